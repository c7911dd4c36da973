//! Dialect adapters.
//!
//! An adapter owns every piece of dialect-specific text: identifier quoting,
//! parameter placeholders, function spellings and the assembly of clause
//! fragments into complete statements. The accumulator only collects
//! fragments and hands them over in one of the `*Parts` structs below.

mod mysql;
mod sql_server;

pub use mysql::MySqlAdapter;
pub use sql_server::SqlServerAdapter;

use std::fmt;

use crate::error::{Result, SqlError};
use crate::expr::DatePart;
use crate::value::SqlValue;

/// The kind of statement being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// SELECT.
    Query,
    /// INSERT ... VALUES.
    Insert,
    /// INSERT ... SELECT.
    InsertFrom,
    /// UPDATE.
    Update,
    /// DELETE.
    Delete,
    /// A CASE fragment embedded in another statement.
    Case,
    /// A SELECT used as a derived table or `IN` operand.
    SubQuery,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Query => "query",
            Self::Insert => "insert",
            Self::InsertFrom => "insert-from",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Case => "case",
            Self::SubQuery => "subquery",
        };
        f.write_str(name)
    }
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    LeftOuter,
    Right,
    RightOuter,
    Full,
    FullOuter,
    Cross,
}

impl JoinType {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
            Self::Right => "RIGHT JOIN",
            Self::RightOuter => "RIGHT OUTER JOIN",
            Self::Full => "FULL JOIN",
            Self::FullOuter => "FULL OUTER JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    size: usize,
    index: usize,
    offset: usize,
}

impl Page {
    /// Page `index` (zero-based) of `size` rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidArgument`] when the offset of the page
    /// does not fit in `usize`.
    pub fn new(size: usize, index: usize) -> Result<Self> {
        let offset = size.checked_mul(index).ok_or_else(|| {
            SqlError::InvalidArgument(format!(
                "page {index} of {size} rows is out of range"
            ))
        })?;
        Ok(Self {
            size,
            index,
            offset,
        })
    }

    /// Rows per page.
    #[must_use]
    pub const fn size(self) -> usize {
        self.size
    }

    /// Zero-based page index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Number of rows skipped before this page.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }
}

/// Rendered fragments of a SELECT.
///
/// Clause strings already carry their keyword (`WHERE ...`, `ORDER BY ...`)
/// and are empty when the clause is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectParts<'a> {
    pub selection: &'a str,
    pub source: &'a str,
    pub conditions: &'a str,
    pub grouping: &'a str,
    pub having: &'a str,
    pub order: &'a str,
}

/// Rendered fragments of an INSERT ... VALUES.
#[derive(Debug, Clone, Copy)]
pub struct InsertParts<'a> {
    /// Quoted target table.
    pub target: &'a str,
    /// Quoted column names.
    pub columns: &'a [String],
    /// One entry per row, each holding one value per column.
    pub rows: &'a [Vec<String>],
    /// Quoted key column to return, if requested.
    pub output: Option<&'a str>,
}

/// Rendered fragments of an INSERT ... SELECT.
#[derive(Debug, Clone, Copy)]
pub struct InsertFromParts<'a> {
    pub target: &'a str,
    pub columns: &'a [String],
    pub selection: &'a str,
    pub source: &'a str,
    pub conditions: &'a str,
}

/// Rendered fragments of an UPDATE or DELETE.
#[derive(Debug, Clone, Copy)]
pub struct WriteParts<'a> {
    /// Alias of the target table.
    pub alias: &'a str,
    /// Target table with alias, followed by joins.
    pub source: &'a str,
    /// `column = value` assignments; empty for DELETE.
    pub assignments: &'a [String],
    pub conditions: &'a str,
}

/// Dialect-specific SQL generation.
///
/// Only the pieces that differ between engines are required; the rest have
/// defaults that produce the common syntax.
pub trait SqlAdapter: fmt::Debug + Send + Sync {
    /// Returns the adapter name.
    fn name(&self) -> &'static str;

    /// Returns the opening and closing identifier quotes, if the dialect
    /// quotes identifiers.
    fn identifier_quotes(&self) -> Option<(char, char)> {
        None
    }

    /// Quotes a single identifier.
    fn quote_identifier(&self, name: &str) -> String {
        match self.identifier_quotes() {
            Some((open, close)) => {
                let escaped = name.replace(close, &format!("{close}{close}"));
                format!("{open}{escaped}{close}")
            }
            None => name.to_string(),
        }
    }

    /// Quotes a possibly dotted table name, segment by segment.
    fn table(&self, name: &str) -> String {
        name.split('.')
            .map(|segment| self.quote_identifier(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Renders a table used as a FROM or JOIN item.
    fn table_with_alias(&self, name: &str, alias: &str) -> String {
        format!("{name} {alias}")
    }

    /// Renders a derived table.
    fn derived_table(&self, query: &str, alias: &str) -> String {
        format!("({query}) {alias}")
    }

    /// Quotes a column name.
    fn field(&self, name: &str) -> String {
        self.quote_identifier(name)
    }

    /// Renders `alias.column`.
    fn qualified_field(&self, alias: &str, name: &str) -> String {
        format!("{alias}.{}", self.field(name))
    }

    /// Renders every column of an aliased table.
    fn all_fields(&self, alias: &str) -> String {
        format!("{alias}.*")
    }

    /// Renders a parameter placeholder.
    fn parameter(&self, name: &str) -> String {
        format!("@{name}")
    }

    /// Renders a projection alias.
    fn alias(&self, alias: &str) -> String {
        format!("AS {}", self.quote_identifier(alias))
    }

    /// Renders a value inline.
    fn literal(&self, value: &SqlValue) -> String {
        value.to_sql_inline()
    }

    /// Renders `WHERE conditions`, or nothing.
    fn where_command(&self, conditions: &str) -> String {
        if conditions.trim().is_empty() {
            String::new()
        } else {
            format!("WHERE {conditions}")
        }
    }

    /// The current server timestamp.
    fn current_timestamp(&self) -> String;

    /// Null replacement.
    fn is_null_function(&self, value: &str, fallback: &str) -> String;

    /// Formats a value with a dialect format string.
    fn format_function(&self, value: &str, pattern: &str) -> String;

    /// Concatenation.
    fn concat_function(&self, parts: &[String]) -> String {
        format!("CONCAT({})", parts.join(", "))
    }

    /// Extracts a date component.
    fn date_part_function(&self, part: DatePart, value: &str) -> String;

    /// Assembles a SELECT.
    fn query_string(&self, parts: &SelectParts<'_>) -> String {
        clauses(&[
            "SELECT",
            parts.selection,
            "FROM",
            parts.source,
            parts.conditions,
            parts.grouping,
            parts.having,
            parts.order,
        ])
    }

    /// Assembles a paginated SELECT.
    fn query_string_page(&self, parts: &SelectParts<'_>, page: Page) -> String;

    /// Assembles a SELECT used inside another statement.
    fn sub_query_string(&self, parts: &SelectParts<'_>) -> String {
        self.query_string(parts)
    }

    /// Assembles a paginated SELECT used inside another statement.
    fn sub_query_string_page(&self, parts: &SelectParts<'_>, page: Page) -> String {
        self.query_string_page(parts, page)
    }

    /// Assembles an INSERT ... VALUES.
    fn insert_command(&self, parts: &InsertParts<'_>) -> String;

    /// Assembles an INSERT ... SELECT.
    fn insert_from_command(&self, parts: &InsertFromParts<'_>) -> String {
        clauses(&[
            "INSERT INTO",
            parts.target,
            &format!("({})", parts.columns.join(", ")),
            "SELECT",
            parts.selection,
            "FROM",
            parts.source,
            parts.conditions,
        ])
    }

    /// Assembles an UPDATE.
    fn update_command(&self, parts: &WriteParts<'_>) -> String;

    /// Assembles a DELETE.
    fn delete_command(&self, parts: &WriteParts<'_>) -> String {
        clauses(&["DELETE", parts.alias, "FROM", parts.source, parts.conditions])
    }
}

/// Joins the non-empty fragments with single spaces.
#[must_use]
pub fn clauses(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders `(a, b), (c, d)` for a VALUES list.
#[must_use]
pub fn values_list(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| format!("({})", row.join(", ")))
        .collect::<Vec<_>>()
        .join(", ")
}
