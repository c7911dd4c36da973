//! MySQL adapter.

use super::{clauses, values_list, InsertParts, Page, SelectParts, SqlAdapter, WriteParts};
use crate::expr::DatePart;
use crate::value::SqlValue;

/// MySQL dialect.
///
/// Identifiers are emitted bare, pagination uses `LIMIT` and inserts return
/// the generated key with a trailing `SELECT LAST_INSERT_ID()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlAdapter;

impl MySqlAdapter {
    /// Creates a new MySQL adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlAdapter for MySqlAdapter {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn current_timestamp(&self) -> String {
        String::from("CURRENT_TIMESTAMP")
    }

    fn is_null_function(&self, value: &str, fallback: &str) -> String {
        format!("IFNULL({value}, {fallback})")
    }

    fn format_function(&self, value: &str, pattern: &str) -> String {
        let pattern = self.literal(&SqlValue::Text(pattern.to_string()));
        format!("DATE_FORMAT({value}, {pattern})")
    }

    fn date_part_function(&self, part: DatePart, value: &str) -> String {
        match part {
            DatePart::Millisecond => format!("(MICROSECOND({value}) DIV 1000)"),
            other => format!("{other}({value})"),
        }
    }

    fn query_string_page(&self, parts: &SelectParts<'_>, page: Page) -> String {
        let limit = if page.index() == 0 {
            format!("LIMIT {}", page.size())
        } else {
            format!("LIMIT {}, {}", page.offset(), page.size())
        };
        clauses(&[&self.query_string(parts), &limit])
    }

    fn insert_command(&self, parts: &InsertParts<'_>) -> String {
        let sql = clauses(&[
            "INSERT INTO",
            parts.target,
            &format!("({})", parts.columns.join(", ")),
            "VALUES",
            &values_list(parts.rows),
        ]);
        if parts.output.is_some() {
            format!("{sql}; SELECT LAST_INSERT_ID()")
        } else {
            sql
        }
    }

    fn update_command(&self, parts: &WriteParts<'_>) -> String {
        clauses(&[
            "UPDATE",
            parts.source,
            "SET",
            &parts.assignments.join(", "),
            parts.conditions,
        ])
    }
}
