//! Clause accumulator.
//!
//! A [`QueryBuilder`] collects the rendered fragments of one statement
//! (selection, source tables and joins, predicate fragments, ordering,
//! grouping, write payloads, pagination) together with its bound
//! parameters. It never inspects expressions itself: the resolver produces
//! the fragments and the adapter assembles them when the statement is
//! rendered.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use oxide_query_core::adapter::SqlServerAdapter;
//! use oxide_query_core::builder::{QueryBuilder, TableSource};
//! use oxide_query_core::value::SqlValue;
//!
//! let mut builder = QueryBuilder::new(Arc::new(SqlServerAdapter::new()), "Param", 0);
//! builder.add_table("User", "Users", TableSource::Table);
//! let email = builder.add_parameter(SqlValue::Text(String::from("a@b.com")));
//! builder.add_predicate(format!("u.[Email] = {email}"));
//!
//! let command = builder.render().unwrap();
//! assert_eq!(command.text, "SELECT u.* FROM Users u WHERE u.[Email] = @Param1");
//! assert_eq!(builder.current_param_index(), 1);
//! ```

mod clauses;
mod render;
mod table;

pub use table::{SplitColumn, TableRef, TableSource};

use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use crate::adapter::{Operation, SqlAdapter};
use crate::error::Result;
use crate::params::Parameters;
use crate::value::SqlValue;

/// Which clause predicate fragments are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredicateTarget {
    /// The WHERE clause.
    #[default]
    Where,
    /// The HAVING clause.
    Having,
    /// The ON condition of the join being added.
    Join,
}

/// A rendered statement: SQL text plus its parameter table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub text: String,
    pub parameters: Parameters,
}

/// Clause lengths captured by [`QueryBuilder::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    tables: usize,
    joins: usize,
    selection: usize,
    conditions: usize,
    having: usize,
    join_scratch: usize,
    order: usize,
    grouping: usize,
    updates: usize,
    split_columns: usize,
}

/// Accumulates the fragments of one statement.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    adapter: Arc<dyn SqlAdapter>,
    operation: Operation,
    tables: Vec<TableRef>,
    joins: Vec<String>,
    selection: Vec<String>,
    conditions: Vec<String>,
    having: Vec<String>,
    join_scratch: Vec<String>,
    target: PredicateTarget,
    order: Vec<String>,
    grouping: Vec<String>,
    insert_target: Option<String>,
    insert_columns: Vec<String>,
    insert_rows: Vec<Vec<(String, String)>>,
    updates: Vec<String>,
    page_size: Option<usize>,
    page_index: usize,
    output_identity: Option<String>,
    split_columns: Vec<SplitColumn>,
    parameters: Parameters,
    param_index: usize,
    prefix: String,
}

impl QueryBuilder {
    /// Creates an empty query whose parameter numbering continues after
    /// `seed`.
    #[must_use]
    pub fn new(adapter: Arc<dyn SqlAdapter>, prefix: impl Into<String>, seed: usize) -> Self {
        Self {
            adapter,
            operation: Operation::Query,
            tables: Vec::new(),
            joins: Vec::new(),
            selection: Vec::new(),
            conditions: Vec::new(),
            having: Vec::new(),
            join_scratch: Vec::new(),
            target: PredicateTarget::Where,
            order: Vec::new(),
            grouping: Vec::new(),
            insert_target: None,
            insert_columns: Vec::new(),
            insert_rows: Vec::new(),
            updates: Vec::new(),
            page_size: None,
            page_index: 0,
            output_identity: None,
            split_columns: Vec::new(),
            parameters: Parameters::new(),
            param_index: seed,
            prefix: prefix.into(),
        }
    }

    /// Creates the builder of a CASE fragment nested in this statement.
    ///
    /// The nested builder sees the same tables and adapter, but numbers its
    /// own parameters under `prefix` starting from 1.
    #[must_use]
    pub fn nested_case(&self, prefix: impl Into<String>) -> Self {
        let mut nested = Self::new(Arc::clone(&self.adapter), prefix, 0);
        nested.operation = Operation::Case;
        nested.tables = self.tables.clone();
        nested
    }

    /// Returns the adapter.
    #[must_use]
    pub fn adapter(&self) -> &dyn SqlAdapter {
        self.adapter.as_ref()
    }

    /// Returns the statement kind.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Changes the statement kind.
    pub fn set_operation(&mut self, operation: Operation) {
        self.operation = operation;
    }

    /// Returns the parameter name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the highest parameter number issued so far, seed included.
    #[must_use]
    pub const fn current_param_index(&self) -> usize {
        self.param_index
    }

    /// Returns the parameters bound so far, in binding order.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Reserves the next parameter name.
    pub fn next_parameter_name(&mut self) -> String {
        self.param_index += 1;
        format!("{}{}", self.prefix, self.param_index)
    }

    /// Binds `value` under a fresh name and returns its placeholder.
    pub fn add_parameter(&mut self, value: SqlValue) -> String {
        let name = self.next_parameter_name();
        let placeholder = self.adapter.parameter(&name);
        self.parameters.insert(name, value);
        placeholder
    }

    /// Binds `value` under a caller-chosen name.
    pub fn bind_named(&mut self, name: impl Into<String>, value: SqlValue) {
        self.parameters.insert(name, value);
    }

    /// Merges parameters produced by another statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ParameterCollision`](crate::SqlError::ParameterCollision)
    /// when a name is already bound.
    pub fn merge_parameters(&mut self, other: &Parameters) -> Result<()> {
        self.parameters.try_extend(other)
    }

    /// Records how far each clause has been filled.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            tables: self.tables.len(),
            joins: self.joins.len(),
            selection: self.selection.len(),
            conditions: self.conditions.len(),
            having: self.having.len(),
            join_scratch: self.join_scratch.len(),
            order: self.order.len(),
            grouping: self.grouping.len(),
            updates: self.updates.len(),
            split_columns: self.split_columns.len(),
        }
    }

    /// Drops every fragment added since `checkpoint`. Parameters bound in
    /// the meantime stay allocated, so numbering never goes backwards.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.tables.truncate(checkpoint.tables);
        self.joins.truncate(checkpoint.joins);
        self.selection.truncate(checkpoint.selection);
        self.conditions.truncate(checkpoint.conditions);
        self.having.truncate(checkpoint.having);
        self.join_scratch.truncate(checkpoint.join_scratch);
        self.order.truncate(checkpoint.order);
        self.grouping.truncate(checkpoint.grouping);
        self.updates.truncate(checkpoint.updates);
        self.split_columns.truncate(checkpoint.split_columns);
    }

    /// Parses the number of a parameter issued by this builder.
    fn own_number(&self, name: &str) -> Option<usize> {
        name.strip_prefix(self.prefix.as_str())?.parse().ok()
    }
}

/// Compiles a pattern matching any of `placeholders` as a whole word.
///
/// Quoted string literals are matched as one unit first, so callers see
/// them as matches that are not placeholders and leave them untouched.
pub(crate) fn placeholder_pattern<'a>(
    placeholders: impl IntoIterator<Item = &'a str>,
) -> Result<Regex> {
    let mut placeholders: Vec<&str> = placeholders.into_iter().collect();
    placeholders.sort_by(|a, b| b.len().cmp(&a.len()));
    let alternation = placeholders
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Regex::new(&format!(r"'(?:[^']|'')*'|(?:{alternation})\b"))?)
}
