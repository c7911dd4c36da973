//! Table references registered in a statement.

use serde::Serialize;
use tracing::debug;

use super::QueryBuilder;
use crate::adapter::{JoinType, SqlAdapter};
use crate::error::{Result, SqlError};
use crate::schema::unique_alias;

/// What a table reference reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// A physical table.
    Table,
    /// A derived table built from this rendered query.
    Derived(String),
    /// A table-valued function call, rendered verbatim.
    Function(String),
}

/// One occurrence of a record in the FROM/JOIN list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    record: String,
    name: String,
    alias: String,
    source: TableSource,
}

impl TableRef {
    /// Returns the record this reference belongs to.
    #[must_use]
    pub fn record(&self) -> &str {
        &self.record
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the alias.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns the source kind.
    #[must_use]
    pub const fn source(&self) -> &TableSource {
        &self.source
    }

    /// Renders the reference as a FROM or JOIN item.
    #[must_use]
    pub fn render(&self, adapter: &dyn SqlAdapter) -> String {
        match &self.source {
            TableSource::Table => adapter.table_with_alias(&self.name, &self.alias),
            TableSource::Derived(query) => adapter.derived_table(query, &self.alias),
            TableSource::Function(call) => adapter.table_with_alias(call, &self.alias),
        }
    }
}

/// Marks where the columns of another record start in a projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitColumn {
    /// Projection member that switched tables.
    pub member: String,
    /// First column of the switched-to table.
    pub column: String,
}

impl QueryBuilder {
    /// Registers a table and returns its position.
    ///
    /// The alias is derived from `name` and made unique among the tables
    /// already registered.
    pub fn add_table(&mut self, record: &str, name: &str, source: TableSource) -> usize {
        let alias = unique_alias(name, self.tables.iter().map(TableRef::alias));
        debug!(record, table = name, alias = %alias, "registered table");
        self.tables.push(TableRef {
            record: record.to_string(),
            name: name.to_string(),
            alias,
            source,
        });
        self.tables.len() - 1
    }

    /// Returns the registered tables in order.
    #[must_use]
    pub fn tables(&self) -> &[TableRef] {
        &self.tables
    }

    /// Returns the names of the registered tables.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Resolves the alias of a record occurrence.
    ///
    /// `instance` is 1-based; `None` selects the most recent occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TableNotInStatement`] when the record (or that
    /// occurrence of it) was never registered.
    pub fn table_alias(&self, record: &str, instance: Option<usize>) -> Result<&str> {
        let mut occurrences = self.tables.iter().filter(|t| t.record == record);
        let found = match instance {
            Some(n) => occurrences.nth(n.saturating_sub(1)),
            None => occurrences.last(),
        };
        found
            .map(TableRef::alias)
            .ok_or_else(|| SqlError::TableNotInStatement {
                record: record.to_string(),
            })
    }

    /// Appends a join to the table registered at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidArgument`] when no table is registered at
    /// `position`.
    pub fn add_join(
        &mut self,
        join_type: JoinType,
        position: usize,
        on: Option<&str>,
    ) -> Result<()> {
        let Some(table) = self.tables.get(position) else {
            return Err(SqlError::InvalidArgument(format!(
                "no table is registered at position {position}"
            )));
        };
        let item = table.render(self.adapter.as_ref());
        let join = match on {
            Some(condition) if join_type != JoinType::Cross => {
                format!("{} {item} ON {condition}", join_type.keyword())
            }
            _ => format!("{} {item}", join_type.keyword()),
        };
        debug!(join = %join, "added join");
        self.joins.push(join);
        Ok(())
    }

    /// Records a table switch inside a projection.
    pub fn add_split_column(&mut self, split: SplitColumn) {
        self.split_columns.push(split);
    }

    /// Returns the recorded table switches.
    #[must_use]
    pub fn split_columns(&self) -> &[SplitColumn] {
        &self.split_columns
    }
}
