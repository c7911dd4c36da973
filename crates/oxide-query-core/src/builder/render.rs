//! Statement assembly and parameter renumbering.

use std::collections::HashMap;

use regex::Captures;
use tracing::{debug, trace};

use super::clauses::collapse;
use super::{placeholder_pattern, Command, QueryBuilder, TableRef};
use crate::adapter::{InsertFromParts, InsertParts, Operation, Page, SelectParts, WriteParts};
use crate::error::{Result, SqlError};
use crate::params::Parameters;

impl QueryBuilder {
    /// Renders the statement.
    ///
    /// Whitespace runs are collapsed, and the parameters this builder issued
    /// are renumbered so they read `Param1, Param2, ...` in order of first
    /// appearance in the text. Parameters issued by other builders (CASE
    /// fragments, function sources) keep their names.
    ///
    /// # Errors
    ///
    /// Fails when the statement has no source table or no write payload,
    /// when pagination is requested without a page size or ordering, and
    /// when insert rows set different columns.
    pub fn render(&self) -> Result<Command> {
        let raw = self.render_text()?;
        let command = self.normalize(collapse(&raw))?;
        if self.operation == Operation::Case {
            trace!(sql = %command.text, "rendered case fragment");
        } else {
            debug!(
                operation = %self.operation,
                sql = %command.text,
                params = command.parameters.len(),
                "rendered statement"
            );
        }
        Ok(command)
    }

    fn render_text(&self) -> Result<String> {
        let adapter = self.adapter.as_ref();
        match self.operation {
            Operation::Case => Ok(self.conditions.concat()),
            Operation::Query | Operation::SubQuery => {
                let selection = self.selection_text();
                let source = self.source_text()?;
                let conditions = adapter.where_command(&self.where_text());
                let grouping = list_clause("GROUP BY", &self.grouping);
                let having = self.having_text();
                let order = list_clause("ORDER BY", &self.order);
                let parts = SelectParts {
                    selection: &selection,
                    source: &source,
                    conditions: &conditions,
                    grouping: &grouping,
                    having: &having,
                    order: &order,
                };
                let sub = self.operation == Operation::SubQuery;
                Ok(match (self.page()?, sub) {
                    (None, false) => adapter.query_string(&parts),
                    (None, true) => adapter.sub_query_string(&parts),
                    (Some(page), false) => adapter.query_string_page(&parts, page),
                    (Some(page), true) => adapter.sub_query_string_page(&parts, page),
                })
            }
            Operation::Insert => {
                let target = self.target_table()?;
                let (columns, rows) = self.insert_matrix()?;
                Ok(adapter.insert_command(&InsertParts {
                    target: &target,
                    columns: &columns,
                    rows: &rows,
                    output: self.output_identity.as_deref(),
                }))
            }
            Operation::InsertFrom => {
                if self.insert_columns.is_empty() {
                    return Err(SqlError::EmptyStatement {
                        operation: self.operation,
                        detail: "no columns to insert",
                    });
                }
                let target = self.target_table()?;
                let selection = self.selection.join(", ");
                let source = self.source_text()?;
                let conditions = adapter.where_command(&self.where_text());
                Ok(adapter.insert_from_command(&InsertFromParts {
                    target: &target,
                    columns: &self.insert_columns,
                    selection: &selection,
                    source: &source,
                    conditions: &conditions,
                }))
            }
            Operation::Update | Operation::Delete => {
                if self.operation == Operation::Update && self.updates.is_empty() {
                    return Err(SqlError::EmptyStatement {
                        operation: self.operation,
                        detail: "no columns to update",
                    });
                }
                let alias = self.primary_table()?.alias();
                let source = self.source_text()?;
                let conditions = adapter.where_command(&self.where_text());
                let parts = WriteParts {
                    alias,
                    source: &source,
                    assignments: &self.updates,
                    conditions: &conditions,
                };
                Ok(if self.operation == Operation::Update {
                    adapter.update_command(&parts)
                } else {
                    adapter.delete_command(&parts)
                })
            }
        }
    }

    fn primary_table(&self) -> Result<&TableRef> {
        self.tables.first().ok_or(SqlError::EmptyStatement {
            operation: self.operation,
            detail: "no source table",
        })
    }

    fn target_table(&self) -> Result<String> {
        match &self.insert_target {
            Some(target) => Ok(target.clone()),
            None => Ok(self.adapter.table(self.primary_table()?.name())),
        }
    }

    fn selection_text(&self) -> String {
        if self.selection.is_empty() {
            self.tables
                .iter()
                .map(|t| self.adapter.all_fields(t.alias()))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            self.selection.join(", ")
        }
    }

    fn source_text(&self) -> Result<String> {
        let primary = self.primary_table()?.render(self.adapter.as_ref());
        let mut parts = Vec::with_capacity(self.joins.len() + 1);
        parts.push(primary);
        parts.extend(self.joins.iter().cloned());
        Ok(parts.join(" "))
    }

    fn having_text(&self) -> String {
        let having = collapse(&self.having.concat());
        if having.is_empty() {
            having
        } else {
            format!("HAVING {having}")
        }
    }

    fn page(&self) -> Result<Option<Page>> {
        match self.page_size {
            None if self.page_index > 0 => Err(SqlError::PageIndexWithoutSize),
            None => Ok(None),
            Some(_) if self.page_index > 0 && self.order.is_empty() => {
                Err(SqlError::PaginationWithoutOrder)
            }
            Some(size) => Page::new(size, self.page_index).map(Some),
        }
    }

    fn insert_matrix(&self) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let Some(first) = self.insert_rows.first().filter(|row| !row.is_empty()) else {
            return Err(SqlError::EmptyStatement {
                operation: self.operation,
                detail: "no values to insert",
            });
        };
        let columns: Vec<String> = first.iter().map(|(column, _)| column.clone()).collect();
        let mut rows = Vec::with_capacity(self.insert_rows.len());
        for row in &self.insert_rows {
            if row.len() != columns.len() {
                return Err(SqlError::InvalidArgument(String::from(
                    "every inserted row must set the same columns",
                )));
            }
            let values = columns
                .iter()
                .map(|column| {
                    row.iter()
                        .find(|(c, _)| c == column)
                        .map(|(_, value)| value.clone())
                        .ok_or_else(|| {
                            SqlError::InvalidArgument(format!(
                                "inserted row is missing column {column}"
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(values);
        }
        Ok((columns, rows))
    }

    /// Renumbers this builder's parameters by order of first appearance.
    fn normalize(&self, text: String) -> Result<Command> {
        let mut text = text;
        let mut parameters = self.parameters.clone();

        let own: Vec<(String, &str)> = self
            .parameters
            .keys()
            .filter(|name| self.own_number(name).is_some())
            .map(|name| (self.adapter.parameter(name), name))
            .collect();

        if own.len() > 1 {
            let pattern = placeholder_pattern(own.iter().map(|(p, _)| p.as_str()))?;
            let lookup: HashMap<&str, &str> =
                own.iter().map(|(p, name)| (p.as_str(), *name)).collect();

            let mut appearance: Vec<&str> = Vec::new();
            for found in pattern.find_iter(&text) {
                if let Some(name) = lookup.get(found.as_str()) {
                    if !appearance.contains(name) {
                        appearance.push(*name);
                    }
                }
            }
            let mut numbers: Vec<usize> = appearance
                .iter()
                .filter_map(|name| self.own_number(name))
                .collect();
            numbers.sort_unstable();

            let renames: HashMap<&str, String> = appearance
                .iter()
                .zip(numbers)
                .filter(|(name, number)| self.own_number(name) != Some(*number))
                .map(|(name, number)| (*name, format!("{}{number}", self.prefix)))
                .collect();

            if !renames.is_empty() {
                trace!(renamed = renames.len(), "renumbering parameters");
                text = pattern
                    .replace_all(&text, |caps: &Captures<'_>| {
                        let placeholder = &caps[0];
                        lookup
                            .get(placeholder)
                            .and_then(|name| renames.get(name))
                            .map_or_else(
                                || placeholder.to_string(),
                                |renamed| self.adapter.parameter(renamed),
                            )
                    })
                    .into_owned();
                parameters = parameters
                    .into_iter()
                    .map(|(name, value)| match renames.get(name.as_str()) {
                        Some(renamed) => (renamed.clone(), value),
                        None => (name, value),
                    })
                    .collect::<Parameters>();
            }
        }

        parameters.sort_by_key(|(name, _)| self.own_number(name).unwrap_or(usize::MAX));
        Ok(Command { text, parameters })
    }
}

fn list_clause(keyword: &str, items: &[String]) -> String {
    if items.is_empty() {
        String::new()
    } else {
        format!("{keyword} {}", items.join(", "))
    }
}
