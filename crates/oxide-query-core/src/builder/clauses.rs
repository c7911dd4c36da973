//! Fragment accumulation for each clause.

use super::{PredicateTarget, QueryBuilder};
use crate::adapter::Operation;

impl QueryBuilder {
    /// Routes subsequent predicate fragments to `target`.
    pub fn set_predicate_target(&mut self, target: PredicateTarget) {
        self.target = target;
    }

    /// Returns where predicate fragments currently go.
    #[must_use]
    pub const fn predicate_target(&self) -> PredicateTarget {
        self.target
    }

    fn target_mut(&mut self) -> &mut Vec<String> {
        match self.target {
            PredicateTarget::Where => &mut self.conditions,
            PredicateTarget::Having => &mut self.having,
            PredicateTarget::Join => &mut self.join_scratch,
        }
    }

    /// Appends a raw predicate fragment.
    pub fn add_predicate(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        self.target_mut().push(fragment);
    }

    /// Appends `AND` unless the target is still empty.
    pub fn and(&mut self) {
        let target = self.target_mut();
        if !target.is_empty() {
            target.push(String::from(" AND "));
        }
    }

    /// Appends `OR` unless the target is still empty.
    pub fn or(&mut self) {
        let target = self.target_mut();
        if !target.is_empty() {
            target.push(String::from(" OR "));
        }
    }

    /// Appends `NOT`.
    pub fn not(&mut self) {
        self.add_predicate("NOT ");
    }

    /// Opens a parenthesized group.
    pub fn begin_group(&mut self) {
        self.add_predicate("(");
    }

    /// Closes a parenthesized group.
    pub fn end_group(&mut self) {
        self.add_predicate(")");
    }

    /// Drains the ON condition collected for the join being added.
    pub fn take_join_predicate(&mut self) -> String {
        let fragments: String = self.join_scratch.drain(..).collect();
        collapse(&fragments)
    }

    /// Opens a CASE.
    pub fn begin_case(&mut self) {
        self.add_predicate(" CASE ");
    }

    /// Starts a WHEN branch.
    pub fn when(&mut self) {
        self.add_predicate(" WHEN ");
    }

    /// Separates a WHEN condition from its result.
    pub fn then(&mut self) {
        self.add_predicate(" THEN ");
    }

    /// Starts the ELSE branch.
    pub fn otherwise(&mut self) {
        self.add_predicate(" ELSE ");
    }

    /// Closes a CASE.
    pub fn end_case(&mut self) {
        self.add_predicate(" END ");
    }

    /// Returns the collapsed WHERE fragments, without the keyword.
    #[must_use]
    pub fn where_text(&self) -> String {
        collapse(&self.conditions.concat())
    }

    /// Appends a projection item.
    pub fn add_selection(&mut self, fragment: impl Into<String>) {
        self.selection.push(fragment.into());
    }

    /// Returns true when an explicit projection was given.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Appends an ORDER BY item.
    pub fn add_ordering(&mut self, fragment: impl Into<String>, descending: bool) {
        let fragment = fragment.into();
        if descending {
            self.order.push(format!("{fragment} DESC"));
        } else {
            self.order.push(fragment);
        }
    }

    /// Appends a GROUP BY item.
    pub fn add_grouping(&mut self, fragment: impl Into<String>) {
        self.grouping.push(fragment.into());
    }

    /// Sets the page size.
    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = Some(size);
    }

    /// Sets the zero-based page index.
    pub fn set_page_index(&mut self, index: usize) {
        self.page_index = index;
    }

    /// Sets the quoted target table of an insert.
    pub fn set_insert_target(&mut self, target: impl Into<String>) {
        self.insert_target = Some(target.into());
    }

    /// Appends a target column of an INSERT ... SELECT.
    pub fn add_insert_column(&mut self, column: impl Into<String>) {
        self.insert_columns.push(column.into());
    }

    /// Starts a new insert row.
    pub fn next_insert_record(&mut self) {
        self.insert_rows.push(Vec::new());
    }

    /// Sets one column value of the current insert row.
    pub fn add_insert_value(&mut self, column: impl Into<String>, value: impl Into<String>) {
        if self.insert_rows.is_empty() {
            self.next_insert_record();
        }
        if let Some(row) = self.insert_rows.last_mut() {
            row.push((column.into(), value.into()));
        }
    }

    /// Appends a `column = value` assignment.
    pub fn add_update(&mut self, assignment: impl Into<String>) {
        self.updates.push(assignment.into());
    }

    /// Requests the generated key of an insert, as a quoted column.
    pub fn set_output_identity(&mut self, column: impl Into<String>) {
        self.output_identity = Some(column.into());
    }

    /// Returns true when the statement writes rows.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self.operation,
            Operation::Insert | Operation::InsertFrom | Operation::Update | Operation::Delete
        )
    }
}

/// Collapses every whitespace run into one space and trims the ends.
/// Quoted string literals are copied as they are.
pub(crate) fn collapse(fragment: &str) -> String {
    let mut collapsed = String::with_capacity(fragment.len());
    let mut quoted = false;
    let mut pending_space = false;
    for c in fragment.chars() {
        if !quoted && c.is_whitespace() {
            pending_space = !collapsed.is_empty();
            continue;
        }
        if pending_space {
            collapsed.push(' ');
            pending_space = false;
        }
        if c == '\'' {
            quoted = !quoted;
        }
        collapsed.push(c);
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapter::SqlServerAdapter;

    fn builder() -> QueryBuilder {
        QueryBuilder::new(Arc::new(SqlServerAdapter::new()), "Param", 0)
    }

    #[test]
    fn test_and_is_skipped_on_empty_target() {
        let mut builder = builder();
        builder.and();
        builder.add_predicate("a = 1");
        builder.and();
        builder.add_predicate("b = 2");
        assert_eq!(builder.where_text(), "a = 1 AND b = 2");
    }

    #[test]
    fn test_groups_and_negation() {
        let mut builder = builder();
        builder.not();
        builder.begin_group();
        builder.add_predicate("a = 1");
        builder.or();
        builder.add_predicate("b = 2");
        builder.end_group();
        assert_eq!(builder.where_text(), "NOT (a = 1 OR b = 2)");
    }

    #[test]
    fn test_join_target_is_drained_separately() {
        let mut builder = builder();
        builder.add_predicate("a = 1");
        builder.set_predicate_target(PredicateTarget::Join);
        builder.and();
        builder.add_predicate("u.[Id]   =  ug.[UserId]");
        assert_eq!(builder.take_join_predicate(), "u.[Id] = ug.[UserId]");
        assert_eq!(builder.take_join_predicate(), "");
        builder.set_predicate_target(PredicateTarget::Where);
        assert_eq!(builder.where_text(), "a = 1");
    }

    #[test]
    fn test_case_keywords() {
        let mut builder = builder();
        builder.begin_case();
        builder.when();
        builder.add_predicate("x");
        builder.then();
        builder.add_predicate("y");
        builder.end_case();
        assert_eq!(builder.where_text(), "CASE WHEN x THEN y END");
    }

    #[test]
    fn test_collapse() {
        assert_eq!(collapse("  a \n\t b  "), "a b");
        assert_eq!(
            collapse("CONCAT(u.[Name],  'a  b''  c')   AS [Tag]"),
            "CONCAT(u.[Name], 'a  b''  c') AS [Tag]"
        );
    }
}
