//! Clause-level entry points used by the statement facade.

use super::Resolver;
use crate::adapter::JoinType;
use crate::builder::{PredicateTarget, TableSource};
use crate::error::{Result, SqlError};
use crate::expr::{Expr, FieldRef};

impl Resolver<'_> {
    /// Emits AND when the current target already holds a condition, before
    /// one of the explicit `query_by_*` entry points.
    pub fn conjoin(&mut self) {
        self.builder.and();
    }

    /// Runs `f` and, when it fails, drops every fragment it added.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`.
    pub fn atomic<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let checkpoint = self.builder.checkpoint();
        let result = f(self);
        if result.is_err() {
            self.builder.rollback(checkpoint);
        }
        result
    }

    /// ANDs a predicate onto the current target.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve_predicate`].
    pub fn and_predicate(&mut self, expr: &Expr) -> Result<()> {
        self.atomic(|resolver| {
            resolver.builder.and();
            resolver.resolve_predicate(expr)
        })
    }

    /// ORs a predicate onto the current target.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve_predicate`].
    pub fn or_predicate(&mut self, expr: &Expr) -> Result<()> {
        self.atomic(|resolver| {
            resolver.builder.or();
            resolver.resolve_predicate(expr)
        })
    }

    /// ANDs a predicate onto the HAVING clause.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve_predicate`].
    pub fn having_predicate(&mut self, expr: &Expr) -> Result<()> {
        self.with_target(PredicateTarget::Having, |resolver| {
            resolver.and_predicate(expr)
        })
    }

    fn with_target(
        &mut self,
        target: PredicateTarget,
        f: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let previous = self.builder.predicate_target();
        self.builder.set_predicate_target(target);
        let result = f(self);
        self.builder.set_predicate_target(previous);
        result
    }

    /// Registers `record` and joins it.
    ///
    /// The joined table is registered before the condition is resolved, so
    /// unpinned fields of `record` in the condition refer to the new
    /// occurrence. It is unregistered again when the join fails.
    ///
    /// # Errors
    ///
    /// Fails when the record is unknown, when a non-cross join has no
    /// condition, or when the condition does not resolve.
    pub fn resolve_join(
        &mut self,
        join_type: JoinType,
        record: &str,
        on: Option<&Expr>,
    ) -> Result<()> {
        let schema = self.schema(record)?;
        if join_type != JoinType::Cross && on.is_none() {
            return Err(SqlError::InvalidArgument(format!(
                "{} of `{record}` needs a condition",
                join_type.keyword()
            )));
        }
        self.atomic(|resolver| {
            let index = resolver.builder.add_table(
                record,
                &schema.qualified_table(),
                TableSource::Table,
            );

            let condition = match on {
                Some(expr) if join_type != JoinType::Cross => {
                    let mut condition = String::new();
                    let resolved = resolver.with_target(PredicateTarget::Join, |resolver| {
                        let result = resolver.resolve_predicate(expr);
                        condition = resolver.builder.take_join_predicate();
                        result
                    });
                    resolved?;
                    Some(condition)
                }
                _ => None,
            };
            resolver
                .builder
                .add_join(join_type, index, condition.as_deref())
        })
    }

    /// Appends an ORDER BY item.
    ///
    /// # Errors
    ///
    /// Fails when the field cannot be resolved.
    pub fn resolve_ordering(&mut self, field: &FieldRef, descending: bool) -> Result<()> {
        let column = self.field(field)?;
        self.builder.add_ordering(column, descending);
        Ok(())
    }

    /// Appends a GROUP BY item.
    ///
    /// # Errors
    ///
    /// Fails when the field cannot be resolved.
    pub fn resolve_grouping(&mut self, field: &FieldRef) -> Result<()> {
        let column = self.field(field)?;
        self.builder.add_grouping(column);
        Ok(())
    }
}
