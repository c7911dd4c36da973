//! CASE expressions.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::Resolver;
use crate::adapter::Operation;
use crate::error::{Result, SqlError};
use crate::expr::CaseExpr;

/// Namespace counter for CASE parameter prefixes, unique per process.
static CASE_NAMESPACE: AtomicUsize = AtomicUsize::new(0);

fn next_case_prefix() -> String {
    let namespace = CASE_NAMESPACE.fetch_add(1, Ordering::Relaxed) + 1;
    format!("Case{namespace}_")
}

impl Resolver<'_> {
    /// Renders a CASE expression in a nested builder and merges its
    /// parameters into this statement.
    ///
    /// The nested builder names its parameters `Case{n}_1, Case{n}_2, ...`
    /// so they never collide with the outer statement's numbering.
    ///
    /// # Errors
    ///
    /// Fails when the CASE has no WHEN branch, or a branch fails to resolve.
    pub fn resolve_case(&mut self, case: &CaseExpr) -> Result<String> {
        if case.branches().is_empty() {
            return Err(SqlError::EmptyStatement {
                operation: Operation::Case,
                detail: "CASE needs at least one WHEN branch",
            });
        }

        let mut nested = self.builder.nested_case(next_case_prefix());
        {
            let mut inner = Resolver::new(&mut nested, self.schemas);
            inner.builder.begin_case();
            if let Some(subject) = case.subject() {
                let subject = inner.resolve_value(subject)?;
                inner.builder.add_predicate(subject);
            }
            for branch in case.branches() {
                inner.builder.when();
                if case.subject().is_some() {
                    let value = inner.resolve_value(&branch.condition)?;
                    inner.builder.add_predicate(value);
                } else {
                    inner.resolve_predicate(&branch.condition)?;
                }
                inner.builder.then();
                let result = inner.resolve_value(&branch.result)?;
                inner.builder.add_predicate(result);
            }
            if let Some(otherwise) = case.else_value() {
                inner.builder.otherwise();
                let result = inner.resolve_value(otherwise)?;
                inner.builder.add_predicate(result);
            }
            inner.builder.end_case();
        }

        let fragment = nested.render()?;
        self.builder.merge_parameters(&fragment.parameters)?;
        Ok(fragment.text)
    }
}
