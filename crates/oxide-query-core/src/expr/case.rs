//! CASE expressions.

use super::Expr;

/// One `WHEN condition THEN result` branch.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenBranch {
    /// A predicate, or a value compared with the subject of a simple CASE.
    pub condition: Expr,
    /// The value produced when the branch matches.
    pub result: Expr,
}

/// A searched (`CASE WHEN p THEN v`) or simple (`CASE x WHEN v THEN r`)
/// CASE expression.
///
/// ```rust
/// use oxide_query_core::expr::{CaseExpr, Expr};
///
/// let age = Expr::field("User", "age");
/// let bracket = CaseExpr::new()
///     .when(age.clone().lt(18), "minor")
///     .when(age.gt_eq(65), "senior")
///     .otherwise("adult")
///     .end();
/// assert!(matches!(bracket, Expr::Case(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaseExpr {
    subject: Option<Expr>,
    branches: Vec<WhenBranch>,
    otherwise: Option<Expr>,
}

impl CaseExpr {
    /// Starts a searched CASE.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a simple CASE over `subject`.
    #[must_use]
    pub fn on(subject: impl Into<Expr>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    /// Appends a branch.
    #[must_use]
    pub fn when(mut self, condition: impl Into<Expr>, result: impl Into<Expr>) -> Self {
        self.branches.push(WhenBranch {
            condition: condition.into(),
            result: result.into(),
        });
        self
    }

    /// Sets the ELSE value.
    #[must_use]
    pub fn otherwise(mut self, result: impl Into<Expr>) -> Self {
        self.otherwise = Some(result.into());
        self
    }

    /// Finishes the CASE as an expression node.
    #[must_use]
    pub fn end(self) -> Expr {
        Expr::Case(Box::new(self))
    }

    /// Returns the subject of a simple CASE.
    #[must_use]
    pub const fn subject(&self) -> Option<&Expr> {
        self.subject.as_ref()
    }

    /// Returns the branches in order.
    #[must_use]
    pub fn branches(&self) -> &[WhenBranch] {
        &self.branches
    }

    /// Returns the ELSE value.
    #[must_use]
    pub const fn else_value(&self) -> Option<&Expr> {
        self.otherwise.as_ref()
    }
}
