//! Joins. Each join returns a view typed by the joined record that shares
//! the statement with the view it was called on.

use super::SqlBuilder;
use crate::adapter::JoinType;
use crate::error::Result;
use crate::expr::Expr;
use crate::schema::Record;

macro_rules! join_methods {
    ($($(#[$doc:meta])* $name:ident => $kind:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// Fails when `U` is not registered or the condition does not
            /// resolve.
            pub fn $name<U: Record>(self, on: impl Into<Expr>) -> Result<SqlBuilder<U>> {
                self.join(JoinType::$kind, on)
            }
        )+
    };
}

impl<T: Record> SqlBuilder<T> {
    /// Joins `U` with the given join kind.
    ///
    /// `U` is registered before `on` is resolved, so unpinned fields of `U`
    /// in the condition refer to the table just joined. Joining the same
    /// record twice gives the second occurrence its own alias (`u2`).
    ///
    /// # Errors
    ///
    /// Fails when `U` is not registered or the condition does not resolve.
    pub fn join<U: Record>(
        self,
        join_type: JoinType,
        on: impl Into<Expr>,
    ) -> Result<SqlBuilder<U>> {
        let on = on.into();
        self.with_resolver(|resolver| resolver.resolve_join(join_type, U::NAME, Some(&on)))?;
        Ok(self.view())
    }

    join_methods! {
        /// `INNER JOIN U ON ...`
        inner_join => Inner,
        /// `LEFT JOIN U ON ...`
        left_join => Left,
        /// `LEFT OUTER JOIN U ON ...`
        left_outer_join => LeftOuter,
        /// `RIGHT JOIN U ON ...`
        right_join => Right,
        /// `RIGHT OUTER JOIN U ON ...`
        right_outer_join => RightOuter,
        /// `FULL JOIN U ON ...`
        full_join => Full,
        /// `FULL OUTER JOIN U ON ...`
        full_outer_join => FullOuter,
    }

    /// `CROSS JOIN U`, which takes no condition.
    ///
    /// # Errors
    ///
    /// Fails when `U` is not registered.
    pub fn cross_join<U: Record>(self) -> Result<SqlBuilder<U>> {
        self.with_resolver(|resolver| resolver.resolve_join(JoinType::Cross, U::NAME, None))?;
        Ok(self.view())
    }
}
