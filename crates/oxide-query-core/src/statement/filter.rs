//! WHERE, HAVING, ordering, grouping and paging.

use super::{SqlBuilder, SqlCommand};
use crate::error::Result;
use crate::expr::{Expr, FieldRef};
use crate::schema::Record;
use crate::value::ToSqlValue;

impl<T: Record> SqlBuilder<T> {
    /// ANDs a predicate onto the WHERE clause.
    ///
    /// # Errors
    ///
    /// Fails when the predicate does not resolve.
    pub fn where_clause(self, predicate: impl Into<Expr>) -> Result<Self> {
        let predicate = predicate.into();
        self.with_resolver(|resolver| resolver.and_predicate(&predicate))?;
        Ok(self)
    }

    /// Same as [`where_clause`](Self::where_clause); reads better after the
    /// first condition.
    ///
    /// # Errors
    ///
    /// Fails when the predicate does not resolve.
    pub fn and_where(self, predicate: impl Into<Expr>) -> Result<Self> {
        self.where_clause(predicate)
    }

    /// ORs a predicate onto the WHERE clause.
    ///
    /// # Errors
    ///
    /// Fails when the predicate does not resolve.
    pub fn or_where(self, predicate: impl Into<Expr>) -> Result<Self> {
        let predicate = predicate.into();
        self.with_resolver(|resolver| resolver.or_predicate(&predicate))?;
        Ok(self)
    }

    /// Adds `field IN (@p1, @p2, ...)`.
    ///
    /// # Errors
    ///
    /// Fails on an empty list or an unknown field.
    pub fn where_in<V: ToSqlValue>(
        self,
        field: impl Into<FieldRef>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        self.is_in(&field.into(), values, false)
    }

    /// Adds `field NOT IN (@p1, @p2, ...)`.
    ///
    /// # Errors
    ///
    /// Fails on an empty list or an unknown field.
    pub fn where_not_in<V: ToSqlValue>(
        self,
        field: impl Into<FieldRef>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        self.is_in(&field.into(), values, true)
    }

    fn is_in<V: ToSqlValue>(
        self,
        field: &FieldRef,
        values: impl IntoIterator<Item = V>,
        negate: bool,
    ) -> Result<Self> {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        self.with_resolver(|resolver| {
            resolver.conjoin();
            resolver.query_by_is_in(field, values, negate)
        })?;
        Ok(self)
    }

    /// Adds `field IN (subquery)`, adopting the subquery's parameters.
    ///
    /// # Errors
    ///
    /// Fails when the subquery does not render or the field is unknown.
    pub fn where_in_query(
        self,
        field: impl Into<FieldRef>,
        query: &impl SqlCommand,
    ) -> Result<Self> {
        self.in_query(&field.into(), query, false)
    }

    /// Adds `field NOT IN (subquery)`.
    ///
    /// # Errors
    ///
    /// Fails when the subquery does not render or the field is unknown.
    pub fn where_not_in_query(
        self,
        field: impl Into<FieldRef>,
        query: &impl SqlCommand,
    ) -> Result<Self> {
        self.in_query(&field.into(), query, true)
    }

    fn in_query(self, field: &FieldRef, query: &impl SqlCommand, negate: bool) -> Result<Self> {
        let inner = query.command()?;
        self.with_resolver(|resolver| {
            resolver.conjoin();
            resolver.query_by_is_in_subquery(field, &inner, negate)
        })?;
        Ok(self)
    }

    /// Adds `(field BETWEEN @a AND @b)`.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown.
    pub fn where_between(
        self,
        field: impl Into<FieldRef>,
        start: impl ToSqlValue,
        end: impl ToSqlValue,
    ) -> Result<Self> {
        self.between(&field.into(), start, end, false)
    }

    /// Adds `(field NOT BETWEEN @a AND @b)`.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown.
    pub fn where_not_between(
        self,
        field: impl Into<FieldRef>,
        start: impl ToSqlValue,
        end: impl ToSqlValue,
    ) -> Result<Self> {
        self.between(&field.into(), start, end, true)
    }

    fn between(
        self,
        field: &FieldRef,
        start: impl ToSqlValue,
        end: impl ToSqlValue,
        negate: bool,
    ) -> Result<Self> {
        let (start, end) = (start.to_sql_value(), end.to_sql_value());
        self.with_resolver(|resolver| {
            resolver.conjoin();
            resolver.query_by_between(field, start, end, negate)
        })?;
        Ok(self)
    }

    /// Adds `field LIKE @p` with `pattern` bound as given, wildcards
    /// included.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown.
    pub fn where_like(self, field: impl Into<FieldRef>, pattern: &str) -> Result<Self> {
        let field = field.into();
        self.with_resolver(|resolver| {
            resolver.conjoin();
            resolver.query_by_like(&field, pattern)
        })?;
        Ok(self)
    }

    /// ANDs a predicate onto the HAVING clause.
    ///
    /// # Errors
    ///
    /// Fails when the predicate does not resolve.
    pub fn having(self, predicate: impl Into<Expr>) -> Result<Self> {
        let predicate = predicate.into();
        self.with_resolver(|resolver| resolver.having_predicate(&predicate))?;
        Ok(self)
    }

    /// Appends an ascending ORDER BY item.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown or not part of the statement.
    pub fn order_by(self, field: impl Into<FieldRef>) -> Result<Self> {
        self.ordering(field.into(), false)
    }

    /// Appends a descending ORDER BY item.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown or not part of the statement.
    pub fn order_by_descending(self, field: impl Into<FieldRef>) -> Result<Self> {
        self.ordering(field.into(), true)
    }

    fn ordering(self, field: FieldRef, descending: bool) -> Result<Self> {
        self.with_resolver(|resolver| resolver.resolve_ordering(&field, descending))?;
        Ok(self)
    }

    /// Appends a GROUP BY item.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown or not part of the statement.
    pub fn group_by(self, field: impl Into<FieldRef>) -> Result<Self> {
        let field = field.into();
        self.with_resolver(|resolver| resolver.resolve_grouping(&field))?;
        Ok(self)
    }

    /// Limits the result to `size` rows per page.
    #[must_use]
    pub fn take(self, size: usize) -> Self {
        self.state().set_page_size(size);
        self
    }

    /// Selects the zero-based page to return. Needs [`take`](Self::take)
    /// and an ordering, checked when the statement is rendered.
    #[must_use]
    pub fn skip(self, index: usize) -> Self {
        self.state().set_page_index(index);
        self
    }
}
