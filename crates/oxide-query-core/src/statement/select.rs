//! SELECT constructors and projections.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use super::{SqlBuilder, SqlCommand};
use crate::adapter::Operation;
use crate::builder::TableSource;
use crate::context::SqlContext;
use crate::error::{Result, SqlError};
use crate::expr::{self, Expr, FieldRef};
use crate::schema::Record;
use crate::value::ToSqlValue;

impl<T: Record> SqlBuilder<T> {
    /// Starts `SELECT ... FROM <T>`.
    ///
    /// Without an explicit projection every column of every table in the
    /// statement is selected.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnknownRecord`] when `T` is not registered.
    pub fn select(context: &SqlContext) -> Result<Self> {
        Self::start(context, Operation::Query)
    }

    /// Starts a SELECT limited to one row.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnknownRecord`] when `T` is not registered.
    pub fn select_single(context: &SqlContext) -> Result<Self> {
        Ok(Self::select(context)?.take(1))
    }

    /// Starts `SELECT COUNT(*) FROM <T>`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnknownRecord`] when `T` is not registered.
    pub fn count(context: &SqlContext) -> Result<Self> {
        Self::select(context)?.select_count_all()
    }

    /// Starts a SELECT over a table-valued function.
    ///
    /// `call` is rendered verbatim as the FROM item, aliased like `T`'s
    /// table. Each distinct `@name` placeholder in it is bound, in order of
    /// appearance, to the next value of `args` under that exact name.
    ///
    /// ```rust,ignore
    /// let query = SqlBuilder::<User>::select_function(
    ///     &context,
    ///     "dbo.UsersOfTenant(@tenant, @since)",
    ///     [SqlValue::Int(7), SqlValue::Text("2024-01-01".into())],
    /// )?;
    /// // SELECT u.* FROM dbo.UsersOfTenant(@tenant, @since) u
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::FunctionArity`] when the number of placeholders
    /// and values differ.
    pub fn select_function<V: ToSqlValue>(
        context: &SqlContext,
        call: &str,
        args: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let schema = context.schemas().get(T::NAME)?;
        let pattern = Regex::new(r"@(\w+)")?;
        let mut seen = HashSet::new();
        let names: Vec<&str> = pattern
            .captures_iter(call)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .filter(|name| seen.insert(*name))
            .collect();
        let values: Vec<_> = args.into_iter().map(ToSqlValue::to_sql_value).collect();
        if names.len() != values.len() {
            return Err(SqlError::FunctionArity {
                expected: names.len(),
                found: values.len(),
            });
        }

        let mut builder = context.query_builder();
        for (name, value) in names.into_iter().zip(values) {
            builder.bind_named(name, value);
        }
        builder.add_table(
            T::NAME,
            schema.table(),
            TableSource::Function(call.to_string()),
        );
        debug!(record = T::NAME, call, "selecting from function");
        Ok(Self::wrap(builder, context))
    }

    /// Starts a SELECT over a derived table built from `inner`.
    ///
    /// The inner statement's parameters are carried over and numbering
    /// continues after its last parameter.
    ///
    /// # Errors
    ///
    /// Fails when `inner` does not render or `T` is not registered.
    pub fn from_subquery(context: &SqlContext, inner: &impl SqlCommand) -> Result<Self> {
        let schema = context.schemas().get(T::NAME)?;
        let command = inner.command()?;
        let mut builder = context
            .with_seed(inner.current_param_index().max(context.seed()))
            .query_builder();
        builder.set_operation(Operation::SubQuery);
        builder.merge_parameters(&command.parameters)?;
        builder.add_table(T::NAME, schema.table(), TableSource::Derived(command.text));
        Ok(Self::wrap(builder, context))
    }

    /// Appends `expr` to the projection.
    ///
    /// Fields keep their column name, objects project each member under its
    /// name, and a whole record projects `alias.*`.
    ///
    /// # Errors
    ///
    /// Fails when the expression cannot be projected.
    pub fn columns(self, projection: impl Into<Expr>) -> Result<Self> {
        let projection = projection.into();
        self.with_resolver(|resolver| resolver.resolve_selection(&projection, None))?;
        Ok(self)
    }

    /// Appends `expr AS alias` to the projection.
    ///
    /// # Errors
    ///
    /// Fails when the expression cannot be projected.
    pub fn column_as(self, projection: impl Into<Expr>, alias: &str) -> Result<Self> {
        let projection = projection.into();
        self.with_resolver(|resolver| resolver.resolve_selection(&projection, Some(alias)))?;
        Ok(self)
    }

    /// Projects `COUNT(field)`.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown or not part of the statement.
    pub fn select_count(self, field: impl Into<FieldRef>) -> Result<Self> {
        self.columns(expr::count(Expr::Field(field.into())))
    }

    /// Projects `COUNT(*)`.
    ///
    /// # Errors
    ///
    /// Does not fail; returns `Result` to chain like the other projections.
    pub fn select_count_all(self) -> Result<Self> {
        self.columns(expr::count_all())
    }

    /// Projects `DISTINCT(field)`.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown or not part of the statement.
    pub fn select_distinct(self, field: impl Into<FieldRef>) -> Result<Self> {
        self.columns(expr::distinct(Expr::Field(field.into())))
    }

    /// Projects `SUM(field)`.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown or not part of the statement.
    pub fn select_sum(self, field: impl Into<FieldRef>) -> Result<Self> {
        self.columns(expr::sum(Expr::Field(field.into())))
    }

    /// Projects `MIN(field)`.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown or not part of the statement.
    pub fn select_min(self, field: impl Into<FieldRef>) -> Result<Self> {
        self.columns(expr::min(Expr::Field(field.into())))
    }

    /// Projects `MAX(field)`.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown or not part of the statement.
    pub fn select_max(self, field: impl Into<FieldRef>) -> Result<Self> {
        self.columns(expr::max(Expr::Field(field.into())))
    }

    /// Projects `AVG(field)`.
    ///
    /// # Errors
    ///
    /// Fails when the field is unknown or not part of the statement.
    pub fn select_average(self, field: impl Into<FieldRef>) -> Result<Self> {
        self.columns(expr::avg(Expr::Field(field.into())))
    }

    /// Projects `projection` and returns the statement typed by `U`, the
    /// shape of each result row.
    ///
    /// Members holding a whole record of a joined table switch the
    /// projection to that table; see [`split_columns`](Self::split_columns).
    ///
    /// # Errors
    ///
    /// Fails when the projection does not resolve.
    pub fn result<U: Record>(self, projection: impl Into<Expr>) -> Result<SqlBuilder<U>> {
        Ok(self.columns(projection)?.view())
    }

    /// Projects a single value.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidArgument`] for record and object
    /// projections, which select more than one column.
    pub fn scalar_result(self, projection: impl Into<Expr>) -> Result<Self> {
        let projection = projection.into();
        if matches!(projection, Expr::Record(_) | Expr::Object(_)) {
            return Err(SqlError::InvalidArgument(format!(
                "a scalar result cannot project a {}",
                projection.kind()
            )));
        }
        self.columns(projection)
    }
}
