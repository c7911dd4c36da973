//! INSERT, UPDATE and DELETE.

use super::SqlBuilder;
use crate::adapter::Operation;
use crate::context::SqlContext;
use crate::error::{Result, SqlError};
use crate::expr::Expr;
use crate::schema::{Insertable, Record};

impl<T: Record> SqlBuilder<T> {
    /// Starts `INSERT INTO <T> (...) VALUES (...)`.
    ///
    /// `payload` is an object whose members name fields of `T`, or an array
    /// of such objects for a multi-row insert.
    ///
    /// # Errors
    ///
    /// Fails when a member does not name a field of `T` or the payload is
    /// not an object or array.
    pub fn insert(context: &SqlContext, payload: impl Into<Expr>) -> Result<Self> {
        let payload = payload.into();
        let statement = Self::start(context, Operation::Insert)?;
        statement.with_resolver(|resolver| resolver.resolve_insert(&payload, T::NAME))?;
        Ok(statement)
    }

    /// Inserts every non-key field of `record`.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn insert_record(context: &SqlContext, record: &T) -> Result<Self>
    where
        T: Insertable,
    {
        Self::insert(context, record.to_object())
    }

    /// Inserts several records in one multi-row statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidArgument`] when `records` is empty.
    pub fn insert_many<'r>(
        context: &SqlContext,
        records: impl IntoIterator<Item = &'r T>,
    ) -> Result<Self>
    where
        T: Insertable + 'r,
    {
        Self::insert(context, Expr::array(records.into_iter().map(Insertable::to_object)))
    }

    /// Starts `INSERT INTO <T> (...) SELECT ... FROM <S>`.
    ///
    /// Each member of `payload` names a field of `T`; its value is resolved
    /// against the returned statement, whose primary table is `S`, so the
    /// usual filters and joins apply to the SELECT half.
    ///
    /// # Errors
    ///
    /// Fails when either record is not registered or the payload does not
    /// resolve.
    pub fn insert_from<S: Record>(
        context: &SqlContext,
        payload: impl Into<Expr>,
    ) -> Result<SqlBuilder<S>> {
        let payload = payload.into();
        let target = context.schemas().get(T::NAME)?.qualified_table();
        let statement = SqlBuilder::<S>::start(context, Operation::InsertFrom)?;
        statement.with_resolver(|resolver| resolver.resolve_insert_from(&payload, T::NAME))?;
        statement
            .state()
            .set_insert_target(context.adapter().table(&target));
        Ok(statement)
    }

    /// Starts `UPDATE <T> SET ...`.
    ///
    /// # Errors
    ///
    /// Fails when the payload is not an object or a member does not name a
    /// field of `T`.
    pub fn update(context: &SqlContext, payload: impl Into<Expr>) -> Result<Self> {
        let payload = payload.into();
        let statement = Self::start(context, Operation::Update)?;
        statement.with_resolver(|resolver| resolver.resolve_update(&payload, T::NAME))?;
        Ok(statement)
    }

    /// Starts `DELETE FROM <T>`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnknownRecord`] when `T` is not registered.
    pub fn delete(context: &SqlContext) -> Result<Self> {
        Self::start(context, Operation::Delete)
    }

    /// Makes the insert return the generated key of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::OutputIdentityNotInsert`] on any other statement
    /// and [`SqlError::MissingKey`] when `T` has no key field.
    pub fn output_identity(self) -> Result<Self> {
        let operation = self.operation();
        if operation != Operation::Insert {
            return Err(SqlError::OutputIdentityNotInsert { operation });
        }
        let column = self
            .context
            .schemas()
            .get(T::NAME)?
            .key_field()
            .map(|field| field.column().to_string())
            .ok_or_else(|| SqlError::MissingKey(T::NAME.to_string()))?;
        let quoted = self.context.adapter().field(&column);
        self.state().set_output_identity(quoted);
        Ok(self)
    }
}
