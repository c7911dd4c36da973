//! Write payloads: insert rows, insert-from projections, update assignments.

use super::Resolver;
use crate::error::{Result, SqlError};
use crate::expr::{Expr, FieldRef, ObjectExpr};
use crate::schema::RecordSchema;

impl<'a> Resolver<'a> {
    /// Resolves an insert payload for `record`.
    ///
    /// An object produces one row; an array produces one row per element.
    ///
    /// # Errors
    ///
    /// Fails when a member does not name a field of `record`, or when the
    /// payload is neither an object nor an array of objects.
    pub fn resolve_insert(&mut self, payload: &Expr, record: &str) -> Result<()> {
        match payload {
            Expr::Object(object) => {
                let schema = self.payload_schema(object, record)?;
                self.builder.next_insert_record();
                for member in object.members() {
                    let column = schema.require_field(&member.name)?.column();
                    let column = self.builder.adapter().field(column);
                    let value = self.resolve_value(&member.value)?;
                    self.builder.add_insert_value(column, value);
                }
                Ok(())
            }
            Expr::Array(items) => {
                if items.is_empty() {
                    return Err(SqlError::InvalidArgument(String::from(
                        "no records to insert",
                    )));
                }
                items
                    .iter()
                    .try_for_each(|item| self.resolve_insert(item, record))
            }
            other => Err(SqlError::unsupported(
                "insert payload",
                format!("expected an object or array, got {}", other.kind()),
            )),
        }
    }

    /// Resolves the projection of an INSERT ... SELECT into `record`.
    ///
    /// Each member names a target field; its value is selected from the
    /// statement's source tables and aliased with the target column.
    ///
    /// # Errors
    ///
    /// Fails when the payload is not an object or a member does not name a
    /// field of `record`.
    pub fn resolve_insert_from(&mut self, payload: &Expr, record: &str) -> Result<()> {
        let Expr::Object(object) = payload else {
            return Err(SqlError::unsupported(
                "insert payload",
                format!("expected an object, got {}", payload.kind()),
            ));
        };
        let schema = self.payload_schema(object, record)?;
        for member in object.members() {
            let column = schema.require_field(&member.name)?.column();
            let value = self.resolve_value(&member.value)?;
            let adapter = self.builder.adapter();
            let quoted = adapter.field(column);
            let item = format!("{value} {}", adapter.alias(column));
            self.builder.add_insert_column(quoted);
            self.builder.add_selection(item);
        }
        Ok(())
    }

    /// Resolves the assignments of an UPDATE of `record`.
    ///
    /// # Errors
    ///
    /// Fails when the payload is not an object or a member does not name a
    /// field of `record`.
    pub fn resolve_update(&mut self, payload: &Expr, record: &str) -> Result<()> {
        let Expr::Object(object) = payload else {
            return Err(SqlError::unsupported(
                "update payload",
                format!("expected an object, got {}", payload.kind()),
            ));
        };
        self.payload_schema(object, record)?;
        for member in object.members() {
            let target = self.field(&FieldRef::new(record, member.name.as_str()))?;
            let value = self.resolve_value(&member.value)?;
            self.builder.add_update(format!("{target} = {value}"));
        }
        Ok(())
    }

    fn payload_schema(&self, object: &ObjectExpr, record: &str) -> Result<&'a RecordSchema> {
        match object.record() {
            Some(declared) if declared != record => Err(SqlError::unsupported(
                "payload",
                format!("object of `{declared}` written to `{record}`"),
            )),
            _ => self.schema(record),
        }
    }
}
