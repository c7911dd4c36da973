//! Projection position: the SELECT list.

use tracing::trace;

use super::{first_field, Resolver};
use crate::builder::SplitColumn;
use crate::error::{Result, SqlError};
use crate::expr::{Expr, RecordRef, SqlFunction, UnaryOp};

impl Resolver<'_> {
    /// Appends the projection of `expr`, aliased as `alias` when given.
    ///
    /// Records project every column (`u.*`), objects project each member
    /// under its name, and function calls default to the column name of
    /// their first field argument.
    ///
    /// # Errors
    ///
    /// Fails on predicates and arrays, which cannot be projected.
    pub fn resolve_selection(&mut self, expr: &Expr, alias: Option<&str>) -> Result<()> {
        trace!(kind = expr.kind(), "resolving selection");
        match expr {
            Expr::Record(record) => {
                let all = self.all_fields(record)?;
                self.builder.add_selection(all);
            }
            Expr::Object(object) => {
                for member in object.members() {
                    self.resolve_member(&member.name, &member.value)?;
                }
            }
            Expr::Field(field) => {
                let column = self.column(field)?;
                let rendered = self.field(field)?;
                let alias = alias.filter(|alias| !alias.eq_ignore_ascii_case(column));
                let item = self.aliased(rendered, alias);
                self.builder.add_selection(item);
            }
            Expr::Call { function, args } => {
                let parsed = SqlFunction::parse(function)?;
                if parsed == SqlFunction::As {
                    if let [inner] = args.as_slice() {
                        return self.resolve_selection(inner, alias);
                    }
                }
                let rendered = self.resolve_call(function, args)?;
                let inherited = if parsed.inherits_alias() {
                    first_field(args).map(|field| self.column(field)).transpose()?
                } else {
                    None
                };
                let item = self.aliased(rendered, alias.or(inherited));
                self.builder.add_selection(item);
            }
            Expr::Literal(_) | Expr::Case(_) | Expr::Unary { op: UnaryOp::Negate, .. } => {
                let rendered = self.resolve_value(expr)?;
                let item = self.aliased(rendered, alias);
                self.builder.add_selection(item);
            }
            Expr::Binary { op, .. } if op.is_arithmetic() => {
                let rendered = self.resolve_value(expr)?;
                let item = self.aliased(rendered, alias);
                self.builder.add_selection(item);
            }
            other => {
                return Err(SqlError::unsupported(
                    "projection",
                    format!("{} cannot be selected", other.kind()),
                ))
            }
        }
        Ok(())
    }

    /// Projects one object member. A member holding a whole record of
    /// another table switches to that table's columns and records where the
    /// switch happens.
    fn resolve_member(&mut self, name: &str, value: &Expr) -> Result<()> {
        let Expr::Record(record) = value else {
            return self.resolve_selection(value, Some(name));
        };
        let all = self.all_fields(record)?;
        self.builder.add_selection(all);

        let primary = self.builder.tables().first().map(|t| t.record().to_string());
        if primary.as_deref() != Some(record.record()) {
            let schema = self.schema(record.record())?;
            let column = schema
                .key_field()
                .or_else(|| schema.fields().first())
                .map(|field| field.column().to_string())
                .ok_or_else(|| SqlError::MissingKey(record.record().to_string()))?;
            self.builder.add_split_column(SplitColumn {
                member: name.to_string(),
                column,
            });
        }
        Ok(())
    }

    fn all_fields(&self, record: &RecordRef) -> Result<String> {
        let alias = self
            .builder
            .table_alias(record.record(), record.occurrence())?;
        Ok(self.builder.adapter().all_fields(alias))
    }

    fn aliased(&self, rendered: String, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => format!("{rendered} {}", self.builder.adapter().alias(alias)),
            None => rendered,
        }
    }
}
