//! Expression resolver.
//!
//! Walks [`Expr`] trees and writes the corresponding SQL fragments into a
//! [`QueryBuilder`]. Each position an expression can appear in has its own
//! entry point: predicates, projections, insert and update payloads, join
//! conditions. Values are always bound as parameters, except for the few
//! function arguments that must be literal text.

mod case;
mod clause;
mod payload;
mod predicate;
mod projection;

use tracing::trace;

use crate::builder::QueryBuilder;
use crate::error::{Result, SqlError};
use crate::expr::{Expr, FieldRef, SqlFunction, UnaryOp};
use crate::schema::{RecordSchema, SchemaRegistry};
use crate::value::SqlValue;

/// Compiles expressions into one statement.
#[derive(Debug)]
pub struct Resolver<'a> {
    builder: &'a mut QueryBuilder,
    schemas: &'a SchemaRegistry,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver writing into `builder`.
    pub fn new(builder: &'a mut QueryBuilder, schemas: &'a SchemaRegistry) -> Self {
        Self { builder, schemas }
    }

    fn schema(&self, record: &str) -> Result<&'a RecordSchema> {
        self.schemas.get(record)
    }

    fn column(&self, field: &FieldRef) -> Result<&'a str> {
        Ok(self.schema(field.record())?.require_field(field.field())?.column())
    }

    /// Renders a field as `alias.column`.
    ///
    /// # Errors
    ///
    /// Fails when the record or field is unknown, or the record is not part
    /// of the statement.
    pub fn field(&self, field: &FieldRef) -> Result<String> {
        let column = self.column(field)?;
        let alias = self
            .builder
            .table_alias(field.record(), field.occurrence())?;
        Ok(self.builder.adapter().qualified_field(alias, column))
    }

    /// Resolves an expression in value position.
    ///
    /// Literals become parameters, fields become qualified columns, and
    /// arithmetic, calls and CASE expressions are rendered recursively.
    ///
    /// # Errors
    ///
    /// Fails on predicates, records, objects and arrays, which have no value
    /// form.
    pub fn resolve_value(&mut self, expr: &Expr) -> Result<String> {
        trace!(kind = expr.kind(), "resolving value");
        match expr {
            Expr::Field(field) => self.field(field),
            Expr::Literal(value) => Ok(self.builder.add_parameter(value.clone())),
            Expr::Unary {
                op: UnaryOp::Negate,
                operand,
            } => Ok(format!("-{}", self.operand(operand)?)),
            Expr::Binary { op, left, right } if op.is_arithmetic() => {
                let left = self.operand(left)?;
                let right = self.operand(right)?;
                Ok(format!("{left} {op} {right}"))
            }
            Expr::Call { function, args } => self.resolve_call(function, args),
            Expr::Case(case) => self.resolve_case(case),
            Expr::Unary { op: UnaryOp::Not, .. } => Err(SqlError::unsupported(
                "value",
                "NOT can only be used in a predicate",
            )),
            Expr::Binary { op, .. } => Err(SqlError::unsupported(
                "value",
                format!("`{op}` can only be used in a predicate"),
            )),
            Expr::Record(_) | Expr::Object(_) | Expr::Array(_) => Err(SqlError::unsupported(
                "value",
                format!("{} has no value form", expr.kind()),
            )),
        }
    }

    /// Resolves an operand of an arithmetic expression, parenthesizing
    /// nested arithmetic.
    fn operand(&mut self, expr: &Expr) -> Result<String> {
        let rendered = self.resolve_value(expr)?;
        match expr {
            Expr::Binary { op, .. } if op.is_arithmetic() => Ok(format!("({rendered})")),
            _ => Ok(rendered),
        }
    }

    /// Resolves a function argument that is inlined when it is a constant.
    fn inline_operand(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Literal(value) => Ok(self.builder.adapter().literal(value)),
            other => self.resolve_value(other),
        }
    }

    /// Resolves a function call in value position.
    fn resolve_call(&mut self, name: &str, args: &[Expr]) -> Result<String> {
        let function = SqlFunction::parse(name)?;
        match function {
            SqlFunction::As => {
                let [value] = arguments::<1>(name, args)?;
                self.resolve_value(value)
            }
            SqlFunction::Format => {
                let [value, pattern] = arguments::<2>(name, args)?;
                let pattern = text_argument(name, pattern)?;
                let value = self.resolve_value(value)?;
                Ok(self.builder.adapter().format_function(&value, pattern))
            }
            SqlFunction::Coalesce => {
                let [value, fallback] = arguments::<2>(name, args)?;
                let value = self.resolve_value(value)?;
                let fallback = self.inline_operand(fallback)?;
                Ok(self.builder.adapter().is_null_function(&value, &fallback))
            }
            SqlFunction::Concat => {
                if args.is_empty() {
                    return Err(SqlError::unsupported(
                        "value",
                        "concat needs at least one argument",
                    ));
                }
                let parts = args
                    .iter()
                    .map(|arg| self.inline_operand(arg))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.builder.adapter().concat_function(&parts))
            }
            SqlFunction::DatePart => {
                let [part, value] = arguments::<2>(name, args)?;
                let part = text_argument(name, part)?.parse()?;
                let value = self.resolve_value(value)?;
                Ok(self.builder.adapter().date_part_function(part, &value))
            }
            SqlFunction::Now => Ok(self.builder.adapter().current_timestamp()),
            SqlFunction::Replace => {
                let [value, find, with] = arguments::<3>(name, args)?;
                let value = self.resolve_value(value)?;
                let find = self.resolve_value(find)?;
                let with = self.resolve_value(with)?;
                Ok(format!("REPLACE({value}, {find}, {with})"))
            }
            SqlFunction::Aggregate(aggregate) => match args {
                [] => Ok(format!("{}(*)", aggregate.as_sql())),
                [value] => {
                    let value = self.resolve_value(value)?;
                    Ok(format!("{}({value})", aggregate.as_sql()))
                }
                _ => Err(SqlError::unsupported(
                    "value",
                    format!("{name} takes at most one argument"),
                )),
            },
            SqlFunction::Like
            | SqlFunction::Contains
            | SqlFunction::StartsWith
            | SqlFunction::EndsWith => Err(SqlError::unsupported(
                "value",
                format!("{name} can only be used in a predicate"),
            )),
        }
    }
}

/// Checks the arity of a call and returns its arguments as an array.
fn arguments<'e, const N: usize>(name: &str, args: &'e [Expr]) -> Result<&'e [Expr; N]> {
    args.try_into().map_err(|_| {
        SqlError::unsupported(
            "call",
            format!("{name} expects {N} argument(s), got {}", args.len()),
        )
    })
}

/// Extracts a text constant argument.
fn text_argument<'e>(name: &str, arg: &'e Expr) -> Result<&'e str> {
    match arg {
        Expr::Literal(SqlValue::Text(text)) => Ok(text),
        other => Err(SqlError::unsupported(
            "call",
            format!("{name} expects a text constant, got {}", other.kind()),
        )),
    }
}

/// Returns the column of the first field found in `args`, used as the
/// default alias of projected function calls.
fn first_field(args: &[Expr]) -> Option<&FieldRef> {
    args.iter().find_map(|arg| match arg {
        Expr::Field(field) => Some(field),
        Expr::Call { args, .. } => first_field(args),
        _ => None,
    })
}
