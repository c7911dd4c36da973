//! Expression trees compiled by the resolver.
//!
//! Callers describe predicates, projections and write payloads as [`Expr`]
//! values. Field references are usually produced by the typed constructors
//! that `#[derive(Record)]` generates (`User::email()`), and combined with
//! the comparison methods below:
//!
//! ```rust
//! use oxide_query_core::expr::{Expr, FieldRef};
//!
//! let email = Expr::from(FieldRef::new("User", "email"));
//! let deleted = Expr::from(FieldRef::new("User", "deleted"));
//! let predicate = email.eq("a@b.com").and(!deleted);
//!
//! assert!(matches!(predicate, Expr::Binary { .. }));
//! ```

mod case;
mod function;

pub use case::{CaseExpr, WhenBranch};
pub use function::{
    as_type, avg, coalesce, concat, count, count_all, date_part, distinct, format, max, min, now,
    replace, sum, Aggregate, DatePart, SqlFunction,
};

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Div, Mul, Neg, Not, Sub};

use crate::schema::Record;
use crate::value::{SqlValue, ToSqlValue};

/// Reference to one field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    record: String,
    field: String,
    instance: Option<usize>,
}

impl FieldRef {
    /// References `field` of `record`.
    #[must_use]
    pub fn new(record: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            field: field.into(),
            instance: None,
        }
    }

    /// Pins the reference to the `n`-th (1-based) occurrence of the record
    /// in the statement. Unpinned references use the latest occurrence.
    #[must_use]
    pub fn instance(mut self, n: usize) -> Self {
        self.instance = Some(n);
        self
    }

    /// Returns the record name.
    #[must_use]
    pub fn record(&self) -> &str {
        &self.record
    }

    /// Returns the field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the pinned occurrence, if any.
    #[must_use]
    pub const fn occurrence(&self) -> Option<usize> {
        self.instance
    }
}

/// Reference to a whole record (every column of its table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    record: String,
    instance: Option<usize>,
}

impl RecordRef {
    /// References `record`.
    #[must_use]
    pub fn new(record: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            instance: None,
        }
    }

    /// Pins the reference to the `n`-th occurrence of the record.
    #[must_use]
    pub fn instance(mut self, n: usize) -> Self {
        self.instance = Some(n);
        self
    }

    /// Returns the record name.
    #[must_use]
    pub fn record(&self) -> &str {
        &self.record
    }

    /// Returns the pinned occurrence, if any.
    #[must_use]
    pub const fn occurrence(&self) -> Option<usize> {
        self.instance
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation of a predicate.
    Not,
    /// Arithmetic negation of a value.
    Negate,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`!=`).
    NotEq,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    LtEq,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    GtEq,
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

impl BinaryOp {
    /// Returns the SQL spelling of the operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    /// Returns true for `= != < <= > >=`.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    /// Returns true for `AND` and `OR`.
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns true for `+ - * /`.
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One named member of an object-construction expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Member name: a field name for write payloads, an alias for projections.
    pub name: String,
    /// Member value.
    pub value: Expr,
}

/// Object construction, used for projections and insert/update payloads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectExpr {
    record: Option<String>,
    members: Vec<Member>,
}

impl ObjectExpr {
    /// Creates an anonymous object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an object whose members are fields of `record`.
    #[must_use]
    pub fn for_record(record: impl Into<String>) -> Self {
        Self {
            record: Some(record.into()),
            members: Vec::new(),
        }
    }

    /// Appends a member.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.members.push(Member {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Returns the record the members belong to, if declared.
    #[must_use]
    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }

    /// Returns the members in source order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true when there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A node of an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A field of a record.
    Field(FieldRef),
    /// A whole record.
    Record(RecordRef),
    /// A constant bound as a parameter.
    Literal(SqlValue),
    /// A unary operation.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// A binary operation.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// A function call, dispatched by name.
    Call { function: String, args: Vec<Expr> },
    /// Object construction.
    Object(ObjectExpr),
    /// A collection of values, one insert row per element.
    Array(Vec<Expr>),
    /// A CASE expression.
    Case(Box<CaseExpr>),
}

impl Expr {
    /// References `field` of `record`.
    #[must_use]
    pub fn field(record: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Field(FieldRef::new(record, field))
    }

    /// References every column of `record`.
    #[must_use]
    pub fn record(record: impl Into<String>) -> Self {
        Self::Record(RecordRef::new(record))
    }

    /// Wraps a constant.
    #[must_use]
    pub fn value(value: impl ToSqlValue) -> Self {
        Self::Literal(value.to_sql_value())
    }

    /// The NULL constant.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(SqlValue::Null)
    }

    /// Calls `function` with `args`.
    #[must_use]
    pub fn call(function: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Call {
            function: function.into(),
            args,
        }
    }

    /// Builds a collection of values.
    #[must_use]
    pub fn array<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `self = other`
    #[must_use]
    pub fn eq(self, other: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Eq, self, other.into())
    }

    /// `self != other`
    #[must_use]
    pub fn not_eq(self, other: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::NotEq, self, other.into())
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Lt, self, other.into())
    }

    /// `self <= other`
    #[must_use]
    pub fn lt_eq(self, other: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::LtEq, self, other.into())
    }

    /// `self > other`
    #[must_use]
    pub fn gt(self, other: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Gt, self, other.into())
    }

    /// `self >= other`
    #[must_use]
    pub fn gt_eq(self, other: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::GtEq, self, other.into())
    }

    /// `self IS NULL`
    #[must_use]
    pub fn is_null(self) -> Self {
        self.eq(Self::null())
    }

    /// `self IS NOT NULL`
    #[must_use]
    pub fn is_not_null(self) -> Self {
        self.not_eq(Self::null())
    }

    /// `self LIKE pattern`, with the pattern used as given.
    #[must_use]
    pub fn like(self, pattern: &str) -> Self {
        Self::call("like", vec![self, Self::value(pattern)])
    }

    /// `self LIKE '%text%'`
    #[must_use]
    pub fn contains(self, text: &str) -> Self {
        Self::call("contains", vec![self, Self::value(text)])
    }

    /// `self LIKE 'text%'`
    #[must_use]
    pub fn starts_with(self, text: &str) -> Self {
        Self::call("starts_with", vec![self, Self::value(text)])
    }

    /// `self LIKE '%text'`
    #[must_use]
    pub fn ends_with(self, text: &str) -> Self {
        Self::call("ends_with", vec![self, Self::value(text)])
    }

    /// `(self AND other)`
    #[must_use]
    pub fn and(self, other: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::And, self, other.into())
    }

    /// `(self OR other)`
    #[must_use]
    pub fn or(self, other: impl Into<Self>) -> Self {
        Self::binary(BinaryOp::Or, self, other.into())
    }

    /// Returns a short name of the node kind, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Field(_) => "field",
            Self::Record(_) => "record",
            Self::Literal(_) => "literal",
            Self::Unary { .. } => "unary",
            Self::Binary { .. } => "binary",
            Self::Call { .. } => "call",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Case(_) => "case",
        }
    }
}

impl<T: ToSqlValue> From<T> for Expr {
    fn from(value: T) -> Self {
        Self::Literal(value.to_sql_value())
    }
}

impl From<FieldRef> for Expr {
    fn from(field: FieldRef) -> Self {
        Self::Field(field)
    }
}

impl From<RecordRef> for Expr {
    fn from(record: RecordRef) -> Self {
        Self::Record(record)
    }
}

impl From<ObjectExpr> for Expr {
    fn from(object: ObjectExpr) -> Self {
        Self::Object(object)
    }
}

impl From<CaseExpr> for Expr {
    fn from(case: CaseExpr) -> Self {
        Self::Case(Box::new(case))
    }
}

impl Not for Expr {
    type Output = Self;

    fn not(self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

impl Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self {
        Self::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(self),
        }
    }
}

macro_rules! impl_arithmetic {
    ($($trait:ident :: $method:ident => $op:ident),+ $(,)?) => {
        $(
            impl<T: Into<Expr>> $trait<T> for Expr {
                type Output = Expr;

                fn $method(self, rhs: T) -> Expr {
                    Expr::binary(BinaryOp::$op, self, rhs.into())
                }
            }

            impl<R: Record, T: Into<Expr>> $trait<T> for Field<R> {
                type Output = Expr;

                fn $method(self, rhs: T) -> Expr {
                    Expr::binary(BinaryOp::$op, self.into(), rhs.into())
                }
            }
        )+
    };
}

impl_arithmetic!(
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
);

/// References every column of `R`.
#[must_use]
pub fn record<R: Record>() -> Expr {
    Expr::record(R::NAME)
}

/// A typed field of record `R`.
///
/// Produced by the accessors `#[derive(Record)]` generates. Facade methods
/// that only make sense for the statement's own record (ordering, grouping,
/// `IN` lists) accept a `Field<T>` so the record is checked at compile time.
pub struct Field<R> {
    name: &'static str,
    instance: Option<usize>,
    record: PhantomData<fn() -> R>,
}

impl<R> Field<R> {
    /// Creates a field reference.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            instance: None,
            record: PhantomData,
        }
    }

    /// Pins the field to the `n`-th occurrence of its record.
    #[must_use]
    pub const fn instance(mut self, n: usize) -> Self {
        self.instance = Some(n);
        self
    }

    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<R: Record> Field<R> {
    /// Returns the untyped reference.
    #[must_use]
    pub fn to_ref(&self) -> FieldRef {
        FieldRef {
            record: R::NAME.to_string(),
            field: self.name.to_string(),
            instance: self.instance,
        }
    }

    /// Converts into an expression node.
    #[must_use]
    pub fn expr(self) -> Expr {
        Expr::Field(self.to_ref())
    }

    /// `self = other`
    #[must_use]
    pub fn eq(self, other: impl Into<Expr>) -> Expr {
        self.expr().eq(other)
    }

    /// `self != other`
    #[must_use]
    pub fn not_eq(self, other: impl Into<Expr>) -> Expr {
        self.expr().not_eq(other)
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: impl Into<Expr>) -> Expr {
        self.expr().lt(other)
    }

    /// `self <= other`
    #[must_use]
    pub fn lt_eq(self, other: impl Into<Expr>) -> Expr {
        self.expr().lt_eq(other)
    }

    /// `self > other`
    #[must_use]
    pub fn gt(self, other: impl Into<Expr>) -> Expr {
        self.expr().gt(other)
    }

    /// `self >= other`
    #[must_use]
    pub fn gt_eq(self, other: impl Into<Expr>) -> Expr {
        self.expr().gt_eq(other)
    }

    /// `self IS NULL`
    #[must_use]
    pub fn is_null(self) -> Expr {
        self.expr().is_null()
    }

    /// `self IS NOT NULL`
    #[must_use]
    pub fn is_not_null(self) -> Expr {
        self.expr().is_not_null()
    }

    /// `self LIKE pattern`
    #[must_use]
    pub fn like(self, pattern: &str) -> Expr {
        self.expr().like(pattern)
    }

    /// `self LIKE '%text%'`
    #[must_use]
    pub fn contains(self, text: &str) -> Expr {
        self.expr().contains(text)
    }

    /// `self LIKE 'text%'`
    #[must_use]
    pub fn starts_with(self, text: &str) -> Expr {
        self.expr().starts_with(text)
    }

    /// `self LIKE '%text'`
    #[must_use]
    pub fn ends_with(self, text: &str) -> Expr {
        self.expr().ends_with(text)
    }
}

impl<R> Clone for Field<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Field<R> {}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("instance", &self.instance)
            .finish()
    }
}

impl<R: Record> From<Field<R>> for Expr {
    fn from(field: Field<R>) -> Self {
        field.expr()
    }
}

impl<R: Record> From<Field<R>> for FieldRef {
    fn from(field: Field<R>) -> Self {
        field.to_ref()
    }
}

impl<R: Record> Not for Field<R> {
    type Output = Expr;

    fn not(self) -> Expr {
        !self.expr()
    }
}
