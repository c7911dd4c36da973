//! Function calls understood by the resolver.

use std::fmt;
use std::str::FromStr;

use super::Expr;
use crate::error::{Result, SqlError};

/// Aggregate functions usable in projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Distinct,
    Sum,
    Min,
    Max,
    Avg,
}

impl Aggregate {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Distinct => "DISTINCT",
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Avg => "AVG",
        }
    }
}

/// A function the resolver knows how to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlFunction {
    /// Projection alias; renders its argument unchanged.
    As,
    Format,
    Coalesce,
    Concat,
    DatePart,
    Now,
    Replace,
    Like,
    Contains,
    StartsWith,
    EndsWith,
    Aggregate(Aggregate),
}

impl SqlFunction {
    /// Looks a function up by name, case-insensitively.
    pub fn parse(name: &str) -> Result<Self> {
        let function = match name.to_ascii_lowercase().as_str() {
            "as" | "as_type" => Self::As,
            "format" => Self::Format,
            "coalesce" | "is_null" => Self::Coalesce,
            "concat" => Self::Concat,
            "date_part" => Self::DatePart,
            "now" => Self::Now,
            "replace" => Self::Replace,
            "like" => Self::Like,
            "contains" => Self::Contains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            "count" => Self::Aggregate(Aggregate::Count),
            "distinct" => Self::Aggregate(Aggregate::Distinct),
            "sum" => Self::Aggregate(Aggregate::Sum),
            "min" => Self::Aggregate(Aggregate::Min),
            "max" => Self::Aggregate(Aggregate::Max),
            "avg" | "average" => Self::Aggregate(Aggregate::Avg),
            _ => return Err(SqlError::UnknownFunction(name.to_string())),
        };
        Ok(function)
    }

    /// Returns true for the LIKE family.
    #[must_use]
    pub const fn is_pattern_match(self) -> bool {
        matches!(
            self,
            Self::Like | Self::Contains | Self::StartsWith | Self::EndsWith
        )
    }

    /// Returns true when the default projection alias is taken from the
    /// first field argument.
    #[must_use]
    pub const fn inherits_alias(self) -> bool {
        matches!(
            self,
            Self::Format | Self::Coalesce | Self::Concat | Self::DatePart | Self::Replace
        )
    }
}

/// Date/time components accepted by [`date_part`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Day,
    DayOfYear,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Week,
    Weekday,
}

impl DatePart {
    /// Returns the upper-case component name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::DayOfYear => "DAYOFYEAR",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
            Self::Millisecond => "MILLISECOND",
            Self::Microsecond => "MICROSECOND",
            Self::Week => "WEEK",
            Self::Weekday => "WEEKDAY",
        }
    }
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatePart {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self> {
        let part = match s.to_ascii_uppercase().as_str() {
            "YEAR" => Self::Year,
            "MONTH" => Self::Month,
            "DAY" => Self::Day,
            "DAYOFYEAR" => Self::DayOfYear,
            "HOUR" => Self::Hour,
            "MINUTE" => Self::Minute,
            "SECOND" => Self::Second,
            "MILLISECOND" => Self::Millisecond,
            "MICROSECOND" => Self::Microsecond,
            "WEEK" => Self::Week,
            "WEEKDAY" => Self::Weekday,
            _ => {
                return Err(SqlError::unsupported(
                    "date part",
                    format!("unknown component `{s}`"),
                ))
            }
        };
        Ok(part)
    }
}

/// The current timestamp of the database server.
#[must_use]
pub fn now() -> Expr {
    Expr::call("now", Vec::new())
}

/// Aliases a projected value without changing it.
#[must_use]
pub fn as_type(value: impl Into<Expr>) -> Expr {
    Expr::call("as", vec![value.into()])
}

/// Formats a value with a dialect format string.
#[must_use]
pub fn format(value: impl Into<Expr>, pattern: &str) -> Expr {
    Expr::call("format", vec![value.into(), Expr::value(pattern)])
}

/// Replaces NULL with `fallback`. Literal fallbacks are inlined.
#[must_use]
pub fn coalesce(value: impl Into<Expr>, fallback: impl Into<Expr>) -> Expr {
    Expr::call("coalesce", vec![value.into(), fallback.into()])
}

/// Concatenates values. Literal parts are inlined.
#[must_use]
pub fn concat<I, E>(parts: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::call("concat", parts.into_iter().map(Into::into).collect())
}

/// Extracts a component of a date value.
#[must_use]
pub fn date_part(part: DatePart, value: impl Into<Expr>) -> Expr {
    Expr::call("date_part", vec![Expr::value(part.as_str()), value.into()])
}

/// Replaces every occurrence of `find` in `value` with `with`.
#[must_use]
pub fn replace(value: impl Into<Expr>, find: &str, with: &str) -> Expr {
    Expr::call(
        "replace",
        vec![value.into(), Expr::value(find), Expr::value(with)],
    )
}

/// `COUNT(value)`
#[must_use]
pub fn count(value: impl Into<Expr>) -> Expr {
    Expr::call("count", vec![value.into()])
}

/// `COUNT(*)`
#[must_use]
pub fn count_all() -> Expr {
    Expr::call("count", Vec::new())
}

/// `DISTINCT(value)`
#[must_use]
pub fn distinct(value: impl Into<Expr>) -> Expr {
    Expr::call("distinct", vec![value.into()])
}

/// `SUM(value)`
#[must_use]
pub fn sum(value: impl Into<Expr>) -> Expr {
    Expr::call("sum", vec![value.into()])
}

/// `MIN(value)`
#[must_use]
pub fn min(value: impl Into<Expr>) -> Expr {
    Expr::call("min", vec![value.into()])
}

/// `MAX(value)`
#[must_use]
pub fn max(value: impl Into<Expr>) -> Expr {
    Expr::call("max", vec![value.into()])
}

/// `AVG(value)`
#[must_use]
pub fn avg(value: impl Into<Expr>) -> Expr {
    Expr::call("avg", vec![value.into()])
}
