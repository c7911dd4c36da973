//! Error types for statement construction and rendering.

use thiserror::Error;

use crate::adapter::Operation;

/// Errors raised while building or rendering a statement.
#[derive(Debug, Error)]
pub enum SqlError {
    /// No adapter was configured before the first statement was built.
    #[error("no SQL adapter configured; pass a context explicitly or set a default one")]
    MissingAdapter,

    /// The options document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The dialect name is not one of the supported adapters.
    #[error("unknown dialect `{0}`")]
    UnknownDialect(String),

    /// The record was never registered in the schema registry.
    #[error("record `{0}` is not registered")]
    UnknownRecord(String),

    /// The record schema has no such field.
    #[error("record `{record}` has no field `{field}`")]
    UnknownField { record: String, field: String },

    /// A field refers to a record the statement never selected or joined.
    #[error("record `{record}` is not part of this statement")]
    TableNotInStatement { record: String },

    /// The expression shape cannot be compiled in this position.
    #[error("unsupported expression in {context}: {detail}")]
    UnsupportedExpression {
        context: &'static str,
        detail: String,
    },

    /// A call node names a function the resolver does not model.
    #[error("unknown SQL function `{0}`")]
    UnknownFunction(String),

    /// A page index was requested without any ordering.
    #[error("pagination requires the ORDER BY statement to be specified")]
    PaginationWithoutOrder,

    /// A page index was requested without a page size.
    #[error("skipping pages requires a page size, call take() first")]
    PageIndexWithoutSize,

    /// Output identity was requested on a statement that is not an insert.
    #[error("cannot output identity for a {operation} statement")]
    OutputIdentityNotInsert { operation: Operation },

    /// The record has neither a marked key nor an `id` field.
    #[error("record `{0}` has no key field")]
    MissingKey(String),

    /// The statement has no content to render for its operation.
    #[error("{operation} statement is empty: {detail}")]
    EmptyStatement {
        operation: Operation,
        detail: &'static str,
    },

    /// An argument passed to a facade operation is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A table-valued function source got the wrong number of arguments.
    #[error("function source expects {expected} parameter(s) but {found} were given")]
    FunctionArity { expected: usize, found: usize },

    /// Two members of a composite produced the same parameter name.
    #[error("parameter `{0}` is produced by more than one statement")]
    ParameterCollision(String),

    /// A placeholder pattern could not be compiled.
    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl SqlError {
    pub(crate) fn unsupported(context: &'static str, detail: impl Into<String>) -> Self {
        Self::UnsupportedExpression {
            context,
            detail: detail.into(),
        }
    }
}

/// Result type alias for statement operations.
pub type Result<T> = std::result::Result<T, SqlError>;
