//! # oxide-query-core
//!
//! Compiles typed query expressions into parameterized SQL for SQL Server
//! and MySQL.
//!
//! This crate provides:
//! - An expression model ([`expr`]) built from typed record fields
//! - A resolver that lowers expressions into clause fragments
//! - A clause accumulator that renders complete statements through a
//!   dialect [`adapter`]
//! - Batches and unions of statements ([`composite`])
//!
//! Values never appear in the SQL text: every constant is bound as a
//! parameter named `Param1`, `Param2`, ... in order of appearance.
//!
//! ## Building a statement
//!
//! Records are usually declared with `#[derive(Record)]` from
//! `oxide-query-derive`; the impl below is what it expands to.
//!
//! ```rust
//! use oxide_query_core::prelude::*;
//! use oxide_query_core::schema::{FieldSchema, RecordSchema};
//!
//! struct User;
//!
//! impl Record for User {
//!     const NAME: &'static str = "User";
//!
//!     fn schema() -> RecordSchema {
//!         RecordSchema::new("User", "Users")
//!             .with_field(FieldSchema::new("id").with_column("Id").key())
//!             .with_field(FieldSchema::new("email").with_column("Email"))
//!     }
//! }
//!
//! impl User {
//!     const fn email() -> Field<Self> {
//!         Field::new("email")
//!     }
//! }
//!
//! let context = SqlContext::sql_server(SchemaRegistry::new().register::<User>());
//! let query = SqlBuilder::<User>::select(&context)
//!     .unwrap()
//!     .where_clause(User::email().eq("a@b.com"))
//!     .unwrap();
//!
//! assert_eq!(
//!     query.command_text().unwrap(),
//!     "SELECT u.* FROM Users u WHERE u.[Email] = @Param1"
//! );
//! assert_eq!(query.current_param_index(), 1);
//! ```
//!
//! ## Dialects
//!
//! The same statement renders differently per adapter: identifiers are
//! bracket-quoted on SQL Server and bare on MySQL, pagination uses
//! `TOP`/`OFFSET ... FETCH` or `LIMIT`, and an insert returns its key with
//! `OUTPUT Inserted.[Id]` or a trailing `SELECT LAST_INSERT_ID()`.

pub mod adapter;
pub mod builder;
pub mod composite;
pub mod context;
pub mod error;
pub mod expr;
pub mod params;
pub mod resolver;
pub mod schema;
pub mod statement;
pub mod value;

pub use builder::Command;
pub use composite::{SqlCollection, SqlUnion};
pub use context::{BuilderOptions, Dialect, SqlContext};
pub use error::{Result, SqlError};
pub use expr::{Expr, Field, FieldRef};
pub use params::Parameters;
pub use schema::{Insertable, Record, SchemaRegistry};
pub use statement::{SqlBuilder, SqlCommand};
pub use value::{SqlValue, ToSqlValue};

/// The types needed to declare records and build statements.
pub mod prelude {
    pub use crate::adapter::JoinType;
    pub use crate::composite::{SqlCollection, SqlUnion};
    pub use crate::context::SqlContext;
    pub use crate::error::{Result, SqlError};
    pub use crate::expr::{record, CaseExpr, DatePart, Expr, Field, ObjectExpr};
    pub use crate::schema::{Insertable, Record, SchemaRegistry};
    pub use crate::statement::{SqlBuilder, SqlCommand};
    pub use crate::value::SqlValue;
}
