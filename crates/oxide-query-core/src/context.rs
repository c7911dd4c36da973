//! Statement context and builder options.
//!
//! A [`SqlContext`] bundles what every statement needs: the dialect adapter,
//! the schema registry and the naming options. It is cheap to clone and is
//! passed explicitly to the facade constructors. Applications that want a
//! process-wide default can install one with [`set_default_context`].
//!
//! ```rust
//! use oxide_query_core::context::{BuilderOptions, Dialect, SqlContext};
//! use oxide_query_core::schema::SchemaRegistry;
//!
//! let options = BuilderOptions::from_json_str(r#"{ "dialect": "mysql" }"#).unwrap();
//! assert_eq!(options.dialect, Dialect::MySql);
//! assert_eq!(options.parameter_prefix, "Param");
//!
//! let context = SqlContext::new(options, SchemaRegistry::new());
//! assert_eq!(context.adapter().name(), "mysql");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{MySqlAdapter, SqlAdapter, SqlServerAdapter};
use crate::builder::QueryBuilder;
use crate::error::{Result, SqlError};
use crate::schema::SchemaRegistry;

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Microsoft SQL Server.
    #[default]
    #[serde(alias = "mssql", alias = "sql_server")]
    SqlServer,
    /// MySQL and MariaDB.
    #[serde(alias = "mariadb")]
    MySql,
}

impl Dialect {
    /// Creates the adapter for this dialect.
    #[must_use]
    pub fn adapter(self) -> Arc<dyn SqlAdapter> {
        match self {
            Self::SqlServer => Arc::new(SqlServerAdapter::new()),
            Self::MySql => Arc::new(MySqlAdapter::new()),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SqlServer => f.write_str("sqlserver"),
            Self::MySql => f.write_str("mysql"),
        }
    }
}

impl FromStr for Dialect {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlserver" | "sql_server" | "mssql" => Ok(Self::SqlServer),
            "mysql" | "mariadb" => Ok(Self::MySql),
            _ => Err(SqlError::UnknownDialect(s.to_string())),
        }
    }
}

/// Options controlling statement generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Dialect to generate.
    pub dialect: Dialect,
    /// Prefix of generated parameter names.
    pub parameter_prefix: String,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::SqlServer,
            parameter_prefix: String::from("Param"),
        }
    }
}

impl BuilderOptions {
    /// Parses options from JSON. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Config`] on malformed JSON or an unknown dialect.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Everything a statement needs besides its own clauses.
#[derive(Debug, Clone)]
pub struct SqlContext {
    adapter: Arc<dyn SqlAdapter>,
    schemas: Arc<SchemaRegistry>,
    options: BuilderOptions,
    seed: usize,
}

impl SqlContext {
    /// Creates a context for the dialect named in `options`.
    #[must_use]
    pub fn new(options: BuilderOptions, schemas: impl Into<Arc<SchemaRegistry>>) -> Self {
        Self {
            adapter: options.dialect.adapter(),
            schemas: schemas.into(),
            options,
            seed: 0,
        }
    }

    /// Creates a SQL Server context with default options.
    #[must_use]
    pub fn sql_server(schemas: impl Into<Arc<SchemaRegistry>>) -> Self {
        Self::new(BuilderOptions::default(), schemas)
    }

    /// Creates a MySQL context with default options.
    #[must_use]
    pub fn mysql(schemas: impl Into<Arc<SchemaRegistry>>) -> Self {
        Self::new(
            BuilderOptions {
                dialect: Dialect::MySql,
                ..BuilderOptions::default()
            },
            schemas,
        )
    }

    /// Creates a context around a custom adapter.
    #[must_use]
    pub fn with_adapter(
        adapter: Arc<dyn SqlAdapter>,
        schemas: impl Into<Arc<SchemaRegistry>>,
    ) -> Self {
        Self {
            adapter,
            schemas: schemas.into(),
            options: BuilderOptions::default(),
            seed: 0,
        }
    }

    /// Creates a context from JSON options.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Config`] when the options cannot be parsed.
    pub fn from_json_str(json: &str, schemas: impl Into<Arc<SchemaRegistry>>) -> Result<Self> {
        Ok(Self::new(BuilderOptions::from_json_str(json)?, schemas))
    }

    /// Returns a copy whose statements number parameters after `seed`.
    #[must_use]
    pub fn with_seed(&self, seed: usize) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Returns a copy using a different parameter prefix.
    #[must_use]
    pub fn with_parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.parameter_prefix = prefix.into();
        self
    }

    /// Returns the adapter.
    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn SqlAdapter> {
        &self.adapter
    }

    /// Returns the schema registry.
    #[must_use]
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Returns the parameter seed.
    #[must_use]
    pub const fn seed(&self) -> usize {
        self.seed
    }

    /// Creates an empty accumulator configured from this context.
    #[must_use]
    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(
            Arc::clone(&self.adapter),
            self.options.parameter_prefix.clone(),
            self.seed,
        )
    }
}

static DEFAULT_CONTEXT: RwLock<Option<SqlContext>> = RwLock::new(None);

/// Installs the process-wide default context.
pub fn set_default_context(context: SqlContext) {
    debug!(adapter = context.adapter.name(), "installed default SQL context");
    *DEFAULT_CONTEXT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(context);
}

/// Removes the process-wide default context.
pub fn clear_default_context() {
    *DEFAULT_CONTEXT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

/// Returns the process-wide default context.
///
/// # Errors
///
/// Returns [`SqlError::MissingAdapter`] when none was installed.
pub fn default_context() -> Result<SqlContext> {
    DEFAULT_CONTEXT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(SqlError::MissingAdapter)
}
