//! Record schemas and the registry the resolver reads them from.
//!
//! A [`RecordSchema`] describes how one record type maps to a table: the
//! physical table name, an optional namespace, and its ordered fields with
//! their column overrides and key marker. Schemas are registered once in a
//! [`SchemaRegistry`] and shared read-only by every statement.
//!
//! The `#[derive(Record)]` macro from `oxide-query-derive` implements
//! [`Record`] and [`Insertable`], but schemas can also be declared by hand:
//!
//! ```rust
//! use oxide_query_core::schema::{FieldSchema, RecordSchema, SchemaRegistry};
//!
//! let registry = SchemaRegistry::new().with_schema(
//!     RecordSchema::new("User", "Users")
//!         .with_field(FieldSchema::new("id").with_column("Id").key())
//!         .with_field(FieldSchema::new("email").with_column("Email")),
//! );
//!
//! let user = registry.get("User").unwrap();
//! assert_eq!(user.column_name("email"), Some("Email"));
//! assert_eq!(user.key_field().unwrap().name(), "id");
//! ```

mod alias;

pub use alias::short_alias;
pub(crate) use alias::unique_alias;

use std::collections::HashMap;

use crate::error::{Result, SqlError};
use crate::expr::ObjectExpr;

/// A record type that maps onto a table.
pub trait Record {
    /// The record identifier used by field references.
    const NAME: &'static str;

    /// Returns the schema describing this record.
    fn schema() -> RecordSchema;
}

/// A record whose values can be turned into an insert payload.
pub trait Insertable: Record {
    /// Returns every non-key field as a member of an object expression.
    fn to_object(&self) -> ObjectExpr;
}

/// Metadata of one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    name: String,
    column: Option<String>,
    rust_type: Option<String>,
    key: bool,
}

impl FieldSchema {
    /// Declares a field named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: None,
            rust_type: None,
            key: false,
        }
    }

    /// Overrides the column name.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Records the semantic type of the field.
    #[must_use]
    pub fn with_type(mut self, rust_type: impl Into<String>) -> Self {
        self.rust_type = Some(rust_type.into());
        self
    }

    /// Marks the field as the record key.
    #[must_use]
    pub const fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column name, falling back to the field name.
    #[must_use]
    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    /// Returns the declared type, if any.
    #[must_use]
    pub fn rust_type(&self) -> Option<&str> {
        self.rust_type.as_deref()
    }

    /// Returns true when the field is marked as the key.
    #[must_use]
    pub const fn is_key(&self) -> bool {
        self.key
    }

    /// Returns true when the declared type is known and is not boolean.
    pub(crate) fn is_known_non_bool(&self) -> bool {
        self.rust_type
            .as_deref()
            .is_some_and(|ty| ty != "bool" && ty != "Option<bool>")
    }
}

/// Metadata of one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    name: String,
    table: String,
    namespace: Option<String>,
    fields: Vec<FieldSchema>,
}

impl RecordSchema {
    /// Declares record `name` stored in `table`.
    #[must_use]
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            namespace: None,
            fields: Vec::new(),
        }
    }

    /// Sets the schema/namespace prefix of the table.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the bare table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the namespace prefix, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the table name prefixed by its namespace.
    #[must_use]
    pub fn qualified_table(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.table),
            None => self.table.clone(),
        }
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the column a field maps to.
    #[must_use]
    pub fn column_name(&self, field: &str) -> Option<&str> {
        self.field(field).map(FieldSchema::column)
    }

    /// Looks up a field, failing with [`SqlError::UnknownField`].
    pub fn require_field(&self, name: &str) -> Result<&FieldSchema> {
        self.field(name).ok_or_else(|| SqlError::UnknownField {
            record: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Returns the key field: the one marked as key, else one named `id`.
    #[must_use]
    pub fn key_field(&self) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.key)
            .or_else(|| self.fields.iter().find(|f| f.name.eq_ignore_ascii_case("id")))
    }
}

/// Schemas of every record known to a statement context.
///
/// Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    records: HashMap<String, RecordSchema>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the schema of `R`.
    #[must_use]
    pub fn register<R: Record>(self) -> Self {
        self.with_schema(R::schema())
    }

    /// Registers a hand-written schema, replacing one with the same name.
    #[must_use]
    pub fn with_schema(mut self, schema: RecordSchema) -> Self {
        self.insert(schema);
        self
    }

    /// Registers a schema in place.
    pub fn insert(&mut self, schema: RecordSchema) {
        self.records.insert(schema.name.clone(), schema);
    }

    /// Looks up a record schema.
    pub fn get(&self, record: &str) -> Result<&RecordSchema> {
        self.records
            .get(record)
            .ok_or_else(|| SqlError::UnknownRecord(record.to_string()))
    }

    /// Returns true when `record` is registered.
    #[must_use]
    pub fn contains(&self, record: &str) -> bool {
        self.records.contains_key(record)
    }

    /// Returns the number of registered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
