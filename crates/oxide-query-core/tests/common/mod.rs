#![allow(dead_code)]

use chrono::NaiveDate;
use oxide_query_core::context::SqlContext;
use oxide_query_core::schema::SchemaRegistry;
use oxide_query_derive::Record;

#[derive(Debug, Clone, Record)]
#[record(table = "Users", rename_all = "PascalCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub age: i32,
    pub active: bool,
    pub birthday: Option<NaiveDate>,
}

impl User {
    pub fn sample(n: i64) -> Self {
        Self {
            id: n,
            email: format!("user{n}@example.com"),
            name: format!("User {n}"),
            age: 20 + i32::try_from(n).unwrap_or(0),
            active: n % 2 == 0,
            birthday: None,
        }
    }
}

#[derive(Debug, Clone, Record)]
#[record(table = "UsersGroup", rename_all = "PascalCase")]
pub struct UserGroup {
    pub id: i64,
    pub user_id: i64,
    pub group_id: i64,
}

#[derive(Debug, Clone, Record)]
#[record(table = "Groups", rename_all = "PascalCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Record)]
#[record(table = "UsersArchive", rename_all = "PascalCase")]
pub struct UserArchive {
    #[column(key)]
    pub archive_id: i64,
    pub email: String,
    #[column(name = "FullName")]
    pub name: String,
}

#[derive(Debug, Clone, Record)]
#[record(table = "AuditLogs", schema = "dbo", rename_all = "PascalCase")]
pub struct AuditLog {
    pub id: i64,
    pub message: String,
}

/// A record without a key field.
#[derive(Debug, Clone, Record)]
#[record(table = "Tags")]
pub struct Tag {
    pub label: String,
}

pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .register::<User>()
        .register::<UserGroup>()
        .register::<Group>()
        .register::<UserArchive>()
        .register::<AuditLog>()
        .register::<Tag>()
}

pub fn sql_server() -> SqlContext {
    SqlContext::sql_server(registry())
}

pub fn mysql() -> SqlContext {
    SqlContext::mysql(registry())
}
