//! CASE expressions inside statements.

mod common;

use common::{mysql, sql_server, User};
use oxide_query_core::expr::{CaseExpr, ObjectExpr};
use oxide_query_core::value::SqlValue;
use oxide_query_core::{SqlBuilder, SqlCommand, SqlError};

/// Returns the `Case{n}_` prefix of the first CASE placeholder in `sql`.
fn case_prefix(sql: &str) -> String {
    let start = sql.find("@Case").map(|i| i + 1).unwrap();
    let end = start + sql[start..].find('_').unwrap() + 1;
    sql[start..end].to_string()
}

fn age_bracket() -> CaseExpr {
    CaseExpr::new()
        .when(User::age().lt(18), "minor")
        .when(User::age().lt(30), "young")
        .when(User::age().lt(65), "adult")
        .otherwise("senior")
}

#[test]
fn test_case_projection_with_filter() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .column_as(age_bracket(), "Bracket")
        .unwrap()
        .where_clause(User::active())
        .unwrap();
    let command = query.command().unwrap();
    let prefix = case_prefix(&command.text);

    assert!(command.text.starts_with("SELECT CASE WHEN u.[Age] < @Case"));
    assert!(command
        .text
        .ends_with("END AS [Bracket] FROM Users u WHERE u.[Active] = @Param1"));
    assert_eq!(
        command.text,
        format!(
            "SELECT CASE WHEN u.[Age] < @{prefix}1 THEN @{prefix}2 \
             WHEN u.[Age] < @{prefix}3 THEN @{prefix}4 \
             WHEN u.[Age] < @{prefix}5 THEN @{prefix}6 ELSE @{prefix}7 END AS [Bracket] \
             FROM Users u WHERE u.[Active] = @Param1"
        )
    );

    assert_eq!(command.parameters.len(), 8);
    let keys: Vec<&str> = command.parameters.keys().collect();
    assert_eq!(keys[0], "Param1");
    assert!(keys[1..].iter().all(|key| key.starts_with(&prefix)));
    assert_eq!(
        command.parameters.get(&format!("{prefix}7")),
        Some(&SqlValue::Text(String::from("senior")))
    );
    assert_eq!(query.current_param_index(), 1);
}

#[test]
fn test_each_case_gets_its_own_prefix() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .columns(
            ObjectExpr::new()
                .member("Bracket", age_bracket())
                .member("Status", CaseExpr::on(User::active()).when(true, "on").otherwise("off")),
        )
        .unwrap();
    let command = query.command().unwrap();
    let first = case_prefix(&command.text);
    let rest = &command.text[command.text.find(" AS [Bracket]").unwrap()..];
    let second = case_prefix(rest);
    assert_ne!(first, second);
    assert!(rest.starts_with(&format!(
        " AS [Bracket], CASE u.[Active] WHEN @{second}1 THEN @{second}2 ELSE @{second}3 END AS [Status]"
    )));
    assert_eq!(command.parameters.len(), 10);
}

#[test]
fn test_case_in_update_payload() {
    let ctx = mysql();
    let update = SqlBuilder::<User>::update(
        &ctx,
        ObjectExpr::for_record("User").member(
            "name",
            CaseExpr::new()
                .when(User::name().is_null(), "anonymous")
                .otherwise(User::name()),
        ),
    )
    .unwrap()
    .where_clause(User::id().gt(100))
    .unwrap();
    let command = update.command().unwrap();
    let prefix = case_prefix(&command.text);
    assert_eq!(
        command.text,
        format!(
            "UPDATE Users u SET u.Name = CASE WHEN u.Name IS NULL THEN @{prefix}1 \
             ELSE u.Name END WHERE u.Id = @Param1"
        )
    );
}

#[test]
fn test_case_without_branches_fails() {
    let ctx = sql_server();
    let result = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .column_as(CaseExpr::new().otherwise(1), "One");
    assert!(matches!(result, Err(SqlError::EmptyStatement { .. })));
}
