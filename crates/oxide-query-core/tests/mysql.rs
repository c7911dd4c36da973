//! The MySQL adapter end to end.

mod common;

use common::{mysql, registry, AuditLog, User, UserGroup};
use oxide_query_core::expr::{self, DatePart, ObjectExpr};
use oxide_query_core::{SqlBuilder, SqlCommand, SqlContext};

#[test]
fn test_select_uses_bare_identifiers() {
    let ctx = mysql();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .inner_join::<UserGroup>(User::id().eq(UserGroup::user_id()))
        .unwrap()
        .where_clause(UserGroup::group_id().eq(2))
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT u.*, ug.* FROM Users u INNER JOIN UsersGroup ug ON u.Id = ug.UserId \
         WHERE ug.GroupId = @Param1"
    );
}

#[test]
fn test_pagination_uses_limit() {
    let ctx = mysql();
    let first = SqlBuilder::<User>::select(&ctx).unwrap().take(5);
    assert_eq!(
        first.command_text().unwrap(),
        "SELECT u.* FROM Users u LIMIT 5"
    );

    let third = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .order_by(User::id())
        .unwrap()
        .take(5)
        .skip(2);
    assert_eq!(
        third.command_text().unwrap(),
        "SELECT u.* FROM Users u ORDER BY u.Id LIMIT 10, 5"
    );
}

#[test]
fn test_functions() {
    let ctx = mysql();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .columns(expr::coalesce(User::name(), ""))
        .unwrap()
        .columns(expr::date_part(DatePart::Month, User::birthday()))
        .unwrap()
        .column_as(expr::format(User::birthday(), "%Y-%m"), "Period")
        .unwrap()
        .column_as(expr::now(), "Stamp")
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT IFNULL(u.Name, '') AS Name, MONTH(u.Birthday) AS Birthday, \
         DATE_FORMAT(u.Birthday, '%Y-%m') AS Period, CURRENT_TIMESTAMP AS Stamp FROM Users u"
    );
}

#[test]
fn test_insert_returns_last_insert_id() {
    let ctx = mysql();
    let insert = SqlBuilder::<User>::insert_record(&ctx, &User::sample(1))
        .unwrap()
        .output_identity()
        .unwrap();
    assert_eq!(
        insert.command_text().unwrap(),
        "INSERT INTO Users (Email, Name, Age, Active, Birthday) \
         VALUES (@Param1, @Param2, @Param3, @Param4, @Param5); SELECT LAST_INSERT_ID()"
    );

    let log = AuditLog {
        id: 0,
        message: String::from("login"),
    };
    let insert = SqlBuilder::<AuditLog>::insert_record(&ctx, &log).unwrap();
    assert_eq!(
        insert.command_text().unwrap(),
        "INSERT INTO dbo.AuditLogs (Message) VALUES (@Param1)"
    );
}

#[test]
fn test_update_and_delete() {
    let ctx = mysql();
    let update = SqlBuilder::<User>::update(
        &ctx,
        ObjectExpr::for_record("User").member("email", "new@example.com"),
    )
    .unwrap()
    .where_clause(User::id().eq(7))
    .unwrap();
    assert_eq!(
        update.command_text().unwrap(),
        "UPDATE Users u SET u.Email = @Param1 WHERE u.Id = @Param2"
    );

    let delete = SqlBuilder::<User>::delete(&ctx)
        .unwrap()
        .where_clause(User::id().eq(7))
        .unwrap();
    assert_eq!(
        delete.command_text().unwrap(),
        "DELETE u FROM Users u WHERE u.Id = @Param1"
    );
}

#[test]
fn test_context_from_json_options() {
    let ctx = SqlContext::from_json_str(
        r#"{ "dialect": "mariadb", "parameter_prefix": "p" }"#,
        registry(),
    )
    .unwrap();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(User::email().eq("a@b.com").or(User::age().lt_eq(21)))
        .unwrap();
    let command = query.command().unwrap();
    assert_eq!(
        command.text,
        "SELECT u.* FROM Users u WHERE (u.Email = @p1 OR u.Age <= @p2)"
    );
    let keys: Vec<&str> = command.parameters.keys().collect();
    assert_eq!(keys, ["p1", "p2"]);
}
