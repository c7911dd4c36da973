//! SELECT statements through the typed facade.

mod common;

use common::{sql_server, Tag, User, UserGroup};
use oxide_query_core::expr::{self, DatePart, Expr, ObjectExpr};
use oxide_query_core::value::SqlValue;
use oxide_query_core::{SqlBuilder, SqlCommand, SqlError};

#[test]
fn test_filter_by_email() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(User::email().eq("a@b.com"))
        .unwrap();

    let command = query.command().unwrap();
    assert_eq!(
        command.text,
        "SELECT u.* FROM Users u WHERE u.[Email] = @Param1"
    );
    assert_eq!(command.parameters.len(), 1);
    assert_eq!(
        command.parameters.get("Param1"),
        Some(&SqlValue::Text(String::from("a@b.com")))
    );
    assert_eq!(query.current_param_index(), 1);
}

#[test]
fn test_parameters_serialize_as_object() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(User::email().eq("a@b.com").and(User::age().gt(30)))
        .unwrap();
    let json = serde_json::to_value(query.command_parameters().unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "Param1": "a@b.com", "Param2": 30 })
    );
}

#[test]
fn test_chained_where_and_or() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(User::age().gt_eq(18))
        .unwrap()
        .and_where(User::active())
        .unwrap()
        .or_where(User::name().is_null())
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT u.* FROM Users u WHERE u.[Age] >= @Param1 AND u.[Active] = @Param2 \
         OR u.[Name] IS NULL"
    );
    assert_eq!(
        query.where_command_text(),
        "u.[Age] >= @Param1 AND u.[Active] = @Param2 OR u.[Name] IS NULL"
    );
}

#[test]
fn test_negated_boolean_field() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(!User::active())
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT u.* FROM Users u WHERE NOT u.[Active] = @Param1"
    );
}

#[test]
fn test_first_page_uses_top() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .order_by(User::id())
        .unwrap()
        .take(10);
    let text = query.command_text().unwrap();
    assert!(text.contains("TOP(10)"));
    assert!(text.contains("ORDER BY u.[Id]"));
    assert_eq!(text, "SELECT TOP(10) u.* FROM Users u ORDER BY u.[Id]");
}

#[test]
fn test_later_page_uses_offset_fetch() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .order_by_descending(User::age())
        .unwrap()
        .take(10)
        .skip(1);
    let text = query.command_text().unwrap();
    assert!(text.contains("ORDER BY u.[Age] DESC"));
    assert!(text.ends_with("OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY"));
}

#[test]
fn test_paging_without_order_fails() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx).unwrap().take(10).skip(2);
    assert!(matches!(
        query.command(),
        Err(SqlError::PaginationWithoutOrder)
    ));

    let query = SqlBuilder::<User>::select(&ctx).unwrap().skip(2);
    assert!(matches!(query.command(), Err(SqlError::PageIndexWithoutSize)));
}

#[test]
fn test_page_offset_out_of_range_fails() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .order_by(User::id())
        .unwrap()
        .take(usize::MAX)
        .skip(2);
    assert!(matches!(query.command(), Err(SqlError::InvalidArgument(_))));
}

#[test]
fn test_select_single_and_count() {
    let ctx = sql_server();
    let single = SqlBuilder::<User>::select_single(&ctx)
        .unwrap()
        .where_clause(User::id().eq(4))
        .unwrap();
    assert_eq!(
        single.command_text().unwrap(),
        "SELECT TOP(1) u.* FROM Users u WHERE u.[Id] = @Param1"
    );

    let count = SqlBuilder::<User>::count(&ctx)
        .unwrap()
        .where_clause(User::active())
        .unwrap();
    assert_eq!(
        count.command_text().unwrap(),
        "SELECT COUNT(*) FROM Users u WHERE u.[Active] = @Param1"
    );
}

#[test]
fn test_projection_of_fields_and_functions() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .columns(User::id())
        .unwrap()
        .columns(expr::coalesce(User::name(), "n/a"))
        .unwrap()
        .column_as(expr::date_part(DatePart::Year, User::birthday()), "BirthYear")
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT u.[Id], ISNULL(u.[Name], 'n/a') AS [Name], \
         DATEPART(YEAR, u.[Birthday]) AS [BirthYear] FROM Users u"
    );
}

#[test]
fn test_object_projection_aliases_renamed_members() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .columns(
            ObjectExpr::new()
                .member("email", User::email())
                .member("mail", User::email())
                .member("next_age", User::age() + 1),
        )
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT u.[Email], u.[Email] AS [mail], u.[Age] + @Param1 AS [next_age] FROM Users u"
    );
}

#[test]
fn test_aggregates_group_by_and_having() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .columns(User::active())
        .unwrap()
        .select_count(User::id())
        .unwrap()
        .select_average(User::age())
        .unwrap()
        .group_by(User::active())
        .unwrap()
        .having(expr::count(User::id()).gt(2))
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT u.[Active], COUNT(u.[Id]), AVG(u.[Age]) FROM Users u \
         GROUP BY u.[Active] HAVING COUNT(u.[Id]) > @Param1"
    );
}

#[test]
fn test_other_aggregates() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .select_distinct(User::name())
        .unwrap()
        .select_sum(User::age())
        .unwrap()
        .select_min(User::age())
        .unwrap()
        .select_max(User::age())
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT DISTINCT(u.[Name]), SUM(u.[Age]), MIN(u.[Age]), MAX(u.[Age]) FROM Users u"
    );
}

#[test]
fn test_where_in_and_between() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_in(User::id(), [1, 2, 3])
        .unwrap()
        .where_not_between(User::age(), 30, 40)
        .unwrap()
        .where_like(User::email(), "%@example.%")
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT u.* FROM Users u WHERE u.[Id] IN (@Param1,@Param2,@Param3) \
         AND (u.[Age] NOT BETWEEN @Param4 AND @Param5) AND u.[Email] LIKE @Param6"
    );
    let params = query.command_parameters().unwrap();
    assert_eq!(params.get("Param5"), Some(&SqlValue::Int(40)));
    assert_eq!(
        params.get("Param6").and_then(SqlValue::as_text),
        Some("%@example.%")
    );
}

#[test]
fn test_where_in_empty_list_fails() {
    let ctx = sql_server();
    let result = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_not_in(User::id(), Vec::<i64>::new());
    assert!(matches!(result, Err(SqlError::InvalidArgument(_))));
}

#[test]
fn test_where_in_subquery_continues_numbering() {
    let ctx = sql_server();
    let members = SqlBuilder::<UserGroup>::select(&ctx)
        .unwrap()
        .columns(UserGroup::user_id())
        .unwrap()
        .where_clause(UserGroup::group_id().eq(7))
        .unwrap();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(User::active())
        .unwrap()
        .where_in_query(User::id(), &members)
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT u.* FROM Users u WHERE u.[Active] = @Param1 AND u.[Id] IN \
         (SELECT ug.[UserId] FROM UsersGroup ug WHERE ug.[GroupId] = @Param2)"
    );
    assert_eq!(
        query.command_parameters().unwrap().get("Param2"),
        Some(&SqlValue::Int(7))
    );
    assert_eq!(query.current_param_index(), 2);
}

#[test]
fn test_from_subquery() {
    let ctx = sql_server();
    let adults = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(User::age().gt_eq(18))
        .unwrap();
    let query = SqlBuilder::<User>::from_subquery(&ctx, &adults)
        .unwrap()
        .where_clause(User::active())
        .unwrap();
    assert_eq!(
        query.command_text().unwrap(),
        "SELECT u.* FROM (SELECT u.* FROM Users u WHERE u.[Age] >= @Param1) u \
         WHERE u.[Active] = @Param2"
    );
    assert_eq!(query.command_parameters().unwrap().len(), 2);
}

#[test]
fn test_select_function_binds_named_parameters() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select_function(
        &ctx,
        "dbo.UsersOfTenant(@tenant, @since, @tenant)",
        [SqlValue::Int(3), SqlValue::Text(String::from("2024-01-01"))],
    )
    .unwrap()
    .where_clause(User::active())
    .unwrap();
    let command = query.command().unwrap();
    assert_eq!(
        command.text,
        "SELECT u.* FROM dbo.UsersOfTenant(@tenant, @since, @tenant) u \
         WHERE u.[Active] = @Param1"
    );
    let keys: Vec<&str> = command.parameters.keys().collect();
    assert_eq!(keys, ["Param1", "tenant", "since"]);
}

#[test]
fn test_select_function_arity_mismatch() {
    let ctx = sql_server();
    let result = SqlBuilder::<User>::select_function(&ctx, "dbo.UsersOfTenant(@tenant)", [1, 2]);
    assert!(matches!(
        result,
        Err(SqlError::FunctionArity {
            expected: 1,
            found: 2
        })
    ));
}

#[test]
fn test_scalar_result_rejects_records() {
    let ctx = sql_server();
    let scalar = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .scalar_result(expr::max(User::age()))
        .unwrap();
    assert_eq!(
        scalar.command_text().unwrap(),
        "SELECT MAX(u.[Age]) FROM Users u"
    );

    let result = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .scalar_result(expr::record::<User>());
    assert!(matches!(result, Err(SqlError::InvalidArgument(_))));
}

#[test]
fn test_unknown_record_and_foreign_field() {
    let ctx = oxide_query_core::SqlContext::sql_server(
        oxide_query_core::SchemaRegistry::new().register::<User>(),
    );
    assert!(matches!(
        SqlBuilder::<Tag>::select(&ctx),
        Err(SqlError::UnknownRecord(name)) if name == "Tag"
    ));

    let ctx = sql_server();
    let result = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(UserGroup::group_id().eq(1));
    assert!(matches!(
        result,
        Err(SqlError::TableNotInStatement { record }) if record == "UserGroup"
    ));
}

#[test]
fn test_render_is_idempotent() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(User::email().contains("example"))
        .unwrap()
        .order_by(User::name())
        .unwrap();
    assert_eq!(query.command().unwrap(), query.command().unwrap());
}

#[test]
fn test_inlined_literals_are_left_alone() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(User::age().gt(1))
        .unwrap()
        .where_clause(User::id().eq(2))
        .unwrap()
        .column_as(
            expr::concat([Expr::from(User::name()), Expr::value(" @Param2  x")]),
            "Tag",
        )
        .unwrap();
    let command = query.command().unwrap();
    assert_eq!(
        command.text,
        "SELECT CONCAT(u.[Name], ' @Param2  x') AS [Tag] FROM Users u \
         WHERE u.[Age] > @Param1 AND u.[Id] = @Param2"
    );
    assert_eq!(command.parameters.get("Param1"), Some(&SqlValue::Int(1)));
    assert_eq!(command.parameters.get("Param2"), Some(&SqlValue::Int(2)));
}

#[test]
fn test_failed_filters_leave_statement_untouched() {
    let ctx = sql_server();
    let query = SqlBuilder::<User>::select(&ctx)
        .unwrap()
        .where_clause(User::age().gt(1))
        .unwrap();
    let kept = query.view::<User>();
    assert!(query
        .where_clause(User::age().gt(2).and(User::age()))
        .is_err());
    let query = kept.view::<User>();
    assert!(query
        .where_not_in(User::id(), Vec::<i64>::new())
        .is_err());
    let query = kept.view::<User>();
    let projection = ObjectExpr::new()
        .member("id", User::id())
        .member("adult", User::age().gt(17));
    assert!(query.columns(projection).is_err());

    assert_eq!(
        kept.command_text().unwrap(),
        "SELECT u.* FROM Users u WHERE u.[Age] > @Param1"
    );
    let extended = kept.where_clause(User::id().eq(9)).unwrap();
    let command = extended.command().unwrap();
    assert!(command
        .text
        .ends_with("WHERE u.[Age] > @Param1 AND u.[Id] = @Param3"));
    assert_eq!(command.parameters.get("Param3"), Some(&SqlValue::Int(9)));
}
