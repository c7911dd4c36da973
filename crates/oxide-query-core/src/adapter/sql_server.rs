//! SQL Server adapter.

use super::{clauses, values_list, InsertParts, Page, SelectParts, SqlAdapter, WriteParts};
use crate::expr::DatePart;
use crate::value::SqlValue;

/// SQL Server (T-SQL) dialect.
///
/// Identifiers are bracket-quoted, pagination uses `TOP` for the first page
/// and `OFFSET ... FETCH NEXT` afterwards, and inserts can return the new
/// key through `OUTPUT Inserted`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerAdapter;

impl SqlServerAdapter {
    /// Creates a new SQL Server adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlAdapter for SqlServerAdapter {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn identifier_quotes(&self) -> Option<(char, char)> {
        Some(('[', ']'))
    }

    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Bool(b) => String::from(if *b { "1" } else { "0" }),
            other => other.to_sql_inline(),
        }
    }

    fn current_timestamp(&self) -> String {
        String::from("GETDATE()")
    }

    fn is_null_function(&self, value: &str, fallback: &str) -> String {
        format!("ISNULL({value}, {fallback})")
    }

    fn format_function(&self, value: &str, pattern: &str) -> String {
        let pattern = self.literal(&SqlValue::Text(pattern.to_string()));
        format!("FORMAT({value}, {pattern})")
    }

    fn date_part_function(&self, part: DatePart, value: &str) -> String {
        format!("DATEPART({part}, {value})")
    }

    fn query_string_page(&self, parts: &SelectParts<'_>, page: Page) -> String {
        if page.index() == 0 {
            return clauses(&[
                "SELECT",
                &format!("TOP({})", page.size()),
                parts.selection,
                "FROM",
                parts.source,
                parts.conditions,
                parts.grouping,
                parts.having,
                parts.order,
            ]);
        }
        clauses(&[
            &self.query_string(parts),
            &format!(
                "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                page.offset(),
                page.size()
            ),
        ])
    }

    fn insert_command(&self, parts: &InsertParts<'_>) -> String {
        let output = parts
            .output
            .map(|key| format!("OUTPUT Inserted.{key}"))
            .unwrap_or_default();
        clauses(&[
            "INSERT INTO",
            parts.target,
            &format!("({})", parts.columns.join(", ")),
            &output,
            "VALUES",
            &values_list(parts.rows),
        ])
    }

    fn update_command(&self, parts: &WriteParts<'_>) -> String {
        clauses(&[
            "UPDATE",
            parts.alias,
            "SET",
            &parts.assignments.join(", "),
            "FROM",
            parts.source,
            parts.conditions,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(order: &'a str) -> SelectParts<'a> {
        SelectParts {
            selection: "u.*",
            source: "Users u",
            conditions: "WHERE u.[Active] = @Param1",
            order,
            ..SelectParts::default()
        }
    }

    #[test]
    fn test_quoting() {
        let adapter = SqlServerAdapter::new();
        assert_eq!(adapter.name(), "sqlserver");
        assert_eq!(adapter.field("Email"), "[Email]");
        assert_eq!(adapter.quote_identifier("we]ird"), "[we]]ird]");
        assert_eq!(adapter.table("dbo.Users"), "[dbo].[Users]");
        assert_eq!(adapter.qualified_field("u", "Email"), "u.[Email]");
        assert_eq!(adapter.alias("Total"), "AS [Total]");
        assert_eq!(adapter.parameter("Param1"), "@Param1");
    }

    #[test]
    fn test_boolean_literals_are_bits() {
        let adapter = SqlServerAdapter::new();
        assert_eq!(adapter.literal(&SqlValue::Bool(true)), "1");
        assert_eq!(adapter.literal(&SqlValue::Int(4)), "4");
    }

    #[test]
    fn test_functions() {
        let adapter = SqlServerAdapter::new();
        assert_eq!(adapter.current_timestamp(), "GETDATE()");
        assert_eq!(adapter.is_null_function("u.[Name]", "''"), "ISNULL(u.[Name], '')");
        assert_eq!(
            adapter.format_function("u.[Created]", "yyyy-MM-dd"),
            "FORMAT(u.[Created], 'yyyy-MM-dd')"
        );
        assert_eq!(
            adapter.date_part_function(DatePart::Year, "u.[Created]"),
            "DATEPART(YEAR, u.[Created])"
        );
    }

    #[test]
    fn test_first_page_uses_top() {
        let adapter = SqlServerAdapter::new();
        let sql = adapter.query_string_page(&parts(""), Page::new(10, 0).unwrap());
        assert_eq!(sql, "SELECT TOP(10) u.* FROM Users u WHERE u.[Active] = @Param1");
    }

    #[test]
    fn test_later_page_uses_offset_fetch() {
        let adapter = SqlServerAdapter::new();
        let page = Page::new(10, 2).unwrap();
        let sql = adapter.query_string_page(&parts("ORDER BY u.[Id]"), page);
        assert_eq!(
            sql,
            "SELECT u.* FROM Users u WHERE u.[Active] = @Param1 ORDER BY u.[Id] \
             OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_insert_with_output() {
        let adapter = SqlServerAdapter::new();
        let columns = vec![String::from("[Email]")];
        let rows = vec![vec![String::from("@Param1")]];
        let sql = adapter.insert_command(&InsertParts {
            target: "[Users]",
            columns: &columns,
            rows: &rows,
            output: Some("[Id]"),
        });
        assert_eq!(
            sql,
            "INSERT INTO [Users] ([Email]) OUTPUT Inserted.[Id] VALUES (@Param1)"
        );
    }

    #[test]
    fn test_update_and_delete() {
        let adapter = SqlServerAdapter::new();
        let assignments = vec![String::from("u.[Email] = @Param1")];
        let parts = WriteParts {
            alias: "u",
            source: "Users u",
            assignments: &assignments,
            conditions: "WHERE u.[Id] = @Param2",
        };
        assert_eq!(
            adapter.update_command(&parts),
            "UPDATE u SET u.[Email] = @Param1 FROM Users u WHERE u.[Id] = @Param2"
        );
        assert_eq!(
            adapter.delete_command(&parts),
            "DELETE u FROM Users u WHERE u.[Id] = @Param2"
        );
    }
}
