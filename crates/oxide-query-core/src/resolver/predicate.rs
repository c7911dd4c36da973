//! Predicate position: WHERE, HAVING and join conditions.

use std::collections::HashMap;

use regex::Captures;
use tracing::trace;

use super::{arguments, Resolver};
use crate::builder::{placeholder_pattern, Command};
use crate::error::{Result, SqlError};
use crate::expr::{BinaryOp, Expr, FieldRef, SqlFunction, UnaryOp};
use crate::value::SqlValue;

impl Resolver<'_> {
    /// Resolves a boolean expression into the current predicate target.
    ///
    /// Logical nodes are always parenthesized, comparisons with NULL become
    /// `IS [NOT] NULL`, and a bare field is compared with `true`.
    ///
    /// # Errors
    ///
    /// Fails on expressions that are not predicates, and on bare fields whose
    /// declared type is not boolean.
    pub fn resolve_predicate(&mut self, expr: &Expr) -> Result<()> {
        trace!(kind = expr.kind(), "resolving predicate");
        match expr {
            Expr::Binary { op, left, right } if op.is_logical() => {
                self.builder.begin_group();
                self.resolve_predicate(left)?;
                if *op == BinaryOp::And {
                    self.builder.and();
                } else {
                    self.builder.or();
                }
                self.resolve_predicate(right)?;
                self.builder.end_group();
                Ok(())
            }
            Expr::Binary { op, left, right } if op.is_comparison() => {
                self.resolve_comparison(*op, left, right)
            }
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                self.builder.not();
                self.resolve_predicate(operand)
            }
            Expr::Field(field) => self.resolve_boolean_field(field),
            Expr::Call { function, args } => {
                let parsed = SqlFunction::parse(function)?;
                if parsed.is_pattern_match() {
                    self.resolve_pattern_match(parsed, function, args)
                } else {
                    Err(SqlError::unsupported(
                        "predicate",
                        format!("{function} does not produce a boolean"),
                    ))
                }
            }
            other => Err(SqlError::unsupported(
                "predicate",
                format!("{} is not a boolean expression", other.kind()),
            )),
        }
    }

    fn resolve_comparison(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<()> {
        match (left, right) {
            (operand, Expr::Literal(SqlValue::Null)) | (Expr::Literal(SqlValue::Null), operand) => {
                let keyword = match op {
                    BinaryOp::Eq => "IS NULL",
                    BinaryOp::NotEq => "IS NOT NULL",
                    other => {
                        return Err(SqlError::unsupported(
                            "predicate",
                            format!("NULL cannot be compared with `{other}`"),
                        ))
                    }
                };
                let operand = self.resolve_value(operand)?;
                self.builder.add_predicate(format!("{operand} {keyword}"));
            }
            _ => {
                let left = self.resolve_value(left)?;
                let right = self.resolve_value(right)?;
                self.builder.add_predicate(format!("{left} {op} {right}"));
            }
        }
        Ok(())
    }

    fn resolve_boolean_field(&mut self, field: &FieldRef) -> Result<()> {
        let schema = self.schema(field.record())?.require_field(field.field())?;
        if schema.is_known_non_bool() {
            return Err(SqlError::unsupported(
                "predicate",
                format!(
                    "field `{}` of `{}` is not boolean",
                    field.field(),
                    field.record()
                ),
            ));
        }
        let column = self.field(field)?;
        let flag = self.builder.add_parameter(SqlValue::Bool(true));
        self.builder.add_predicate(format!("{column} = {flag}"));
        Ok(())
    }

    fn resolve_pattern_match(
        &mut self,
        function: SqlFunction,
        name: &str,
        args: &[Expr],
    ) -> Result<()> {
        let [target, pattern] = arguments::<2>(name, args)?;
        let text = match pattern {
            Expr::Literal(SqlValue::Text(text)) => text,
            other => {
                return Err(SqlError::unsupported(
                    "predicate",
                    format!("{name} expects a text pattern, got {}", other.kind()),
                ))
            }
        };
        let pattern = match function {
            SqlFunction::Contains => format!("%{text}%"),
            SqlFunction::StartsWith => format!("{text}%"),
            SqlFunction::EndsWith => format!("%{text}"),
            _ => text.clone(),
        };
        let target = self.resolve_value(target)?;
        let pattern = self.builder.add_parameter(SqlValue::Text(pattern));
        self.builder.add_predicate(format!("{target} LIKE {pattern}"));
        Ok(())
    }

    /// Adds `field [NOT] IN (@p1,@p2,...)`.
    ///
    /// # Errors
    ///
    /// Fails on an empty value list.
    pub fn query_by_is_in(
        &mut self,
        field: &FieldRef,
        values: Vec<SqlValue>,
        negate: bool,
    ) -> Result<()> {
        if values.is_empty() {
            return Err(SqlError::InvalidArgument(format!(
                "IN list for `{}` is empty",
                field.field()
            )));
        }
        let column = self.field(field)?;
        let placeholders = values
            .into_iter()
            .map(|value| self.builder.add_parameter(value))
            .collect::<Vec<_>>()
            .join(",");
        let keyword = if negate { "NOT IN" } else { "IN" };
        self.builder
            .add_predicate(format!("{column} {keyword} ({placeholders})"));
        Ok(())
    }

    /// Adds `field [NOT] IN (subquery)`.
    ///
    /// The subquery's parameters are re-keyed to fresh names of this
    /// statement so both can be executed as one command.
    ///
    /// # Errors
    ///
    /// Fails when the field cannot be resolved.
    pub fn query_by_is_in_subquery(
        &mut self,
        field: &FieldRef,
        query: &Command,
        negate: bool,
    ) -> Result<()> {
        let column = self.field(field)?;
        let text = self.adopt_parameters(query)?;
        let keyword = if negate { "NOT IN" } else { "IN" };
        self.builder
            .add_predicate(format!("{column} {keyword} ({text})"));
        Ok(())
    }

    /// Binds every parameter of `query` under a fresh name and returns its
    /// text with the placeholders rewritten in a single pass.
    fn adopt_parameters(&mut self, query: &Command) -> Result<String> {
        if query.parameters.is_empty() {
            return Ok(query.text.clone());
        }
        let mut renames: HashMap<String, String> = HashMap::new();
        for (name, value) in &query.parameters {
            let old = self.builder.adapter().parameter(name);
            let new = self.builder.add_parameter(value.clone());
            renames.insert(old, new);
        }
        let pattern = placeholder_pattern(renames.keys().map(String::as_str))?;
        Ok(pattern
            .replace_all(&query.text, |caps: &Captures<'_>| {
                renames
                    .get(&caps[0])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned())
    }

    /// Adds `(field [NOT] BETWEEN @a AND @b)`.
    ///
    /// # Errors
    ///
    /// Fails when the field cannot be resolved.
    pub fn query_by_between(
        &mut self,
        field: &FieldRef,
        start: SqlValue,
        end: SqlValue,
        negate: bool,
    ) -> Result<()> {
        let column = self.field(field)?;
        let start = self.builder.add_parameter(start);
        let end = self.builder.add_parameter(end);
        let keyword = if negate { "NOT BETWEEN" } else { "BETWEEN" };
        self.builder
            .add_predicate(format!("({column} {keyword} {start} AND {end})"));
        Ok(())
    }

    /// Adds `field LIKE @p` with the pattern used as given.
    ///
    /// # Errors
    ///
    /// Fails when the field cannot be resolved.
    pub fn query_by_like(&mut self, field: &FieldRef, pattern: &str) -> Result<()> {
        let column = self.field(field)?;
        let pattern = self
            .builder
            .add_parameter(SqlValue::Text(pattern.to_string()));
        self.builder
            .add_predicate(format!("{column} LIKE {pattern}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{registry, users};
    use super::*;
    use crate::builder::PredicateTarget;
    use crate::params::Parameters;

    fn where_of(expr: &Expr) -> Result<(String, Parameters)> {
        let registry = registry();
        let mut builder = users();
        Resolver::new(&mut builder, &registry).resolve_predicate(expr)?;
        Ok((builder.where_text(), builder.parameters().clone()))
    }

    fn email() -> Expr {
        Expr::field("User", "email")
    }

    #[test]
    fn test_equality() {
        let (sql, params) = where_of(&email().eq("a@b.com")).unwrap();
        assert_eq!(sql, "u.[Email] = @Param1");
        assert_eq!(
            params.get("Param1"),
            Some(&SqlValue::Text(String::from("a@b.com")))
        );
    }

    #[test]
    fn test_logical_nodes_are_parenthesized() {
        let expr = email()
            .eq("a")
            .or(Expr::field("User", "age").gt(18).and(Expr::field("User", "active")));
        let (sql, params) = where_of(&expr).unwrap();
        assert_eq!(
            sql,
            "(u.[Email] = @Param1 OR (u.[Age] > @Param2 AND u.[Active] = @Param3))"
        );
        assert_eq!(params.get("Param3"), Some(&SqlValue::Bool(true)));
    }

    #[test]
    fn test_null_comparisons() {
        assert_eq!(where_of(&email().is_null()).unwrap().0, "u.[Email] IS NULL");
        assert_eq!(
            where_of(&email().is_not_null()).unwrap().0,
            "u.[Email] IS NOT NULL"
        );
        assert!(where_of(&email().gt(Expr::null())).is_err());
    }

    #[test]
    fn test_not() {
        let (sql, _) = where_of(&!Expr::field("User", "active")).unwrap();
        assert_eq!(sql, "NOT u.[Active] = @Param1");
        let (sql, _) = where_of(&!(email().eq("x").and(email().eq("y")))).unwrap();
        assert_eq!(sql, "NOT (u.[Email] = @Param1 AND u.[Email] = @Param2)");
    }

    #[test]
    fn test_bare_non_boolean_field_is_rejected() {
        assert!(matches!(
            where_of(&Expr::field("User", "age")),
            Err(SqlError::UnsupportedExpression { context: "predicate", .. })
        ));
    }

    #[test]
    fn test_pattern_matching() {
        let (sql, params) = where_of(&email().contains("gmail")).unwrap();
        assert_eq!(sql, "u.[Email] LIKE @Param1");
        assert_eq!(
            params.get("Param1"),
            Some(&SqlValue::Text(String::from("%gmail%")))
        );
        let (_, params) = where_of(&email().starts_with("adm")).unwrap();
        assert_eq!(params.get("Param1").and_then(SqlValue::as_text), Some("adm%"));
        let (_, params) = where_of(&email().ends_with(".org")).unwrap();
        assert_eq!(params.get("Param1").and_then(SqlValue::as_text), Some("%.org"));
    }

    #[test]
    fn test_non_predicates_are_rejected() {
        assert!(where_of(&Expr::value(1)).is_err());
        assert!(where_of(&crate::expr::now()).is_err());
        assert!(matches!(
            where_of(&Expr::call("levenshtein", vec![])),
            Err(SqlError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_in_and_between() {
        let registry = registry();
        let mut builder = users();
        let mut resolver = Resolver::new(&mut builder, &registry);
        let id = FieldRef::new("User", "id");
        resolver
            .query_by_is_in(&id, vec![SqlValue::Int(1), SqlValue::Int(2)], false)
            .unwrap();
        resolver.builder.and();
        resolver
            .query_by_between(&FieldRef::new("User", "age"), SqlValue::Int(18), SqlValue::Int(30), true)
            .unwrap();
        assert!(matches!(
            resolver.query_by_is_in(&id, Vec::new(), false),
            Err(SqlError::InvalidArgument(_))
        ));
        assert_eq!(
            builder.where_text(),
            "u.[Id] IN (@Param1,@Param2) AND (u.[Age] NOT BETWEEN @Param3 AND @Param4)"
        );
    }

    #[test]
    fn test_in_subquery_rekeys_parameters() {
        let registry = registry();
        let mut builder = users();
        let mut resolver = Resolver::new(&mut builder, &registry);
        resolver
            .resolve_predicate(&Expr::field("User", "active"))
            .unwrap();
        resolver.builder.and();

        let inner: Parameters = [
            (String::from("Param1"), SqlValue::Int(10)),
            (String::from("Param10"), SqlValue::Int(11)),
        ]
        .into_iter()
        .collect();
        let inner = Command {
            text: String::from(
                "SELECT ug.[UserId] FROM UsersGroup ug WHERE ug.[GroupId] = @Param1 OR ug.[GroupId] = @Param10",
            ),
            parameters: inner,
        };
        resolver
            .query_by_is_in_subquery(&FieldRef::new("User", "id"), &inner, false)
            .unwrap();
        assert_eq!(
            builder.where_text(),
            "u.[Active] = @Param1 AND u.[Id] IN (SELECT ug.[UserId] FROM UsersGroup ug \
             WHERE ug.[GroupId] = @Param2 OR ug.[GroupId] = @Param3)"
        );
        assert_eq!(builder.parameters().get("Param3"), Some(&SqlValue::Int(11)));
    }

    #[test]
    fn test_in_subquery_keeps_quoted_literals() {
        let registry = registry();
        let mut builder = users();
        builder.add_parameter(SqlValue::Int(5));
        let inner = Command {
            text: String::from(
                "SELECT ug.[UserId] FROM UsersGroup ug \
                 WHERE CONCAT(ug.[Role], '@Param1') = @Param1",
            ),
            parameters: [(String::from("Param1"), SqlValue::Text(String::from("x")))]
                .into_iter()
                .collect(),
        };
        Resolver::new(&mut builder, &registry)
            .query_by_is_in_subquery(&FieldRef::new("User", "id"), &inner, false)
            .unwrap();
        assert_eq!(
            builder.where_text(),
            "u.[Id] IN (SELECT ug.[UserId] FROM UsersGroup ug \
             WHERE CONCAT(ug.[Role], '@Param1') = @Param2)"
        );
    }

    #[test]
    fn test_having_target() {
        let registry = registry();
        let mut builder = users();
        builder.set_predicate_target(PredicateTarget::Having);
        Resolver::new(&mut builder, &registry)
            .resolve_predicate(&Expr::field("User", "age").gt_eq(21))
            .unwrap();
        assert_eq!(builder.where_text(), "");
    }
}
