#[cfg(test)]
mod tests {
    use quarry::{
        AliasRemover, AnsiDialect, ArgumentExpression, BooleanExpression, ColumnDeclaring,
        Database, Executor, ExprRef, ExpressionKind, ExpressionVisitor, OrderByRemover, Result,
        Table, TableExpression, Value, case_when, exists, value,
    };
    use std::sync::Arc;

    struct Identity;
    impl ExpressionVisitor for Identity {}

    /// Renames one table everywhere, sub-queries included.
    struct TableRenamer {
        from: &'static str,
        to: &'static str,
    }

    impl ExpressionVisitor for TableRenamer {
        fn visit_table(&mut self, expr: &ExprRef, table: &TableExpression) -> Result<ExprRef> {
            if table.name != self.from {
                return Ok(expr.clone());
            }
            Ok(expr.rebuild(TableExpression {
                name: self.to.into(),
                ..table.clone()
            }))
        }
    }

    /// Doubles every integer argument.
    struct Doubler;

    impl ExpressionVisitor for Doubler {
        fn visit_argument(
            &mut self,
            expr: &ExprRef,
            argument: &ArgumentExpression,
        ) -> Result<ExprRef> {
            match argument.value {
                Value::Int32(Some(v)) => Ok(expr.rebuild(ArgumentExpression {
                    value: Value::Int32(Some(v * 2)),
                    ..argument.clone()
                })),
                _ => Ok(expr.clone()),
            }
        }
    }

    fn database() -> Database {
        Database::offline(AnsiDialect).build().unwrap()
    }

    #[test]
    fn identity_returns_the_same_tree() {
        let database = database();
        let e = Table::new("t_employee").aliased("e");
        let m = Table::new("t_employee").aliased("m");
        let managed = database
            .from(&m)
            .select(m.column::<i32>("id"))
            .filter(m.column::<i32>("manager_id").eq_expr(e.column::<i32>("id")));
        let query = database
            .from(&e)
            .select((
                e.column::<String>("name"),
                case_when::<i32>()
                    .when_value(e.column::<i32>("id").eq(1), 10)
                    .otherwise_value(20),
            ))
            .filter(exists(&managed).or(e.column::<i32>("id").in_list([1, 2, 3])))
            .order_by([e.column::<String>("name").desc()]);
        let expression = query.expression();
        assert!(Arc::ptr_eq(expression, &Identity.visit(expression).unwrap()));
        assert!(Arc::ptr_eq(expression, &AliasRemover.visit(expression).unwrap()));
        let renamed = TableRenamer {
            from: "t_department",
            to: "t_division",
        }
        .visit(expression)
        .unwrap();
        assert!(Arc::ptr_eq(expression, &renamed));
    }

    #[test]
    fn only_the_changed_path_is_rebuilt() {
        let e = Table::new("t_employee");
        let d = Table::new("t_department");
        let condition = e
            .column::<i32>("id")
            .eq(1)
            .and(d.column::<String>("name").eq("tech"))
            .as_expression();
        let doubled = Doubler.visit(&condition).unwrap();
        assert!(!Arc::ptr_eq(&condition, &doubled));
        let (ExpressionKind::Binary(before), ExpressionKind::Binary(after)) =
            (&condition.kind, &doubled.kind)
        else {
            panic!("Expected a binary expression, found {}", doubled.kind_name());
        };
        assert!(!Arc::ptr_eq(&before.left, &after.left));
        assert!(Arc::ptr_eq(&before.right, &after.right));

        let database = database();
        let (sql, arguments) = database.format_expression(&doubled).unwrap();
        assert_eq!(sql, "(t_employee.id = ?) AND (t_department.name = ?)");
        assert_eq!(arguments[0].value, Value::Int32(Some(2)));
    }

    #[test]
    fn rename_everywhere() {
        let database = database();
        let e = Table::new("t_employee").aliased("e");
        let m = Table::new("t_employee").aliased("m");
        let managers = database
            .from(&m)
            .select(m.column::<i32>("manager_id"));
        let query = database
            .from(&e)
            .select(e.column::<String>("name"))
            .filter(e.column::<i32>("id").in_query(&managers));
        let renamed = TableRenamer {
            from: "t_employee",
            to: "t_staff",
        }
        .visit(query.expression())
        .unwrap();
        assert_eq!(
            database.format_expression(&renamed).unwrap().0,
            "SELECT e.name FROM t_staff e WHERE e.id IN (SELECT m.manager_id FROM t_staff m)"
        );
    }

    #[test]
    fn alias_removal_keeps_subqueries() {
        let database = database();
        let e = Table::new("t_employee").aliased("e");
        let m = Table::new("t_employee").aliased("m");
        let managers = database
            .from(&m)
            .select(m.column::<i32>("manager_id"));
        let condition = e
            .column::<i32>("id")
            .in_query(&managers)
            .and(e.column::<String>("job").eq("trainee"));
        let removed = AliasRemover.visit(&condition.as_expression()).unwrap();
        assert_eq!(
            database.format_expression(&removed).unwrap().0,
            "(id IN (SELECT m.manager_id FROM t_employee m)) AND (job = ?)"
        );
    }

    #[test]
    fn order_by_removal() {
        let database = database();
        let e = Table::new("t_employee");
        let name = e.column::<String>("name");
        let query = database
            .from(&e)
            .select(name.clone())
            .order_by([name.asc()]);
        let removed = OrderByRemover.visit(query.expression()).unwrap();
        assert_eq!(
            database.format_expression(&removed).unwrap().0,
            "SELECT t_employee.name FROM t_employee"
        );

        // Nothing to remove, the same node comes back
        let removed_again = OrderByRemover.visit(&removed).unwrap();
        assert!(Arc::ptr_eq(&removed, &removed_again));

        let weighted = database
            .from(&e)
            .select(name.clone())
            .order_by([
                name.desc(),
                case_when::<i64>()
                    .when(name.eq("vince"), value(0i64))
                    .otherwise_value(1)
                    .asc(),
            ]);
        let removed = OrderByRemover.visit(weighted.expression()).unwrap();
        let (sql, arguments) = database.format_expression(&removed).unwrap();
        assert_eq!(
            sql,
            "SELECT t_employee.name FROM t_employee ORDER BY (CASE WHEN t_employee.name = ? THEN ? ELSE ? END)"
        );
        assert_eq!(arguments.len(), 3);
    }
}
