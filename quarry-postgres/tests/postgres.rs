#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{
        AliasRemover, ColumnDeclaring, Database, Executor, ExpressionVisitor, NumericExpression,
        Table, Value,
    };
    use quarry_postgres::{
        LockingClause, LockingMode, PostgresDialect, PostgresQuery, PostgresTextExpression,
        excluded, insert_or_update_expression,
    };

    fn database() -> Database {
        Database::offline(PostgresDialect::new()).build().unwrap()
    }

    fn format(database: &Database, expression: &quarry_core::ExprRef) -> String {
        let expression = AliasRemover.visit(expression).unwrap();
        database.format_expression(&expression).unwrap().0
    }

    #[test]
    fn limit_and_offset_are_independent() {
        let database = database();
        let employee = Table::new("t_employee");
        let name = employee.column::<String>("name");
        let query = database.from(&employee).select(name.clone()).limit(10);
        assert_eq!(query.sql().unwrap(), "SELECT t_employee.name FROM t_employee LIMIT ?");

        let query = database.from(&employee).select(name.clone()).offset(3);
        assert_eq!(query.sql().unwrap(), "SELECT t_employee.name FROM t_employee OFFSET ?");

        let query = database
            .from(&employee)
            .select(name.clone())
            .order_by([name.asc()])
            .limit(10)
            .offset(30);
        let (sql, arguments) = query.sql_with_arguments().unwrap();
        assert_eq!(
            sql,
            "SELECT t_employee.name FROM t_employee ORDER BY t_employee.name LIMIT ? OFFSET ?"
        );
        let values = arguments.iter().map(|v| v.value.clone()).collect::<Vec<_>>();
        assert_eq!(values, [Value::Int64(Some(10)), Value::Int64(Some(30))]);
    }

    #[test]
    fn identifiers_are_folded_to_lower_case() {
        let database = database();
        let employee = Table::new("Employee");
        let query = database
            .from(&employee)
            .select(employee.column::<String>("FullName"));
        assert_eq!(
            query.sql().unwrap(),
            r#"SELECT "Employee"."FullName" FROM "Employee""#
        );

        let employee = Table::new("EMPLOYEE");
        let query = database.from(&employee).select(employee.column::<String>("NAME"));
        assert_eq!(query.sql().unwrap(), "SELECT employee.name FROM employee");
    }

    #[test]
    fn upsert_updates_the_non_conflicting_columns() {
        let database = database();
        let employee = Table::new("t_employee");
        let id = employee.column::<i64>("id");
        let name = employee.column::<String>("name");
        let salary = employee.column::<i64>("salary");
        let expression = insert_or_update_expression(&employee, |v| {
            v.set(&id, 1).set(&name, "vince").set(&salary, 1000);
            v.on_conflict(id.clone());
        })
        .unwrap();
        assert_eq!(
            format(&database, &expression),
            "INSERT INTO t_employee (id, name, salary) VALUES (?, ?, ?) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, salary = EXCLUDED.salary"
        );
    }

    #[test]
    fn upsert_with_explicit_updates_and_returning() {
        let database = Database::offline(PostgresDialect::new())
            .beautify(true, 2)
            .build()
            .unwrap();
        let employee = Table::new("t_employee");
        let id = employee.column::<i64>("id");
        let name = employee.column::<String>("name");
        let salary = employee.column::<i64>("salary");
        let expression = insert_or_update_expression(&employee, |v| {
            v.set(&id, 1).set(&name, "vince").set(&salary, 1000);
            v.on_conflict(id.clone())
                .do_update(|v| {
                    v.set_expr(&salary, excluded(&salary).plus_expr(salary.clone()));
                })
                .returning((id.clone(), salary.clone()));
        })
        .unwrap();
        assert_eq!(
            format(&database, &expression),
            indoc! {"
                INSERT INTO t_employee (id, name, salary) VALUES (?, ?, ?)
                ON CONFLICT (id) DO UPDATE SET salary = EXCLUDED.salary + salary
                RETURNING id, salary
            "}
            .trim()
        );
    }

    #[test]
    fn upsert_doing_nothing() {
        let database = database();
        let employee = Table::new("t_employee");
        let id = employee.column::<i64>("id");
        let name = employee.column::<String>("name");
        let expression = insert_or_update_expression(&employee, |v| {
            v.set(&id, 1).set(&name, "vince");
            v.do_nothing();
        })
        .unwrap();
        assert_eq!(
            format(&database, &expression),
            "INSERT INTO t_employee (id, name) VALUES (?, ?) ON CONFLICT DO NOTHING"
        );

        // Only the conflict target is inserted, nothing is left to update
        let expression = insert_or_update_expression(&employee, |v| {
            v.set(&id, 1);
            v.on_conflict(id.clone());
        })
        .unwrap();
        assert_eq!(
            format(&database, &expression),
            "INSERT INTO t_employee (id) VALUES (?) ON CONFLICT (id) DO NOTHING"
        );
    }

    #[test]
    fn upsert_update_requires_a_conflict_target() {
        let employee = Table::new("t_employee");
        let id = employee.column::<i64>("id");
        let name = employee.column::<String>("name");
        let result = insert_or_update_expression(&employee, |v| {
            v.set(&id, 1).set(&name, "vince");
        });
        assert!(result.is_err());
    }

    #[test]
    fn ilike() {
        let database = database();
        let employee = Table::new("t_employee").aliased("e");
        let name = employee.column::<String>("name");
        let query = database
            .from(&employee)
            .select(name.clone())
            .filter(name.ilike("vin%"));
        assert_eq!(
            query.sql().unwrap(),
            "SELECT e.name FROM t_employee e WHERE e.name ILIKE ?"
        );

        let query = database
            .from(&employee)
            .select(name.clone())
            .filter(name.not_ilike("%test%"));
        assert_eq!(
            query.sql().unwrap(),
            "SELECT e.name FROM t_employee e WHERE e.name NOT ILIKE ?"
        );
    }

    #[test]
    fn locking_clauses() {
        let database = database();
        let employee = Table::new("t_employee");
        let id = employee.column::<i64>("id");
        let query = database
            .from(&employee)
            .select(id.clone())
            .filter(id.eq(3))
            .for_update();
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_employee.id FROM t_employee WHERE t_employee.id = ? FOR UPDATE"
        );

        let query = database
            .from(&employee)
            .select(id.clone())
            .limit(5)
            .locking(
                LockingClause::new(LockingMode::ForNoKeyUpdate)
                    .of(&employee)
                    .nowait(),
            );
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_employee.id FROM t_employee LIMIT ? FOR NO KEY UPDATE OF t_employee NOWAIT"
        );

        let query = database.from(&employee).select(id.clone()).for_share();
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_employee.id FROM t_employee FOR SHARE"
        );
    }

    #[test]
    fn casts() {
        let database = database();
        let employee = Table::new("t_employee");
        let query = database.from(&employee).select((
            employee.column::<i32>("age").cast::<f64>(),
            employee.column::<String>("code").cast::<i32>(),
        ));
        assert_eq!(
            query.sql().unwrap(),
            "SELECT CAST(t_employee.age AS DOUBLE PRECISION), CAST(t_employee.code AS INTEGER) FROM t_employee"
        );
    }
}
