#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{
        AliasRemover, BooleanExpression, ColumnDeclaring, Database, Executor, ExpressionVisitor,
        NumericExpression, SqlError, Table, Value,
    };
    use quarry_mysql::{
        LockingClause, LockingMode, MySQLDialect, MySQLQuery, MySQLQuerySource,
        MySQLTextExpression, SearchModifier, default_value, insert_or_update_expression,
        match_against,
    };

    fn database() -> Database {
        Database::offline(MySQLDialect::new()).build().unwrap()
    }

    #[test]
    fn pagination_binds_offset_then_limit() {
        let database = database();
        let employee = Table::new("t_employee");
        let query = database
            .from(&employee)
            .select(employee.column::<String>("name"))
            .limit(10)
            .offset(20);
        let (sql, arguments) = query.sql_with_arguments().unwrap();
        assert_eq!(sql, "SELECT t_employee.name FROM t_employee LIMIT ?, ?");
        let values = arguments.iter().map(|v| v.value.clone()).collect::<Vec<_>>();
        assert_eq!(values, [Value::Int64(Some(20)), Value::Int64(Some(10))]);

        let query = database
            .from(&employee)
            .select(employee.column::<String>("name"))
            .offset(5);
        let (sql, arguments) = query.sql_with_arguments().unwrap();
        assert_eq!(sql, "SELECT t_employee.name FROM t_employee LIMIT ?, ?");
        assert_eq!(arguments[0].value, Value::Int64(Some(5)));
        assert_eq!(arguments[1].value, Value::Int64(Some(i64::MAX)));
    }

    #[test]
    fn identifiers_use_backticks() {
        let database = database();
        let order = Table::new("order").aliased("o");
        let query = database
            .from(&order)
            .select(order.column::<i64>("key"))
            .filter(order.column::<String>("Status").eq("open"));
        assert_eq!(
            query.sql().unwrap(),
            "SELECT o.`key` FROM `order` o WHERE o.Status = ?"
        );
    }

    #[test]
    fn insert_or_update_reuses_the_inserted_values() {
        let database = database();
        let employee = Table::new("t_employee");
        let id = employee.column::<i64>("id");
        let name = employee.column::<String>("name");
        let expression = insert_or_update_expression(&employee, |v| {
            v.set(&id, 1).set(&name, "vince");
        })
        .unwrap();
        let (sql, arguments) = database
            .format_expression(&AliasRemover.visit(&expression).unwrap())
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO t_employee (id, name) VALUES (?, ?) ON DUPLICATE KEY UPDATE id = ?, name = ?"
        );
        assert_eq!(arguments.len(), 4);
    }

    #[test]
    fn insert_or_update_with_explicit_updates() {
        let database = Database::offline(MySQLDialect::new())
            .beautify(true, 2)
            .build()
            .unwrap();
        let employee = Table::new("t_employee");
        let id = employee.column::<i64>("id");
        let name = employee.column::<String>("name");
        let salary = employee.column::<i64>("salary");
        let expression = insert_or_update_expression(&employee, |v| {
            v.set(&id, 1).set(&name, "vince").set(&salary, 1000);
            v.on_duplicate_key(|v| {
                v.set_expr(&salary, salary.plus(100));
            });
        })
        .unwrap();
        let (sql, arguments) = database
            .format_expression(&AliasRemover.visit(&expression).unwrap())
            .unwrap();
        assert_eq!(
            sql,
            indoc! {"
                INSERT INTO t_employee (id, name, salary) VALUES (?, ?, ?)
                ON DUPLICATE KEY UPDATE salary = salary + ?
            "}
            .trim()
        );
        assert_eq!(arguments[3].value, Value::Int64(Some(100)));
    }

    #[test]
    fn insert_or_update_without_assignments() {
        let employee = Table::new("t_employee");
        let error = insert_or_update_expression(&employee, |_| {}).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::EmptyAssignments(..))
        ));
    }

    #[test]
    fn default_value_in_assignments() {
        let database = database();
        let employee = Table::new("t_employee");
        let expression = insert_or_update_expression(&employee, |v| {
            v.set(&employee.column::<i64>("id"), 7)
                .set_expr(&employee.column::<i64>("salary"), default_value::<i64>());
        })
        .unwrap();
        let (sql, _) = database
            .format_expression(&AliasRemover.visit(&expression).unwrap())
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO t_employee (id, salary) VALUES (?, DEFAULT) ON DUPLICATE KEY UPDATE id = ?, salary = DEFAULT"
        );
    }

    #[test]
    fn natural_join() {
        let database = database();
        let employee = Table::new("t_employee");
        let department = Table::new("t_department");
        let query = database
            .from(&employee)
            .natural_join(&department)
            .select((employee.column::<String>("name"), department.column::<String>("location")));
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_employee.name, t_department.location FROM t_employee NATURAL JOIN t_department"
        );
    }

    #[test]
    fn full_text_search() {
        let database = database();
        let book = Table::new("t_book");
        let title = book.column::<String>("title");
        let query = database
            .from(&book)
            .select(title.clone())
            .filter(
                match_against(
                    (title.clone(), book.column::<String>("summary")),
                    "+rust -java",
                    Some(SearchModifier::BooleanMode),
                )
                .and(book.column::<i64>("pages").greater(100)),
            );
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_book.title FROM t_book WHERE MATCH (t_book.title, t_book.summary) AGAINST (? IN BOOLEAN MODE) AND (t_book.pages > ?)"
        );

        let query = database
            .from(&book)
            .select(title.clone())
            .filter(title.matches("database", None));
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_book.title FROM t_book WHERE MATCH (t_book.title) AGAINST (?)"
        );
    }

    #[test]
    fn locking_clauses() {
        let database = database();
        let employee = Table::new("t_employee");
        let department = Table::new("t_department");
        let id = employee.column::<i64>("id");
        let query = database
            .from(&employee)
            .select(id.clone())
            .filter(id.eq(1))
            .for_update();
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_employee.id FROM t_employee WHERE t_employee.id = ? FOR UPDATE"
        );

        let query = database
            .from(&employee)
            .inner_join(
                &department,
                employee
                    .column::<i64>("department_id")
                    .eq_expr(department.column::<i64>("id")),
            )
            .select(id.clone())
            .locking(
                LockingClause::new(LockingMode::ForShare)
                    .of(&employee)
                    .skip_locked(),
            );
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_employee.id FROM t_employee INNER JOIN t_department ON t_employee.department_id = t_department.id FOR SHARE OF t_employee SKIP LOCKED"
        );

        let query = database
            .from(&employee)
            .select(id.clone())
            .limit(1)
            .lock_in_share_mode();
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_employee.id FROM t_employee LIMIT ?, ? LOCK IN SHARE MODE"
        );
    }

    #[test]
    fn locking_a_union_is_an_error() {
        let database = database();
        let employee = Table::new("t_employee");
        let id = employee.column::<i64>("id");
        let query = database
            .from(&employee)
            .select(id.clone())
            .union(database.from(&employee).select(id.clone()))
            .for_update();
        let error = query.sql().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::NotASelect(..))
        ));
    }

    #[test]
    fn casts() {
        let database = database();
        let employee = Table::new("t_employee");
        let query = database.from(&employee).select((
            employee.column::<String>("code").cast::<i64>(),
            employee.column::<i64>("salary").cast::<String>(),
        ));
        assert_eq!(
            query.sql().unwrap(),
            "SELECT CAST(t_employee.code AS SIGNED), CAST(t_employee.salary AS CHAR) FROM t_employee"
        );
    }
}
