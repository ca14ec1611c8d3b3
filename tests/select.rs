#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry::{
        AnsiDialect, BooleanExpression, CaseWhen, Column, ColumnDeclaring, Database,
        DatabaseMetadata, Executor, FrameBound, KeywordCase, NumericExpression, SqlError, Table,
        TextExpression, Value, Window, case_when, count_expression, exists, function, lag,
        row_number, value,
    };
    use time::Date;

    fn database() -> Database {
        Database::offline(AnsiDialect).build().unwrap()
    }

    struct Employee {
        table: Table,
        id: Column<i32>,
        name: Column<String>,
        job: Column<String>,
        manager_id: Column<i32>,
        hire_date: Column<Date>,
        salary: Column<f64>,
        department_id: Column<i32>,
    }

    impl Employee {
        fn new(alias: &str) -> Self {
            let table = Table::new("t_employee").aliased(alias);
            Self {
                id: table.column("id"),
                name: table.column("name"),
                job: table.column("job"),
                manager_id: table.column("manager_id"),
                hire_date: table.column("hire_date"),
                salary: table.column("salary"),
                department_id: table.column("department_id"),
                table,
            }
        }
    }

    #[test]
    fn select_join_where() {
        let database = database();
        let e = Employee::new("e");
        let department = Table::new("t_department").aliased("d");
        let department_id = department.column::<i32>("id");
        let department_name = department.column::<String>("name");
        let query = database
            .from(&e.table)
            .inner_join(&department, e.department_id.eq_expr(department_id.clone()))
            .select((e.name.clone(), department_name.aliased("department")))
            .filter(
                e.salary
                    .greater(100.0)
                    .and(e.name.like("v%"))
                    .or(e.manager_id.is_null()),
            )
            .order_by([e.name.asc(), e.salary.desc()]);
        let (sql, arguments) = query.sql_with_arguments().unwrap();
        assert_eq!(
            sql,
            "SELECT e.name, d.name AS department FROM t_employee e INNER JOIN t_department d ON e.department_id = d.id WHERE ((e.salary > ?) AND (e.name LIKE ?)) OR (e.manager_id IS NULL) ORDER BY e.name, e.salary DESC"
        );
        let values = arguments.iter().map(|v| v.value.clone()).collect::<Vec<_>>();
        assert_eq!(
            values,
            [Value::Float64(Some(100.0)), Value::Varchar(Some("v%".into()))]
        );
        // Computed once
        assert!(std::ptr::eq(query.sql().unwrap(), query.sql().unwrap()));
    }

    #[test]
    fn select_every_clause() {
        let database = database();
        let e = Employee::new("e");
        let query = database
            .from(&e.table)
            .select_distinct((e.job.clone(), e.salary.sum().aliased("payroll")))
            .filter(e.hire_date.between(
                Date::from_ordinal_date(2018, 1).unwrap(),
                Date::from_ordinal_date(2019, 365).unwrap(),
            ))
            .group_by(e.job.clone())
            .having(e.salary.sum().greater_eq(100.0))
            .order_by([e.salary.sum().desc()]);
        assert_eq!(
            query.sql().unwrap(),
            "SELECT DISTINCT e.job, SUM(e.salary) AS payroll FROM t_employee e WHERE e.hire_date BETWEEN ? AND ? GROUP BY e.job HAVING SUM(e.salary) >= ? ORDER BY SUM(e.salary) DESC"
        );

        let query = database.from(&e.table).select_all().filter(
            e.id.not_in_list([1, 2])
                .and(e.job.not_like("t%"))
                .and(e.salary.unary_minus().less(-10.0)),
        );
        assert_eq!(
            query.sql().unwrap(),
            "SELECT * FROM t_employee e WHERE ((e.id NOT IN (?, ?)) AND (e.job NOT LIKE ?)) AND ((-e.salary) < ?)"
        );
        assert_eq!(query.sql_with_arguments().unwrap().1.len(), 4);
    }

    #[test]
    fn identifiers_are_quoted_when_needed() {
        let database = database();
        let order = Table::new("order");
        let query = database.from(&order).select((
            order.column::<i32>("value"),
            order.column::<String>("Full Name"),
            order.column::<String>("FullName"),
            order.column::<i32>("2nd"),
        ));
        assert_eq!(
            query.sql().unwrap(),
            r#"SELECT "order"."value", "order"."Full Name", "order".FullName, "order"."2nd" FROM "order""#
        );

        let quoted = Database::offline(AnsiDialect)
            .always_quote_identifiers(true)
            .keyword_case(KeywordCase::Lower)
            .build()
            .unwrap();
        let employee = Table::new("t_employee");
        let query = quoted
            .from(&employee)
            .select(employee.column::<String>("name"))
            .filter(employee.column::<i32>("id").eq(1));
        assert_eq!(
            query.sql().unwrap(),
            r#"select "t_employee"."name" from "t_employee" where "t_employee"."id" = ?"#
        );
    }

    #[test]
    fn column_names_length() {
        let metadata = DatabaseMetadata {
            max_column_name_length: 8,
            ..Default::default()
        };
        let database = Database::offline(AnsiDialect)
            .metadata(metadata)
            .build()
            .unwrap();
        let e = Employee::new("e");
        assert!(database.from(&e.table).select(e.salary.clone()).sql().is_ok());
        let error = database
            .from(&e.table)
            .select(e.salary.aliased("total_salary"))
            .sql()
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::IdentifierTooLong {
                name: "total_salary".into(),
                max: 8
            })
        );
        let error = database
            .from(&e.table)
            .select(e.hire_date.clone())
            .sql()
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::IdentifierTooLong { .. })
        ));
    }

    #[test]
    fn beautified_subqueries() {
        let database = Database::offline(AnsiDialect)
            .beautify(true, 4)
            .build()
            .unwrap();
        let e = Employee::new("e");
        let m = Employee::new("m");
        let managed = database
            .from(&m.table)
            .select(m.id.clone())
            .filter(m.manager_id.eq_expr(e.id.clone()));
        let query = database
            .from(&e.table)
            .select(e.name.clone())
            .filter(exists(&managed))
            .order_by([e.name.asc()]);
        assert_eq!(
            query.sql().unwrap(),
            indoc! {"
                SELECT e.name
                FROM t_employee e
                WHERE EXISTS (
                    SELECT m.id
                    FROM t_employee m
                    WHERE m.manager_id = e.id
                )
                ORDER BY e.name"}
        );

        let rich = database
            .from(&e.table)
            .select((e.id.clone(), e.salary.clone()))
            .filter(e.salary.greater(100.0))
            .as_subquery("rich");
        let rich_id = Table::new("rich").column::<i32>("id");
        let query = database.from(&rich).select(rich_id.clone());
        assert_eq!(
            query.sql().unwrap(),
            indoc! {"
                SELECT rich.id
                FROM (
                    SELECT e.id, e.salary
                    FROM t_employee e
                    WHERE e.salary > ?
                ) rich"}
        );
    }

    #[test]
    fn functions_and_windows() {
        let database = database();
        let e = Employee::new("e");
        let level = case_when::<String>()
            .when_value(e.salary.greater(150.0), "high")
            .when_value(e.salary.greater(75.0), "medium")
            .otherwise_value("low")
            .aliased("level");
        let query = database.from(&e.table).select((
            level,
            e.salary.cast::<i64>().aliased("rounded"),
            function::<String>("lower", [e.name.as_expression()]),
            CaseWhen::<i32>::on(e.job.clone())
                .when_value(value("director".to_string()), 1)
                .end(),
        ));
        assert_eq!(
            query.sql().unwrap(),
            "SELECT CASE WHEN e.salary > ? THEN ? WHEN e.salary > ? THEN ? ELSE ? END AS level, CAST(e.salary AS BIGINT) AS rounded, lower(e.name), CASE e.job WHEN ? THEN ? END FROM t_employee e"
        );

        let query = database.from(&e.table).select((
            row_number()
                .over(
                    Window::new()
                        .partition_by(e.department_id.clone())
                        .order_by(e.salary.desc()),
                )
                .aliased("seniority"),
            e.salary
                .sum()
                .over(
                    Window::new()
                        .order_by(e.id.asc())
                        .rows_between(FrameBound::UnboundedPreceding, FrameBound::CurrentRow),
                )
                .aliased("running_total"),
            lag(e.name.clone(), 1, Some("nobody".into()))
                .over(Window::new().order_by(e.id.asc()))
                .aliased("previous_name"),
            e.salary
                .avg()
                .over(
                    Window::new().rows_between(FrameBound::preceding(1), FrameBound::following(1)),
                ),
        ));
        let (sql, arguments) = query.sql_with_arguments().unwrap();
        assert_eq!(
            sql,
            "SELECT ROW_NUMBER() OVER (PARTITION BY e.department_id ORDER BY e.salary DESC) AS seniority, SUM(e.salary) OVER (ORDER BY e.id ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS running_total, LAG(e.name, ?, ?) OVER (ORDER BY e.id) AS previous_name, AVG(e.salary) OVER (ROWS BETWEEN ? PRECEDING AND ? FOLLOWING) FROM t_employee e"
        );
        let values = arguments.iter().map(|v| v.value.clone()).collect::<Vec<_>>();
        assert_eq!(
            values,
            [
                Value::Int64(Some(1)),
                Value::Varchar(Some("nobody".into())),
                Value::Int64(Some(1)),
                Value::Int64(Some(1)),
            ]
        );
    }

    #[test]
    fn unions() {
        let database = database();
        let e = Employee::new("e");
        let job_name = e.job.aliased("job_name");
        let paid = database
            .from(&e.table)
            .select(job_name.clone())
            .filter(e.salary.greater(100.0));
        let unmanaged = database
            .from(&e.table)
            .select(job_name.clone())
            .filter(e.manager_id.is_null());
        let union = paid.clone().union(unmanaged.clone()).order_by([job_name.desc()]);
        assert_eq!(
            union.sql().unwrap(),
            "(SELECT e.job AS job_name FROM t_employee e WHERE e.salary > ?) UNION (SELECT e.job AS job_name FROM t_employee e WHERE e.manager_id IS NULL) ORDER BY job_name DESC"
        );
        let union = paid.union_all(unmanaged);
        assert_eq!(
            union.sql().unwrap(),
            "(SELECT e.job AS job_name FROM t_employee e WHERE e.salary > ?) UNION ALL (SELECT e.job AS job_name FROM t_employee e WHERE e.manager_id IS NULL)"
        );

        // Select only operations are rejected on a union, lazily
        let filtered = union.clone().filter(e.id.eq(1)).order_by([job_name.asc()]);
        let error = filtered.sql().unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::NotASelect("filter"))
        );
        let error = union.group_by(e.job.clone()).row_set().unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::NotASelect("group_by"))
        );
    }

    #[test]
    fn pagination_requires_a_dialect() {
        let database = database();
        let e = Employee::new("e");
        let error = database
            .from(&e.table)
            .select(e.name.clone())
            .limit(10)
            .sql()
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::PaginationNotSupported("ANSI"))
        );
        assert!(
            database
                .from(&e.table)
                .select(e.name.clone())
                .offset(1)
                .sql()
                .is_err()
        );
    }

    #[test]
    fn counting_ignores_pagination() {
        let database = database();
        let e = Employee::new("e");
        let format = |query: &quarry::Query| {
            let count = count_expression(query.expression()).unwrap();
            database.format_expression(&count).unwrap().0
        };

        let query = database
            .from(&e.table)
            .select(e.name.clone())
            .filter(e.salary.greater(100.0))
            .order_by([e.name.asc()])
            .offset(0)
            .limit(1);
        assert_eq!(
            format(&query),
            "SELECT COUNT(*) FROM t_employee e WHERE e.salary > ?"
        );

        let query = database
            .from(&e.table)
            .select(e.hire_date.clone())
            .group_by(e.hire_date.clone())
            .limit(1);
        assert_eq!(
            format(&query),
            "SELECT COUNT(*) FROM (SELECT e.hire_date FROM t_employee e GROUP BY e.hire_date) tmp_count"
        );

        // Ordering terms binding arguments stay, the parameters would not line up otherwise
        let query = database
            .from(&e.table)
            .select(e.name.clone())
            .order_by([case_when::<i64>()
                .when_value(e.name.eq("vince"), 0)
                .otherwise_value(1)
                .asc()])
            .limit(2);
        let count = count_expression(query.expression()).unwrap();
        let (sql, arguments) = database.format_expression(&count).unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM t_employee e ORDER BY (CASE WHEN e.name = ? THEN ? ELSE ? END)"
        );
        assert_eq!(arguments.len(), 3);

        let paid = database.from(&e.table).select(e.name.clone());
        let union = paid.clone().union(paid).limit(3);
        assert_eq!(
            format(&union),
            "SELECT COUNT(*) FROM ((SELECT e.name FROM t_employee e) UNION (SELECT e.name FROM t_employee e)) tmp_count"
        );
    }

    #[test]
    fn queries_are_immutable() {
        let database = database();
        let e = Employee::new("e");
        let base = database.from(&e.table).select(e.name.clone());
        let filtered = base.clone().filter(e.id.eq(1));
        let refiltered = filtered.clone().filter(e.id.eq(2));
        assert_eq!(base.sql().unwrap(), "SELECT e.name FROM t_employee e");
        assert_eq!(
            filtered.sql().unwrap(),
            "SELECT e.name FROM t_employee e WHERE e.id = ?"
        );
        assert_eq!(
            refiltered.sql_with_arguments().unwrap().1[0].value,
            Value::Int32(Some(2))
        );
        assert_eq!(
            filtered.sql_with_arguments().unwrap().1[0].value,
            Value::Int32(Some(1))
        );
    }
}
