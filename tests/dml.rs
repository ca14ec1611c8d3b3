#[cfg(test)]
mod tests {
    use quarry::{
        AliasRemover, AnsiDialect, BooleanExpression, ColumnDeclaring, Database, Executor,
        ExprRef, ExpressionVisitor, InsertFromQueryExpression, NumericExpression, SqlError,
        SqlExpression, Table, TextExpression, Value, bulk_insert_expression, delete_expression,
        insert_expression, update_expression,
    };

    fn format(database: &Database, expression: &ExprRef) -> (String, Vec<Value>) {
        let expression = AliasRemover.visit(expression).unwrap();
        let (sql, arguments) = database.format_expression(&expression).unwrap();
        (sql, arguments.into_iter().map(|v| v.value).collect())
    }

    #[test]
    fn insert() {
        let database = Database::offline(AnsiDialect).build().unwrap();
        let employee = Table::new("t_employee").aliased("e");
        let id = employee.column::<i32>("id");
        let name = employee.column::<String>("name");
        let manager_id = employee.column::<i32>("manager_id");
        let expression = insert_expression(&employee, |v| {
            v.set(&id, 1).set(&name, "vince").set_null(&manager_id);
        })
        .unwrap();
        let (sql, values) = format(&database, &expression);
        assert_eq!(
            sql,
            "INSERT INTO t_employee (id, name, manager_id) VALUES (?, ?, ?)"
        );
        assert_eq!(
            values,
            [
                Value::Int32(Some(1)),
                Value::Varchar(Some("vince".into())),
                Value::Int32(None),
            ]
        );

        let expression = bulk_insert_expression(&employee, |v| {
            v.item(|v| {
                v.set(&id, 1).set(&name, "vince");
            })
            .item(|v| {
                v.set(&id, 2).set(&name, "marry");
            });
        })
        .unwrap();
        let (sql, values) = format(&database, &expression);
        assert_eq!(
            sql,
            "INSERT INTO t_employee (id, name) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn insert_from_query() {
        let database = Database::offline(AnsiDialect).build().unwrap();
        let employee = Table::new("t_employee").aliased("e");
        let id = employee.column::<i32>("id");
        let name = employee.column::<String>("name");
        let salary = employee.column::<f64>("salary");
        let history = Table::new("t_history").aliased("h");
        let query = database
            .from(&employee)
            .select((id.plus(100), name.clone()))
            .filter(salary.greater(100.0));
        let expression = SqlExpression::new(InsertFromQueryExpression {
            table: history.as_expression(),
            columns: vec![
                history.column::<i32>("id").as_expression(),
                history.column::<String>("name").as_expression(),
            ],
            query: query.expression().clone(),
        });
        // The aliases of the query are its own, they stay
        let (sql, values) = format(&database, &expression);
        assert_eq!(
            sql,
            "INSERT INTO t_history (id, name) SELECT e.id + ?, e.name FROM t_employee e WHERE e.salary > ?"
        );
        assert_eq!(
            values,
            [Value::Int32(Some(100)), Value::Float64(Some(100.0))]
        );
    }

    #[test]
    fn update() {
        let database = Database::offline(AnsiDialect).build().unwrap();
        let employee = Table::new("t_employee").aliased("e");
        let job = employee.column::<String>("job");
        let salary = employee.column::<f64>("salary");
        let expression = update_expression(&employee, |v| {
            v.filter(job.eq("trainee").and(salary.less(100.0)))
                .set_expr(&salary, salary.times(1.1))
                .set(&job, "engineer");
        })
        .unwrap();
        let (sql, values) = format(&database, &expression);
        assert_eq!(
            sql,
            "UPDATE t_employee SET salary = salary * ?, job = ? WHERE (job = ?) AND (salary < ?)"
        );
        assert_eq!(
            values,
            [
                Value::Float64(Some(1.1)),
                Value::Varchar(Some("engineer".into())),
                Value::Varchar(Some("trainee".into())),
                Value::Float64(Some(100.0)),
            ]
        );

        // Without a condition every row is updated
        let expression = update_expression(&employee, |v| {
            v.set(&salary, 0.0);
        })
        .unwrap();
        assert_eq!(format(&database, &expression).0, "UPDATE t_employee SET salary = ?");

        let error = update_expression(&employee, |v| {
            v.filter(job.eq("trainee"));
        })
        .unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::EmptyAssignments("update"))
        );
    }

    #[test]
    fn delete() {
        let database = Database::offline(AnsiDialect).build().unwrap();
        let employee = Table::new("t_employee").aliased("e");
        let name = employee.column::<String>("name");
        let id = employee.column::<i32>("id");
        let manager = Table::new("t_employee").aliased("m");
        let manager_id = manager.column::<i32>("manager_id");
        let managers = database
            .from(&manager)
            .select(manager_id.clone())
            .filter(manager_id.is_not_null());
        let expression = delete_expression(
            &employee,
            Some(name.like("j%").and(id.not_in_query(&managers)).as_expression()),
        );
        assert_eq!(
            format(&database, &expression).0,
            "DELETE FROM t_employee WHERE (name LIKE ?) AND (id NOT IN (SELECT m.manager_id FROM t_employee m WHERE m.manager_id IS NOT NULL))"
        );
        assert_eq!(
            format(&database, &delete_expression(&employee, None)).0,
            "DELETE FROM t_employee"
        );
    }

    #[test]
    fn execution_needs_a_connection() {
        let database = Database::offline(AnsiDialect).build().unwrap();
        let employee = Table::new("t_employee");
        let error = database.delete_all(&employee).unwrap_err();
        assert!(format!("{:#}", error).contains("offline"));
        assert!(error.downcast_ref::<SqlError>().is_none());
    }
}
