use quarry::{
    BooleanExpression, Column, ColumnDeclaring, Database, Executor, NumericExpression, Result,
    SqlError, Table, TextExpression,
};
use time::{Date, macros::date};

const SCHEMA: &str = r#"
DROP TABLE IF EXISTS t_employee;
DROP TABLE IF EXISTS t_department;
DROP TABLE IF EXISTS t_value;
CREATE TABLE t_department (
    id INTEGER PRIMARY KEY,
    name VARCHAR(128) NOT NULL,
    location VARCHAR(128)
);
CREATE TABLE t_employee (
    id INTEGER PRIMARY KEY,
    name VARCHAR(128) NOT NULL,
    job VARCHAR(128),
    manager_id INTEGER,
    hire_date DATE,
    salary DOUBLE,
    department_id INTEGER
);
CREATE TABLE t_value (
    id INTEGER PRIMARY KEY,
    flag BOOLEAN,
    small SMALLINT,
    number INTEGER,
    big BIGINT,
    ratio DOUBLE,
    amount DECIMAL(20, 4),
    label VARCHAR(128),
    content BLOB,
    day DATE,
    moment TIME,
    stamp TIMESTAMP,
    stamp_tz TIMESTAMP,
    uid VARCHAR(36)
);
"#;

pub(crate) fn create_schema(database: &Database) -> Result<()> {
    database.use_connection(|connection| connection.execute_script(SCHEMA))
}

/// Tables and columns shared by the suites.
#[derive(Debug, Clone)]
pub struct Schema {
    pub department: Table,
    pub department_id: Column<i32>,
    pub department_name: Column<String>,
    pub location: Column<String>,
    pub employee: Table,
    pub id: Column<i32>,
    pub name: Column<String>,
    pub job: Column<String>,
    pub manager_id: Column<i32>,
    pub hire_date: Column<Date>,
    pub salary: Column<f64>,
    pub employee_department_id: Column<i32>,
}

impl Schema {
    pub fn new() -> Self {
        Self::with_tables(Table::new("t_department"), Table::new("t_employee"))
    }

    /// Same columns, reached through the aliases `d` and `e`.
    pub fn aliased() -> Self {
        Self::with_tables(
            Table::new("t_department").aliased("d"),
            Table::new("t_employee").aliased("e"),
        )
    }

    fn with_tables(department: Table, employee: Table) -> Self {
        Self {
            department_id: department.column("id"),
            department_name: department.column("name"),
            location: department.column("location"),
            id: employee.column("id"),
            name: employee.column("name"),
            job: employee.column("job"),
            manager_id: employee.column("manager_id"),
            hire_date: employee.column("hire_date"),
            salary: employee.column("salary"),
            employee_department_id: employee.column("department_id"),
            department,
            employee,
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// Reset both tables to two departments and four employees.
pub fn populate(database: &Database) -> Result<()> {
    let s = Schema::new();
    database.delete_all(&s.employee)?;
    database.delete_all(&s.department)?;
    database.bulk_insert(&s.department, |v| {
        v.item(|v| {
            v.set(&s.department_id, 1)
                .set(&s.department_name, "tech")
                .set(&s.location, "Guangzhou");
        })
        .item(|v| {
            v.set(&s.department_id, 2)
                .set(&s.department_name, "finance")
                .set(&s.location, "Beijing");
        });
    })?;
    let rows: [(i32, &str, &str, Option<i32>, Date, f64, i32); 4] = [
        (1, "vince", "engineer", None, date!(2018 - 01 - 01), 100.0, 1),
        (2, "marry", "trainee", Some(1), date!(2019 - 01 - 01), 50.0, 1),
        (3, "tom", "director", None, date!(2018 - 01 - 01), 200.0, 2),
        (4, "penny", "assistant", Some(3), date!(2019 - 01 - 01), 100.0, 2),
    ];
    database.bulk_insert(&s.employee, |v| {
        for (id, name, job, manager_id, hire_date, salary, department_id) in rows {
            v.item(|v| {
                v.set(&s.id, id)
                    .set(&s.name, name)
                    .set(&s.job, job)
                    .set(&s.hire_date, hire_date)
                    .set(&s.salary, salary)
                    .set(&s.employee_department_id, department_id);
                match manager_id {
                    Some(manager_id) => v.set(&s.manager_id, manager_id),
                    None => v.set_null(&s.manager_id),
                };
            });
        }
    })?;
    Ok(())
}

pub(crate) fn employees(database: &Database) {
    populate(database).expect("Could not populate the tables");
    let s = Schema::new();

    // Insert and read back the generated key
    let key = database
        .insert_and_generate_key::<i64>(&s.employee, |v| {
            v.set(&s.name, "jerry")
                .set(&s.job, "trainee")
                .set(&s.manager_id, 1)
                .set(&s.hire_date, date!(2024 - 03 - 15))
                .set(&s.salary, 40.0)
                .set(&s.employee_department_id, 1);
        })
        .expect("Could not insert jerry");
    assert_eq!(key, Some(5));

    // Update
    let updated = database
        .update(&s.employee, |v| {
            v.filter(s.job.eq("trainee"))
                .set_expr(&s.salary, s.salary.plus(10.0));
        })
        .expect("Could not raise the trainees");
    assert_eq!(updated, 2);
    let salaries = database
        .from(&s.employee)
        .select((s.name.clone(), s.salary.clone()))
        .filter(s.job.eq("trainee"))
        .order_by([s.id.asc()])
        .map_rows(|v| Ok((v.get_column(&s.name)?, v.get_column(&s.salary)?)))
        .unwrap();
    assert_eq!(
        salaries,
        [
            (Some("marry".to_string()), Some(60.0)),
            (Some("jerry".to_string()), Some(50.0)),
        ]
    );

    // Aliases are removed from the statement
    let e = Schema::aliased();
    let updated = database
        .update(&e.employee, |v| {
            v.filter(e.id.eq(5)).set(&e.job, "engineer");
        })
        .expect("Could not update through an alias");
    assert_eq!(updated, 1);

    // Nothing to update
    let error = database.update(&s.employee, |_| {}).unwrap_err();
    assert_eq!(
        error.downcast_ref::<SqlError>(),
        Some(&SqlError::EmptyAssignments("update"))
    );

    // Delete
    let deleted = database
        .delete(&s.employee, s.name.like("j%").and(s.id.greater(4)))
        .expect("Could not delete jerry");
    assert_eq!(deleted, 1);
    let deleted = database
        .delete(&s.employee, s.id.eq(5).or(s.salary.greater(1000.0)))
        .unwrap();
    assert_eq!(deleted, 0);
    let remaining = database.from(&s.employee).select_all().row_set().unwrap();
    assert_eq!(remaining.len(), 4);

    // Insert from a query
    let inserted = database
        .from(&s.employee)
        .select((s.id.plus(10), s.name.clone(), s.employee_department_id.clone()))
        .filter(s.employee_department_id.eq(2))
        .insert_to(
            &s.employee,
            (s.id.clone(), s.name.clone(), s.employee_department_id.clone()),
        )
        .unwrap();
    assert_eq!(inserted, 2);
    let copies = database
        .from(&s.employee)
        .select(s.name.clone())
        .filter(s.id.greater(10))
        .order_by([s.id.asc()])
        .map_rows(|v| v.get_column(&s.name))
        .unwrap();
    assert_eq!(
        copies,
        [Some("tom".to_string()), Some("penny".to_string())]
    );
}
