use crate::{Schema, populate};
use quarry::{
    BooleanExpression, ColumnDeclaring, Database, Executor, Expr, NumericExpression,
    TextExpression, case_when, exists, not_exists,
};

pub(crate) fn queries(database: &Database) {
    populate(database).expect("Could not populate the tables");
    let e = Schema::aliased();
    let m = {
        let employee = e.employee.aliased("m");
        (employee.column::<i32>("id"), employee.column::<String>("name"), employee)
    };

    // Self join through a left join, employees without a manager keep a NULL
    let managers = database
        .from(&e.employee)
        .left_join(&m.2, e.manager_id.eq_expr(m.0.clone()))
        .select((e.name.clone(), m.1.aliased("manager_name")))
        .order_by([e.id.asc()])
        .map_rows(|v| Ok((v.get_column(&e.name)?, v.get::<String>("manager_name")?)))
        .unwrap();
    assert_eq!(
        managers,
        [
            (Some("vince".to_string()), None),
            (Some("marry".to_string()), Some("vince".to_string())),
            (Some("tom".to_string()), None),
            (Some("penny".to_string()), Some("tom".to_string())),
        ]
    );

    // Conditions
    let names = |condition: Expr<bool>| {
        database
            .from(&e.employee)
            .select(e.name.clone())
            .filter(condition)
            .order_by([e.name.asc()])
            .map_rows(|v| Ok(v.get_column(&e.name)?.unwrap_or_default()))
            .unwrap()
    };
    assert_eq!(
        names(e.salary.between(60.0, 150.0)),
        ["penny".to_string(), "vince".to_string()]
    );
    assert_eq!(
        names(e.job.in_list(["director", "trainee"])),
        ["marry".to_string(), "tom".to_string()]
    );
    assert_eq!(
        names(e.manager_id.is_null().and(e.name.not_like("t%"))),
        ["vince".to_string()]
    );
    assert_eq!(
        names(e.salary.times(2.0).greater_eq(200.0).and(e.job.eq("engineer").not())),
        ["penny".to_string(), "tom".to_string()]
    );
    assert_eq!(
        names(e.id.not_in_list([1, 2, 3]).or(e.salary.unary_minus().less(-150.0))),
        ["penny".to_string(), "tom".to_string()]
    );

    // Grouping follows the builder calls, not the operator precedence
    let director = || e.job.eq("director");
    let well_paid = || e.salary.greater(150.0);
    let is_vince = || e.name.eq("vince");
    assert_eq!(
        names(director().and(well_paid()).or(is_vince())),
        ["tom".to_string(), "vince".to_string()]
    );
    assert_eq!(
        names(director().and(well_paid().or(is_vince()))),
        ["tom".to_string()]
    );
    assert_eq!(
        names(director().or(is_vince()).and(well_paid())),
        ["tom".to_string()]
    );
    assert_eq!(names(director().or(is_vince().and(well_paid()))), ["tom".to_string()]);
    assert_eq!(
        names(is_vince().or(director()).and(well_paid().not())),
        ["vince".to_string()]
    );

    // Sub-queries
    let department = database
        .from(&e.department)
        .select(e.department_id.clone())
        .filter(e.location.eq("Guangzhou"));
    assert_eq!(
        names(e.employee_department_id.in_query(&department)),
        ["marry".to_string(), "vince".to_string()]
    );
    let subordinates = database
        .from(&m.2)
        .select(m.0.clone())
        .filter(m.0.eq_expr(e.manager_id.clone()).not());
    assert_eq!(names(exists(&subordinates)).len(), 2);
    let managed = database
        .from(&m.2)
        .select_all()
        .filter(e.manager_id.eq_expr(m.0.clone()));
    assert_eq!(
        names(not_exists(&managed)),
        ["tom".to_string(), "vince".to_string()]
    );

    // Derived table
    let rich = database
        .from(&e.employee)
        .select((e.name.clone(), e.salary.clone()))
        .filter(e.salary.greater_eq(100.0))
        .as_subquery("rich");
    let count = database.from(&rich).select_all().row_set().unwrap().len();
    assert_eq!(count, 3);

    // Case
    let level = case_when::<String>()
        .when_value(e.salary.greater(150.0), "high")
        .when_value(e.salary.greater(60.0), "medium")
        .otherwise_value("low")
        .aliased("level");
    let levels = database
        .from(&e.employee)
        .select((e.name.clone(), level))
        .order_by([e.id.asc()])
        .map_rows(|v| v.get::<String>("level"))
        .unwrap();
    assert_eq!(
        levels,
        [
            Some("medium".to_string()),
            Some("low".to_string()),
            Some("high".to_string()),
            Some("medium".to_string()),
        ]
    );

    // Unions, ordered by the label of the left-most select
    let job = e.job.aliased("job_name");
    let union = database
        .from(&e.employee)
        .select(job.clone())
        .filter(e.employee_department_id.eq(1))
        .union(
            database
                .from(&e.employee)
                .select(job.clone())
                .filter(e.salary.greater(150.0)),
        )
        .order_by([job.desc()]);
    let jobs = union.map_rows(|v| v.get::<String>(1)).unwrap();
    assert_eq!(
        jobs,
        [
            Some("trainee".to_string()),
            Some("engineer".to_string()),
            Some("director".to_string()),
        ]
    );
    let union_all = database
        .from(&e.employee)
        .select(e.employee_department_id.clone())
        .union_all(database.from(&e.employee).select(e.employee_department_id.clone()));
    assert_eq!(union_all.row_set().unwrap().len(), 8);

    let distinct = database
        .from(&e.employee)
        .select_distinct(e.hire_date.clone())
        .row_set()
        .unwrap();
    assert_eq!(distinct.len(), 2);

    #[cfg(not(feature = "disable-full-join"))]
    {
        let joined = database
            .from(&e.employee)
            .full_join(&e.department, e.employee_department_id.eq_expr(e.department_id.plus(1)))
            .select((e.name.clone(), e.department_name.clone()))
            .row_set()
            .unwrap();
        // tom and penny match tech, vince and marry match nothing, finance matches nobody
        assert_eq!(joined.len(), 5);
    }

    #[cfg(not(feature = "disable-window-functions"))]
    window_functions(database);
}

#[cfg(not(feature = "disable-window-functions"))]
fn window_functions(database: &Database) {
    use quarry::{Window, dense_rank, lag, row_number};

    let e = Schema::aliased();
    let rows = database
        .from(&e.employee)
        .select((
            e.name.clone(),
            row_number()
                .over(
                    Window::new()
                        .partition_by(e.employee_department_id.clone())
                        .order_by(e.salary.desc()),
                )
                .aliased("rank_in_department"),
            dense_rank()
                .over(Window::new().order_by(e.hire_date.asc()))
                .aliased("seniority"),
            lag(e.name.clone(), 1, Some("-".to_string()))
                .over(Window::new().order_by(e.id.asc()))
                .aliased("previous_name"),
        ))
        .order_by([e.id.asc()])
        .map_rows(|v| {
            Ok((
                v.get_column(&e.name)?.unwrap_or_default(),
                v.get::<i64>("rank_in_department")?.unwrap_or_default(),
                v.get::<i64>("seniority")?.unwrap_or_default(),
                v.get::<String>("previous_name")?.unwrap_or_default(),
            ))
        })
        .unwrap();
    assert_eq!(
        rows,
        [
            ("vince".to_string(), 1, 1, "-".to_string()),
            ("marry".to_string(), 2, 2, "vince".to_string()),
            ("tom".to_string(), 1, 1, "marry".to_string()),
            ("penny".to_string(), 2, 2, "tom".to_string()),
        ]
    );
}
