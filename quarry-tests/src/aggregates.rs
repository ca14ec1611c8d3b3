use crate::{Schema, populate};
use quarry::{ColumnDeclaring, Database, Executor, count_all, function};

pub(crate) fn aggregates(database: &Database) {
    populate(database).expect("Could not populate the tables");
    let e = Schema::aliased();

    let mut rows = database
        .from(&e.employee)
        .select((
            count_all().aliased("total"),
            e.manager_id.count().aliased("managed"),
            e.hire_date.count_distinct().aliased("hire_dates"),
            e.salary.sum().aliased("payroll"),
            e.salary.avg().aliased("average"),
            e.salary.max().aliased("highest"),
            e.name.min().aliased("first_name"),
        ))
        .row_set()
        .unwrap();
    assert!(rows.next());
    assert_eq!(rows.get::<i64>("total").unwrap(), Some(4));
    assert_eq!(rows.get::<i64>("managed").unwrap(), Some(2));
    assert_eq!(rows.get::<i64>("hire_dates").unwrap(), Some(2));
    assert_eq!(rows.get::<f64>("payroll").unwrap(), Some(450.0));
    assert_eq!(rows.get::<f64>("average").unwrap(), Some(112.5));
    assert_eq!(rows.get::<f64>("highest").unwrap(), Some(200.0));
    assert_eq!(rows.get::<String>("first_name").unwrap(), Some("marry".into()));
    assert!(!rows.next());

    // Grouping with a condition on the groups
    let payroll = e.salary.sum().aliased("payroll");
    let departments = database
        .from(&e.employee)
        .inner_join(&e.department, e.employee_department_id.eq_expr(e.department_id.clone()))
        .select((e.department_name.clone(), payroll.clone()))
        .group_by(e.department_name.clone())
        .having(e.salary.sum().greater(200.0))
        .order_by([e.department_name.asc()])
        .map_rows(|v| Ok((v.get_column(&e.department_name)?, v.get_column(&payroll)?)))
        .unwrap();
    assert_eq!(
        departments,
        [(Some("finance".to_string()), Some(300.0))]
    );

    // An aggregate over no rows
    let mut rows = database
        .from(&e.employee)
        .select((count_all().aliased("total"), e.salary.max().aliased("highest")))
        .filter(e.salary.greater(1000.0))
        .row_set()
        .unwrap();
    assert!(rows.next());
    assert_eq!(rows.get::<i64>(1).unwrap(), Some(0));
    assert_eq!(rows.get::<f64>(2).unwrap(), None);
    assert!(rows.was_null());

    // Generic function call
    let upper = function::<String>("upper", [e.name.as_expression()]).aliased("upper_name");
    let names = database
        .from(&e.employee)
        .select(upper.clone())
        .filter(e.id.less_eq(2))
        .order_by([e.id.asc()])
        .map_rows(|v| v.get_column(&upper))
        .unwrap();
    assert_eq!(
        names,
        [Some("VINCE".to_string()), Some("MARRY".to_string())]
    );
}
