use crate::{Schema, populate};
use quarry::{ColumnDeclaring, Database, Executor, SqlError, Table};

pub(crate) fn row_sets(database: &Database) {
    populate(database).expect("Could not populate the tables");
    let s = Schema::new();

    let query = database
        .from(&s.employee)
        .select((s.id.clone(), s.name.clone(), s.manager_id.clone()))
        .order_by([s.id.asc()]);
    let mut rows = query.row_set().unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.is_before_first());
    assert_eq!(
        rows.current_row()
            .unwrap_err()
            .downcast_ref::<SqlError>(),
        Some(&SqlError::InvalidCursorPosition)
    );
    assert!(rows.next());
    assert!(rows.is_first());
    assert_eq!(rows.get::<i32>(1).unwrap(), Some(1));
    assert_eq!(rows.get::<String>("NAME").unwrap(), Some("vince".into()));
    assert_eq!(rows.get::<i32>("manager_id").unwrap(), None);
    assert!(rows.was_null());
    assert!(rows.last());
    assert_eq!(rows.row(), 4);
    assert_eq!(rows.get_column(&s.name).unwrap(), Some("penny".into()));
    assert_eq!(rows.get_column(&s.manager_id).unwrap(), Some(3));
    assert!(!rows.was_null());
    assert!(rows.absolute(-3));
    assert_eq!(rows.get_column(&s.id).unwrap(), Some(2));
    assert!(rows.relative(1));
    assert_eq!(rows.get_column(&s.id).unwrap(), Some(3));
    assert!(!rows.relative(10));
    assert!(rows.is_after_last());
    assert!(rows.previous());
    assert!(rows.is_last());
    assert_eq!(
        rows.get::<i32>(4).unwrap_err().downcast_ref::<SqlError>(),
        Some(&SqlError::InvalidColumnIndex { index: 4, count: 3 })
    );
    assert!(rows.get::<i32>("salary").is_err());

    // The query caches its rows
    let again = query.row_set().unwrap();
    assert!(again.is_before_first());
    assert_eq!(again.len(), 4);

    // Both tables have a `name` column
    let e = Schema::aliased();
    let query = database
        .from(&e.employee)
        .inner_join(&e.department, e.employee_department_id.eq_expr(e.department_id.clone()))
        .select((e.name.clone(), e.department_name.clone()))
        .filter(e.id.eq(3));
    let mut rows = query.row_set().unwrap();
    assert!(rows.has_ambiguous_name("name"));
    assert!(rows.next());
    assert_eq!(rows.get_column(&e.name).unwrap(), Some("tom".into()));
    assert_eq!(
        rows.get_column(&e.department_name).unwrap(),
        Some("finance".into())
    );

    // Declared labels disambiguate without table metadata
    let query = database
        .from(&e.employee)
        .inner_join(&e.department, e.employee_department_id.eq_expr(e.department_id.clone()))
        .select((
            e.name.aliased("employee_name"),
            e.department_name.aliased("department_name"),
        ))
        .filter(e.id.eq(4));
    let rows = query
        .map_rows(|v| {
            Ok((
                v.get::<String>("employee_name")?,
                v.get::<String>("department_name")?,
            ))
        })
        .unwrap();
    assert_eq!(
        rows,
        [(Some("penny".to_string()), Some("finance".to_string()))]
    );

    // Every column of both tables, `id` and `name` appear twice
    let query = database
        .from(&e.employee)
        .inner_join(&e.department, e.employee_department_id.eq_expr(e.department_id.clone()))
        .select_all()
        .order_by([e.id.asc()]);
    let mut rows = query.row_set().unwrap();
    assert!(rows.has_ambiguous_name("id"));
    assert!(rows.has_ambiguous_name("NAME"));
    assert!(!rows.has_ambiguous_name("location"));
    let unknown_table = Table::new("t_unknown").column::<i32>("id");
    let mut ids = Vec::new();
    while rows.next() {
        let first = rows.get::<i32>("id").unwrap();
        assert_eq!(rows.get::<i32>("id").unwrap(), first);
        assert_eq!(rows.get_column(&unknown_table).unwrap(), first);
        assert_eq!(rows.get_column(&e.id).unwrap(), first);
        ids.push((first, rows.get_column(&e.department_id).unwrap()));
    }
    assert_eq!(
        ids,
        [(Some(1), Some(1)), (Some(2), Some(1)), (Some(3), Some(2)), (Some(4), Some(2))]
    );
}
