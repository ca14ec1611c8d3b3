use crate::{Schema, populate};
use quarry::{ColumnDeclaring, Database, Executor};

pub(crate) fn limits(database: &Database) {
    populate(database).expect("Could not populate the tables");
    let e = Schema::aliased();

    let page = |offset: u64, limit: u64| {
        database
            .from(&e.employee)
            .select(e.name.clone())
            .order_by([e.id.asc()])
            .offset(offset)
            .limit(limit)
    };
    let first = page(0, 1);
    assert_eq!(
        first.map_rows(|v| v.get_column(&e.name)).unwrap(),
        [Some("vince".to_string())]
    );
    assert_eq!(first.total_records_in_all_pages().unwrap(), 4);
    let second = page(1, 2);
    assert_eq!(
        second.map_rows(|v| v.get_column(&e.name)).unwrap(),
        [Some("marry".to_string()), Some("tom".to_string())]
    );
    assert_eq!(second.total_records_in_all_pages().unwrap(), 4);
    let last = page(3, 10);
    assert_eq!(last.row_set().unwrap().len(), 1);
    assert_eq!(page(10, 10).row_set().unwrap().len(), 0);

    // Only an offset
    let skipped = database
        .from(&e.employee)
        .select(e.id.clone())
        .order_by([e.id.desc()])
        .offset(2)
        .map_rows(|v| v.get_column(&e.id))
        .unwrap();
    assert_eq!(skipped, [Some(2), Some(1)]);

    // Counting a grouped query wraps it
    let grouped = database
        .from(&e.employee)
        .select(e.hire_date.clone())
        .group_by(e.hire_date.clone())
        .limit(1);
    assert_eq!(grouped.row_set().unwrap().len(), 1);
    assert_eq!(grouped.total_records_in_all_pages().unwrap(), 2);

    // Without pagination the rows are counted directly
    let all = database
        .from(&e.employee)
        .select(e.id.clone())
        .filter(e.salary.greater_eq(100.0));
    assert_eq!(all.total_records_in_all_pages().unwrap(), 3);
    assert_eq!(all.row_set().unwrap().len(), 3);
}
