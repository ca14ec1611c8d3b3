use crate::{Schema, populate};
use quarry::{ColumnDeclaring, Database, Executor, NumericExpression, SqlError};

pub(crate) fn batch(database: &Database) {
    populate(database).expect("Could not populate the tables");
    let s = Schema::new();

    let counts = database
        .batch_insert(&s.employee, |v| {
            for (id, name) in [(10, "ann"), (11, "bob"), (12, "carl")] {
                v.item(|v| {
                    v.set(&s.id, id)
                        .set(&s.name, name)
                        .set(&s.job, "intern")
                        .set(&s.salary, 10.0)
                        .set(&s.employee_department_id, 2);
                });
            }
        })
        .expect("Could not insert the interns");
    assert_eq!(counts, [1, 1, 1]);

    let counts = database
        .batch_update(&s.employee, |v| {
            for (id, raise) in [(10, 1.0), (11, 2.0), (99, 3.0)] {
                v.item(|v| {
                    v.filter(s.id.eq(id))
                        .set_expr(&s.salary, s.salary.plus(raise));
                });
            }
        })
        .expect("Could not raise the interns");
    assert_eq!(counts, [1, 1, 0]);
    let salaries = database
        .from(&s.employee)
        .select(s.salary.clone())
        .filter(s.job.eq("intern"))
        .order_by([s.id.asc()])
        .map_rows(|v| v.get_column(&s.salary))
        .unwrap();
    assert_eq!(salaries, [Some(11.0), Some(12.0), Some(10.0)]);

    // Items must render to the same statement
    let error = database
        .batch_insert(&s.employee, |v| {
            v.item(|v| {
                v.set(&s.id, 20).set(&s.name, "dan");
            })
            .item(|v| {
                v.set(&s.id, 21).set(&s.job, "intern");
            });
        })
        .unwrap_err();
    assert!(matches!(
        error.downcast_ref::<SqlError>(),
        Some(SqlError::BatchStructureMismatch { .. })
    ));
    let error = database
        .bulk_insert(&s.employee, |v| {
            v.item(|v| {
                v.set(&s.id, 20).set(&s.name, "dan");
            })
            .item(|v| {
                v.set(&s.name, "eve").set(&s.id, 21);
            });
        })
        .unwrap_err();
    assert!(matches!(
        error.downcast_ref::<SqlError>(),
        Some(SqlError::BatchStructureMismatch { .. })
    ));
    assert_eq!(
        database.batch_insert(&s.employee, |_| {}).unwrap(),
        Vec::<u64>::new()
    );

    // Nothing was written by the failed batches
    let count = database
        .from(&s.employee)
        .select(s.id.clone())
        .filter(s.id.greater_eq(20))
        .row_set()
        .unwrap()
        .len();
    assert_eq!(count, 0);
    let deleted = database.delete(&s.employee, s.job.eq("intern")).unwrap();
    assert_eq!(deleted, 3);
}
