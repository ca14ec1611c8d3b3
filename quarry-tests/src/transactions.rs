use crate::{Schema, populate};
use quarry::{
    ColumnDeclaring, Database, Error, Executor, SqlError, Transaction,
    TransactionIsolation,
};

fn count_interns(executor: &impl Executor, s: &Schema) -> usize {
    executor
        .from(&s.employee)
        .select(s.id.clone())
        .filter(s.job.eq("intern"))
        .row_set()
        .unwrap()
        .len()
}

fn hire(executor: &impl Executor, s: &Schema, id: i32, name: &str) -> quarry::Result<u64> {
    executor.insert(&s.employee, |v| {
        v.set(&s.id, id).set(&s.name, name).set(&s.job, "intern");
    })
}

pub(crate) fn transactions(database: &Database) {
    populate(database).expect("Could not populate the tables");
    let s = Schema::new();

    // Committed when the closure succeeds
    database
        .use_transaction(|transaction| {
            hire(transaction, &s, 10, "ann")?;
            hire(transaction, &s, 11, "bob")?;
            assert_eq!(count_interns(transaction, &s), 2);
            Ok(())
        })
        .expect("The transaction should commit");
    assert_eq!(count_interns(database, &s), 2);

    // Rolled back when the closure fails
    let result = database.use_transaction(|transaction| {
        hire(transaction, &s, 12, "carl")?;
        assert_eq!(count_interns(transaction, &s), 3);
        Err::<(), _>(Error::msg("Abort"))
    });
    assert!(result.is_err());
    assert_eq!(count_interns(database, &s), 2);

    // A failing nested scope rolls back the outer one too
    let result = database.use_transaction(|outer| {
        hire(outer, &s, 13, "dan")?;
        outer.use_transaction(|inner| {
            hire(inner, &s, 14, "eve")?;
            Err::<(), _>(Error::msg("Inner abort"))
        })?;
        Ok(())
    });
    assert_eq!(result.unwrap_err().to_string(), "Inner abort");
    assert_eq!(count_interns(database, &s), 2);

    // The nested scope cannot commit on its own
    let result = database.use_transaction(|outer| {
        outer.use_transaction(|inner| hire(inner, &s, 15, "fay"))?;
        assert_eq!(count_interns(database, &s), 2);
        Err::<(), _>(Error::msg("Outer abort"))
    });
    assert!(result.is_err());
    assert_eq!(count_interns(database, &s), 2);

    // A session joins the current transaction or opens a new one
    let session = database.session();
    session
        .use_transaction(|transaction| {
            transaction
                .session()
                .use_transaction(|inner| hire(inner, &s, 16, "gus"))
        })
        .unwrap();
    assert_eq!(count_interns(database, &s), 3);

    // A closed transaction cannot run statements
    let mut escaped: Option<Transaction> = None;
    database
        .use_transaction(|transaction| {
            escaped = Some(transaction.clone());
            Ok(())
        })
        .unwrap();
    let escaped = escaped.expect("The transaction should have been captured");
    assert!(escaped.is_closed());
    let error = hire(&escaped, &s, 17, "hal").unwrap_err();
    assert_eq!(
        error.downcast_ref::<SqlError>(),
        Some(&SqlError::TransactionClosed)
    );

    // The isolation level is applied for the transaction only
    database
        .use_transaction_with(TransactionIsolation::ReadUncommitted, |transaction| {
            let isolation = transaction.use_connection(|c| c.transaction_isolation())?;
            assert_eq!(isolation, TransactionIsolation::ReadUncommitted);
            hire(transaction, &s, 18, "ivy")
        })
        .unwrap();
    assert_eq!(count_interns(database, &s), 4);

    database.delete(&s.employee, s.job.eq("intern")).unwrap();
}
