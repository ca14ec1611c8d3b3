#[cfg(test)]
mod tests {
    use quarry::{
        ColumnMetadata, Connection, Database, DatabaseMetadata, DriverError,
        Error, Executor, Result, RowCursor, SqlError, Statement, Table, Transaction,
        TransactionIsolation, Value,
    };
    use std::{
        panic::{AssertUnwindSafe, catch_unwind},
        sync::{Arc, Mutex},
        vec,
    };

    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<String>>,
    }

    impl Journal {
        fn push(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    struct MockConnection {
        journal: Arc<Journal>,
        auto_commit: bool,
        isolation: TransactionIsolation,
    }

    impl Drop for MockConnection {
        fn drop(&mut self) {
            self.journal.push("close");
        }
    }

    impl Connection for MockConnection {
        fn prepare<'s>(&'s mut self, sql: &str) -> Result<Box<dyn Statement + 's>> {
            self.journal.push(format!("prepare {}", sql));
            Ok(Box::new(MockStatement {
                journal: self.journal.clone(),
                sql: sql.to_string(),
                parameters: Vec::new(),
                batch: 0,
            }))
        }
        fn metadata(&mut self) -> Result<DatabaseMetadata> {
            Ok(DatabaseMetadata {
                product_name: "Mock".into(),
                product_version: "1.0".into(),
                ..Default::default()
            })
        }
        fn auto_commit(&self) -> bool {
            self.auto_commit
        }
        fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
            self.journal.push(format!("auto_commit {}", auto_commit));
            self.auto_commit = auto_commit;
            Ok(())
        }
        fn transaction_isolation(&mut self) -> Result<TransactionIsolation> {
            Ok(self.isolation)
        }
        fn set_transaction_isolation(&mut self, isolation: TransactionIsolation) -> Result<()> {
            self.journal.push(format!("isolation {}", isolation));
            self.isolation = isolation;
            Ok(())
        }
        fn commit(&mut self) -> Result<()> {
            self.journal.push("commit");
            Ok(())
        }
        fn rollback(&mut self) -> Result<()> {
            self.journal.push("rollback");
            Ok(())
        }
        fn execute_script(&mut self, sql: &str) -> Result<()> {
            self.journal.push(format!("script {}", sql));
            Ok(())
        }
    }

    struct MockStatement {
        journal: Arc<Journal>,
        sql: String,
        parameters: Vec<Value>,
        batch: usize,
    }

    impl Statement for MockStatement {
        fn bind(&mut self, index: usize, value: &Value) -> Result<()> {
            if self.parameters.len() < index {
                self.parameters.resize(index, Value::Null);
            }
            self.parameters[index - 1] = value.clone();
            Ok(())
        }
        fn query<'s>(&'s mut self) -> Result<Box<dyn RowCursor + 's>> {
            self.journal.push("query");
            Ok(Box::new(MockCursor {
                columns: vec![ColumnMetadata::labeled("n")],
                rows: vec![vec![Value::Int64(Some(1))], vec![Value::Int64(Some(2))]].into_iter(),
            }))
        }
        fn execute_update(&mut self) -> Result<u64> {
            if self.sql.contains("t_broken") {
                return Err(DriverError::new(Some(42), "no such table: t_broken")
                    .with_sql(self.sql.clone())
                    .into());
            }
            self.journal.push("update");
            Ok(1)
        }
        fn add_batch(&mut self) -> Result<()> {
            self.parameters.clear();
            self.batch += 1;
            Ok(())
        }
        fn execute_batch(&mut self) -> Result<Vec<u64>> {
            self.journal.push(format!("batch {}", self.batch));
            Ok(vec![1; std::mem::take(&mut self.batch)])
        }
    }

    struct MockCursor {
        columns: Vec<ColumnMetadata>,
        rows: vec::IntoIter<Vec<Value>>,
    }

    impl RowCursor for MockCursor {
        fn columns(&self) -> &[ColumnMetadata] {
            &self.columns
        }
        fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
            Ok(self.rows.next())
        }
    }

    fn database(isolation: TransactionIsolation) -> (Database, Arc<Journal>) {
        let journal = Arc::new(Journal::default());
        let supplier = {
            let journal = journal.clone();
            move || -> Result<Box<dyn Connection>> {
                journal.push("connect");
                Ok(Box::new(MockConnection {
                    journal: journal.clone(),
                    auto_commit: true,
                    isolation,
                }))
            }
        };
        let database = Database::builder(supplier)
            .error_translator(|e| e.context("Translated"))
            .build()
            .unwrap();
        assert_eq!(journal.take(), ["connect", "close"]);
        (database, journal)
    }

    fn log_table() -> Table {
        Table::new("t_log")
    }

    fn write(executor: &impl Executor) -> Result<u64> {
        let table = log_table();
        executor.insert(&table, |v| {
            v.set(&table.column::<i64>("n"), 1);
        })
    }

    const INSERT: &str = "prepare INSERT INTO t_log (n) VALUES (?)";

    #[test]
    fn statements_without_transaction() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        assert_eq!(database.metadata().product_name, "Mock");
        write(&database).unwrap();
        database.delete_all(&log_table()).unwrap();
        assert_eq!(
            journal.take(),
            [
                "connect",
                INSERT,
                "update",
                "close",
                "connect",
                "prepare DELETE FROM t_log",
                "update",
                "close",
            ]
        );
    }

    #[test]
    fn commit_on_success() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        let result = database
            .use_transaction(|transaction| {
                write(transaction)?;
                write(transaction)?;
                Ok("done")
            })
            .unwrap();
        assert_eq!(result, "done");
        assert_eq!(
            journal.take(),
            [
                "connect",
                "auto_commit false",
                INSERT,
                "update",
                INSERT,
                "update",
                "commit",
                "auto_commit true",
                "close",
            ]
        );
    }

    #[test]
    fn connection_is_acquired_lazily() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        database.use_transaction(|_| Ok(())).unwrap();
        assert!(journal.take().is_empty());
    }

    #[test]
    fn rollback_on_error() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        let error = database
            .use_transaction(|transaction| {
                write(transaction)?;
                Err::<(), _>(Error::msg("Stop"))
            })
            .unwrap_err();
        assert_eq!(error.to_string(), "Stop");
        assert_eq!(
            journal.take(),
            [
                "connect",
                "auto_commit false",
                INSERT,
                "update",
                "rollback",
                "auto_commit true",
                "close",
            ]
        );
    }

    #[test]
    fn rollback_on_panic() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        let result = catch_unwind(AssertUnwindSafe(|| {
            database.use_transaction(|transaction| {
                write(transaction)?;
                if transaction.isolation().is_none() {
                    panic!("Unexpected state");
                }
                Ok(())
            })
        }));
        assert!(result.is_err());
        let events = journal.take();
        assert_eq!(
            &events[events.len() - 3..],
            ["rollback", "auto_commit true", "close"]
        );
    }

    #[test]
    fn nested_scopes_share_the_outer_transaction() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        database
            .use_transaction(|outer| {
                write(outer)?;
                outer.use_transaction(|inner| write(inner))?;
                outer.use_transaction(|inner| inner.use_transaction(|t| write(t)))?;
                Ok(())
            })
            .unwrap();
        let events = journal.take();
        assert_eq!(events.iter().filter(|v| *v == "connect").count(), 1);
        assert_eq!(events.iter().filter(|v| *v == "update").count(), 3);
        assert_eq!(events.iter().filter(|v| *v == "commit").count(), 1);

        let result = database.use_transaction(|outer| {
            write(outer)?;
            let _ = outer.use_transaction(|inner| {
                write(inner)?;
                Err::<(), _>(Error::msg("Inner failure"))
            });
            Err::<(), _>(Error::msg("Outer failure"))
        });
        assert!(result.is_err());
        let events = journal.take();
        assert!(!events.contains(&"commit".to_string()));
        assert_eq!(events.iter().filter(|v| *v == "rollback").count(), 1);
    }

    #[test]
    fn sessions() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        let table = log_table();
        let n = table.column::<i64>("n");
        let session = database.session();
        let values = session
            .from(&table)
            .select(n.clone())
            .map_rows(|v| v.get_column(&n))
            .unwrap();
        assert_eq!(values, [Some(1), Some(2)]);
        journal.take();

        database
            .use_transaction(|transaction| {
                let session = transaction.session();
                write(&session)?;
                session.use_transaction(|inner| write(inner))
            })
            .unwrap();
        let events = journal.take();
        assert_eq!(events.iter().filter(|v| *v == "connect").count(), 1);
        assert_eq!(events.iter().filter(|v| *v == "update").count(), 2);
        assert_eq!(events.iter().filter(|v| *v == "commit").count(), 1);
    }

    #[test]
    fn isolation_is_restored() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        database
            .use_transaction_with(TransactionIsolation::Serializable, |transaction| {
                let isolation = transaction.use_connection(|c| c.transaction_isolation())?;
                assert_eq!(isolation, TransactionIsolation::Serializable);
                write(transaction)
            })
            .unwrap();
        assert_eq!(
            journal.take(),
            [
                "connect",
                "isolation SERIALIZABLE",
                "auto_commit false",
                INSERT,
                "update",
                "commit",
                "isolation READ COMMITTED",
                "auto_commit true",
                "close",
            ]
        );

        // Nothing to change nor restore
        database
            .use_transaction_with(TransactionIsolation::ReadCommitted, |t| write(t))
            .unwrap();
        assert!(
            !journal
                .take()
                .iter()
                .any(|v| v.starts_with("isolation"))
        );
    }

    #[test]
    fn closed_transaction() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        let mut escaped: Option<Transaction> = None;
        database
            .use_transaction(|transaction| {
                escaped = Some(transaction.clone());
                Ok(())
            })
            .unwrap();
        let transaction = escaped.unwrap();
        assert!(transaction.is_closed());
        let error = write(&transaction).unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::TransactionClosed)
        );
        assert!(journal.take().is_empty());
    }

    #[test]
    fn driver_errors_are_translated() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        let error = database.delete_all(&Table::new("t_broken")).unwrap_err();
        assert_eq!(error.to_string(), "Translated");
        let driver = error.downcast_ref::<DriverError>().unwrap();
        assert_eq!(driver.code, Some(42));
        assert_eq!(driver.sql.as_deref(), Some("DELETE FROM t_broken"));
        journal.take();

        // Errors not coming from the driver are left alone
        let error = database
            .use_connection(|_| Err::<(), _>(Error::msg("Plain")))
            .unwrap_err();
        assert_eq!(error.to_string(), "Plain");

        // The transaction rolls back whatever the translation produced
        let error = database
            .use_transaction(|transaction| {
                write(transaction)?;
                transaction.delete_all(&Table::new("t_broken"))
            })
            .unwrap_err();
        assert_eq!(error.to_string(), "Translated");
        let events = journal.take();
        assert!(events.contains(&"rollback".to_string()));
        assert!(!events.contains(&"commit".to_string()));
    }

    #[test]
    fn batches_and_queries() {
        let (database, journal) = database(TransactionIsolation::ReadCommitted);
        let table = log_table();
        let n = table.column::<i64>("n");
        let counts = database
            .batch_insert(&table, |v| {
                for i in 0..3 {
                    v.item(|v| {
                        v.set(&n, i);
                    });
                }
            })
            .unwrap();
        assert_eq!(counts, [1, 1, 1]);
        assert_eq!(
            journal.take(),
            ["connect", INSERT, "batch 3", "close"]
        );

        let query = database.from(&table).select(n.clone());
        let values = query.map_rows(|v| v.get_column(&n)).unwrap();
        assert_eq!(values, [Some(1), Some(2)]);
        // The rows are fetched once
        assert_eq!(query.row_set().unwrap().len(), 2);
        assert_eq!(query.total_records_in_all_pages().unwrap(), 2);
        assert_eq!(
            journal.take(),
            ["connect", "prepare SELECT t_log.n FROM t_log", "query", "close"]
        );
    }
}
