#[cfg(test)]
mod tests {
    use quarry_core::{
        ColumnDeclaring, Connection, Executor, NumericExpression, Table, TransactionIsolation,
        Value,
    };
    use quarry_sqlite::{SQLiteConnection, SQLiteDriver, SQLiteExecutor, excluded};
    use quarry_tests::{init_logs, silent_logs};
    use std::{fs, path::Path, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        SQLiteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH), None)
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SQLiteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH), None)
            .expect("Could not open the database");
        fs::remove_file(DB_PATH)
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SQLiteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH), None).is_err(),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[test]
    fn wrong_url() {
        silent_logs! {
            assert!(SQLiteConnection::connect("mysql://some_value", None).is_err());
            assert!(SQLiteConnection::connect("sqlite://:memory:?mode=xyz", None).is_err());
            assert!(
                SQLiteConnection::connect("sqlite://:memory:?busy_timeout=soon", None).is_err()
            );
        }
    }

    #[test]
    fn memory_connection() {
        init_logs();
        let mut connection = SQLiteConnection::connect("sqlite://:memory:", None)
            .expect("Could not open the in memory database");
        assert!(connection.auto_commit());
        let metadata = connection.metadata().unwrap();
        assert_eq!(metadata.product_name, "SQLite");
        assert!(!metadata.product_version.is_empty());
        assert_eq!(
            connection.transaction_isolation().unwrap(),
            TransactionIsolation::Serializable
        );
        connection
            .set_transaction_isolation(TransactionIsolation::ReadUncommitted)
            .unwrap();
        assert_eq!(
            connection.transaction_isolation().unwrap(),
            TransactionIsolation::ReadUncommitted
        );
        silent_logs! {
            assert!(
                connection
                    .set_transaction_isolation(TransactionIsolation::RepeatableRead)
                    .is_err()
            );
        }
        connection
            .execute_script("CREATE TABLE t_value (id INTEGER PRIMARY KEY, label TEXT);")
            .unwrap();
        {
            let mut statement = connection
                .prepare("INSERT INTO t_value (id, label) VALUES (?, ?)")
                .unwrap();
            statement.bind(1, &Value::Int64(Some(1))).unwrap();
            statement.bind(2, &Value::Varchar(Some("one".into()))).unwrap();
            statement.add_batch().unwrap();
            statement.bind(1, &Value::Int64(Some(2))).unwrap();
            statement.bind(2, &Value::Varchar(None)).unwrap();
            statement.add_batch().unwrap();
            assert_eq!(statement.execute_batch().unwrap(), [1, 1]);
        }
        let mut statement = connection
            .prepare("SELECT v.id, v.label AS name FROM t_value v ORDER BY v.id")
            .unwrap();
        let mut cursor = statement.query().unwrap();
        let columns = cursor.columns().to_vec();
        assert_eq!(columns[0].label, "id");
        assert_eq!(columns[0].table_name, "t_value");
        assert_eq!(columns[1].label, "name");
        assert_eq!(columns[1].name, "label");
        assert_eq!(columns[1].type_name, "TEXT");
        assert_eq!(
            cursor.next_row().unwrap(),
            Some(vec![Value::Int64(Some(1)), Value::Varchar(Some("one".into()))])
        );
        assert_eq!(
            cursor.next_row().unwrap(),
            Some(vec![Value::Int64(Some(2)), Value::Null])
        );
        assert_eq!(cursor.next_row().unwrap(), None);
    }

    #[test]
    fn multiple_statements_are_rejected() {
        let mut connection = SQLiteConnection::connect("sqlite://:memory:", None).unwrap();
        silent_logs! {
            assert!(connection.prepare("SELECT 1; SELECT 2").is_err());
            assert!(connection.prepare("SELECT * FROM missing_table").is_err());
        }
        assert!(connection.prepare("SELECT 1;  ").is_ok());
    }

    #[test]
    fn manual_transactions() {
        let mut connection = SQLiteConnection::connect("sqlite://:memory:", None).unwrap();
        connection
            .execute_script("CREATE TABLE t_counter (value INTEGER);")
            .unwrap();
        connection.set_auto_commit(false).unwrap();
        connection
            .prepare("INSERT INTO t_counter VALUES (1)")
            .unwrap()
            .execute_update()
            .unwrap();
        connection.rollback().unwrap();
        connection
            .prepare("INSERT INTO t_counter VALUES (2)")
            .unwrap()
            .execute_update()
            .unwrap();
        connection.commit().unwrap();
        connection.set_auto_commit(true).unwrap();
        let mut statement = connection.prepare("SELECT value FROM t_counter").unwrap();
        let mut cursor = statement.query().unwrap();
        assert_eq!(
            cursor.next_row().unwrap(),
            Some(vec![Value::Int64(Some(2))])
        );
        assert_eq!(cursor.next_row().unwrap(), None);
    }

    #[test]
    fn upsert() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/upsert.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        let database = SQLiteDriver::new(format!("sqlite://{}?mode=rwc", DB_PATH))
            .database()
            .build()
            .unwrap();
        database
            .use_connection(|c| {
                c.execute_script(
                    "CREATE TABLE t_stock (code TEXT PRIMARY KEY, quantity INTEGER NOT NULL);",
                )
            })
            .unwrap();
        let stock = Table::new("t_stock");
        let code = stock.column::<String>("code");
        let quantity = stock.column::<i64>("quantity");
        let inserted = database
            .insert_or_update(&stock, |v| {
                v.set(&code, "A-1").set(&quantity, 5);
                v.on_conflict(code.clone());
            })
            .unwrap();
        assert_eq!(inserted, 1);
        database
            .insert_or_update(&stock, |v| {
                v.set(&code, "A-1").set(&quantity, 3);
                v.on_conflict(code.clone()).do_update(|v| {
                    v.set_expr(&quantity, quantity.plus_expr(excluded(&quantity)));
                });
            })
            .unwrap();
        database
            .insert_or_update(&stock, |v| {
                v.set(&code, "A-1").set(&quantity, 100);
                v.do_nothing();
            })
            .unwrap();
        let rows = database
            .from(&stock)
            .select(quantity.clone())
            .filter(code.eq("A-1"))
            .map_rows(|v| v.get_column(&quantity))
            .unwrap();
        assert_eq!(rows, [Some(8)]);
    }
}
