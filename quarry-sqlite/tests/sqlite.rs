#[cfg(test)]
mod tests {
    use quarry_sqlite::SQLiteDriver;
    use quarry_tests::{execute_tests, init_logs};
    use std::{fs, path::Path, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn sqlite() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        let database = SQLiteDriver::new(format!("sqlite://{}?mode=rwc", DB_PATH))
            .database()
            .build()
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        assert_eq!(database.metadata().product_name, "SQLite");
        execute_tests(database);
    }
}
