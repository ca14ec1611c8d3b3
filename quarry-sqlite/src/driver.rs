use crate::{SQLiteConnection, SQLiteDialect};
use quarry_core::{Connection, ConnectionSupplier, Database, DatabaseBuilder, Result};
use std::time::Duration;

/// Opens a new [`SQLiteConnection`] on every request.
///
/// ```rust,no_run
/// use quarry_sqlite::SQLiteDriver;
/// let database = SQLiteDriver::new("sqlite://data.sqlite?mode=rwc")
///     .database()
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SQLiteDriver {
    url: String,
    busy_timeout: Option<Duration>,
}

impl SQLiteDriver {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            busy_timeout: None,
        }
    }

    /// How long a statement waits on a locked database before failing with `SQLITE_BUSY`.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Builder of a database using this driver and the SQLite dialect.
    pub fn database(self) -> DatabaseBuilder {
        Database::builder(self).dialect(SQLiteDialect::new())
    }
}

impl ConnectionSupplier for SQLiteDriver {
    fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(SQLiteConnection::connect(
            &self.url,
            self.busy_timeout,
        )?))
    }
}
