use crate::{CBox, SQLITE_KEYWORDS, SQLiteStatement, driver_error, error_message_from_ptr};
use libsqlite3_sys::{
    SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE,
    SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_busy_timeout, sqlite3_close, sqlite3_column_int64,
    sqlite3_exec, sqlite3_finalize, sqlite3_free, sqlite3_get_autocommit, sqlite3_libversion,
    sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_step, sqlite3_stmt,
};
use quarry_core::{
    Connection, Context, DatabaseMetadata, DriverError, Error, Result, Statement,
    TransactionIsolation, truncate_long,
};
use std::{
    ffi::{CStr, CString, c_int},
    ptr,
    time::Duration,
};
use urlencoding::decode;

pub const SQLITE_URL_PREFIX: &str = "sqlite://";

/// Metadata of every SQLite database, `url` aside.
pub fn sqlite_metadata(url: &str) -> DatabaseMetadata {
    let version = unsafe { error_message_from_ptr(sqlite3_libversion()) };
    DatabaseMetadata {
        product_name: "SQLite".into(),
        product_version: version,
        url: url.into(),
        keywords: SQLITE_KEYWORDS.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

/// A blocking connection to a SQLite database file.
///
/// Auto-commit is emulated: when disabled, a transaction is started with `BEGIN` right before
/// the next statement and ended by `commit` or `rollback`.
pub struct SQLiteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
    url: String,
    auto_commit: bool,
}

impl SQLiteConnection {
    /// Open `sqlite://path?mode=rwc`, the path is percent decoded.
    ///
    /// Supported parameters: `mode` (`ro`, `rw`, `rwc`, `memory`) and `busy_timeout` in
    /// milliseconds.
    pub fn connect(url: &str, busy_timeout: Option<Duration>) -> Result<SQLiteConnection> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let Some(rest) = url.strip_prefix(SQLITE_URL_PREFIX) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                SQLITE_URL_PREFIX
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = decode(path).with_context(context)?;
        let mut flags = SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE;
        let mut busy_timeout = busy_timeout;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "mode" => {
                    flags = match value.as_ref() {
                        "ro" => SQLITE_OPEN_READONLY,
                        "rw" => SQLITE_OPEN_READWRITE,
                        "rwc" | "memory" => SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE,
                        other => {
                            return Err(Error::msg(format!("Unknown mode `{}`", other))
                                .context(context()));
                        }
                    }
                }
                "busy_timeout" => {
                    let millis = value
                        .parse::<u64>()
                        .with_context(|| format!("Invalid busy_timeout `{}`", value))
                        .with_context(context)?;
                    busy_timeout = Some(Duration::from_millis(millis));
                }
                other => log::warn!("Ignoring the unknown sqlite url parameter `{}`", other),
            }
        }
        let path = if path.is_empty() { ":memory:" } else { path.as_ref() };
        let filename = CString::new(path).with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                filename.as_ptr(),
                &mut *connection,
                flags | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            if connection.is_null() {
                return Err(Error::msg(format!("Could not open the database (code {})", rc))
                    .context(context()));
            }
            return Err(driver_error(*connection, None).context(context()));
        }
        if let Some(timeout) = busy_timeout {
            let millis = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
            unsafe {
                sqlite3_busy_timeout(*connection, millis);
            }
        }
        log::debug!("Opened the sqlite database `{}`", path);
        Ok(SQLiteConnection {
            connection,
            url: url.into(),
            auto_commit: true,
        })
    }

    fn in_transaction(&self) -> bool {
        unsafe { sqlite3_get_autocommit(*self.connection) == 0 }
    }

    fn begin_if_needed(&mut self) -> Result<()> {
        if !self.auto_commit && !self.in_transaction() {
            self.execute_script("BEGIN")?;
        }
        Ok(())
    }

    fn prepare_raw(&mut self, sql: &str) -> Result<CBox<*mut sqlite3_stmt>> {
        let context = || format!("While preparing the query:\n{}", truncate_long!(sql));
        let query = CString::new(sql)
            .map_err(Error::new)
            .context("Could not create a CString from the query String")
            .with_context(context)?;
        let mut statement = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_finalize(p);
        });
        let mut tail = ptr::null();
        let rc = unsafe {
            sqlite3_prepare_v2(
                *self.connection,
                query.as_ptr(),
                -1,
                &mut *statement,
                &mut tail,
            )
        };
        if rc != SQLITE_OK {
            return Err(driver_error(*self.connection, Some(sql)));
        }
        if !tail.is_null() {
            let remaining = unsafe { CStr::from_ptr(tail) };
            if !remaining.to_bytes().iter().all(u8::is_ascii_whitespace) {
                let error = Error::msg("Cannot prepare more than one statement at a time")
                    .context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        if statement.is_null() {
            return Err(Error::msg("The query does not contain any statement").context(context()));
        }
        Ok(statement)
    }

    fn pragma(&mut self, name: &str) -> Result<i64> {
        let statement = self.prepare_raw(&format!("PRAGMA {}", name))?;
        match unsafe { sqlite3_step(*statement) } {
            SQLITE_ROW => Ok(unsafe { sqlite3_column_int64(*statement, 0) }),
            SQLITE_DONE => Err(Error::msg(format!("PRAGMA {} returned no value", name))),
            _ => Err(driver_error(*self.connection, Some(name))),
        }
    }
}

impl Connection for SQLiteConnection {
    fn prepare<'s>(&'s mut self, sql: &str) -> Result<Box<dyn Statement + 's>> {
        self.begin_if_needed()?;
        let statement = self.prepare_raw(sql)?;
        Ok(Box::new(SQLiteStatement::new(*self.connection, statement, sql)))
    }

    fn metadata(&mut self) -> Result<DatabaseMetadata> {
        Ok(sqlite_metadata(&self.url))
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        if auto_commit && !self.auto_commit && self.in_transaction() {
            self.execute_script("COMMIT")?;
        }
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn transaction_isolation(&mut self) -> Result<TransactionIsolation> {
        Ok(if self.pragma("read_uncommitted")? != 0 {
            TransactionIsolation::ReadUncommitted
        } else {
            TransactionIsolation::Serializable
        })
    }

    /// Only `READ UNCOMMITTED` (shared cache) and `SERIALIZABLE` exist in SQLite.
    fn set_transaction_isolation(&mut self, isolation: TransactionIsolation) -> Result<()> {
        match isolation {
            TransactionIsolation::ReadUncommitted => {
                self.execute_script("PRAGMA read_uncommitted = 1")
            }
            TransactionIsolation::Serializable => {
                self.execute_script("PRAGMA read_uncommitted = 0")
            }
            other => Err(DriverError::new(
                None,
                format!("SQLite does not support the transaction isolation {}", other),
            )
            .into()),
        }
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_transaction() {
            self.execute_script("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.in_transaction() {
            self.execute_script("ROLLBACK")?;
        }
        Ok(())
    }

    fn execute_script(&mut self, sql: &str) -> Result<()> {
        let script = CString::new(sql)
            .map_err(Error::new)
            .context("Could not create a CString from the script")?;
        let mut message = ptr::null_mut();
        let rc = unsafe {
            sqlite3_exec(
                *self.connection,
                script.as_ptr(),
                None,
                ptr::null_mut(),
                &mut message,
            )
        };
        if rc != SQLITE_OK {
            let text = error_message_from_ptr(message);
            unsafe {
                sqlite3_free(message as *mut _);
            }
            let error: Error = DriverError::new(Some(rc), text).with_sql(sql).into();
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }
}
