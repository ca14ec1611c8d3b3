use crate::{CBox, driver_error, extract::{extract_columns, extract_value}};
use libsqlite3_sys::*;
use quarry_core::{ColumnMetadata, Error, Result, RowCursor, Statement, Value, truncate_long};
use rust_decimal::prelude::ToPrimitive;
use std::{
    ffi::{c_char, c_int, c_void},
    fmt::{self, Display},
    marker::PhantomData,
};
use time::{format_description::BorrowedFormatItem, macros::format_description};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond]");
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
const TIMESTAMP_OFFSET_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
);

/// A prepared statement bound to the connection that created it.
pub struct SQLiteStatement<'c> {
    pub(crate) connection: *mut sqlite3,
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
    sql: String,
    /// Currently bound parameters, 1-based positions stored at `index - 1`.
    parameters: Vec<Value>,
    batch: Vec<Vec<Value>>,
    _connection: PhantomData<&'c mut sqlite3>,
}

impl<'c> SQLiteStatement<'c> {
    pub(crate) fn new(
        connection: *mut sqlite3,
        statement: CBox<*mut sqlite3_stmt>,
        sql: impl Into<String>,
    ) -> Self {
        unsafe {
            sqlite3_clear_bindings(*statement);
        }
        Self {
            connection,
            statement,
            sql: sql.into(),
            parameters: Vec::new(),
            batch: Vec::new(),
            _connection: PhantomData,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn bind_text(&self, index: c_int, value: &str) -> c_int {
        unsafe {
            sqlite3_bind_text(
                *self.statement,
                index,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        }
    }

    fn bind_native(&self, index: usize, value: &Value) -> Result<()> {
        let index = c_int::try_from(index)
            .map_err(|_| Error::msg(format!("Parameter index {} is out of range", index)))?;
        let statement = *self.statement;
        let rc = unsafe {
            match value {
                Value::Null
                | Value::Boolean(None)
                | Value::Int16(None)
                | Value::Int32(None)
                | Value::Int64(None)
                | Value::Float32(None)
                | Value::Float64(None)
                | Value::Decimal(None)
                | Value::Varchar(None)
                | Value::Blob(None)
                | Value::Date(None)
                | Value::Time(None)
                | Value::Timestamp(None)
                | Value::TimestampWithTimezone(None)
                | Value::Uuid(None) => sqlite3_bind_null(statement, index),
                Value::Boolean(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
                Value::Int16(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
                Value::Int32(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
                Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, *v),
                Value::Float32(Some(v)) => sqlite3_bind_double(statement, index, *v as f64),
                Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, *v),
                Value::Decimal(Some(v)) => sqlite3_bind_double(
                    statement,
                    index,
                    v.to_f64().ok_or_else(|| {
                        Error::msg(format!("Cannot convert the Decimal value `{}` to f64", v))
                    })?,
                ),
                Value::Varchar(Some(v)) => self.bind_text(index, v),
                Value::Blob(Some(v)) => sqlite3_bind_blob(
                    statement,
                    index,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                Value::Date(Some(v)) => self.bind_text(index, &v.format(DATE_FORMAT)?),
                Value::Time(Some(v)) => self.bind_text(index, &v.format(TIME_FORMAT)?),
                Value::Timestamp(Some(v)) => self.bind_text(index, &v.format(TIMESTAMP_FORMAT)?),
                Value::TimestampWithTimezone(Some(v)) => {
                    self.bind_text(index, &v.format(TIMESTAMP_OFFSET_FORMAT)?)
                }
                Value::Uuid(Some(v)) => self.bind_text(index, &v.to_string()),
            }
        };
        if rc != SQLITE_OK {
            return Err(driver_error(self.connection, Some(&self.sql)).context(format!(
                "Cannot bind parameter {} to query:\n{}",
                index,
                truncate_long!(self.sql)
            )));
        }
        Ok(())
    }

    fn reset(&mut self) {
        unsafe {
            sqlite3_reset(*self.statement);
        }
    }

    /// Run the statement to completion, rows are discarded.
    fn run(&mut self) -> Result<u64> {
        self.reset();
        loop {
            match unsafe { sqlite3_step(*self.statement) } {
                SQLITE_DONE => break,
                SQLITE_ROW => continue,
                _ => {
                    let error = driver_error(self.connection, Some(&self.sql));
                    self.reset();
                    return Err(error);
                }
            }
        }
        let changes = unsafe { sqlite3_changes64(self.connection) };
        self.reset();
        Ok(changes.max(0) as u64)
    }
}

impl Statement for SQLiteStatement<'_> {
    fn bind(&mut self, index: usize, value: &Value) -> Result<()> {
        self.bind_native(index, value)?;
        if self.parameters.len() < index {
            self.parameters.resize(index, Value::Null);
        }
        if let Some(slot) = index.checked_sub(1).and_then(|i| self.parameters.get_mut(i)) {
            *slot = value.clone();
        }
        Ok(())
    }

    fn query<'s>(&'s mut self) -> Result<Box<dyn RowCursor + 's>> {
        self.reset();
        Ok(Box::new(SQLiteCursor {
            columns: extract_columns(*self.statement),
            statement: self,
            done: false,
        }))
    }

    fn execute_update(&mut self) -> Result<u64> {
        self.run()
    }

    fn add_batch(&mut self) -> Result<()> {
        self.batch.push(std::mem::take(&mut self.parameters));
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<u64>> {
        let batch = std::mem::take(&mut self.batch);
        let mut counts = Vec::with_capacity(batch.len());
        for parameters in batch {
            self.reset();
            unsafe {
                sqlite3_clear_bindings(*self.statement);
            }
            for (i, value) in parameters.iter().enumerate() {
                self.bind_native(i + 1, value)?;
            }
            counts.push(self.run()?);
        }
        Ok(counts)
    }
}

impl Display for SQLiteStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:p}", *self.statement)
    }
}

/// Rows of a running query, read one step at a time.
pub struct SQLiteCursor<'s, 'c> {
    statement: &'s mut SQLiteStatement<'c>,
    columns: Vec<ColumnMetadata>,
    done: bool,
}

impl RowCursor for SQLiteCursor<'_, '_> {
    fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if self.done {
            return Ok(None);
        }
        let statement = *self.statement.statement;
        match unsafe { sqlite3_step(statement) } {
            SQLITE_ROW => {
                let count = self.columns.len() as c_int;
                let row = (0..count)
                    .map(|i| extract_value(statement, i))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(row))
            }
            SQLITE_DONE => {
                self.done = true;
                Ok(None)
            }
            _ => {
                self.done = true;
                Err(driver_error(
                    self.statement.connection,
                    Some(&self.statement.sql),
                ))
            }
        }
    }
}

impl Drop for SQLiteCursor<'_, '_> {
    fn drop(&mut self) {
        self.statement.reset();
    }
}
