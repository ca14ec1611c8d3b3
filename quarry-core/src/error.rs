use std::fmt::{self, Display};

/// Errors raised by Quarry itself, carried inside [`crate::Error`].
///
/// Callers can inspect them with `error.downcast_ref::<SqlError>()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlError {
    #[error("There are no columns to {0} in the statement")]
    EmptyAssignments(&'static str),
    #[error(
        "Every item in a batch operation must generate the same SQL.\nExpected: {expected}\nFound: {found}"
    )]
    BatchStructureMismatch { expected: String, found: String },
    #[error("The identifier `{name}` is too long, the maximum length is {max}")]
    IdentifierTooLong { name: String, max: usize },
    #[error("Pagination is not supported by the {0} dialect, select a dialect that implements it")]
    PaginationNotSupported(&'static str),
    #[error("Unsupported expression type {kind} for the {dialect} dialect")]
    UnsupportedExpression {
        kind: &'static str,
        dialect: &'static str,
    },
    #[error("Expected a query expression (select or union), found {0}")]
    NotAQuery(&'static str),
    #[error("The operation `{0}` is only supported on a select query, not on a union")]
    NotASelect(&'static str),
    #[error("Invalid column index {index}, the row set has {count} columns")]
    InvalidColumnIndex { index: usize, count: usize },
    #[error("Invalid column label `{0}`")]
    InvalidColumnLabel(String),
    #[error("Invalid cursor position, there is no current row")]
    InvalidCursorPosition,
    #[error("Cannot find the column `{0}` by label or by name")]
    ColumnNotFound(String),
    #[error("The transaction is already closed")]
    TransactionClosed,
    #[error("The query returned no rows while counting the total records")]
    NoCountResult,
}

/// A failure reported by the underlying datastore (the raw error a translation hook receives).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    /// Vendor specific error code, when the driver exposes one.
    pub code: Option<i32>,
    pub message: String,
    /// Statement that was being executed.
    pub sql: Option<String>,
}

impl DriverError {
    pub fn new(code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            sql: None,
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

impl Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[{}] ", code)?;
        }
        f.write_str(&self.message)?;
        if let Some(sql) = &self.sql {
            write!(f, "\nWhile executing:\n{}", crate::truncate_long!(sql))?;
        }
        Ok(())
    }
}

impl std::error::Error for DriverError {}
