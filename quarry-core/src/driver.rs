use crate::{CachedRowSet, Result, Value};
use std::fmt::{self, Display};

/// Blocking seam between Quarry and a concrete datastore driver.
///
/// A connection is used by one thread of control at a time, drivers do not need to be `Sync`.
pub trait Connection {
    /// Prepare a statement using `?` placeholders.
    fn prepare<'s>(&'s mut self, sql: &str) -> Result<Box<dyn Statement + 's>>;
    /// Metadata describing the datastore behind this connection.
    fn metadata(&mut self) -> Result<DatabaseMetadata>;
    fn auto_commit(&self) -> bool;
    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()>;
    fn transaction_isolation(&mut self) -> Result<TransactionIsolation>;
    fn set_transaction_isolation(&mut self, isolation: TransactionIsolation) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
    /// Execute one or more statements without parameters, typically schema setup.
    fn execute_script(&mut self, sql: &str) -> Result<()>;
}

/// A prepared statement, parameters are 1-based.
pub trait Statement {
    fn bind(&mut self, index: usize, value: &Value) -> Result<()>;
    fn query<'s>(&'s mut self) -> Result<Box<dyn RowCursor + 's>>;
    fn execute_update(&mut self) -> Result<u64>;
    /// Queue the currently bound parameters as one item of a batch.
    fn add_batch(&mut self) -> Result<()>;
    fn execute_batch(&mut self) -> Result<Vec<u64>>;
    /// Keys generated by the last `execute_update`, when the driver reports them natively.
    fn generated_keys(&mut self) -> Result<Option<CachedRowSet>> {
        Ok(None)
    }
}

/// Live, forward only cursor over the rows of a query.
pub trait RowCursor {
    fn columns(&self) -> &[ColumnMetadata];
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// Obtains a fresh connection for each unit of work.
pub trait ConnectionSupplier: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Connection>>;
}

impl<F> ConnectionSupplier for F
where
    F: Fn() -> Result<Box<dyn Connection>> + Send + Sync,
{
    fn connect(&self) -> Result<Box<dyn Connection>> {
        self()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Output label (the alias when the query declared one).
    pub label: String,
    pub name: String,
    /// Owning table, empty when unknown.
    pub table_name: String,
    pub type_name: String,
}

impl ColumnMetadata {
    pub fn labeled(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            name: label.clone(),
            label,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionIsolation {
    None,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl Display for TransactionIsolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionIsolation::None => "NONE",
            TransactionIsolation::ReadUncommitted => "READ UNCOMMITTED",
            TransactionIsolation::ReadCommitted => "READ COMMITTED",
            TransactionIsolation::RepeatableRead => "REPEATABLE READ",
            TransactionIsolation::Serializable => "SERIALIZABLE",
        })
    }
}

/// Connection metadata read once when a database is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseMetadata {
    pub product_name: String,
    pub product_version: String,
    pub url: String,
    /// Database specific keywords, on top of the SQL:2003 ones.
    pub keywords: Vec<String>,
    /// Empty when quoting is not supported.
    pub identifier_quote: String,
    /// Characters allowed in unquoted identifiers besides `[A-Za-z0-9_]`.
    pub extra_name_characters: String,
    pub supports_mixed_case_identifiers: bool,
    pub stores_upper_case_identifiers: bool,
    pub stores_lower_case_identifiers: bool,
    pub stores_mixed_case_identifiers: bool,
    pub supports_mixed_case_quoted_identifiers: bool,
    pub stores_upper_case_quoted_identifiers: bool,
    pub stores_lower_case_quoted_identifiers: bool,
    pub stores_mixed_case_quoted_identifiers: bool,
    /// Zero means unlimited.
    pub max_column_name_length: usize,
}

impl Default for DatabaseMetadata {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            product_version: String::new(),
            url: String::new(),
            keywords: Vec::new(),
            identifier_quote: "\"".into(),
            extra_name_characters: String::new(),
            supports_mixed_case_identifiers: false,
            stores_upper_case_identifiers: false,
            stores_lower_case_identifiers: false,
            stores_mixed_case_identifiers: true,
            supports_mixed_case_quoted_identifiers: true,
            stores_upper_case_quoted_identifiers: false,
            stores_lower_case_quoted_identifiers: false,
            stores_mixed_case_quoted_identifiers: true,
            max_column_name_length: 0,
        }
    }
}
