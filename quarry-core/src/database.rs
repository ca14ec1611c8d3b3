use crate::{
    AliasRemover, AnsiDialect, ArgumentExpression, AsValue, BatchInsertStatement,
    BatchUpdateStatement, BulkInsertStatement, CachedRowSet, ColumnDeclaring,
    ColumnNameLengthChecker, Connection, ConnectionSupplier, Context, DatabaseMetadata, Dialect,
    DriverError, Error, ExprRef, ExpressionVisitor, FormatOptions, KeywordCase, QuerySource,
    Result, Source, SqlError, SqlFormatter, Table, Transaction, TransactionIsolation,
    UpdateStatement, Assignments, bind_arguments, bulk_insert_expression, delete_expression,
    insert_expression, separated_by, truncate_long, update_expression,
};
use log::{Level, log_enabled};
use std::{fmt, sync::Arc};

/// Hook turning raw driver failures into application errors.
pub type ErrorTranslator = dyn Fn(Error) -> Error + Send + Sync;

struct DatabaseInner {
    supplier: Box<dyn ConnectionSupplier>,
    dialect: Box<dyn Dialect>,
    metadata: Arc<DatabaseMetadata>,
    translator: Option<Box<ErrorTranslator>>,
    options: FormatOptions,
    isolation: Option<TransactionIsolation>,
}

/// Entry point: a connection supplier, a dialect and the metadata of the datastore.
///
/// Cheap to clone, every clone shares the same configuration. Without a transaction every
/// operation obtains a fresh connection from the supplier and releases it right after.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("product_name", &self.inner.metadata.product_name)
            .field("product_version", &self.inner.metadata.product_version)
            .field("dialect", &self.inner.dialect.name())
            .finish()
    }
}

/// Supplier of databases that only generate SQL.
struct OfflineSupplier;

impl ConnectionSupplier for OfflineSupplier {
    fn connect(&self) -> Result<Box<dyn Connection>> {
        Err(Error::msg(
            "The database is offline, it can generate SQL but not execute it",
        ))
    }
}

pub struct DatabaseBuilder {
    supplier: Box<dyn ConnectionSupplier>,
    dialect: Box<dyn Dialect>,
    metadata: Option<DatabaseMetadata>,
    translator: Option<Box<ErrorTranslator>>,
    options: FormatOptions,
    isolation: Option<TransactionIsolation>,
}

impl DatabaseBuilder {
    pub fn new(supplier: impl ConnectionSupplier + 'static) -> Self {
        Self {
            supplier: Box::new(supplier),
            dialect: Box::new(AnsiDialect),
            metadata: None,
            translator: None,
            options: Default::default(),
            isolation: None,
        }
    }

    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Box::new(dialect);
        self
    }

    /// Use `metadata` instead of reading it from a connection.
    pub fn metadata(mut self, metadata: DatabaseMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn always_quote_identifiers(mut self, value: bool) -> Self {
        self.options.always_quote_identifiers = value;
        self
    }

    pub fn keyword_case(mut self, value: KeywordCase) -> Self {
        self.options.keyword_case = value;
        self
    }

    /// Pretty print the generated SQL, one clause per line.
    pub fn beautify(mut self, value: bool, indent_size: usize) -> Self {
        self.options.beautify = value;
        self.options.indent_size = indent_size;
        self
    }

    /// Isolation level of the transactions opened without an explicit one.
    pub fn transaction_isolation(mut self, value: TransactionIsolation) -> Self {
        self.isolation = Some(value);
        self
    }

    /// Applied to every error coming from the driver before it reaches the caller.
    pub fn error_translator(
        mut self,
        translator: impl Fn(Error) -> Error + Send + Sync + 'static,
    ) -> Self {
        self.translator = Some(Box::new(translator));
        self
    }

    /// Open one connection to read the metadata, then release it. No connection is opened when
    /// the metadata was provided.
    pub fn build(self) -> Result<Database> {
        let metadata = match self.metadata {
            Some(metadata) => metadata,
            None => {
                let mut connection = self
                    .supplier
                    .connect()
                    .context("Could not obtain a connection to read the database metadata")?;
                connection.metadata()?
            }
        };
        log::info!(
            "Connected to {} {}, dialect: {}",
            metadata.product_name,
            metadata.product_version,
            self.dialect.name(),
        );
        Ok(Database {
            inner: Arc::new(DatabaseInner {
                supplier: self.supplier,
                dialect: self.dialect,
                metadata: Arc::new(metadata),
                translator: self.translator,
                options: self.options,
                isolation: self.isolation,
            }),
        })
    }
}

impl Database {
    pub fn builder(supplier: impl ConnectionSupplier + 'static) -> DatabaseBuilder {
        DatabaseBuilder::new(supplier)
    }

    /// A database without connections, used to generate SQL for `dialect`.
    ///
    /// ```rust
    /// use quarry_core::{AnsiDialect, ColumnDeclaring, Database, Executor, Table};
    /// let database = Database::offline(AnsiDialect).build().unwrap();
    /// let employee = Table::new("t_employee");
    /// let query = database
    ///     .from(&employee)
    ///     .select(employee.column::<String>("name"))
    ///     .filter(employee.column::<i64>("id").eq(1));
    /// assert_eq!(
    ///     query.sql().unwrap(),
    ///     "SELECT t_employee.name FROM t_employee WHERE t_employee.id = ?"
    /// );
    /// ```
    pub fn offline(dialect: impl Dialect + 'static) -> DatabaseBuilder {
        let metadata = dialect.default_metadata();
        DatabaseBuilder::new(OfflineSupplier)
            .dialect(dialect)
            .metadata(metadata)
    }

    /// A database with the default configuration and the ANSI dialect.
    pub fn connect(supplier: impl ConnectionSupplier + 'static) -> Result<Database> {
        DatabaseBuilder::new(supplier).build()
    }

    pub fn metadata(&self) -> &DatabaseMetadata {
        &self.inner.metadata
    }

    pub fn metadata_ref(&self) -> Arc<DatabaseMetadata> {
        self.inner.metadata.clone()
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.inner.dialect.as_ref()
    }

    pub fn format_options(&self) -> &FormatOptions {
        &self.inner.options
    }

    pub fn default_isolation(&self) -> Option<TransactionIsolation> {
        self.inner.isolation
    }

    /// Formatter configured with the options of this database.
    pub fn formatter(&self) -> Box<dyn SqlFormatter> {
        let options = &self.inner.options;
        self.inner
            .dialect
            .create_formatter(self, options.beautify, options.indent_size)
    }

    /// Obtain a fresh connection from the supplier.
    pub fn connection(&self) -> Result<Box<dyn Connection>> {
        self.inner
            .supplier
            .connect()
            .context("Could not obtain a connection from the supplier")
    }

    /// Pass `error` through the translation hook, when it carries a driver failure.
    pub fn translate(&self, error: Error) -> Error {
        match &self.inner.translator {
            Some(translator) if error.chain().any(|e| e.is::<DriverError>()) => translator(error),
            _ => error,
        }
    }

    /// Run `f` inside a new transaction, committed when `f` succeeds and rolled back when it
    /// fails or panics.
    pub fn use_transaction<R>(&self, f: impl FnOnce(&Transaction) -> Result<R>) -> Result<R> {
        Transaction::run(self.clone(), self.inner.isolation, f)
    }

    /// Like [`Database::use_transaction`] with an explicit isolation level, the original one is
    /// restored when the transaction closes.
    pub fn use_transaction_with<R>(
        &self,
        isolation: TransactionIsolation,
        f: impl FnOnce(&Transaction) -> Result<R>,
    ) -> Result<R> {
        Transaction::run(self.clone(), Some(isolation), f)
    }
}

/// Where statements run: directly on the database or inside a transaction. Obtained through
/// [`Executor::session`].
#[derive(Debug, Clone)]
pub enum Session {
    Database(Database),
    Transaction(Transaction),
}

impl Session {
    /// Joins the current transaction, or opens a new one when there is none.
    pub fn use_transaction<R>(&self, f: impl FnOnce(&Transaction) -> Result<R>) -> Result<R> {
        match self {
            Session::Database(database) => database.use_transaction(f),
            Session::Transaction(transaction) => transaction.use_transaction(f),
        }
    }
}

fn log_statement(sql: &str, arguments: &[ArgumentExpression]) {
    if !log_enabled!(target: "quarry::sql", Level::Debug) {
        return;
    }
    log::debug!(target: "quarry::sql", "SQL: {}", truncate_long!(sql));
    let mut out = String::new();
    separated_by(
        &mut out,
        arguments,
        |out, v| {
            out.push_str(&v.value.to_string());
            out.push('(');
            out.push_str(v.sql_type.type_name());
            out.push(')');
        },
        ", ",
    );
    log::debug!(target: "quarry::sql", "Parameters: [{}]", out);
}

/// Runs statements. Implemented by [`Database`], [`Transaction`] and [`Session`].
pub trait Executor {
    fn database(&self) -> &Database;

    /// Run `f` with the connection of the current unit of work. Errors are translated.
    fn use_connection<R>(&self, f: impl FnOnce(&mut dyn Connection) -> Result<R>) -> Result<R>;

    fn session(&self) -> Session;

    /// Render an expression with the formatter of the database.
    fn format_expression(&self, expression: &ExprRef) -> Result<(String, Vec<ArgumentExpression>)> {
        let database = self.database();
        ColumnNameLengthChecker {
            max_length: database.metadata().max_column_name_length,
        }
        .visit(expression)?;
        database.formatter().format(expression)
    }

    fn execute_query(&self, expression: &ExprRef) -> Result<CachedRowSet> {
        let (sql, arguments) = self.format_expression(expression)?;
        self.execute_sql_query(&sql, &arguments)
    }

    /// Run an already formatted query and cache its rows.
    fn execute_sql_query(
        &self,
        sql: &str,
        arguments: &[ArgumentExpression],
    ) -> Result<CachedRowSet> {
        log_statement(sql, arguments);
        let rows = self.use_connection(|connection| {
            let mut statement = connection.prepare(sql)?;
            bind_arguments(statement.as_mut(), arguments)?;
            let mut cursor = statement.query()?;
            let rows = CachedRowSet::from_cursor(cursor.as_mut())?;
            Ok(rows)
        })?;
        log::debug!(target: "quarry::sql", "Results: {}", rows.len());
        Ok(rows)
    }

    fn execute_update(&self, expression: &ExprRef) -> Result<u64> {
        let (sql, arguments) = self.format_expression(expression)?;
        log_statement(&sql, &arguments);
        let count = self.use_connection(|connection| {
            let mut statement = connection.prepare(&sql)?;
            bind_arguments(statement.as_mut(), &arguments)?;
            statement.execute_update()
        })?;
        log::debug!(target: "quarry::sql", "Effects: {}", count);
        Ok(count)
    }

    /// Execute an insert, returns the affected rows and the keys generated by the database.
    fn execute_update_and_retrieve_keys(
        &self,
        expression: &ExprRef,
    ) -> Result<(u64, CachedRowSet)> {
        let (sql, arguments) = self.format_expression(expression)?;
        log_statement(&sql, &arguments);
        let dialect = self.database().dialect();
        let (count, keys) = self.use_connection(|connection| {
            dialect.execute_update_and_retrieve_keys(connection, &sql, &arguments)
        })?;
        log::debug!(target: "quarry::sql", "Effects: {}", count);
        Ok((count, keys))
    }

    /// Execute the statements in a single batch, they must all render to the same SQL.
    fn execute_batch(&self, expressions: &[ExprRef]) -> Result<Vec<u64>> {
        let Some((first, rest)) = expressions.split_first() else {
            return Ok(Vec::new());
        };
        let (sql, arguments) = self.format_expression(first)?;
        let mut batch = Vec::with_capacity(expressions.len());
        batch.push(arguments);
        for expression in rest {
            let (found, arguments) = self.format_expression(expression)?;
            if found != sql {
                return Err(SqlError::BatchStructureMismatch {
                    expected: sql,
                    found,
                }
                .into());
            }
            batch.push(arguments);
        }
        log::debug!(target: "quarry::sql", "SQL: {}", truncate_long!(sql));
        log::debug!(target: "quarry::sql", "Batch items: {}", batch.len());
        let counts = self.use_connection(|connection| {
            let mut statement = connection.prepare(&sql)?;
            for arguments in &batch {
                bind_arguments(statement.as_mut(), arguments)?;
                statement.add_batch()?;
            }
            statement.execute_batch()
        })?;
        log::debug!(target: "quarry::sql", "Effects: {:?}", counts);
        Ok(counts)
    }

    /// Start a query from a table or from a sub-query.
    fn from(&self, source: &impl Source) -> QuerySource {
        QuerySource::new(self.session(), source.source_expression())
    }

    fn insert(&self, table: &Table, build: impl FnOnce(&mut Assignments)) -> Result<u64> {
        let expression = AliasRemover.visit(&insert_expression(table, build)?)?;
        self.execute_update(&expression)
    }

    /// Insert one row, returns the first generated key if the database reported any.
    fn insert_and_generate_key<K: AsValue>(
        &self,
        table: &Table,
        build: impl FnOnce(&mut Assignments),
    ) -> Result<Option<K>> {
        let expression = AliasRemover.visit(&insert_expression(table, build)?)?;
        let (_, mut keys) = self.execute_update_and_retrieve_keys(&expression)?;
        if keys.next() {
            keys.get::<K>(1)
        } else {
            Ok(None)
        }
    }

    /// Insert many rows with a single statement.
    fn bulk_insert(
        &self,
        table: &Table,
        build: impl FnOnce(&mut BulkInsertStatement),
    ) -> Result<u64> {
        let expression = AliasRemover.visit(&bulk_insert_expression(table, build)?)?;
        self.execute_update(&expression)
    }

    fn update(&self, table: &Table, build: impl FnOnce(&mut UpdateStatement)) -> Result<u64> {
        let expression = AliasRemover.visit(&update_expression(table, build)?)?;
        self.execute_update(&expression)
    }

    fn delete(&self, table: &Table, condition: impl ColumnDeclaring<Value = bool>) -> Result<u64> {
        let expression =
            AliasRemover.visit(&delete_expression(table, Some(condition.as_expression())))?;
        self.execute_update(&expression)
    }

    fn delete_all(&self, table: &Table) -> Result<u64> {
        let expression = AliasRemover.visit(&delete_expression(table, None))?;
        self.execute_update(&expression)
    }

    /// One insert per item, submitted in a single batch.
    fn batch_insert(
        &self,
        table: &Table,
        build: impl FnOnce(&mut BatchInsertStatement),
    ) -> Result<Vec<u64>> {
        let expressions = BatchInsertStatement::build(table, build)?
            .iter()
            .map(|v| AliasRemover.visit(v))
            .collect::<Result<Vec<_>>>()?;
        self.execute_batch(&expressions)
    }

    /// One update per item, submitted in a single batch.
    fn batch_update(
        &self,
        table: &Table,
        build: impl FnOnce(&mut BatchUpdateStatement),
    ) -> Result<Vec<u64>> {
        let expressions = BatchUpdateStatement::build(table, build)?
            .iter()
            .map(|v| AliasRemover.visit(v))
            .collect::<Result<Vec<_>>>()?;
        self.execute_batch(&expressions)
    }
}

impl Executor for Database {
    fn database(&self) -> &Database {
        self
    }

    fn use_connection<R>(&self, f: impl FnOnce(&mut dyn Connection) -> Result<R>) -> Result<R> {
        let mut connection = self.connection().map_err(|e| self.translate(e))?;
        f(connection.as_mut()).map_err(|e| self.translate(e))
    }

    fn session(&self) -> Session {
        Session::Database(self.clone())
    }
}

impl Executor for Session {
    fn database(&self) -> &Database {
        match self {
            Session::Database(database) => database,
            Session::Transaction(transaction) => transaction.database(),
        }
    }

    fn use_connection<R>(&self, f: impl FnOnce(&mut dyn Connection) -> Result<R>) -> Result<R> {
        match self {
            Session::Database(database) => database.use_connection(f),
            Session::Transaction(transaction) => transaction.use_connection(f),
        }
    }

    fn session(&self) -> Session {
        self.clone()
    }
}
