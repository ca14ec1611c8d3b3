use crate::{
    ArgumentExpression, CachedRowSet, Connection, Database, DatabaseMetadata, FormatOptions,
    FormatterState, Result, SqlFormatter, Statement,
};

/// Database specific behavior: SQL syntax and generated keys retrieval.
///
/// Dialects are chosen explicitly when the [`Database`] is built, [`AnsiDialect`] is the default.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    fn create_formatter(
        &self,
        database: &Database,
        beautify: bool,
        indent_size: usize,
    ) -> Box<dyn SqlFormatter>;

    /// Metadata assumed when no connection is available to read it.
    fn default_metadata(&self) -> DatabaseMetadata {
        DatabaseMetadata::default()
    }

    /// Execute an insert and return the affected rows together with the generated keys.
    fn execute_update_and_retrieve_keys(
        &self,
        connection: &mut dyn Connection,
        sql: &str,
        arguments: &[ArgumentExpression],
    ) -> Result<(u64, CachedRowSet)> {
        let mut statement = connection.prepare(sql)?;
        bind_arguments(statement.as_mut(), arguments)?;
        let count = statement.execute_update()?;
        let keys = statement.generated_keys()?.unwrap_or_default();
        Ok((count, keys))
    }
}

/// Bind every argument at its 1-based position, through its SQL type.
pub fn bind_arguments(
    statement: &mut dyn Statement,
    arguments: &[ArgumentExpression],
) -> Result<()> {
    for (i, argument) in arguments.iter().enumerate() {
        argument.sql_type.bind(statement, i + 1, &argument.value)?;
    }
    Ok(())
}

/// Options of `database` with the layout overridden by the caller.
pub fn formatter_state(database: &Database, beautify: bool, indent_size: usize) -> FormatterState {
    FormatterState::new(
        database.metadata_ref(),
        FormatOptions {
            beautify,
            indent_size,
            ..database.format_options().clone()
        },
    )
}

/// Standard SQL only, without pagination, upsert or locking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ANSI"
    }

    fn create_formatter(
        &self,
        database: &Database,
        beautify: bool,
        indent_size: usize,
    ) -> Box<dyn SqlFormatter> {
        Box::new(AnsiFormatter::new(formatter_state(
            database,
            beautify,
            indent_size,
        )))
    }
}

#[derive(Debug, Default, Clone)]
pub struct AnsiFormatter {
    state: FormatterState,
}

impl AnsiFormatter {
    pub fn new(state: FormatterState) -> Self {
        Self { state }
    }
}

impl SqlFormatter for AnsiFormatter {
    fn state(&self) -> &FormatterState {
        &self.state
    }
}
