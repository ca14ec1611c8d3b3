use crate::{ExcludedExpression, InsertOrUpdateExpression, sqlite_metadata};
use quarry_core::{
    ArgumentExpression, CachedRowSet, Connection, Database, DatabaseMetadata, Dialect, ExprRef,
    FormatterState, InsertExpression, Result, SqlError, SqlFormatter, SqlTypeRef, argument,
    bind_arguments, formatter_state, try_separated_by,
    writer::{Context, Fragment},
};

/// Reserved words of SQLite that are not SQL:2003 keywords.
pub const SQLITE_KEYWORDS: &[&str] = &[
    "ABORT", "ANALYZE", "ATTACH", "AUTOINCREMENT", "CONFLICT", "DATABASE", "DETACH", "EXCLUSIVE",
    "EXPLAIN", "FAIL", "GLOB", "IGNORE", "INDEXED", "INSTEAD", "ISNULL", "LIMIT", "NOTNULL",
    "OFFSET", "PLAN", "PRAGMA", "QUERY", "RAISE", "REGEXP", "REINDEX", "RENAME", "REPLACE",
    "TEMP", "VACUUM", "VIRTUAL",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct SQLiteDialect;

impl SQLiteDialect {
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SQLiteDialect {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn default_metadata(&self) -> DatabaseMetadata {
        sqlite_metadata("")
    }

    fn create_formatter(
        &self,
        database: &Database,
        beautify: bool,
        indent_size: usize,
    ) -> Box<dyn SqlFormatter> {
        Box::new(SQLiteFormatter::new(formatter_state(
            database,
            beautify,
            indent_size,
        )))
    }

    /// SQLite has no generated keys result set, the rowid of the last insert is read instead.
    fn execute_update_and_retrieve_keys(
        &self,
        connection: &mut dyn Connection,
        sql: &str,
        arguments: &[ArgumentExpression],
    ) -> Result<(u64, CachedRowSet)> {
        let count = {
            let mut statement = connection.prepare(sql)?;
            bind_arguments(statement.as_mut(), arguments)?;
            statement.execute_update()?
        };
        let mut statement = connection.prepare("SELECT last_insert_rowid()")?;
        let mut cursor = statement.query()?;
        let keys = CachedRowSet::from_cursor(cursor.as_mut())?;
        Ok((count, keys))
    }
}

#[derive(Debug, Default, Clone)]
pub struct SQLiteFormatter {
    state: FormatterState,
}

impl SQLiteFormatter {
    pub fn new(state: FormatterState) -> Self {
        Self { state }
    }

    fn write_insert_or_update(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &InsertOrUpdateExpression,
    ) -> Result<()> {
        self.write_insert(
            context,
            out,
            &InsertExpression {
                table: value.table.clone(),
                assignments: value.assignments.clone(),
            },
        )?;
        self.new_line(context, out);
        self.write_keyword(out, "on conflict");
        if !value.conflict_columns.is_empty() {
            out.push(' ');
            self.write_insert_columns(out, &value.conflict_columns)?;
        }
        out.push(' ');
        if value.updates.is_empty() {
            self.write_keyword(out, "do nothing");
            return Ok(());
        }
        self.write_keyword(out, "do update set");
        out.push(' ');
        let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
        try_separated_by(
            out,
            &value.updates,
            |out, v| self.write_expression(&mut context, out, v),
            ", ",
        )
    }
}

impl SqlFormatter for SQLiteFormatter {
    fn state(&self) -> &FormatterState {
        &self.state
    }

    fn dialect_name(&self) -> &'static str {
        "SQLite"
    }

    fn write_unknown(&self, context: &mut Context, out: &mut String, expr: &ExprRef) -> Result<()> {
        if let Some(value) = expr.as_extension::<InsertOrUpdateExpression>() {
            return self.write_insert_or_update(context, out, value);
        }
        if let Some(value) = expr.as_extension::<ExcludedExpression>() {
            self.write_keyword(out, "excluded");
            out.push('.');
            return self.write_assigned_column(out, &value.column);
        }
        Err(SqlError::UnsupportedExpression {
            kind: expr.kind_name(),
            dialect: self.dialect_name(),
        }
        .into())
    }

    /// Storage classes, SQLite accepts any type name but only these change the value.
    fn write_cast_type(&self, out: &mut String, sql_type: SqlTypeRef) {
        let name = match sql_type.type_name() {
            "boolean" | "smallint" | "int" | "bigint" => "integer",
            "float" | "double" => "real",
            "decimal" => "numeric",
            "bytes" => "blob",
            _ => "text",
        };
        self.write_keyword(out, name);
    }

    /// `LIMIT ? OFFSET ?`, an offset alone is written with the limit `-1`.
    fn write_pagination(
        &self,
        context: &mut Context,
        out: &mut String,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<()> {
        if offset.is_none() && limit.is_none() {
            return Ok(());
        }
        self.new_line(context, out);
        self.write_keyword(out, "limit");
        out.push(' ');
        let limit = limit.map_or(-1, |v| i64::try_from(v).unwrap_or(i64::MAX));
        self.write_expression(context, out, &argument(limit))?;
        if let Some(offset) = offset {
            out.push(' ');
            self.write_keyword(out, "offset");
            out.push(' ');
            let offset = i64::try_from(offset).unwrap_or(i64::MAX);
            self.write_expression(context, out, &argument(offset))?;
        }
        Ok(())
    }

    /// Compound select operands cannot be parenthesized in SQLite.
    fn write_union_operand(
        &self,
        context: &mut Context,
        out: &mut String,
        operand: &ExprRef,
    ) -> Result<()> {
        self.write_expression(context, out, operand)
    }
}
