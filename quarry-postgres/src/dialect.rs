use crate::{
    ConflictAction, DefaultValueExpression, ExcludedExpression, ILikeExpression,
    InsertOrUpdateExpression, LOCKING_CLAUSE, LockingClause, LockingWait,
};
use quarry_core::{
    Database, DatabaseMetadata, Dialect, Error, ExprRef, FormatterState,
    InsertExpression, Result, SqlError, SqlFormatter, SqlTypeRef, argument, formatter_state,
    separated_by, try_separated_by,
    writer::{Context, Fragment},
};

/// Reserved words of PostgreSQL that are not SQL:2003 keywords.
pub const POSTGRES_KEYWORDS: &[&str] = &[
    "ANALYSE", "ANALYZE", "CONCURRENTLY", "DO", "FREEZE", "ILIKE", "ISNULL", "LIMIT", "NOTNULL",
    "OFFSET", "PLACING", "RETURNING", "VARIADIC", "VERBOSE",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn default_metadata(&self) -> DatabaseMetadata {
        DatabaseMetadata {
            product_name: "PostgreSQL".into(),
            keywords: POSTGRES_KEYWORDS.iter().map(|v| v.to_string()).collect(),
            stores_lower_case_identifiers: true,
            stores_mixed_case_identifiers: false,
            max_column_name_length: 63,
            ..Default::default()
        }
    }

    fn create_formatter(
        &self,
        database: &Database,
        beautify: bool,
        indent_size: usize,
    ) -> Box<dyn SqlFormatter> {
        Box::new(PostgresFormatter::new(formatter_state(
            database,
            beautify,
            indent_size,
        )))
    }
}

#[derive(Debug, Default, Clone)]
pub struct PostgresFormatter {
    state: FormatterState,
}

impl PostgresFormatter {
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
        match &value.action {
            ConflictAction::DoNothing => self.write_keyword(out, "do nothing"),
            ConflictAction::DoUpdate(updates) => {
                if value.conflict_columns.is_empty() {
                    return Err(Error::msg(
                        "ON CONFLICT DO UPDATE requires at least one conflict column",
                    ));
                }
                self.write_keyword(out, "do update set");
                out.push(' ');
                let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
                try_separated_by(
                    out,
                    updates,
                    |out, v| self.write_expression(&mut context, out, v),
                    ", ",
                )?;
            }
        }
        if !value.returning.is_empty() {
            self.new_line(context, out);
            self.write_keyword(out, "returning");
            out.push(' ');
            try_separated_by(
                out,
                &value.returning,
                |out, v| self.write_expression(context, out, v),
                ", ",
            )?;
        }
        Ok(())
    }

    fn write_excluded(&self, out: &mut String, value: &ExcludedExpression) -> Result<()> {
        self.write_keyword(out, "excluded");
        out.push('.');
        self.write_assigned_column(out, &value.column)
    }

    fn write_ilike(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &ILikeExpression,
    ) -> Result<()> {
        self.write_child(context, out, &value.left)?;
        out.push(' ');
        self.write_keyword(out, if value.not_ilike { "not ilike" } else { "ilike" });
        out.push(' ');
        self.write_child(context, out, &value.pattern)
    }

    fn write_locking_clause(&self, out: &mut String, locking: &LockingClause) {
        self.write_keyword(out, locking.mode.keyword());
        if !locking.tables.is_empty() {
            out.push(' ');
            self.write_keyword(out, "of");
            out.push(' ');
            separated_by(
                out,
                &locking.tables,
                |out, v| self.write_identifier(out, v.reference_name()),
                ", ",
            );
        }
        match locking.wait {
            LockingWait::Wait => {}
            LockingWait::NoWait => {
                out.push(' ');
                self.write_keyword(out, "nowait");
            }
            LockingWait::SkipLocked => {
                out.push(' ');
                self.write_keyword(out, "skip locked");
            }
        }
    }
}

impl SqlFormatter for PostgresFormatter {
    fn state(&self) -> &FormatterState {
        &self.state
    }

    fn dialect_name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn write_unknown(&self, context: &mut Context, out: &mut String, expr: &ExprRef) -> Result<()> {
        if let Some(value) = expr.as_extension::<InsertOrUpdateExpression>() {
            return self.write_insert_or_update(context, out, value);
        }
        if let Some(value) = expr.as_extension::<ExcludedExpression>() {
            return self.write_excluded(out, value);
        }
        if let Some(value) = expr.as_extension::<ILikeExpression>() {
            return self.write_ilike(context, out, value);
        }
        if expr.as_extension::<DefaultValueExpression>().is_some() {
            self.write_keyword(out, "default");
            return Ok(());
        }
        Err(SqlError::UnsupportedExpression {
            kind: expr.kind_name(),
            dialect: self.dialect_name(),
        }
        .into())
    }

    fn write_cast_type(&self, out: &mut String, sql_type: SqlTypeRef) {
        let name = match sql_type.type_name() {
            "int" => "integer",
            "double" => "double precision",
            "float" => "real",
            "bytes" => "bytea",
            other => other,
        };
        self.write_keyword(out, name);
    }

    /// `LIMIT ? OFFSET ?`, each part only when present.
    fn write_pagination(
        &self,
        context: &mut Context,
        out: &mut String,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<()> {
        if let Some(limit) = limit {
            self.new_line(context, out);
            self.write_keyword(out, "limit");
            out.push(' ');
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            self.write_expression(context, out, &argument(limit))?;
        }
        if let Some(offset) = offset {
            self.new_line(context, out);
            self.write_keyword(out, "offset");
            out.push(' ');
            let offset = i64::try_from(offset).unwrap_or(i64::MAX);
            self.write_expression(context, out, &argument(offset))?;
        }
        Ok(())
    }

    fn write_select_suffix(
        &self,
        context: &mut Context,
        out: &mut String,
        expr: &ExprRef,
    ) -> Result<()> {
        if let Some(locking) = expr.extra_properties.get::<LockingClause>(LOCKING_CLAUSE) {
            self.new_line(context, out);
            self.write_locking_clause(out, locking);
        }
        Ok(())
    }
}
