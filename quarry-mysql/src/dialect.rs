use crate::{
    DefaultValueExpression, InsertOrUpdateExpression, LOCKING_CLAUSE, LockingClause, LockingMode,
    LockingWait, MatchAgainstExpression, NaturalJoinExpression,
};
use quarry_core::{
    Database, DatabaseMetadata, Dialect, ExprRef, FormatterState, InsertExpression, Result,
    SqlError, SqlFormatter, SqlTypeRef, argument, formatter_state, separated_by, try_separated_by,
    writer::{Context, Fragment},
};

/// Reserved words of MySQL that are not SQL:2003 keywords.
pub const MYSQL_KEYWORDS: &[&str] = &[
    "ACCESSIBLE", "ANALYZE", "DATABASE", "DATABASES", "DELAYED", "DISTINCTROW", "DIV", "DUAL",
    "ENCLOSED", "ESCAPED", "EXPLAIN", "FULLTEXT", "HIGH_PRIORITY", "IGNORE", "INDEX", "INFILE",
    "KEY", "KEYS", "KILL", "LIMIT", "LINEAR", "LINES", "LOAD", "LOCK", "LONG", "LOW_PRIORITY",
    "MEDIUMINT", "OPTIMIZE", "OPTIONALLY", "OUTFILE", "PURGE", "REGEXP", "RENAME", "REPLACE",
    "REQUIRE", "RLIKE", "SCHEMA", "SCHEMAS", "SEPARATOR", "SHOW", "SPATIAL", "STRAIGHT_JOIN",
    "TERMINATED", "TINYINT", "UNLOCK", "UNSIGNED", "USAGE", "UTC_DATE", "XOR", "ZEROFILL",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct MySQLDialect;

impl MySQLDialect {
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySQLDialect {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn default_metadata(&self) -> DatabaseMetadata {
        DatabaseMetadata {
            product_name: "MySQL".into(),
            keywords: MYSQL_KEYWORDS.iter().map(|v| v.to_string()).collect(),
            identifier_quote: "`".into(),
            supports_mixed_case_identifiers: true,
            max_column_name_length: 64,
            ..Default::default()
        }
    }

    fn create_formatter(
        &self,
        database: &Database,
        beautify: bool,
        indent_size: usize,
    ) -> Box<dyn SqlFormatter> {
        Box::new(MySQLFormatter::new(formatter_state(
            database,
            beautify,
            indent_size,
        )))
    }
}

#[derive(Debug, Default, Clone)]
pub struct MySQLFormatter {
    state: FormatterState,
}

impl MySQLFormatter {
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
        if value.updates.is_empty() {
            return Ok(());
        }
        self.new_line(context, out);
        self.write_keyword(out, "on duplicate key update");
        out.push(' ');
        let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
        try_separated_by(
            out,
            &value.updates,
            |out, v| self.write_expression(&mut context, out, v),
            ", ",
        )
    }

    fn write_natural_join(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &NaturalJoinExpression,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlJoin);
        self.write_query_source(&mut context, out, &value.left)?;
        self.new_line(&mut context, out);
        self.write_keyword(out, "natural join");
        out.push(' ');
        self.write_query_source(&mut context, out, &value.right)
    }

    fn write_match_against(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &MatchAgainstExpression,
    ) -> Result<()> {
        self.write_keyword(out, "match");
        out.push_str(" (");
        try_separated_by(
            out,
            &value.columns,
            |out, v| self.write_expression(context, out, v),
            ", ",
        )?;
        out.push_str(") ");
        self.write_keyword(out, "against");
        out.push_str(" (");
        self.write_expression(context, out, &value.search)?;
        if let Some(modifier) = value.modifier {
            out.push(' ');
            self.write_keyword(out, modifier.keyword());
        }
        out.push(')');
        Ok(())
    }

    fn write_locking_clause(&self, out: &mut String, locking: &LockingClause) {
        self.write_keyword(
            out,
            match locking.mode {
                LockingMode::ForUpdate => "for update",
                LockingMode::ForShare => "for share",
                LockingMode::LockInShareMode => "lock in share mode",
            },
        );
        if locking.mode == LockingMode::LockInShareMode {
            return;
        }
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

impl SqlFormatter for MySQLFormatter {
    fn state(&self) -> &FormatterState {
        &self.state
    }

    fn dialect_name(&self) -> &'static str {
        "MySQL"
    }

    fn write_unknown(&self, context: &mut Context, out: &mut String, expr: &ExprRef) -> Result<()> {
        if let Some(value) = expr.as_extension::<InsertOrUpdateExpression>() {
            return self.write_insert_or_update(context, out, value);
        }
        if let Some(value) = expr.as_extension::<NaturalJoinExpression>() {
            return self.write_natural_join(context, out, value);
        }
        if let Some(value) = expr.as_extension::<MatchAgainstExpression>() {
            return self.write_match_against(context, out, value);
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
            "smallint" | "int" | "bigint" => "signed",
            "varchar" | "text" | "uuid" => "char",
            "boolean" => "unsigned",
            "bytes" => "binary",
            "timestamp" | "timestamptz" => "datetime",
            other => other,
        };
        self.write_keyword(out, name);
    }

    /// `LIMIT offset, limit`, both always bound.
    fn write_pagination(
        &self,
        context: &mut Context,
        out: &mut String,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<()> {
        let offset = offset.map_or(0, |v| i64::try_from(v).unwrap_or(i64::MAX));
        let limit = limit.map_or(i64::MAX, |v| i64::try_from(v).unwrap_or(i64::MAX));
        self.new_line(context, out);
        self.write_keyword(out, "limit");
        out.push(' ');
        self.write_expression(context, out, &argument(offset))?;
        out.push_str(", ");
        self.write_expression(context, out, &argument(limit))
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
