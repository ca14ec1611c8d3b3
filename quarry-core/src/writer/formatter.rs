use crate::{
    AggregateExpression, ArgumentExpression, BetweenExpression, BinaryExpression,
    BulkInsertExpression, CaseWhenExpression, CastingExpression, ColumnAssignmentExpression,
    ColumnDeclaringExpression, ColumnExpression, DeleteExpression, ExistsExpression, ExprRef,
    ExpressionKind, FrameBound, FunctionExpression, InListExpression, InListSource,
    InsertExpression, InsertFromQueryExpression, JoinExpression, Order, OrderByExpression, Result,
    SelectExpression, SqlError, SqlTypeRef, TableExpression, UnaryExpression, UnionExpression,
    UpdateExpression, WindowFunctionExpression, try_separated_by,
    writer::{Context, Fragment, FormatterState},
};
use std::borrow::Cow;

/// Wrap the output of `$v` in parentheses when `$cond` holds.
#[macro_export]
macro_rules! possibly_parenthesized {
    ($out:ident, $cond:expr, $v:expr) => {
        if $cond {
            $out.push('(');
            $v;
            $out.push(')');
        } else {
            $v;
        }
    };
}

/// Renders expression trees to SQL text with `?` placeholders.
///
/// Every node has a `write_*` method with a default ANSI rendering, dialect formatters override
/// the few that differ (pagination, locking, unions) and intercept their own node types in
/// [`SqlFormatter::write_unknown`].
pub trait SqlFormatter {
    fn state(&self) -> &FormatterState;

    /// Used in error messages.
    fn dialect_name(&self) -> &'static str {
        "ANSI"
    }

    /// Render `expr`, returns the SQL text and the arguments to bind, in placeholder order.
    fn format(&self, expr: &ExprRef) -> Result<(String, Vec<ArgumentExpression>)> {
        let mut context = Context::default();
        let mut out = String::with_capacity(256);
        self.write_expression(&mut context, &mut out, expr)?;
        Ok((out, context.parameters))
    }

    fn write_keyword(&self, out: &mut String, keyword: &str) {
        if self.state().upper_case_keywords() {
            out.push_str(&keyword.to_uppercase());
        } else {
            out.push_str(&keyword.to_lowercase());
        }
    }

    fn should_quote(&self, identifier: &str) -> bool {
        let state = self.state();
        let metadata = &state.metadata;
        if state.options.always_quote_identifiers {
            return true;
        }
        let extra = &metadata.extra_name_characters;
        let valid = identifier
            .chars()
            .next()
            .is_some_and(|c| !c.is_ascii_digit())
            && identifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || extra.contains(c));
        if !valid {
            return true;
        }
        if state.is_keyword(identifier) {
            return true;
        }
        let mixed_case = identifier.chars().any(|c| c.is_ascii_uppercase())
            && identifier.chars().any(|c| c.is_ascii_lowercase());
        let folds =
            metadata.stores_upper_case_identifiers || metadata.stores_lower_case_identifiers;
        mixed_case
            && folds
            && !metadata.supports_mixed_case_identifiers
            && metadata.supports_mixed_case_quoted_identifiers
    }

    fn write_identifier(&self, out: &mut String, identifier: &str) {
        let metadata = &self.state().metadata;
        let quote = metadata.identifier_quote.trim();
        if !quote.is_empty() && self.should_quote(identifier) {
            let identifier: Cow<str> = if metadata.supports_mixed_case_quoted_identifiers {
                identifier.into()
            } else if metadata.stores_upper_case_quoted_identifiers {
                identifier.to_uppercase().into()
            } else if metadata.stores_lower_case_quoted_identifiers {
                identifier.to_lowercase().into()
            } else {
                identifier.into()
            };
            out.push_str(quote);
            out.push_str(&identifier.replace(quote, &quote.repeat(2)));
            out.push_str(quote);
        } else if metadata.supports_mixed_case_identifiers {
            out.push_str(identifier);
        } else if metadata.stores_upper_case_identifiers {
            out.push_str(&identifier.to_uppercase());
        } else if metadata.stores_lower_case_identifiers {
            out.push_str(&identifier.to_lowercase());
        } else {
            out.push_str(identifier);
        }
    }

    /// Clause separator: a space, or a new indented line when beautifying.
    fn new_line(&self, context: &mut Context, out: &mut String) {
        let options = &self.state().options;
        if options.beautify {
            out.push('\n');
            out.extend(std::iter::repeat_n(' ', context.depth * options.indent_size));
        } else {
            out.push(' ');
        }
    }

    /// Children that render unambiguously without parentheses.
    fn needs_brackets(&self, expr: &ExprRef) -> bool {
        !expr.is_leaf_node
            && !matches!(
                expr.kind,
                ExpressionKind::Column(..)
                    | ExpressionKind::Function(..)
                    | ExpressionKind::Aggregate(..)
                    | ExpressionKind::Exists(..)
                    | ExpressionKind::ColumnDeclaring(..)
                    | ExpressionKind::Casting(..)
                    | ExpressionKind::WindowFunction(..)
            )
    }

    /// Render a sub-expression, parenthesized unless it is safe not to.
    fn write_child(&self, context: &mut Context, out: &mut String, expr: &ExprRef) -> Result<()> {
        if self.needs_brackets(expr) {
            self.write_parenthesized(context, out, expr)
        } else {
            self.write_expression(context, out, expr)
        }
    }

    fn write_parenthesized(
        &self,
        context: &mut Context,
        out: &mut String,
        expr: &ExprRef,
    ) -> Result<()> {
        if expr.is_query() && self.state().options.beautify {
            out.push('(');
            context.depth += 1;
            self.new_line(context, out);
            self.write_expression(context, out, expr)?;
            context.depth -= 1;
            self.new_line(context, out);
            out.push(')');
        } else {
            possibly_parenthesized!(out, true, self.write_expression(context, out, expr)?);
        }
        Ok(())
    }

    fn write_expression(
        &self,
        context: &mut Context,
        out: &mut String,
        expr: &ExprRef,
    ) -> Result<()> {
        match &expr.kind {
            ExpressionKind::Table(v) => self.write_table(context, out, v),
            ExpressionKind::Column(v) => self.write_column(context, out, v),
            ExpressionKind::ColumnDeclaring(v) => self.write_column_declaring(context, out, v),
            ExpressionKind::Argument(v) => self.write_argument(context, out, v),
            ExpressionKind::Unary(v) => self.write_unary(context, out, v),
            ExpressionKind::Binary(v) => self.write_binary(context, out, v),
            ExpressionKind::Between(v) => self.write_between(context, out, v),
            ExpressionKind::InList(v) => self.write_in_list(context, out, v),
            ExpressionKind::Exists(v) => self.write_exists(context, out, v),
            ExpressionKind::Casting(v) => self.write_casting(context, out, v),
            ExpressionKind::Function(v) => self.write_function(context, out, v),
            ExpressionKind::Aggregate(v) => self.write_aggregate(context, out, v),
            ExpressionKind::CaseWhen(v) => self.write_case_when(context, out, v),
            ExpressionKind::WindowFunction(v) => self.write_window_function(context, out, v),
            ExpressionKind::OrderBy(v) => self.write_order_by(context, out, v),
            ExpressionKind::Join(v) => self.write_join(context, out, v),
            ExpressionKind::Select(v) => self.write_select(context, out, expr, v),
            ExpressionKind::Union(v) => self.write_union(context, out, expr, v),
            ExpressionKind::Insert(v) => self.write_insert(context, out, v),
            ExpressionKind::InsertFromQuery(v) => self.write_insert_from_query(context, out, v),
            ExpressionKind::BulkInsert(v) => self.write_bulk_insert(context, out, v),
            ExpressionKind::Update(v) => self.write_update(context, out, v),
            ExpressionKind::Delete(v) => self.write_delete(context, out, v),
            ExpressionKind::ColumnAssignment(v) => self.write_column_assignment(context, out, v),
            ExpressionKind::Extension(..) => self.write_unknown(context, out, expr),
        }
    }

    /// Fallback for node types this formatter does not know.
    fn write_unknown(
        &self,
        _context: &mut Context,
        _out: &mut String,
        expr: &ExprRef,
    ) -> Result<()> {
        Err(SqlError::UnsupportedExpression {
            kind: expr.kind_name(),
            dialect: self.dialect_name(),
        }
        .into())
    }

    fn write_table(
        &self,
        _context: &mut Context,
        out: &mut String,
        table: &TableExpression,
    ) -> Result<()> {
        if let Some(catalog) = table.catalog.as_deref().filter(|v| !v.is_empty()) {
            self.write_identifier(out, catalog);
            out.push('.');
        }
        if let Some(schema) = table.schema.as_deref().filter(|v| !v.is_empty()) {
            self.write_identifier(out, schema);
            out.push('.');
        }
        self.write_identifier(out, &table.name);
        if let Some(alias) = table.alias.as_deref().filter(|v| !v.is_empty()) {
            out.push(' ');
            self.write_identifier(out, alias);
        }
        Ok(())
    }

    fn write_column(
        &self,
        _context: &mut Context,
        out: &mut String,
        column: &ColumnExpression,
    ) -> Result<()> {
        if let Some(table) = &column.table {
            self.write_identifier(out, table.reference_name());
            out.push('.');
        }
        self.write_identifier(out, &column.name);
        Ok(())
    }

    /// `expr AS label` in the select list, just the label anywhere else.
    fn write_column_declaring(
        &self,
        context: &mut Context,
        out: &mut String,
        column: &ColumnDeclaringExpression,
    ) -> Result<()> {
        let label = column.declared_name.as_deref().filter(|v| !v.is_empty());
        match label {
            Some(label) if context.fragment == Fragment::SqlSelect => {
                self.write_expression(context, out, &column.expression)?;
                out.push(' ');
                self.write_keyword(out, "as");
                out.push(' ');
                self.write_identifier(out, label);
            }
            Some(label) => self.write_identifier(out, label),
            None => self.write_expression(context, out, &column.expression)?,
        }
        Ok(())
    }

    fn write_argument(
        &self,
        context: &mut Context,
        out: &mut String,
        argument: &ArgumentExpression,
    ) -> Result<()> {
        out.push('?');
        context.parameters.push(argument.clone());
        Ok(())
    }

    fn write_unary(
        &self,
        context: &mut Context,
        out: &mut String,
        unary: &UnaryExpression,
    ) -> Result<()> {
        if unary.operator.is_postfix() {
            self.write_child(context, out, &unary.operand)?;
            out.push(' ');
            self.write_keyword(out, unary.operator.keyword());
        } else {
            self.write_keyword(out, unary.operator.keyword());
            if unary.operator == crate::UnaryOpType::Not {
                out.push(' ');
            }
            self.write_child(context, out, &unary.operand)?;
        }
        Ok(())
    }

    fn write_binary(
        &self,
        context: &mut Context,
        out: &mut String,
        binary: &BinaryExpression,
    ) -> Result<()> {
        self.write_child(context, out, &binary.left)?;
        out.push(' ');
        self.write_keyword(out, binary.operator.keyword());
        out.push(' ');
        self.write_child(context, out, &binary.right)
    }

    fn write_between(
        &self,
        context: &mut Context,
        out: &mut String,
        between: &BetweenExpression,
    ) -> Result<()> {
        self.write_child(context, out, &between.expression)?;
        out.push(' ');
        self.write_keyword(
            out,
            if between.not_between {
                "not between"
            } else {
                "between"
            },
        );
        out.push(' ');
        self.write_child(context, out, &between.lower)?;
        out.push(' ');
        self.write_keyword(out, "and");
        out.push(' ');
        self.write_child(context, out, &between.upper)
    }

    fn write_in_list(
        &self,
        context: &mut Context,
        out: &mut String,
        in_list: &InListExpression,
    ) -> Result<()> {
        self.write_child(context, out, &in_list.left)?;
        out.push(' ');
        self.write_keyword(out, if in_list.not_in_list { "not in" } else { "in" });
        out.push(' ');
        match &in_list.source {
            InListSource::Query(query) => self.write_parenthesized(context, out, query),
            InListSource::Values(values) => {
                out.push('(');
                try_separated_by(out, values, |out, v| self.write_child(context, out, v), ", ")?;
                out.push(')');
                Ok(())
            }
        }
    }

    fn write_exists(
        &self,
        context: &mut Context,
        out: &mut String,
        exists: &ExistsExpression,
    ) -> Result<()> {
        self.write_keyword(out, if exists.not_exists { "not exists" } else { "exists" });
        out.push(' ');
        self.write_parenthesized(context, out, &exists.query)
    }

    fn write_cast_type(&self, out: &mut String, sql_type: SqlTypeRef) {
        self.write_keyword(out, sql_type.type_name());
    }

    fn write_casting(
        &self,
        context: &mut Context,
        out: &mut String,
        casting: &CastingExpression,
    ) -> Result<()> {
        self.write_keyword(out, "cast");
        out.push('(');
        self.write_expression(context, out, &casting.expression)?;
        out.push(' ');
        self.write_keyword(out, "as");
        out.push(' ');
        self.write_cast_type(out, casting.sql_type);
        out.push(')');
        Ok(())
    }

    fn write_function(
        &self,
        context: &mut Context,
        out: &mut String,
        function: &FunctionExpression,
    ) -> Result<()> {
        out.push_str(&function.name);
        out.push('(');
        try_separated_by(
            out,
            &function.arguments,
            |out, v| self.write_expression(context, out, v),
            ", ",
        )?;
        out.push(')');
        Ok(())
    }

    fn write_aggregate(
        &self,
        context: &mut Context,
        out: &mut String,
        aggregate: &AggregateExpression,
    ) -> Result<()> {
        self.write_keyword(out, aggregate.aggregate_type.keyword());
        out.push('(');
        if aggregate.is_distinct {
            self.write_keyword(out, "distinct");
            out.push(' ');
        }
        match &aggregate.argument {
            Some(argument) => self.write_expression(context, out, argument)?,
            None => out.push('*'),
        }
        out.push(')');
        Ok(())
    }

    fn write_case_when(
        &self,
        context: &mut Context,
        out: &mut String,
        case_when: &CaseWhenExpression,
    ) -> Result<()> {
        self.write_keyword(out, "case");
        if let Some(operand) = &case_when.operand {
            out.push(' ');
            self.write_child(context, out, operand)?;
        }
        for (condition, result) in &case_when.when_clauses {
            out.push(' ');
            self.write_keyword(out, "when");
            out.push(' ');
            self.write_expression(context, out, condition)?;
            out.push(' ');
            self.write_keyword(out, "then");
            out.push(' ');
            self.write_expression(context, out, result)?;
        }
        if let Some(else_clause) = &case_when.else_clause {
            out.push(' ');
            self.write_keyword(out, "else");
            out.push(' ');
            self.write_expression(context, out, else_clause)?;
        }
        out.push(' ');
        self.write_keyword(out, "end");
        Ok(())
    }

    fn write_frame_bound(
        &self,
        context: &mut Context,
        out: &mut String,
        bound: &FrameBound,
    ) -> Result<()> {
        match bound {
            FrameBound::UnboundedPreceding => self.write_keyword(out, "unbounded preceding"),
            FrameBound::Preceding(v) => {
                self.write_child(context, out, v)?;
                out.push(' ');
                self.write_keyword(out, "preceding");
            }
            FrameBound::CurrentRow => self.write_keyword(out, "current row"),
            FrameBound::Following(v) => {
                self.write_child(context, out, v)?;
                out.push(' ');
                self.write_keyword(out, "following");
            }
            FrameBound::UnboundedFollowing => self.write_keyword(out, "unbounded following"),
        }
        Ok(())
    }

    fn write_window_function(
        &self,
        context: &mut Context,
        out: &mut String,
        function: &WindowFunctionExpression,
    ) -> Result<()> {
        self.write_keyword(out, function.function_type.keyword());
        out.push('(');
        if function.is_distinct {
            self.write_keyword(out, "distinct");
            out.push(' ');
        }
        try_separated_by(
            out,
            &function.arguments,
            |out, v| self.write_expression(context, out, v),
            ", ",
        )?;
        out.push_str(") ");
        self.write_keyword(out, "over");
        out.push_str(" (");
        let window = &function.window;
        let mut separate = false;
        if !window.partition_by.is_empty() {
            self.write_keyword(out, "partition by");
            out.push(' ');
            try_separated_by(
                out,
                &window.partition_by,
                |out, v| self.write_expression(context, out, v),
                ", ",
            )?;
            separate = true;
        }
        if !window.order_by.is_empty() {
            if separate {
                out.push(' ');
            }
            self.write_keyword(out, "order by");
            out.push(' ');
            try_separated_by(
                out,
                &window.order_by,
                |out, v| self.write_expression(context, out, v),
                ", ",
            )?;
            separate = true;
        }
        if let Some(frame) = &window.frame {
            if separate {
                out.push(' ');
            }
            self.write_keyword(out, frame.unit.keyword());
            out.push(' ');
            match &frame.end {
                Some(end) => {
                    self.write_keyword(out, "between");
                    out.push(' ');
                    self.write_frame_bound(context, out, &frame.start)?;
                    out.push(' ');
                    self.write_keyword(out, "and");
                    out.push(' ');
                    self.write_frame_bound(context, out, end)?;
                }
                None => self.write_frame_bound(context, out, &frame.start)?,
            }
        }
        out.push(')');
        Ok(())
    }

    fn write_order_by(
        &self,
        context: &mut Context,
        out: &mut String,
        order_by: &OrderByExpression,
    ) -> Result<()> {
        self.write_child(context, out, &order_by.expression)?;
        if order_by.order == Order::DESC {
            out.push(' ');
            self.write_keyword(out, "desc");
        }
        Ok(())
    }

    /// A table, a join or an aliased sub-query.
    fn write_query_source(
        &self,
        context: &mut Context,
        out: &mut String,
        source: &ExprRef,
    ) -> Result<()> {
        let alias = match &source.kind {
            ExpressionKind::Select(v) => v.table_alias.as_deref(),
            ExpressionKind::Union(v) => v.table_alias.as_deref(),
            ExpressionKind::Join(..) => return self.write_expression(context, out, source),
            _ => None,
        };
        self.write_child(context, out, source)?;
        if let Some(alias) = alias {
            out.push(' ');
            self.write_identifier(out, alias);
        }
        Ok(())
    }

    fn write_join(
        &self,
        context: &mut Context,
        out: &mut String,
        join: &JoinExpression,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlJoin);
        self.write_query_source(&mut context, out, &join.left)?;
        self.new_line(&mut context, out);
        self.write_keyword(out, join.join_type.keyword());
        out.push(' ');
        self.write_query_source(&mut context, out, &join.right)?;
        if let Some(condition) = &join.condition {
            out.push(' ');
            self.write_keyword(out, "on");
            out.push(' ');
            self.write_expression(&mut context, out, condition)?;
        }
        Ok(())
    }

    fn write_order_by_clause(
        &self,
        context: &mut Context,
        out: &mut String,
        order_by: &[ExprRef],
    ) -> Result<()> {
        if order_by.is_empty() {
            return Ok(());
        }
        let mut context = context.switch_fragment(Fragment::SqlSelectOrderBy);
        self.new_line(&mut context, out);
        self.write_keyword(out, "order by");
        out.push(' ');
        try_separated_by(
            out,
            order_by,
            |out, v| self.write_expression(&mut context, out, v),
            ", ",
        )
    }

    fn write_select(
        &self,
        context: &mut Context,
        out: &mut String,
        expr: &ExprRef,
        select: &SelectExpression,
    ) -> Result<()> {
        self.write_keyword(out, "select");
        out.push(' ');
        if select.is_distinct {
            self.write_keyword(out, "distinct");
            out.push(' ');
        }
        if select.columns.is_empty() {
            out.push('*');
        } else {
            let mut context = context.switch_fragment(Fragment::SqlSelect);
            try_separated_by(
                out,
                &select.columns,
                |out, v| self.write_expression(&mut context, out, v),
                ", ",
            )?;
        }
        self.new_line(context, out);
        self.write_keyword(out, "from");
        out.push(' ');
        {
            let mut context = context.switch_fragment(Fragment::SqlSelectFrom);
            self.write_query_source(&mut context, out, &select.from)?;
        }
        if let Some(where_clause) = &select.where_clause {
            let mut context = context.switch_fragment(Fragment::SqlSelectWhere);
            self.new_line(&mut context, out);
            self.write_keyword(out, "where");
            out.push(' ');
            self.write_expression(&mut context, out, where_clause)?;
        }
        if !select.group_by.is_empty() {
            self.new_line(context, out);
            self.write_keyword(out, "group by");
            out.push(' ');
            try_separated_by(
                out,
                &select.group_by,
                |out, v| self.write_expression(context, out, v),
                ", ",
            )?;
        }
        if let Some(having) = &select.having {
            self.new_line(context, out);
            self.write_keyword(out, "having");
            out.push(' ');
            self.write_expression(context, out, having)?;
        }
        self.write_order_by_clause(context, out, &select.order_by)?;
        if select.offset.is_some() || select.limit.is_some() {
            self.write_pagination(context, out, select.offset, select.limit)?;
        }
        self.write_select_suffix(context, out, expr)
    }

    /// Trailing clauses driven by `extra_properties` (e.g. row locking), nothing by default.
    fn write_select_suffix(
        &self,
        _context: &mut Context,
        _out: &mut String,
        _expr: &ExprRef,
    ) -> Result<()> {
        Ok(())
    }

    /// Render offset and limit, binding them as parameters.
    fn write_pagination(
        &self,
        _context: &mut Context,
        _out: &mut String,
        _offset: Option<u64>,
        _limit: Option<u64>,
    ) -> Result<()> {
        Err(SqlError::PaginationNotSupported(self.dialect_name()).into())
    }

    fn write_union_operand(
        &self,
        context: &mut Context,
        out: &mut String,
        operand: &ExprRef,
    ) -> Result<()> {
        self.write_parenthesized(context, out, operand)
    }

    fn write_union(
        &self,
        context: &mut Context,
        out: &mut String,
        _expr: &ExprRef,
        union: &UnionExpression,
    ) -> Result<()> {
        self.write_union_operand(context, out, &union.left)?;
        self.new_line(context, out);
        self.write_keyword(out, if union.is_union_all { "union all" } else { "union" });
        self.new_line(context, out);
        self.write_union_operand(context, out, &union.right)?;
        self.write_order_by_clause(context, out, &union.order_by)?;
        if union.offset.is_some() || union.limit.is_some() {
            self.write_pagination(context, out, union.offset, union.limit)?;
        }
        Ok(())
    }

    /// Column name of an assignment target, never qualified.
    fn write_assigned_column(&self, out: &mut String, column: &ExprRef) -> Result<()> {
        match &column.kind {
            ExpressionKind::Column(v) => {
                self.write_identifier(out, &v.name);
                Ok(())
            }
            _ => Err(SqlError::UnsupportedExpression {
                kind: column.kind_name(),
                dialect: self.dialect_name(),
            }
            .into()),
        }
    }

    fn write_insert_columns(&self, out: &mut String, assignments: &[ExprRef]) -> Result<()> {
        out.push('(');
        try_separated_by(
            out,
            assignments,
            |out, v| match &v.kind {
                ExpressionKind::ColumnAssignment(assignment) => {
                    self.write_assigned_column(out, &assignment.column)
                }
                _ => self.write_assigned_column(out, v),
            },
            ", ",
        )?;
        out.push(')');
        Ok(())
    }

    fn write_insert_values(
        &self,
        context: &mut Context,
        out: &mut String,
        assignments: &[ExprRef],
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
        out.push('(');
        try_separated_by(
            out,
            assignments,
            |out, v| match &v.kind {
                ExpressionKind::ColumnAssignment(assignment) => {
                    self.write_expression(&mut context, out, &assignment.expression)
                }
                _ => self.write_expression(&mut context, out, v),
            },
            ", ",
        )?;
        out.push(')');
        Ok(())
    }

    fn write_insert(
        &self,
        context: &mut Context,
        out: &mut String,
        insert: &InsertExpression,
    ) -> Result<()> {
        if insert.assignments.is_empty() {
            return Err(SqlError::EmptyAssignments("insert").into());
        }
        let mut context = context.switch_fragment(Fragment::SqlInsertInto);
        self.write_keyword(out, "insert into");
        out.push(' ');
        self.write_expression(&mut context, out, &insert.table)?;
        out.push(' ');
        self.write_insert_columns(out, &insert.assignments)?;
        out.push(' ');
        self.write_keyword(out, "values");
        out.push(' ');
        self.write_insert_values(&mut context, out, &insert.assignments)
    }

    fn write_insert_from_query(
        &self,
        context: &mut Context,
        out: &mut String,
        insert: &InsertFromQueryExpression,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlInsertInto);
        self.write_keyword(out, "insert into");
        out.push(' ');
        self.write_expression(&mut context, out, &insert.table)?;
        if !insert.columns.is_empty() {
            out.push(' ');
            self.write_insert_columns(out, &insert.columns)?;
        }
        self.new_line(&mut context, out);
        self.write_expression(&mut context, out, &insert.query)
    }

    fn write_bulk_insert(
        &self,
        context: &mut Context,
        out: &mut String,
        insert: &BulkInsertExpression,
    ) -> Result<()> {
        let Some(first) = insert.rows.first().filter(|v| !v.is_empty()) else {
            return Err(SqlError::EmptyAssignments("insert").into());
        };
        let mut context = context.switch_fragment(Fragment::SqlInsertInto);
        self.write_keyword(out, "insert into");
        out.push(' ');
        self.write_expression(&mut context, out, &insert.table)?;
        out.push(' ');
        self.write_insert_columns(out, first)?;
        out.push(' ');
        self.write_keyword(out, "values");
        out.push(' ');
        try_separated_by(
            out,
            &insert.rows,
            |out, row| self.write_insert_values(&mut context, out, row),
            ", ",
        )
    }

    fn write_update(
        &self,
        context: &mut Context,
        out: &mut String,
        update: &UpdateExpression,
    ) -> Result<()> {
        if update.assignments.is_empty() {
            return Err(SqlError::EmptyAssignments("update").into());
        }
        self.write_keyword(out, "update");
        out.push(' ');
        self.write_expression(context, out, &update.table)?;
        out.push(' ');
        self.write_keyword(out, "set");
        out.push(' ');
        {
            let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
            try_separated_by(
                out,
                &update.assignments,
                |out, v| self.write_expression(&mut context, out, v),
                ", ",
            )?;
        }
        if let Some(where_clause) = &update.where_clause {
            self.new_line(context, out);
            self.write_keyword(out, "where");
            out.push(' ');
            self.write_expression(context, out, where_clause)?;
        }
        Ok(())
    }

    fn write_delete(
        &self,
        context: &mut Context,
        out: &mut String,
        delete: &DeleteExpression,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlDeleteFrom);
        self.write_keyword(out, "delete from");
        out.push(' ');
        self.write_expression(&mut context, out, &delete.table)?;
        if let Some(where_clause) = &delete.where_clause {
            self.new_line(&mut context, out);
            self.write_keyword(out, "where");
            out.push(' ');
            self.write_expression(&mut context, out, where_clause)?;
        }
        Ok(())
    }

    fn write_column_assignment(
        &self,
        context: &mut Context,
        out: &mut String,
        assignment: &ColumnAssignmentExpression,
    ) -> Result<()> {
        self.write_assigned_column(out, &assignment.column)?;
        out.push_str(" = ");
        self.write_expression(context, out, &assignment.expression)
    }
}
