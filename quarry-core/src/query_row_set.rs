use crate::{
    CachedRowSet, ColumnDeclaring, ColumnExpression, ExprRef, ExpressionKind, Result, SqlError,
};
use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

/// Row set of a [`crate::Query`], addressable by the typed columns the query was built with.
#[derive(Debug, Clone)]
pub struct QueryRowSet {
    expression: ExprRef,
    row_set: CachedRowSet,
}

fn same_column(a: &ColumnExpression, b: &ColumnExpression) -> bool {
    a.name == b.name
        && a.table.as_ref().map(|v| v.reference_name())
            == b.table.as_ref().map(|v| v.reference_name())
}

fn same_expression(a: &ExprRef, b: &ExprRef) -> bool {
    match (&a.kind, &b.kind) {
        (ExpressionKind::Column(a), ExpressionKind::Column(b)) => same_column(a, b),
        _ => Arc::ptr_eq(a, b),
    }
}

impl QueryRowSet {
    pub fn new(expression: ExprRef, row_set: CachedRowSet) -> Self {
        Self {
            expression,
            row_set,
        }
    }

    pub fn query_expression(&self) -> &ExprRef {
        &self.expression
    }

    pub fn row_set(&self) -> &CachedRowSet {
        &self.row_set
    }

    /// Select list of the query, the left-most one for unions.
    fn select_columns(&self) -> &[ExprRef] {
        let mut expression = &self.expression;
        loop {
            match &expression.kind {
                ExpressionKind::Select(v) => return &v.columns,
                ExpressionKind::Union(v) => expression = &v.left,
                _ => return &[],
            }
        }
    }

    /// Label the query declared for `expression`, if any.
    fn declared_label(&self, expression: &ExprRef) -> Option<String> {
        if let ExpressionKind::ColumnDeclaring(v) = &expression.kind {
            return v.declared_name.clone();
        }
        self.select_columns().iter().find_map(|v| match &v.kind {
            ExpressionKind::ColumnDeclaring(declaring)
                if same_expression(&declaring.expression, expression) =>
            {
                declaring.declared_name.clone()
            }
            _ => None,
        })
    }

    /// 1-based index of the result column holding `column`.
    ///
    /// Resolved by declared label first, then by column name and owning table, finally by the
    /// bare column name. When the bare name is ambiguous the first match wins and a warning is
    /// logged.
    pub fn index_of(&self, column: &impl ColumnDeclaring) -> Result<usize> {
        let expression = column.as_expression();
        if let Some(label) = self.declared_label(&expression) {
            if let Some(index) = self.row_set.find_column(&label) {
                return Ok(index);
            }
        }
        let column = match &expression.kind {
            ExpressionKind::Column(v) => v,
            ExpressionKind::ColumnDeclaring(v) => match &v.expression.kind {
                ExpressionKind::Column(v) => v,
                _ => return Err(SqlError::ColumnNotFound(expression.kind_name().into()).into()),
            },
            _ => return Err(SqlError::ColumnNotFound(expression.kind_name().into()).into()),
        };
        let columns = self.row_set.columns();
        if let Some(table) = &column.table {
            if let Some(index) = columns.iter().position(|v| {
                v.name.eq_ignore_ascii_case(&column.name)
                    && !v.table_name.is_empty()
                    && v.table_name.eq_ignore_ascii_case(&table.name)
            }) {
                return Ok(index + 1);
            }
        }
        let mut matches = columns
            .iter()
            .enumerate()
            .filter(|(_, v)| {
                v.name.eq_ignore_ascii_case(&column.name)
                    || v.label.eq_ignore_ascii_case(&column.name)
            })
            .map(|(i, _)| i + 1);
        let Some(first) = matches.next() else {
            return Err(SqlError::ColumnNotFound(column.name.clone()).into());
        };
        if matches.next().is_some() {
            log::warn!(
                "Ambiguous column name `{}` in the result, using the first match at index {}, \
                declare a label to pick a different one",
                column.name,
                first,
            );
        }
        Ok(first)
    }

    /// Value of `column` in the current row.
    pub fn get_column<C: ColumnDeclaring>(&self, column: &C) -> Result<Option<C::Value>> {
        let index = self.index_of(column)?;
        self.row_set.get_as(index, column.sql_type())
    }

    /// Whether more than one result column is called `name`.
    pub fn has_ambiguous_name(&self, name: &str) -> bool {
        self.row_set
            .columns()
            .iter()
            .filter(|v| v.name.eq_ignore_ascii_case(name) || v.label.eq_ignore_ascii_case(name))
            .count()
            > 1
    }
}

impl Deref for QueryRowSet {
    type Target = CachedRowSet;

    fn deref(&self) -> &Self::Target {
        &self.row_set
    }
}

impl DerefMut for QueryRowSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.row_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnMetadata, SelectExpression, SqlExpression, Table, Value};

    fn metadata(label: &str, name: &str, table: &str) -> ColumnMetadata {
        ColumnMetadata {
            label: label.into(),
            name: name.into(),
            table_name: table.into(),
            type_name: "INTEGER".into(),
        }
    }

    #[test]
    fn resolution() {
        let employee = Table::new("employee").aliased("e");
        let department = Table::new("department").aliased("d");
        let employee_id = employee.column::<i64>("id");
        let department_id = department.column::<i64>("id");
        let label = department.column::<String>("name").aliased("department_name");
        let mut select = SelectExpression::new(employee.as_expression());
        select.columns = vec![
            employee_id.as_declaring(),
            department_id.as_declaring(),
            label.as_declaring(),
        ];
        let mut rows = QueryRowSet::new(
            SqlExpression::new(select),
            CachedRowSet::from_parts(
                vec![
                    metadata("id", "id", "employee"),
                    metadata("id", "id", "department"),
                    metadata("department_name", "name", "department"),
                ],
                vec![vec![
                    Value::Int64(Some(1)),
                    Value::Int64(Some(2)),
                    Value::Varchar(Some("tech".into())),
                ]],
            ),
        );
        assert!(rows.next());
        assert_eq!(rows.get_column(&employee_id).unwrap(), Some(1));
        assert_eq!(rows.get_column(&department_id).unwrap(), Some(2));
        assert_eq!(rows.get_column(&label).unwrap().as_deref(), Some("tech"));
        assert_eq!(
            rows.get_column(&department.column::<String>("name"))
                .unwrap()
                .as_deref(),
            Some("tech")
        );
        assert!(rows.has_ambiguous_name("id"));
        assert!(!rows.has_ambiguous_name("department_name"));
    }

    #[test]
    fn ambiguous_first_match() {
        let employee = Table::new("employee");
        let id = employee.column::<i64>("id");
        let mut rows = QueryRowSet::new(
            SqlExpression::new(SelectExpression::new(employee.as_expression())),
            CachedRowSet::from_parts(
                vec![metadata("id", "id", ""), metadata("id", "id", "")],
                vec![vec![Value::Int64(Some(10)), Value::Int64(Some(20))]],
            ),
        );
        assert!(rows.next());
        assert_eq!(rows.get_column(&id).unwrap(), Some(10));
        assert!(rows.has_ambiguous_name("ID"));
        let missing = employee.column::<i64>("salary");
        assert!(matches!(
            rows.get_column(&missing).unwrap_err().downcast_ref::<SqlError>(),
            Some(SqlError::ColumnNotFound(..))
        ));
    }
}
