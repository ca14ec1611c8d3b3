use crate::{AsValue, ColumnDeclaring, ColumnExpression, ExprRef, SqlExpression, TableExpression};
use std::{fmt, marker::PhantomData};

/// A table as seen by the query builder, optionally aliased.
///
/// ```rust
/// use quarry_core::Table;
/// let employee = Table::new("t_employee").aliased("e");
/// let id = employee.column::<i64>("id");
/// assert_eq!(id.name(), "id");
/// assert_eq!(employee.alias(), Some("e"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    expression: TableExpression,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            expression: TableExpression::new(name),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.expression.schema = Some(schema.into());
        self
    }

    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.expression.catalog = Some(catalog.into());
        self
    }

    /// A copy of this table with a different alias, columns created from it are qualified by
    /// the alias.
    pub fn aliased(&self, alias: impl Into<String>) -> Self {
        Self {
            expression: TableExpression {
                alias: Some(alias.into()),
                ..self.expression.clone()
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.expression.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.expression.alias.as_deref()
    }

    pub fn table_expression(&self) -> &TableExpression {
        &self.expression
    }

    pub fn as_expression(&self) -> ExprRef {
        SqlExpression::new(self.expression.clone())
    }

    pub fn column<T: AsValue>(&self, name: impl Into<String>) -> Column<T> {
        Column {
            column: ColumnExpression {
                table: Some(self.expression.clone()),
                name: name.into(),
                sql_type: T::sql_type(),
            },
            _type: PhantomData,
        }
    }
}

/// Typed column of a [`Table`].
pub struct Column<T> {
    column: ColumnExpression,
    _type: PhantomData<fn() -> T>,
}

impl<T> Column<T> {
    pub fn column_expression(&self) -> &ColumnExpression {
        &self.column
    }

    pub fn name(&self) -> &str {
        &self.column.name
    }

    pub fn table(&self) -> Option<&TableExpression> {
        self.column.table.as_ref()
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("table", &self.column.table.as_ref().map(|v| v.reference_name()))
            .field("name", &self.column.name)
            .field("sql_type", &self.column.sql_type.type_name())
            .finish()
    }
}

impl<T: AsValue> ColumnDeclaring for Column<T> {
    type Value = T;

    fn as_expression(&self) -> ExprRef {
        SqlExpression::new(self.column.clone())
    }
}
