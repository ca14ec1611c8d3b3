use crate::{
    AggregateExpression, AggregateType, ArgumentExpression, AsValue, ColumnDeclaring, ExprRef,
    FunctionExpression, SqlExpression, SqlTypeRef, Window, WindowFunctionExpression,
    WindowFunctionType,
};
use std::{fmt, marker::PhantomData};

/// Typed handle to an expression node.
pub struct Expr<T> {
    expression: ExprRef,
    _type: PhantomData<fn() -> T>,
}

impl<T> Expr<T> {
    /// Wrap a node, the caller vouches that it evaluates to `T`.
    pub fn new(expression: ExprRef) -> Self {
        Self {
            expression,
            _type: PhantomData,
        }
    }

    pub fn expression(&self) -> &ExprRef {
        &self.expression
    }

    pub fn into_expression(self) -> ExprRef {
        self.expression
    }
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self::new(self.expression.clone())
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.expression).finish()
    }
}

impl<T: AsValue> ColumnDeclaring for Expr<T> {
    type Value = T;

    fn as_expression(&self) -> ExprRef {
        self.expression.clone()
    }
}

/// Bound parameter with the SQL type of `T`.
pub fn value<T: AsValue>(value: T) -> Expr<T> {
    Expr::new(SqlExpression::new(ArgumentExpression {
        value: value.as_value(),
        sql_type: T::sql_type(),
    }))
}

/// Call of a function the DSL does not model, like `abs` or `coalesce`.
pub fn function<T: AsValue>(
    name: impl Into<String>,
    arguments: impl IntoIterator<Item = ExprRef>,
) -> Expr<T> {
    Expr::new(SqlExpression::new(FunctionExpression {
        name: name.into(),
        arguments: arguments.into_iter().collect(),
        sql_type: T::sql_type(),
    }))
}

/// One term of an ORDER BY clause, see [`ColumnDeclaring::asc`] and [`ColumnDeclaring::desc`].
#[derive(Debug, Clone)]
pub struct OrderByTerm {
    expression: ExprRef,
}

impl OrderByTerm {
    pub fn new(expression: ExprRef) -> Self {
        Self { expression }
    }

    pub fn expression(&self) -> &ExprRef {
        &self.expression
    }
}

/// Aggregate function call, usable as a plain expression or as a window function.
pub struct Aggregate<T> {
    aggregate_type: AggregateType,
    argument: Option<ExprRef>,
    is_distinct: bool,
    sql_type: SqlTypeRef,
    _type: PhantomData<fn() -> T>,
}

impl<T> Aggregate<T> {
    pub fn new(
        aggregate_type: AggregateType,
        argument: Option<ExprRef>,
        is_distinct: bool,
        sql_type: SqlTypeRef,
    ) -> Self {
        Self {
            aggregate_type,
            argument,
            is_distinct,
            sql_type,
            _type: PhantomData,
        }
    }

    /// Evaluate the aggregate over a window instead of a group.
    pub fn over(&self, window: Window) -> Expr<T> {
        Expr::new(SqlExpression::new(WindowFunctionExpression {
            function_type: WindowFunctionType::Aggregate(self.aggregate_type),
            arguments: self.argument.iter().cloned().collect(),
            is_distinct: self.is_distinct,
            window: window.into_specification(),
            sql_type: self.sql_type,
        }))
    }
}

impl<T> Clone for Aggregate<T> {
    fn clone(&self) -> Self {
        Self::new(
            self.aggregate_type,
            self.argument.clone(),
            self.is_distinct,
            self.sql_type,
        )
    }
}

impl<T> fmt::Debug for Aggregate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("aggregate_type", &self.aggregate_type)
            .field("argument", &self.argument)
            .field("is_distinct", &self.is_distinct)
            .finish()
    }
}

impl<T: AsValue> ColumnDeclaring for Aggregate<T> {
    type Value = T;

    fn as_expression(&self) -> ExprRef {
        SqlExpression::new(AggregateExpression {
            aggregate_type: self.aggregate_type,
            argument: self.argument.clone(),
            is_distinct: self.is_distinct,
            sql_type: self.sql_type,
        })
    }
}
