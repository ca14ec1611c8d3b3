use crate::{
    Aggregate, AggregateType, AsValue, CaseWhenExpression, ColumnDeclaring, DOUBLE,
    ExistsExpression, Expr, ExprRef, FrameBound, FrameUnit, LONG, OrderByTerm, Query,
    SqlExpression, SqlTypeRef, WindowFrame, WindowFunctionExpression, WindowFunctionType,
    WindowSpecification, argument,
};
use std::marker::PhantomData;

/// `count(*)`.
pub fn count_all() -> Aggregate<i64> {
    Aggregate::new(AggregateType::Count, None, false, LONG)
}

pub fn exists(query: &Query) -> Expr<bool> {
    Expr::new(SqlExpression::new(ExistsExpression {
        query: query.expression().clone(),
        not_exists: false,
    }))
}

pub fn not_exists(query: &Query) -> Expr<bool> {
    Expr::new(SqlExpression::new(ExistsExpression {
        query: query.expression().clone(),
        not_exists: true,
    }))
}

/// `CASE [operand] WHEN .. THEN .. [ELSE ..] END` builder.
///
/// ```rust
/// use quarry_core::{ColumnDeclaring, Table, case_when};
/// let employee = Table::new("t_employee");
/// let salary = employee.column::<i64>("salary");
/// let _level = case_when::<String>()
///     .when_value(salary.greater(1000), "high")
///     .otherwise_value("low");
/// ```
pub struct CaseWhen<T> {
    operand: Option<ExprRef>,
    when_clauses: Vec<(ExprRef, ExprRef)>,
    _type: PhantomData<fn() -> T>,
}

pub fn case_when<T: AsValue>() -> CaseWhen<T> {
    CaseWhen {
        operand: None,
        when_clauses: Vec::new(),
        _type: PhantomData,
    }
}

impl<T: AsValue> CaseWhen<T> {
    /// Simple form: every condition is compared to `operand`.
    pub fn on(operand: impl ColumnDeclaring) -> Self {
        Self {
            operand: Some(operand.as_expression()),
            ..case_when()
        }
    }

    pub fn when(
        mut self,
        condition: impl ColumnDeclaring,
        result: impl ColumnDeclaring<Value = T>,
    ) -> Self {
        self.when_clauses
            .push((condition.as_expression(), result.as_expression()));
        self
    }

    pub fn when_value(mut self, condition: impl ColumnDeclaring, result: impl Into<T>) -> Self {
        self.when_clauses
            .push((condition.as_expression(), crate::value(result.into()).into_expression()));
        self
    }

    pub fn otherwise(self, result: impl ColumnDeclaring<Value = T>) -> Expr<T> {
        self.build(Some(result.as_expression()))
    }

    pub fn otherwise_value(self, result: impl Into<T>) -> Expr<T> {
        self.build(Some(crate::value(result.into()).into_expression()))
    }

    /// Finish without an ELSE branch.
    pub fn end(self) -> Expr<T> {
        self.build(None)
    }

    fn build(self, else_clause: Option<ExprRef>) -> Expr<T> {
        Expr::new(SqlExpression::new(CaseWhenExpression {
            operand: self.operand,
            when_clauses: self.when_clauses,
            else_clause,
            sql_type: T::sql_type(),
        }))
    }
}

impl FrameBound {
    /// `n PRECEDING`.
    pub fn preceding(n: i64) -> Self {
        FrameBound::Preceding(argument(n))
    }

    /// `n FOLLOWING`.
    pub fn following(n: i64) -> Self {
        FrameBound::Following(argument(n))
    }
}

/// Window specification: `PARTITION BY`, `ORDER BY` and frame.
#[derive(Debug, Clone, Default)]
pub struct Window {
    specification: WindowSpecification,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_by(mut self, column: impl ColumnDeclaring) -> Self {
        self.specification.partition_by.push(column.as_expression());
        self
    }

    pub fn order_by(mut self, term: OrderByTerm) -> Self {
        self.specification.order_by.push(term.expression().clone());
        self
    }

    pub fn rows(self, start: FrameBound) -> Self {
        self.frame(FrameUnit::Rows, start, None)
    }

    pub fn rows_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameUnit::Rows, start, Some(end))
    }

    pub fn range(self, start: FrameBound) -> Self {
        self.frame(FrameUnit::Range, start, None)
    }

    pub fn range_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameUnit::Range, start, Some(end))
    }

    pub fn groups_between(self, start: FrameBound, end: FrameBound) -> Self {
        self.frame(FrameUnit::Groups, start, Some(end))
    }

    fn frame(mut self, unit: FrameUnit, start: FrameBound, end: Option<FrameBound>) -> Self {
        self.specification.frame = Some(WindowFrame { unit, start, end });
        self
    }

    pub fn into_specification(self) -> WindowSpecification {
        self.specification
    }
}

/// Window function waiting for its `OVER` clause.
pub struct WindowFunction<T> {
    function_type: WindowFunctionType,
    arguments: Vec<ExprRef>,
    sql_type: SqlTypeRef,
    _type: PhantomData<fn() -> T>,
}

impl<T> WindowFunction<T> {
    fn new(
        function_type: WindowFunctionType,
        arguments: Vec<ExprRef>,
        sql_type: SqlTypeRef,
    ) -> Self {
        Self {
            function_type,
            arguments,
            sql_type,
            _type: PhantomData,
        }
    }

    pub fn over(self, window: Window) -> Expr<T> {
        Expr::new(SqlExpression::new(WindowFunctionExpression {
            function_type: self.function_type,
            arguments: self.arguments,
            is_distinct: false,
            window: window.into_specification(),
            sql_type: self.sql_type,
        }))
    }
}

pub fn row_number() -> WindowFunction<i64> {
    WindowFunction::new(WindowFunctionType::RowNumber, Vec::new(), LONG)
}

pub fn rank() -> WindowFunction<i64> {
    WindowFunction::new(WindowFunctionType::Rank, Vec::new(), LONG)
}

pub fn dense_rank() -> WindowFunction<i64> {
    WindowFunction::new(WindowFunctionType::DenseRank, Vec::new(), LONG)
}

pub fn percent_rank() -> WindowFunction<f64> {
    WindowFunction::new(WindowFunctionType::PercentRank, Vec::new(), DOUBLE)
}

pub fn cume_dist() -> WindowFunction<f64> {
    WindowFunction::new(WindowFunctionType::CumeDist, Vec::new(), DOUBLE)
}

pub fn ntile(buckets: i64) -> WindowFunction<i64> {
    WindowFunction::new(WindowFunctionType::Ntile, vec![argument(buckets)], LONG)
}

fn offset_function<C: ColumnDeclaring>(
    function_type: WindowFunctionType,
    column: C,
    offset: i64,
    default: Option<C::Value>,
) -> WindowFunction<C::Value> {
    let mut arguments = vec![column.as_expression(), argument(offset)];
    if let Some(default) = default {
        arguments.push(column.wrap_argument(default));
    }
    WindowFunction::new(function_type, arguments, column.sql_type())
}

/// Value of `column` `offset` rows before the current one, `default` when there is none.
pub fn lag<C: ColumnDeclaring>(
    column: C,
    offset: i64,
    default: Option<C::Value>,
) -> WindowFunction<C::Value> {
    offset_function(WindowFunctionType::Lag, column, offset, default)
}

/// Value of `column` `offset` rows after the current one, `default` when there is none.
pub fn lead<C: ColumnDeclaring>(
    column: C,
    offset: i64,
    default: Option<C::Value>,
) -> WindowFunction<C::Value> {
    offset_function(WindowFunctionType::Lead, column, offset, default)
}

pub fn first_value<C: ColumnDeclaring>(column: C) -> WindowFunction<C::Value> {
    WindowFunction::new(
        WindowFunctionType::FirstValue,
        vec![column.as_expression()],
        column.sql_type(),
    )
}

pub fn last_value<C: ColumnDeclaring>(column: C) -> WindowFunction<C::Value> {
    WindowFunction::new(
        WindowFunctionType::LastValue,
        vec![column.as_expression()],
        column.sql_type(),
    )
}

pub fn nth_value<C: ColumnDeclaring>(column: C, n: i64) -> WindowFunction<C::Value> {
    WindowFunction::new(
        WindowFunctionType::NthValue,
        vec![column.as_expression(), argument(n)],
        column.sql_type(),
    )
}
