use crate::{
    Aggregate, AggregateType, ArgumentExpression, AsValue, BetweenExpression, BinaryExpression,
    BinaryOpType, BOOLEAN, CastingExpression, ColumnDeclaringExpression, DOUBLE, Expr, ExprRef,
    ExpressionKind, InListExpression, InListSource, LONG, Order, OrderByExpression, OrderByTerm,
    Query, SqlExpression, SqlTypeRef, UnaryExpression, UnaryOpType,
};
use rust_decimal::Decimal;

fn binary(operator: BinaryOpType, left: ExprRef, right: ExprRef, sql_type: SqlTypeRef) -> ExprRef {
    SqlExpression::new(BinaryExpression {
        operator,
        left,
        right,
        sql_type,
    })
}

fn unary(operator: UnaryOpType, operand: ExprRef, sql_type: SqlTypeRef) -> ExprRef {
    SqlExpression::new(UnaryExpression {
        operator,
        operand,
        sql_type,
    })
}

/// Anything that can appear in a select list or in a condition, typed by the Rust value it
/// decodes to.
///
/// Operators are named methods returning new expressions, the receiver is never modified:
///
/// ```rust
/// use quarry_core::{BooleanExpression, ColumnDeclaring, NumericExpression, Table};
/// let employee = Table::new("t_employee");
/// let salary = employee.column::<i64>("salary");
/// let _condition = salary.plus(100).greater(1000).and(salary.is_not_null());
/// ```
pub trait ColumnDeclaring {
    type Value: AsValue;

    fn as_expression(&self) -> ExprRef;

    fn sql_type(&self) -> SqlTypeRef {
        self.as_expression()
            .sql_type()
            .unwrap_or_else(<Self::Value as AsValue>::sql_type)
    }

    /// Output label, when declared with [`ColumnDeclaring::aliased`].
    fn declared_name(&self) -> Option<String> {
        match &self.as_expression().kind {
            ExpressionKind::ColumnDeclaring(v) => v.declared_name.clone(),
            _ => None,
        }
    }

    /// Node used in a select list.
    fn as_declaring(&self) -> ExprRef {
        let expression = self.as_expression();
        if matches!(expression.kind, ExpressionKind::ColumnDeclaring(..)) {
            return expression;
        }
        SqlExpression::new(ColumnDeclaringExpression {
            expression,
            declared_name: None,
        })
    }

    /// Bound parameter typed like this expression.
    fn wrap_argument(&self, value: impl Into<Self::Value>) -> ExprRef {
        SqlExpression::new(ArgumentExpression {
            value: value.into().as_value(),
            sql_type: self.sql_type(),
        })
    }

    fn aliased(&self, label: impl Into<String>) -> Expr<Self::Value> {
        let expression = self.as_expression();
        let expression = match &expression.kind {
            ExpressionKind::ColumnDeclaring(v) => v.expression.clone(),
            _ => expression,
        };
        Expr::new(SqlExpression::new(ColumnDeclaringExpression {
            expression,
            declared_name: Some(label.into()),
        }))
    }

    fn eq(&self, value: impl Into<Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::Equal,
            self.as_expression(),
            self.wrap_argument(value),
            BOOLEAN,
        ))
    }

    fn eq_expr(&self, other: impl ColumnDeclaring<Value = Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::Equal,
            self.as_expression(),
            other.as_expression(),
            BOOLEAN,
        ))
    }

    fn not_eq(&self, value: impl Into<Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::NotEqual,
            self.as_expression(),
            self.wrap_argument(value),
            BOOLEAN,
        ))
    }

    fn not_eq_expr(&self, other: impl ColumnDeclaring<Value = Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::NotEqual,
            self.as_expression(),
            other.as_expression(),
            BOOLEAN,
        ))
    }

    fn less(&self, value: impl Into<Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::Less,
            self.as_expression(),
            self.wrap_argument(value),
            BOOLEAN,
        ))
    }

    fn less_expr(&self, other: impl ColumnDeclaring<Value = Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::Less,
            self.as_expression(),
            other.as_expression(),
            BOOLEAN,
        ))
    }

    fn less_eq(&self, value: impl Into<Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::LessEqual,
            self.as_expression(),
            self.wrap_argument(value),
            BOOLEAN,
        ))
    }

    fn less_eq_expr(&self, other: impl ColumnDeclaring<Value = Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::LessEqual,
            self.as_expression(),
            other.as_expression(),
            BOOLEAN,
        ))
    }

    fn greater(&self, value: impl Into<Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::Greater,
            self.as_expression(),
            self.wrap_argument(value),
            BOOLEAN,
        ))
    }

    fn greater_expr(&self, other: impl ColumnDeclaring<Value = Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::Greater,
            self.as_expression(),
            other.as_expression(),
            BOOLEAN,
        ))
    }

    fn greater_eq(&self, value: impl Into<Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::GreaterEqual,
            self.as_expression(),
            self.wrap_argument(value),
            BOOLEAN,
        ))
    }

    fn greater_eq_expr(&self, other: impl ColumnDeclaring<Value = Self::Value>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::GreaterEqual,
            self.as_expression(),
            other.as_expression(),
            BOOLEAN,
        ))
    }

    fn between(&self, lower: impl Into<Self::Value>, upper: impl Into<Self::Value>) -> Expr<bool> {
        Expr::new(SqlExpression::new(BetweenExpression {
            expression: self.as_expression(),
            lower: self.wrap_argument(lower),
            upper: self.wrap_argument(upper),
            not_between: false,
        }))
    }

    fn not_between(
        &self,
        lower: impl Into<Self::Value>,
        upper: impl Into<Self::Value>,
    ) -> Expr<bool> {
        Expr::new(SqlExpression::new(BetweenExpression {
            expression: self.as_expression(),
            lower: self.wrap_argument(lower),
            upper: self.wrap_argument(upper),
            not_between: true,
        }))
    }

    fn in_list<I>(&self, values: I) -> Expr<bool>
    where
        I: IntoIterator,
        I::Item: Into<Self::Value>,
    {
        Expr::new(SqlExpression::new(InListExpression {
            left: self.as_expression(),
            source: InListSource::Values(
                values.into_iter().map(|v| self.wrap_argument(v)).collect(),
            ),
            not_in_list: false,
        }))
    }

    fn not_in_list<I>(&self, values: I) -> Expr<bool>
    where
        I: IntoIterator,
        I::Item: Into<Self::Value>,
    {
        Expr::new(SqlExpression::new(InListExpression {
            left: self.as_expression(),
            source: InListSource::Values(
                values.into_iter().map(|v| self.wrap_argument(v)).collect(),
            ),
            not_in_list: true,
        }))
    }

    fn in_query(&self, query: &Query) -> Expr<bool> {
        Expr::new(SqlExpression::new(InListExpression {
            left: self.as_expression(),
            source: InListSource::Query(query.expression().clone()),
            not_in_list: false,
        }))
    }

    fn not_in_query(&self, query: &Query) -> Expr<bool> {
        Expr::new(SqlExpression::new(InListExpression {
            left: self.as_expression(),
            source: InListSource::Query(query.expression().clone()),
            not_in_list: true,
        }))
    }

    fn is_null(&self) -> Expr<bool> {
        Expr::new(unary(UnaryOpType::IsNull, self.as_expression(), BOOLEAN))
    }

    fn is_not_null(&self) -> Expr<bool> {
        Expr::new(unary(UnaryOpType::IsNotNull, self.as_expression(), BOOLEAN))
    }

    fn cast<R: AsValue>(&self) -> Expr<R> {
        Expr::new(SqlExpression::new(CastingExpression {
            expression: self.as_expression(),
            sql_type: R::sql_type(),
        }))
    }

    fn asc(&self) -> OrderByTerm {
        OrderByTerm::new(SqlExpression::new(OrderByExpression {
            expression: self.as_expression(),
            order: Order::ASC,
        }))
    }

    fn desc(&self) -> OrderByTerm {
        OrderByTerm::new(SqlExpression::new(OrderByExpression {
            expression: self.as_expression(),
            order: Order::DESC,
        }))
    }

    fn count(&self) -> Aggregate<i64> {
        Aggregate::new(AggregateType::Count, Some(self.as_expression()), false, LONG)
    }

    fn count_distinct(&self) -> Aggregate<i64> {
        Aggregate::new(AggregateType::Count, Some(self.as_expression()), true, LONG)
    }

    fn sum(&self) -> Aggregate<Self::Value> {
        Aggregate::new(
            AggregateType::Sum,
            Some(self.as_expression()),
            false,
            self.sql_type(),
        )
    }

    fn avg(&self) -> Aggregate<f64> {
        Aggregate::new(AggregateType::Avg, Some(self.as_expression()), false, DOUBLE)
    }

    fn max(&self) -> Aggregate<Self::Value> {
        Aggregate::new(
            AggregateType::Max,
            Some(self.as_expression()),
            false,
            self.sql_type(),
        )
    }

    fn min(&self) -> Aggregate<Self::Value> {
        Aggregate::new(
            AggregateType::Min,
            Some(self.as_expression()),
            false,
            self.sql_type(),
        )
    }
}

impl<C: ColumnDeclaring + ?Sized> ColumnDeclaring for &C {
    type Value = C::Value;

    fn as_expression(&self) -> ExprRef {
        (**self).as_expression()
    }
}

/// Numeric types supporting arithmetic.
pub trait Numeric: AsValue {}
impl Numeric for i16 {}
impl Numeric for i32 {}
impl Numeric for i64 {}
impl Numeric for f32 {}
impl Numeric for f64 {}
impl Numeric for Decimal {}

pub trait NumericExpression<T: Numeric>: ColumnDeclaring<Value = T> {
    fn plus(&self, value: impl Into<T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Addition,
            self.as_expression(),
            self.wrap_argument(value),
            self.sql_type(),
        ))
    }

    fn plus_expr(&self, other: impl ColumnDeclaring<Value = T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Addition,
            self.as_expression(),
            other.as_expression(),
            self.sql_type(),
        ))
    }

    fn minus(&self, value: impl Into<T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Subtraction,
            self.as_expression(),
            self.wrap_argument(value),
            self.sql_type(),
        ))
    }

    fn minus_expr(&self, other: impl ColumnDeclaring<Value = T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Subtraction,
            self.as_expression(),
            other.as_expression(),
            self.sql_type(),
        ))
    }

    fn times(&self, value: impl Into<T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Multiplication,
            self.as_expression(),
            self.wrap_argument(value),
            self.sql_type(),
        ))
    }

    fn times_expr(&self, other: impl ColumnDeclaring<Value = T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Multiplication,
            self.as_expression(),
            other.as_expression(),
            self.sql_type(),
        ))
    }

    fn div(&self, value: impl Into<T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Division,
            self.as_expression(),
            self.wrap_argument(value),
            self.sql_type(),
        ))
    }

    fn div_expr(&self, other: impl ColumnDeclaring<Value = T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Division,
            self.as_expression(),
            other.as_expression(),
            self.sql_type(),
        ))
    }

    fn rem(&self, value: impl Into<T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Remainder,
            self.as_expression(),
            self.wrap_argument(value),
            self.sql_type(),
        ))
    }

    fn rem_expr(&self, other: impl ColumnDeclaring<Value = T>) -> Expr<T> {
        Expr::new(binary(
            BinaryOpType::Remainder,
            self.as_expression(),
            other.as_expression(),
            self.sql_type(),
        ))
    }

    fn unary_minus(&self) -> Expr<T> {
        Expr::new(unary(
            UnaryOpType::Negative,
            self.as_expression(),
            self.sql_type(),
        ))
    }

    fn unary_plus(&self) -> Expr<T> {
        Expr::new(unary(UnaryOpType::Plus, self.as_expression(), self.sql_type()))
    }
}

impl<T: Numeric, C: ColumnDeclaring<Value = T> + ?Sized> NumericExpression<T> for C {}

pub trait TextExpression: ColumnDeclaring<Value = String> {
    fn like(&self, pattern: impl Into<String>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::Like,
            self.as_expression(),
            self.wrap_argument(pattern),
            BOOLEAN,
        ))
    }

    fn not_like(&self, pattern: impl Into<String>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::NotLike,
            self.as_expression(),
            self.wrap_argument(pattern),
            BOOLEAN,
        ))
    }
}

impl<C: ColumnDeclaring<Value = String> + ?Sized> TextExpression for C {}

pub trait BooleanExpression: ColumnDeclaring<Value = bool> {
    fn and(&self, other: impl ColumnDeclaring<Value = bool>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::And,
            self.as_expression(),
            other.as_expression(),
            BOOLEAN,
        ))
    }

    fn or(&self, other: impl ColumnDeclaring<Value = bool>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::Or,
            self.as_expression(),
            other.as_expression(),
            BOOLEAN,
        ))
    }

    fn xor(&self, other: impl ColumnDeclaring<Value = bool>) -> Expr<bool> {
        Expr::new(binary(
            BinaryOpType::Xor,
            self.as_expression(),
            other.as_expression(),
            BOOLEAN,
        ))
    }

    fn not(&self) -> Expr<bool> {
        Expr::new(unary(UnaryOpType::Not, self.as_expression(), BOOLEAN))
    }
}

impl<C: ColumnDeclaring<Value = bool> + ?Sized> BooleanExpression for C {}

/// Columns of a select list, a single expression or a tuple of expressions.
pub trait SelectList {
    /// Select list nodes, labels included.
    fn into_columns(self) -> Vec<ExprRef>;
    /// The bare expressions, labels stripped.
    fn into_expressions(self) -> Vec<ExprRef>;
}

fn strip_label(expression: ExprRef) -> ExprRef {
    match &expression.kind {
        ExpressionKind::ColumnDeclaring(v) => v.expression.clone(),
        _ => expression,
    }
}

impl<C: ColumnDeclaring> SelectList for C {
    fn into_columns(self) -> Vec<ExprRef> {
        vec![self.as_declaring()]
    }
    fn into_expressions(self) -> Vec<ExprRef> {
        vec![strip_label(self.as_expression())]
    }
}

impl SelectList for Vec<ExprRef> {
    fn into_columns(self) -> Vec<ExprRef> {
        self.into_iter()
            .map(|v| {
                if matches!(v.kind, ExpressionKind::ColumnDeclaring(..)) {
                    v
                } else {
                    SqlExpression::new(ColumnDeclaringExpression {
                        expression: v,
                        declared_name: None,
                    })
                }
            })
            .collect()
    }
    fn into_expressions(self) -> Vec<ExprRef> {
        self.into_iter().map(strip_label).collect()
    }
}

macro_rules! impl_select_list {
    ($($name:ident),+) => {
        impl<$($name: ColumnDeclaring),+> SelectList for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_columns(self) -> Vec<ExprRef> {
                let ($($name,)+) = self;
                vec![$($name.as_declaring()),+]
            }
            #[allow(non_snake_case)]
            fn into_expressions(self) -> Vec<ExprRef> {
                let ($($name,)+) = self;
                vec![$(strip_label($name.as_expression())),+]
            }
        }
    };
}
impl_select_list!(A);
impl_select_list!(A, B);
impl_select_list!(A, B, C);
impl_select_list!(A, B, C, D);
impl_select_list!(A, B, C, D, E);
impl_select_list!(A, B, C, D, E, F);
impl_select_list!(A, B, C, D, E, F, G);
impl_select_list!(A, B, C, D, E, F, G, H);
impl_select_list!(A, B, C, D, E, F, G, H, I);
impl_select_list!(A, B, C, D, E, F, G, H, I, J);
impl_select_list!(A, B, C, D, E, F, G, H, I, J, K);
impl_select_list!(A, B, C, D, E, F, G, H, I, J, K, L);
