use crate::{
    AggregateExpression, BetweenExpression, BinaryExpression, BulkInsertExpression,
    CaseWhenExpression, CastingExpression, ColumnAssignmentExpression, ColumnDeclaringExpression,
    DeleteExpression, ExistsExpression, ExprRef, ExpressionKind, ExtensionExpression, FrameBound,
    FunctionExpression, InListExpression, InListSource, InsertExpression,
    InsertFromQueryExpression, JoinExpression, OrderByExpression, Result, SelectExpression,
    UnaryExpression, UnionExpression, UpdateExpression, WindowFrame, WindowFunctionExpression,
    WindowSpecification,
};
use std::sync::Arc;

/// Walks an expression tree, optionally producing a transformed copy.
///
/// Every method has a default implementation: leaves are returned as they are, composite nodes
/// visit their children and are rebuilt only when at least one child came back as a different
/// node. A visitor overriding nothing therefore returns the very same `Arc` it was given.
///
/// Override `visit_*` to intercept a variant, call the matching `walk_*` function to keep the
/// default descent.
pub trait ExpressionVisitor {
    fn visit(&mut self, expr: &ExprRef) -> Result<ExprRef> {
        walk(self, expr)
    }
    fn visit_table(&mut self, expr: &ExprRef, _table: &crate::TableExpression) -> Result<ExprRef> {
        Ok(expr.clone())
    }
    fn visit_column(
        &mut self,
        expr: &ExprRef,
        _column: &crate::ColumnExpression,
    ) -> Result<ExprRef> {
        Ok(expr.clone())
    }
    fn visit_argument(
        &mut self,
        expr: &ExprRef,
        _argument: &crate::ArgumentExpression,
    ) -> Result<ExprRef> {
        Ok(expr.clone())
    }
    fn visit_column_declaring(
        &mut self,
        expr: &ExprRef,
        column: &ColumnDeclaringExpression,
    ) -> Result<ExprRef> {
        walk_column_declaring(self, expr, column)
    }
    fn visit_unary(&mut self, expr: &ExprRef, unary: &UnaryExpression) -> Result<ExprRef> {
        walk_unary(self, expr, unary)
    }
    fn visit_binary(&mut self, expr: &ExprRef, binary: &BinaryExpression) -> Result<ExprRef> {
        walk_binary(self, expr, binary)
    }
    fn visit_between(&mut self, expr: &ExprRef, between: &BetweenExpression) -> Result<ExprRef> {
        walk_between(self, expr, between)
    }
    fn visit_in_list(&mut self, expr: &ExprRef, in_list: &InListExpression) -> Result<ExprRef> {
        walk_in_list(self, expr, in_list)
    }
    fn visit_exists(&mut self, expr: &ExprRef, exists: &ExistsExpression) -> Result<ExprRef> {
        walk_exists(self, expr, exists)
    }
    fn visit_casting(&mut self, expr: &ExprRef, casting: &CastingExpression) -> Result<ExprRef> {
        walk_casting(self, expr, casting)
    }
    fn visit_function(
        &mut self,
        expr: &ExprRef,
        function: &FunctionExpression,
    ) -> Result<ExprRef> {
        walk_function(self, expr, function)
    }
    fn visit_aggregate(
        &mut self,
        expr: &ExprRef,
        aggregate: &AggregateExpression,
    ) -> Result<ExprRef> {
        walk_aggregate(self, expr, aggregate)
    }
    fn visit_case_when(
        &mut self,
        expr: &ExprRef,
        case_when: &CaseWhenExpression,
    ) -> Result<ExprRef> {
        walk_case_when(self, expr, case_when)
    }
    fn visit_window_function(
        &mut self,
        expr: &ExprRef,
        window_function: &WindowFunctionExpression,
    ) -> Result<ExprRef> {
        walk_window_function(self, expr, window_function)
    }
    fn visit_order_by(&mut self, expr: &ExprRef, order_by: &OrderByExpression) -> Result<ExprRef> {
        walk_order_by(self, expr, order_by)
    }
    fn visit_join(&mut self, expr: &ExprRef, join: &JoinExpression) -> Result<ExprRef> {
        walk_join(self, expr, join)
    }
    fn visit_select(&mut self, expr: &ExprRef, select: &SelectExpression) -> Result<ExprRef> {
        walk_select(self, expr, select)
    }
    fn visit_union(&mut self, expr: &ExprRef, union: &UnionExpression) -> Result<ExprRef> {
        walk_union(self, expr, union)
    }
    fn visit_insert(&mut self, expr: &ExprRef, insert: &InsertExpression) -> Result<ExprRef> {
        walk_insert(self, expr, insert)
    }
    fn visit_insert_from_query(
        &mut self,
        expr: &ExprRef,
        insert: &InsertFromQueryExpression,
    ) -> Result<ExprRef> {
        walk_insert_from_query(self, expr, insert)
    }
    fn visit_bulk_insert(
        &mut self,
        expr: &ExprRef,
        insert: &BulkInsertExpression,
    ) -> Result<ExprRef> {
        walk_bulk_insert(self, expr, insert)
    }
    fn visit_update(&mut self, expr: &ExprRef, update: &UpdateExpression) -> Result<ExprRef> {
        walk_update(self, expr, update)
    }
    fn visit_delete(&mut self, expr: &ExprRef, delete: &DeleteExpression) -> Result<ExprRef> {
        walk_delete(self, expr, delete)
    }
    fn visit_column_assignment(
        &mut self,
        expr: &ExprRef,
        assignment: &ColumnAssignmentExpression,
    ) -> Result<ExprRef> {
        walk_column_assignment(self, expr, assignment)
    }
    fn visit_extension(
        &mut self,
        expr: &ExprRef,
        extension: &Arc<dyn ExtensionExpression>,
    ) -> Result<ExprRef> {
        walk_extension(self, expr, extension)
    }
}

/// Dispatch `expr` to the `visit_*` method of its variant.
pub fn walk<V: ExpressionVisitor + ?Sized>(visitor: &mut V, expr: &ExprRef) -> Result<ExprRef> {
    match &expr.kind {
        ExpressionKind::Table(v) => visitor.visit_table(expr, v),
        ExpressionKind::Column(v) => visitor.visit_column(expr, v),
        ExpressionKind::ColumnDeclaring(v) => visitor.visit_column_declaring(expr, v),
        ExpressionKind::Argument(v) => visitor.visit_argument(expr, v),
        ExpressionKind::Unary(v) => visitor.visit_unary(expr, v),
        ExpressionKind::Binary(v) => visitor.visit_binary(expr, v),
        ExpressionKind::Between(v) => visitor.visit_between(expr, v),
        ExpressionKind::InList(v) => visitor.visit_in_list(expr, v),
        ExpressionKind::Exists(v) => visitor.visit_exists(expr, v),
        ExpressionKind::Casting(v) => visitor.visit_casting(expr, v),
        ExpressionKind::Function(v) => visitor.visit_function(expr, v),
        ExpressionKind::Aggregate(v) => visitor.visit_aggregate(expr, v),
        ExpressionKind::CaseWhen(v) => visitor.visit_case_when(expr, v),
        ExpressionKind::WindowFunction(v) => visitor.visit_window_function(expr, v),
        ExpressionKind::OrderBy(v) => visitor.visit_order_by(expr, v),
        ExpressionKind::Join(v) => visitor.visit_join(expr, v),
        ExpressionKind::Select(v) => visitor.visit_select(expr, v),
        ExpressionKind::Union(v) => visitor.visit_union(expr, v),
        ExpressionKind::Insert(v) => visitor.visit_insert(expr, v),
        ExpressionKind::InsertFromQuery(v) => visitor.visit_insert_from_query(expr, v),
        ExpressionKind::BulkInsert(v) => visitor.visit_bulk_insert(expr, v),
        ExpressionKind::Update(v) => visitor.visit_update(expr, v),
        ExpressionKind::Delete(v) => visitor.visit_delete(expr, v),
        ExpressionKind::ColumnAssignment(v) => visitor.visit_column_assignment(expr, v),
        ExpressionKind::Extension(v) => visitor.visit_extension(expr, v),
    }
}

/// Tracks whether any child came back as a different node.
struct Children<'v, V: ?Sized> {
    visitor: &'v mut V,
    changed: bool,
}

impl<'v, V: ExpressionVisitor + ?Sized> Children<'v, V> {
    fn new(visitor: &'v mut V) -> Self {
        Self {
            visitor,
            changed: false,
        }
    }

    fn one(&mut self, child: &ExprRef) -> Result<ExprRef> {
        let result = self.visitor.visit(child)?;
        if !Arc::ptr_eq(&result, child) {
            self.changed = true;
        }
        Ok(result)
    }

    fn option(&mut self, child: &Option<ExprRef>) -> Result<Option<ExprRef>> {
        child.as_ref().map(|v| self.one(v)).transpose()
    }

    fn list(&mut self, children: &[ExprRef]) -> Result<Vec<ExprRef>> {
        children.iter().map(|v| self.one(v)).collect()
    }

    fn frame_bound(&mut self, bound: &FrameBound) -> Result<FrameBound> {
        Ok(match bound {
            FrameBound::Preceding(v) => FrameBound::Preceding(self.one(v)?),
            FrameBound::Following(v) => FrameBound::Following(self.one(v)?),
            v => v.clone(),
        })
    }

    fn window(&mut self, window: &WindowSpecification) -> Result<WindowSpecification> {
        Ok(WindowSpecification {
            partition_by: self.list(&window.partition_by)?,
            order_by: self.list(&window.order_by)?,
            frame: window
                .frame
                .as_ref()
                .map(|frame| -> Result<WindowFrame> {
                    Ok(WindowFrame {
                        unit: frame.unit,
                        start: self.frame_bound(&frame.start)?,
                        end: frame.end.as_ref().map(|v| self.frame_bound(v)).transpose()?,
                    })
                })
                .transpose()?,
        })
    }
}

macro_rules! rebuild {
    ($children:ident, $expr:ident, $payload:expr) => {{
        let payload = $payload;
        Ok(if $children.changed {
            $expr.rebuild(payload)
        } else {
            $expr.clone()
        })
    }};
}

pub fn walk_column_declaring<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    column: &ColumnDeclaringExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        ColumnDeclaringExpression {
            expression: children.one(&column.expression)?,
            declared_name: column.declared_name.clone(),
        }
    )
}

pub fn walk_unary<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    unary: &UnaryExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        UnaryExpression {
            operand: children.one(&unary.operand)?,
            ..unary.clone()
        }
    )
}

pub fn walk_binary<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    binary: &BinaryExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        BinaryExpression {
            operator: binary.operator,
            left: children.one(&binary.left)?,
            right: children.one(&binary.right)?,
            sql_type: binary.sql_type,
        }
    )
}

pub fn walk_between<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    between: &BetweenExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        BetweenExpression {
            expression: children.one(&between.expression)?,
            lower: children.one(&between.lower)?,
            upper: children.one(&between.upper)?,
            not_between: between.not_between,
        }
    )
}

pub fn walk_in_list<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    in_list: &InListExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        InListExpression {
            left: children.one(&in_list.left)?,
            source: match &in_list.source {
                InListSource::Query(v) => InListSource::Query(children.one(v)?),
                InListSource::Values(v) => InListSource::Values(children.list(v)?),
            },
            not_in_list: in_list.not_in_list,
        }
    )
}

pub fn walk_exists<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    exists: &ExistsExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        ExistsExpression {
            query: children.one(&exists.query)?,
            not_exists: exists.not_exists,
        }
    )
}

pub fn walk_casting<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    casting: &CastingExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        CastingExpression {
            expression: children.one(&casting.expression)?,
            sql_type: casting.sql_type,
        }
    )
}

pub fn walk_function<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    function: &FunctionExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        FunctionExpression {
            name: function.name.clone(),
            arguments: children.list(&function.arguments)?,
            sql_type: function.sql_type,
        }
    )
}

pub fn walk_aggregate<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    aggregate: &AggregateExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        AggregateExpression {
            argument: children.option(&aggregate.argument)?,
            ..aggregate.clone()
        }
    )
}

pub fn walk_case_when<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    case_when: &CaseWhenExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    let operand = children.option(&case_when.operand)?;
    let when_clauses = case_when
        .when_clauses
        .iter()
        .map(|(condition, result)| Ok((children.one(condition)?, children.one(result)?)))
        .collect::<Result<Vec<_>>>()?;
    rebuild!(
        children,
        expr,
        CaseWhenExpression {
            operand,
            when_clauses,
            else_clause: children.option(&case_when.else_clause)?,
            sql_type: case_when.sql_type,
        }
    )
}

pub fn walk_window_function<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    window_function: &WindowFunctionExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        WindowFunctionExpression {
            function_type: window_function.function_type,
            arguments: children.list(&window_function.arguments)?,
            is_distinct: window_function.is_distinct,
            window: children.window(&window_function.window)?,
            sql_type: window_function.sql_type,
        }
    )
}

pub fn walk_order_by<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    order_by: &OrderByExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        OrderByExpression {
            expression: children.one(&order_by.expression)?,
            order: order_by.order,
        }
    )
}

pub fn walk_join<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    join: &JoinExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        JoinExpression {
            join_type: join.join_type,
            left: children.one(&join.left)?,
            right: children.one(&join.right)?,
            condition: children.option(&join.condition)?,
        }
    )
}

pub fn walk_select<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    select: &SelectExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        SelectExpression {
            columns: children.list(&select.columns)?,
            from: children.one(&select.from)?,
            where_clause: children.option(&select.where_clause)?,
            group_by: children.list(&select.group_by)?,
            having: children.option(&select.having)?,
            is_distinct: select.is_distinct,
            order_by: children.list(&select.order_by)?,
            offset: select.offset,
            limit: select.limit,
            table_alias: select.table_alias.clone(),
        }
    )
}

pub fn walk_union<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    union: &UnionExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        UnionExpression {
            left: children.one(&union.left)?,
            right: children.one(&union.right)?,
            is_union_all: union.is_union_all,
            order_by: children.list(&union.order_by)?,
            offset: union.offset,
            limit: union.limit,
            table_alias: union.table_alias.clone(),
        }
    )
}

pub fn walk_insert<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    insert: &InsertExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        InsertExpression {
            table: children.one(&insert.table)?,
            assignments: children.list(&insert.assignments)?,
        }
    )
}

pub fn walk_insert_from_query<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    insert: &InsertFromQueryExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        InsertFromQueryExpression {
            table: children.one(&insert.table)?,
            columns: children.list(&insert.columns)?,
            query: children.one(&insert.query)?,
        }
    )
}

pub fn walk_bulk_insert<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    insert: &BulkInsertExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    let table = children.one(&insert.table)?;
    let rows = insert
        .rows
        .iter()
        .map(|row| children.list(row))
        .collect::<Result<Vec<_>>>()?;
    rebuild!(children, expr, BulkInsertExpression { table, rows })
}

pub fn walk_update<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    update: &UpdateExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        UpdateExpression {
            table: children.one(&update.table)?,
            assignments: children.list(&update.assignments)?,
            where_clause: children.option(&update.where_clause)?,
        }
    )
}

pub fn walk_delete<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    delete: &DeleteExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        DeleteExpression {
            table: children.one(&delete.table)?,
            where_clause: children.option(&delete.where_clause)?,
        }
    )
}

pub fn walk_column_assignment<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    assignment: &ColumnAssignmentExpression,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    rebuild!(
        children,
        expr,
        ColumnAssignmentExpression {
            column: children.one(&assignment.column)?,
            expression: children.one(&assignment.expression)?,
        }
    )
}

pub fn walk_extension<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &ExprRef,
    extension: &Arc<dyn ExtensionExpression>,
) -> Result<ExprRef> {
    let mut children = Children::new(visitor);
    let visited = children.list(&extension.children())?;
    if !children.changed {
        return Ok(expr.clone());
    }
    Ok(expr.rebuild(ExpressionKind::Extension(
        extension.with_children(visited),
    )))
}
