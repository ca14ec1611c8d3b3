use crate::{ExcludedExpression, InsertOrUpdateExpression};
use quarry_core::{
    AliasRemover, Assignments, AsValue, Column, ColumnAssignmentExpression, ColumnDeclaring,
    Error, Executor, Expr, ExprRef, ExpressionKind, ExpressionVisitor, Result, SelectList,
    SqlError, Table, extension,
};
use std::ops::{Deref, DerefMut};

/// Builder of an SQLite upsert.
#[derive(Debug, Clone, Default)]
pub struct InsertOrUpdateStatement {
    assignments: Assignments,
    conflict_columns: Vec<ExprRef>,
    updates: Assignments,
    do_nothing: bool,
}

impl InsertOrUpdateStatement {
    pub fn on_conflict(&mut self, columns: impl SelectList) -> &mut Self {
        self.conflict_columns = columns.into_expressions();
        self
    }

    /// Explicit `DO UPDATE SET` assignments, the default updates every other inserted column.
    pub fn do_update(&mut self, build: impl FnOnce(&mut Assignments)) -> &mut Self {
        build(&mut self.updates);
        self.do_nothing = false;
        self
    }

    pub fn do_nothing(&mut self) -> &mut Self {
        self.do_nothing = true;
        self
    }

    fn is_conflict_column(&self, name: &str) -> bool {
        self.conflict_columns.iter().any(|v| match &v.kind {
            ExpressionKind::Column(column) => column.name.eq_ignore_ascii_case(name),
            _ => false,
        })
    }
}

impl Deref for InsertOrUpdateStatement {
    type Target = Assignments;

    fn deref(&self) -> &Self::Target {
        &self.assignments
    }
}

impl DerefMut for InsertOrUpdateStatement {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.assignments
    }
}

pub fn insert_or_update_expression(
    table: &Table,
    build: impl FnOnce(&mut InsertOrUpdateStatement),
) -> Result<ExprRef> {
    let mut statement = InsertOrUpdateStatement::default();
    build(&mut statement);
    if statement.assignments.is_empty() {
        return Err(SqlError::EmptyAssignments("insert").into());
    }
    let assignments = statement.assignments.to_expressions();
    let updates = if statement.do_nothing {
        Vec::new()
    } else if !statement.updates.is_empty() {
        statement.updates.to_expressions()
    } else {
        assignments
            .iter()
            .filter_map(|v| {
                let ExpressionKind::ColumnAssignment(assignment) = &v.kind else {
                    return None;
                };
                let ExpressionKind::Column(column) = &assignment.column.kind else {
                    return None;
                };
                if statement.is_conflict_column(&column.name) {
                    return None;
                }
                Some(v.rebuild(ColumnAssignmentExpression {
                    column: assignment.column.clone(),
                    expression: extension(ExcludedExpression {
                        column: assignment.column.clone(),
                    })
                    .with_leaf_node(true),
                }))
            })
            .collect()
    };
    if !updates.is_empty() && statement.conflict_columns.is_empty() {
        return Err(Error::msg(
            "Specify the conflict columns with `on_conflict` to update on conflict",
        ));
    }
    Ok(extension(InsertOrUpdateExpression {
        table: table.as_expression(),
        assignments,
        conflict_columns: statement.conflict_columns,
        updates,
    }))
}

/// Statements only SQLite understands.
pub trait SQLiteExecutor: Executor {
    /// Upsert, returns the number of inserted or updated rows.
    fn insert_or_update(
        &self,
        table: &Table,
        build: impl FnOnce(&mut InsertOrUpdateStatement),
    ) -> Result<u64> {
        let expression = AliasRemover.visit(&insert_or_update_expression(table, build)?)?;
        self.execute_update(&expression)
    }
}

impl<E: Executor> SQLiteExecutor for E {}

/// `excluded.column`, the value that failed to be inserted.
pub fn excluded<T: AsValue>(column: &Column<T>) -> Expr<T> {
    Expr::new(
        extension(ExcludedExpression {
            column: column.as_expression(),
        })
        .with_leaf_node(true),
    )
}
