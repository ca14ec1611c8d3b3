use crate::{
    ConflictAction, DefaultValueExpression, ExcludedExpression, ILikeExpression,
    InsertOrUpdateExpression, LOCKING_CLAUSE, LockingClause, LockingMode,
};
use quarry_core::{
    AliasRemover, Assignments, AsValue, BOOLEAN, CachedRowSet, Column, ColumnAssignmentExpression,
    ColumnDeclaring, Error, Executor, Expr, ExprRef, ExpressionKind, ExpressionVisitor, Query,
    Result, SelectList, SqlError, Table, TextExpression, extension, value,
};
use std::ops::{Deref, DerefMut};

/// Builder of an `INSERT .. ON CONFLICT ..` statement.
///
/// Without an explicit action, every inserted column that is not part of the conflict target is
/// updated with the value proposed for insertion (`col = EXCLUDED.col`).
#[derive(Debug, Clone, Default)]
pub struct InsertOrUpdateStatement {
    assignments: Assignments,
    conflict_columns: Vec<ExprRef>,
    updates: Assignments,
    do_nothing: bool,
    returning: Vec<ExprRef>,
}

impl InsertOrUpdateStatement {
    /// Conflict target, usually the primary key or a unique constraint.
    pub fn on_conflict(&mut self, columns: impl SelectList) -> &mut Self {
        self.conflict_columns = columns.into_expressions();
        self
    }

    pub fn do_update(&mut self, build: impl FnOnce(&mut Assignments)) -> &mut Self {
        build(&mut self.updates);
        self.do_nothing = false;
        self
    }

    pub fn do_nothing(&mut self) -> &mut Self {
        self.do_nothing = true;
        self
    }

    pub fn returning(&mut self, columns: impl SelectList) -> &mut Self {
        self.returning = columns.into_expressions();
        self
    }

    fn implicit_updates(&self) -> Vec<ExprRef> {
        let conflict = self
            .conflict_columns
            .iter()
            .filter_map(|v| match &v.kind {
                ExpressionKind::Column(v) => Some(v.name.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();
        self.assignments
            .to_expressions()
            .into_iter()
            .filter_map(|v| {
                let ExpressionKind::ColumnAssignment(assignment) = &v.kind else {
                    return None;
                };
                let ExpressionKind::Column(column) = &assignment.column.kind else {
                    return None;
                };
                if conflict.iter().any(|c| c.eq_ignore_ascii_case(&column.name)) {
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
    let action = if statement.do_nothing {
        ConflictAction::DoNothing
    } else {
        let updates = if statement.updates.is_empty() {
            statement.implicit_updates()
        } else {
            statement.updates.to_expressions()
        };
        if updates.is_empty() {
            log::debug!("Every inserted column is part of the conflict target, nothing to update");
            ConflictAction::DoNothing
        } else if statement.conflict_columns.is_empty() {
            return Err(Error::msg(
                "Specify the conflict columns with `on_conflict` to update on conflict",
            ));
        } else {
            ConflictAction::DoUpdate(updates)
        }
    };
    Ok(extension(InsertOrUpdateExpression {
        table: table.as_expression(),
        assignments: statement.assignments.to_expressions(),
        conflict_columns: statement.conflict_columns,
        action,
        returning: statement.returning,
    }))
}

/// Statements only PostgreSQL understands.
pub trait PostgresExecutor: Executor {
    /// Upsert, returns the number of inserted or updated rows.
    fn insert_or_update(
        &self,
        table: &Table,
        build: impl FnOnce(&mut InsertOrUpdateStatement),
    ) -> Result<u64> {
        let expression = AliasRemover.visit(&insert_or_update_expression(table, build)?)?;
        self.execute_update(&expression)
    }

    /// Upsert and read back the columns named with [`InsertOrUpdateStatement::returning`].
    fn insert_or_update_returning(
        &self,
        table: &Table,
        build: impl FnOnce(&mut InsertOrUpdateStatement),
    ) -> Result<CachedRowSet> {
        let expression = AliasRemover.visit(&insert_or_update_expression(table, build)?)?;
        self.execute_query(&expression)
    }
}

impl<E: Executor> PostgresExecutor for E {}

pub trait PostgresQuery {
    fn locking(self, clause: LockingClause) -> Query;

    fn for_update(self) -> Query
    where
        Self: Sized,
    {
        self.locking(LockingClause::new(LockingMode::ForUpdate))
    }

    fn for_share(self) -> Query
    where
        Self: Sized,
    {
        self.locking(LockingClause::new(LockingMode::ForShare))
    }
}

impl PostgresQuery for Query {
    fn locking(self, clause: LockingClause) -> Query {
        self.with_property(LOCKING_CLAUSE, clause)
    }
}

fn ilike(left: ExprRef, pattern: String, not_ilike: bool) -> Expr<bool> {
    Expr::new(extension(ILikeExpression {
        left,
        pattern: value(pattern).into_expression(),
        not_ilike,
        sql_type: BOOLEAN,
    }))
}

/// Text predicates with PostgreSQL specific operators.
///
/// ```rust
/// use quarry_core::Table;
/// use quarry_postgres::PostgresTextExpression;
/// let employee = Table::new("t_employee");
/// let _condition = employee.column::<String>("name").ilike("vin%");
/// ```
pub trait PostgresTextExpression: TextExpression {
    fn ilike(&self, pattern: impl Into<String>) -> Expr<bool> {
        ilike(self.as_expression(), pattern.into(), false)
    }

    fn not_ilike(&self, pattern: impl Into<String>) -> Expr<bool> {
        ilike(self.as_expression(), pattern.into(), true)
    }
}

impl<C: ColumnDeclaring<Value = String> + ?Sized> PostgresTextExpression for C {}

/// `EXCLUDED.column`, for `ON CONFLICT DO UPDATE` assignments.
pub fn excluded<T: AsValue>(column: &Column<T>) -> Expr<T> {
    Expr::new(
        extension(ExcludedExpression {
            column: column.as_expression(),
        })
        .with_leaf_node(true),
    )
}

/// `DEFAULT`, usable as the value of an assignment.
pub fn default_value<T: AsValue>() -> Expr<T> {
    Expr::new(
        extension(DefaultValueExpression {
            sql_type: T::sql_type(),
        })
        .with_leaf_node(true),
    )
}
