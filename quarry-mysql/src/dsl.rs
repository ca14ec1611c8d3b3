use crate::{
    DefaultValueExpression, InsertOrUpdateExpression, LOCKING_CLAUSE, LockingClause, LockingMode,
    MatchAgainstExpression, NaturalJoinExpression, SearchModifier,
};
use quarry_core::{
    AliasRemover, Assignments, AsValue, BOOLEAN, ColumnDeclaring, Executor, Expr, ExprRef,
    ExpressionVisitor, Query, QuerySource, Result, SelectList, Source, SqlError, Table,
    TextExpression, extension, value,
};
use std::ops::{Deref, DerefMut};

/// Assignments of an insert, plus the ones applied on a duplicate key.
#[derive(Debug, Clone, Default)]
pub struct InsertOrUpdateStatement {
    assignments: Assignments,
    updates: Assignments,
}

impl InsertOrUpdateStatement {
    /// Columns to update when the row already exists. Without it every inserted column is
    /// updated with the inserted value.
    pub fn on_duplicate_key(&mut self, build: impl FnOnce(&mut Assignments)) -> &mut Self {
        build(&mut self.updates);
        self
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
    let updates = if statement.updates.is_empty() {
        &statement.assignments
    } else {
        &statement.updates
    };
    Ok(extension(InsertOrUpdateExpression {
        table: table.as_expression(),
        assignments: statement.assignments.to_expressions(),
        updates: updates.to_expressions(),
    }))
}

/// Statements only MySQL understands.
pub trait MySQLExecutor: Executor {
    /// `INSERT .. ON DUPLICATE KEY UPDATE ..`, returns the affected rows as MySQL counts them:
    /// 1 for an insert, 2 for an update.
    fn insert_or_update(
        &self,
        table: &Table,
        build: impl FnOnce(&mut InsertOrUpdateStatement),
    ) -> Result<u64> {
        let expression = AliasRemover.visit(&insert_or_update_expression(table, build)?)?;
        self.execute_update(&expression)
    }
}

impl<E: Executor> MySQLExecutor for E {}

pub trait MySQLQuerySource {
    fn natural_join(&self, right: &impl Source) -> QuerySource;
}

impl MySQLQuerySource for QuerySource {
    fn natural_join(&self, right: &impl Source) -> QuerySource {
        let join = extension(NaturalJoinExpression {
            left: self.expression().clone(),
            right: right.source_expression(),
        })
        .with_leaf_node(true);
        QuerySource::new(self.session().clone(), join)
    }
}

pub trait MySQLQuery {
    fn locking(self, clause: LockingClause) -> Query;

    /// `FOR UPDATE`.
    fn for_update(self) -> Query
    where
        Self: Sized,
    {
        self.locking(LockingClause::new(LockingMode::ForUpdate))
    }

    /// `LOCK IN SHARE MODE`.
    fn lock_in_share_mode(self) -> Query
    where
        Self: Sized,
    {
        self.locking(LockingClause::new(LockingMode::LockInShareMode))
    }
}

impl MySQLQuery for Query {
    fn locking(self, clause: LockingClause) -> Query {
        self.with_property(LOCKING_CLAUSE, clause)
    }
}

/// `MATCH (columns) AGAINST (search [modifier])`, true for rows with a positive relevance.
///
/// ```rust
/// use quarry_core::Table;
/// use quarry_mysql::{SearchModifier, match_against};
/// let book = Table::new("t_book");
/// let _found = match_against(
///     (book.column::<String>("title"), book.column::<String>("summary")),
///     "+rust -java",
///     Some(SearchModifier::BooleanMode),
/// );
/// ```
pub fn match_against(
    columns: impl SelectList,
    search: impl Into<String>,
    modifier: Option<SearchModifier>,
) -> Expr<bool> {
    let expression = extension(MatchAgainstExpression {
        columns: columns.into_expressions(),
        search: value(search.into()).into_expression(),
        modifier,
        sql_type: BOOLEAN,
    })
    .with_leaf_node(true);
    Expr::new(expression)
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

/// Text predicates with MySQL specific operators.
pub trait MySQLTextExpression: TextExpression {
    /// Full text search on this single column.
    fn matches(&self, search: impl Into<String>, modifier: Option<SearchModifier>) -> Expr<bool> {
        match_against(vec![self.as_expression()], search, modifier)
    }
}

impl<C: ColumnDeclaring<Value = String> + ?Sized> MySQLTextExpression for C {}
