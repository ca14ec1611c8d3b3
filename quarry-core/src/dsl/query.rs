use crate::{
    AliasRemover, ArgumentExpression, ColumnDeclaring, ColumnDeclaringExpression, Executor,
    ExprRef, ExpressionKind, ExpressionVisitor, InsertFromQueryExpression, JoinExpression,
    JoinType, OrderByRemover, OrderByTerm, QueryRowSet, Result, SelectExpression, SelectList,
    Session, SqlError, SqlExpression, Table, UnionExpression, count_all_expression,
};
use std::{any::Any, cell::OnceCell};

/// Something a query can read from: a table, a join or an aliased sub-query.
pub trait Source {
    fn source_expression(&self) -> ExprRef;
}

impl Source for Table {
    fn source_expression(&self) -> ExprRef {
        self.as_expression()
    }
}

impl<S: Source + ?Sized> Source for &S {
    fn source_expression(&self) -> ExprRef {
        (**self).source_expression()
    }
}

/// The FROM part of a query being built, joins included.
#[derive(Debug, Clone)]
pub struct QuerySource {
    session: Session,
    expression: ExprRef,
}

impl Source for QuerySource {
    fn source_expression(&self) -> ExprRef {
        self.expression.clone()
    }
}

impl QuerySource {
    pub fn new(session: Session, expression: ExprRef) -> Self {
        Self {
            session,
            expression,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn expression(&self) -> &ExprRef {
        &self.expression
    }

    fn join(&self, join_type: JoinType, right: &impl Source, condition: Option<ExprRef>) -> Self {
        Self::new(
            self.session.clone(),
            SqlExpression::new(JoinExpression {
                join_type,
                left: self.expression.clone(),
                right: right.source_expression(),
                condition,
            }),
        )
    }

    pub fn cross_join(&self, right: &impl Source) -> Self {
        self.join(JoinType::Cross, right, None)
    }

    pub fn inner_join(&self, right: &impl Source, on: impl ColumnDeclaring<Value = bool>) -> Self {
        self.join(JoinType::Inner, right, Some(on.as_expression()))
    }

    pub fn left_join(&self, right: &impl Source, on: impl ColumnDeclaring<Value = bool>) -> Self {
        self.join(JoinType::Left, right, Some(on.as_expression()))
    }

    pub fn right_join(&self, right: &impl Source, on: impl ColumnDeclaring<Value = bool>) -> Self {
        self.join(JoinType::Right, right, Some(on.as_expression()))
    }

    pub fn full_join(&self, right: &impl Source, on: impl ColumnDeclaring<Value = bool>) -> Self {
        self.join(JoinType::Full, right, Some(on.as_expression()))
    }

    pub fn select(&self, columns: impl SelectList) -> Query {
        let mut select = SelectExpression::new(self.expression.clone());
        select.columns = columns.into_columns();
        Query::new(self.session.clone(), SqlExpression::new(select))
    }

    pub fn select_distinct(&self, columns: impl SelectList) -> Query {
        let mut select = SelectExpression::new(self.expression.clone());
        select.columns = columns.into_columns();
        select.is_distinct = true;
        Query::new(self.session.clone(), SqlExpression::new(select))
    }

    /// `SELECT *`.
    pub fn select_all(&self) -> Query {
        Query::new(
            self.session.clone(),
            SqlExpression::new(SelectExpression::new(self.expression.clone())),
        )
    }
}

/// An immutable query: every builder method returns a new query.
///
/// The SQL text, the rows and the total count are computed at most once per query, on first
/// use. Builder methods that only apply to a select (like `filter`) record an error when called
/// on a union, the error is returned by the first method that needs the database.
#[derive(Debug, Clone)]
pub struct Query {
    session: Session,
    expression: ExprRef,
    error: Option<SqlError>,
    sql: OnceCell<(String, Vec<ArgumentExpression>)>,
    row_set: OnceCell<QueryRowSet>,
    total_records: OnceCell<u64>,
}

impl Query {
    /// A query over `expression`, which must be a select or a union.
    pub fn new(session: Session, expression: ExprRef) -> Self {
        let error = (!expression.is_query()).then(|| SqlError::NotAQuery(expression.kind_name()));
        Self {
            session,
            expression,
            error,
            sql: OnceCell::new(),
            row_set: OnceCell::new(),
            total_records: OnceCell::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn expression(&self) -> &ExprRef {
        &self.expression
    }

    fn check(&self) -> Result<()> {
        match &self.error {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }

    fn with_expression(self, expression: ExprRef) -> Self {
        Self {
            error: self.error,
            ..Self::new(self.session, expression)
        }
    }

    fn map_select(self, operation: &'static str, f: impl FnOnce(&mut SelectExpression)) -> Self {
        if self.error.is_some() {
            return self;
        }
        let ExpressionKind::Select(select) = &self.expression.kind else {
            return Self {
                error: Some(SqlError::NotASelect(operation)),
                ..self
            };
        };
        let mut select = select.clone();
        f(&mut select);
        let expression = self.expression.rebuild(select);
        self.with_expression(expression)
    }

    fn map_query(
        self,
        select: impl FnOnce(&mut SelectExpression),
        union: impl FnOnce(&mut UnionExpression),
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let expression = match &self.expression.kind {
            ExpressionKind::Select(v) => {
                let mut v = v.clone();
                select(&mut v);
                self.expression.rebuild(v)
            }
            ExpressionKind::Union(v) => {
                let mut v = v.clone();
                union(&mut v);
                self.expression.rebuild(v)
            }
            _ => return self,
        };
        self.with_expression(expression)
    }

    /// Replace the WHERE clause.
    pub fn filter(self, condition: impl ColumnDeclaring<Value = bool>) -> Self {
        let condition = condition.as_expression();
        self.map_select("filter", |v| v.where_clause = Some(condition))
    }

    pub fn group_by(self, columns: impl SelectList) -> Self {
        let columns = columns.into_expressions();
        self.map_select("group_by", |v| v.group_by = columns)
    }

    pub fn having(self, condition: impl ColumnDeclaring<Value = bool>) -> Self {
        let condition = condition.as_expression();
        self.map_select("having", |v| v.having = Some(condition))
    }

    pub fn order_by(self, terms: impl IntoIterator<Item = OrderByTerm>) -> Self {
        let terms: Vec<ExprRef> = terms.into_iter().map(|v| v.expression().clone()).collect();
        let union_terms = terms.clone();
        self.map_query(|v| v.order_by = terms, |v| v.order_by = union_terms)
    }

    pub fn limit(self, limit: u64) -> Self {
        self.map_query(|v| v.limit = Some(limit), |v| v.limit = Some(limit))
    }

    pub fn offset(self, offset: u64) -> Self {
        self.map_query(|v| v.offset = Some(offset), |v| v.offset = Some(offset))
    }

    fn combine(self, other: Query, is_union_all: bool) -> Self {
        let error = self.error.clone().or_else(|| other.error.clone());
        let expression = SqlExpression::new(UnionExpression {
            left: self.expression.clone(),
            right: other.expression,
            is_union_all,
            order_by: Vec::new(),
            offset: None,
            limit: None,
            table_alias: None,
        });
        Self {
            error,
            ..Self::new(self.session, expression)
        }
    }

    pub fn union(self, other: Query) -> Self {
        self.combine(other, false)
    }

    pub fn union_all(self, other: Query) -> Self {
        self.combine(other, true)
    }

    /// Attach a dialect annotation to the select node, read back by the dialect formatter.
    pub fn with_property<T: Any + Send + Sync>(self, key: &'static str, value: T) -> Self {
        if self.error.is_some() {
            return self;
        }
        if !matches!(self.expression.kind, ExpressionKind::Select(..)) {
            return Self {
                error: Some(SqlError::NotASelect(key)),
                ..self
            };
        }
        let expression = self.expression.with_property(key, value);
        self.with_expression(expression)
    }

    /// Use this query as the source of another one, under `alias`.
    pub fn as_subquery(&self, alias: impl Into<String>) -> QuerySource {
        QuerySource::new(self.session.clone(), with_table_alias(&self.expression, alias.into()))
    }

    /// Generated SQL and its arguments.
    pub fn sql_with_arguments(&self) -> Result<&(String, Vec<ArgumentExpression>)> {
        self.check()?;
        if let Some(v) = self.sql.get() {
            return Ok(v);
        }
        let formatted = self.session.format_expression(&self.expression)?;
        Ok(self.sql.get_or_init(|| formatted))
    }

    pub fn sql(&self) -> Result<&str> {
        Ok(&self.sql_with_arguments()?.0)
    }

    /// Execute the query, the rows are fetched once and cached by the query.
    pub fn row_set(&self) -> Result<QueryRowSet> {
        if let Some(v) = self.row_set.get() {
            return Ok(v.clone());
        }
        let (sql, arguments) = self.sql_with_arguments()?;
        let rows = self.session.execute_sql_query(sql, arguments)?;
        Ok(self
            .row_set
            .get_or_init(|| QueryRowSet::new(self.expression.clone(), rows))
            .clone())
    }

    /// Transform every row.
    pub fn map_rows<R>(&self, mut f: impl FnMut(&QueryRowSet) -> Result<R>) -> Result<Vec<R>> {
        let mut rows = self.row_set()?;
        let mut result = Vec::with_capacity(rows.len());
        while rows.next() {
            result.push(f(&rows)?);
        }
        Ok(result)
    }

    /// Number of rows the query would return without its offset and limit.
    pub fn total_records_in_all_pages(&self) -> Result<u64> {
        self.check()?;
        if let Some(v) = self.total_records.get() {
            return Ok(*v);
        }
        let paginated = match &self.expression.kind {
            ExpressionKind::Select(v) => v.offset.is_some() || v.limit.is_some(),
            ExpressionKind::Union(v) => v.offset.is_some() || v.limit.is_some(),
            _ => false,
        };
        let total = if paginated {
            let mut rows = self.session.execute_query(&count_expression(&self.expression)?)?;
            if !rows.next() {
                return Err(SqlError::NoCountResult.into());
            }
            rows.get::<i64>(1)?.unwrap_or(0).max(0) as u64
        } else {
            self.row_set()?.len() as u64
        };
        Ok(*self.total_records.get_or_init(|| total))
    }

    /// `INSERT INTO table (columns) <this query>`, returns the inserted rows.
    pub fn insert_to(&self, table: &Table, columns: impl SelectList) -> Result<u64> {
        self.check()?;
        let expression = SqlExpression::new(InsertFromQueryExpression {
            table: table.as_expression(),
            columns: columns.into_expressions(),
            query: self.expression.clone(),
        });
        self.session.execute_update(&AliasRemover.visit(&expression)?)
    }
}

fn with_table_alias(expression: &ExprRef, alias: String) -> ExprRef {
    match &expression.kind {
        ExpressionKind::Select(v) => expression.rebuild(SelectExpression {
            table_alias: Some(alias),
            ..v.clone()
        }),
        ExpressionKind::Union(v) => expression.rebuild(UnionExpression {
            table_alias: Some(alias),
            ..v.clone()
        }),
        _ => expression.clone(),
    }
}

/// Query counting the rows of `expression` regardless of its pagination.
///
/// A plain select keeps its FROM and WHERE with `count(*)` as the only column, anything else
/// (grouping, distinct, aggregates, unions) is wrapped as a sub-query.
pub fn count_expression(expression: &ExprRef) -> Result<ExprRef> {
    let stripped = match &expression.kind {
        ExpressionKind::Select(v) => expression.rebuild(SelectExpression {
            offset: None,
            limit: None,
            ..v.clone()
        }),
        ExpressionKind::Union(v) => expression.rebuild(UnionExpression {
            offset: None,
            limit: None,
            ..v.clone()
        }),
        _ => return Err(SqlError::NotAQuery(expression.kind_name()).into()),
    };
    let stripped = OrderByRemover.visit(&stripped)?;
    let count = SqlExpression::new(ColumnDeclaringExpression {
        expression: count_all_expression(),
        declared_name: None,
    });
    if let ExpressionKind::Select(v) = &stripped.kind {
        let simple = v.group_by.is_empty()
            && v.having.is_none()
            && !v.is_distinct
            && !v.columns.iter().any(|c| match &c.kind {
                ExpressionKind::ColumnDeclaring(c) => {
                    matches!(c.expression.kind, ExpressionKind::Aggregate(..))
                }
                _ => false,
            });
        if simple {
            return Ok(stripped.rebuild(SelectExpression {
                columns: vec![count],
                ..v.clone()
            }));
        }
    }
    let mut select = SelectExpression::new(with_table_alias(&stripped, "tmp_count".into()));
    select.columns = vec![count];
    Ok(SqlExpression::new(select))
}
