use crate::{
    ArgumentExpression, AsValue, BulkInsertExpression, Column, ColumnAssignmentExpression,
    ColumnDeclaring, DeleteExpression, ExprRef, ExpressionKind, InsertExpression, Result,
    SqlError, SqlExpression, Table, UpdateExpression,
};
use std::ops::{Deref, DerefMut};

/// Ordered `column = value` pairs of an insert or an update.
///
/// Setting the same column twice replaces the earlier value and keeps its position.
#[derive(Debug, Clone, Default)]
pub struct Assignments {
    assignments: Vec<(String, ExprRef, ExprRef)>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, column: ExprRef, expression: ExprRef) -> &mut Self {
        let name = match &column.kind {
            ExpressionKind::Column(v) => v.name.clone(),
            _ => String::new(),
        };
        let position = self
            .assignments
            .iter()
            .position(|(v, ..)| !name.is_empty() && v.eq_ignore_ascii_case(&name));
        match position {
            Some(i) => self.assignments[i].2 = expression,
            None => self.assignments.push((name, column, expression)),
        }
        self
    }

    /// Assign a value, bound as a parameter with the SQL type of the column.
    pub fn set<T: AsValue>(&mut self, column: &Column<T>, value: impl Into<T>) -> &mut Self {
        self.push(column.as_expression(), column.wrap_argument(value))
    }

    /// Assign the result of an expression, for example `salary = salary + 100`.
    pub fn set_expr<T: AsValue>(
        &mut self,
        column: &Column<T>,
        expression: impl ColumnDeclaring<Value = T>,
    ) -> &mut Self {
        self.push(column.as_expression(), expression.as_expression())
    }

    pub fn set_null<T: AsValue>(&mut self, column: &Column<T>) -> &mut Self {
        let value = SqlExpression::new(ArgumentExpression {
            value: T::as_empty_value(),
            sql_type: column.sql_type(),
        });
        self.push(column.as_expression(), value)
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Names of the assigned columns, in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(v, ..)| v.as_str())
    }

    /// [`ColumnAssignmentExpression`] nodes, in order.
    pub fn to_expressions(&self) -> Vec<ExprRef> {
        self.assignments
            .iter()
            .map(|(_, column, expression)| {
                SqlExpression::new(ColumnAssignmentExpression {
                    column: column.clone(),
                    expression: expression.clone(),
                })
            })
            .collect()
    }
}

/// Assignments and condition of an update.
#[derive(Debug, Clone, Default)]
pub struct UpdateStatement {
    assignments: Assignments,
    where_clause: Option<ExprRef>,
}

impl UpdateStatement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the updated rows, replaces a previous condition. Without it every row is updated.
    pub fn filter(&mut self, condition: impl ColumnDeclaring<Value = bool>) -> &mut Self {
        self.where_clause = Some(condition.as_expression());
        self
    }

    pub fn where_clause(&self) -> Option<&ExprRef> {
        self.where_clause.as_ref()
    }
}

impl Deref for UpdateStatement {
    type Target = Assignments;

    fn deref(&self) -> &Self::Target {
        &self.assignments
    }
}

impl DerefMut for UpdateStatement {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.assignments
    }
}

/// Rows of an insert rendered as a single `VALUES (..), (..)` statement.
#[derive(Debug, Clone, Default)]
pub struct BulkInsertStatement {
    rows: Vec<Assignments>,
}

impl BulkInsertStatement {
    pub fn item(&mut self, build: impl FnOnce(&mut Assignments)) -> &mut Self {
        let mut assignments = Assignments::new();
        build(&mut assignments);
        self.rows.push(assignments);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Inserts executed as one batch, every item must assign the same columns.
#[derive(Debug, Clone, Default)]
pub struct BatchInsertStatement {
    items: Vec<Assignments>,
}

impl BatchInsertStatement {
    pub fn item(&mut self, build: impl FnOnce(&mut Assignments)) -> &mut Self {
        let mut assignments = Assignments::new();
        build(&mut assignments);
        self.items.push(assignments);
        self
    }

    /// One insert statement per item.
    pub fn build(
        table: &Table,
        build: impl FnOnce(&mut BatchInsertStatement),
    ) -> Result<Vec<ExprRef>> {
        let mut statement = BatchInsertStatement::default();
        build(&mut statement);
        statement
            .items
            .iter()
            .map(|v| insert_from_assignments(table, v))
            .collect()
    }
}

/// Updates executed as one batch, every item must render to the same SQL.
#[derive(Debug, Clone, Default)]
pub struct BatchUpdateStatement {
    items: Vec<UpdateStatement>,
}

impl BatchUpdateStatement {
    pub fn item(&mut self, build: impl FnOnce(&mut UpdateStatement)) -> &mut Self {
        let mut statement = UpdateStatement::new();
        build(&mut statement);
        self.items.push(statement);
        self
    }

    /// One update statement per item.
    pub fn build(
        table: &Table,
        build: impl FnOnce(&mut BatchUpdateStatement),
    ) -> Result<Vec<ExprRef>> {
        let mut statement = BatchUpdateStatement::default();
        build(&mut statement);
        statement
            .items
            .iter()
            .map(|v| update_from_statement(table, v))
            .collect()
    }
}

fn insert_from_assignments(table: &Table, assignments: &Assignments) -> Result<ExprRef> {
    if assignments.is_empty() {
        return Err(SqlError::EmptyAssignments("insert").into());
    }
    Ok(SqlExpression::new(InsertExpression {
        table: table.as_expression(),
        assignments: assignments.to_expressions(),
    }))
}

fn update_from_statement(table: &Table, statement: &UpdateStatement) -> Result<ExprRef> {
    if statement.is_empty() {
        return Err(SqlError::EmptyAssignments("update").into());
    }
    Ok(SqlExpression::new(UpdateExpression {
        table: table.as_expression(),
        assignments: statement.to_expressions(),
        where_clause: statement.where_clause.clone(),
    }))
}

/// `INSERT INTO table (..) VALUES (..)`, fails when nothing is assigned.
pub fn insert_expression(table: &Table, build: impl FnOnce(&mut Assignments)) -> Result<ExprRef> {
    let mut assignments = Assignments::new();
    build(&mut assignments);
    insert_from_assignments(table, &assignments)
}

/// `UPDATE table SET .. [WHERE ..]`, fails when nothing is assigned.
pub fn update_expression(
    table: &Table,
    build: impl FnOnce(&mut UpdateStatement),
) -> Result<ExprRef> {
    let mut statement = UpdateStatement::new();
    build(&mut statement);
    update_from_statement(table, &statement)
}

/// Multi row insert. The first row names the columns, the others must assign the same ones in
/// the same order.
pub fn bulk_insert_expression(
    table: &Table,
    build: impl FnOnce(&mut BulkInsertStatement),
) -> Result<ExprRef> {
    let mut statement = BulkInsertStatement::default();
    build(&mut statement);
    let Some(first) = statement.rows.first().filter(|v| !v.is_empty()) else {
        return Err(SqlError::EmptyAssignments("insert").into());
    };
    let expected = first.column_names().collect::<Vec<_>>();
    for row in &statement.rows[1..] {
        let found = row.column_names().collect::<Vec<_>>();
        if found != expected {
            return Err(SqlError::BatchStructureMismatch {
                expected: expected.join(", "),
                found: found.join(", "),
            }
            .into());
        }
    }
    Ok(SqlExpression::new(BulkInsertExpression {
        table: table.as_expression(),
        rows: statement.rows.iter().map(Assignments::to_expressions).collect(),
    }))
}

pub fn delete_expression(table: &Table, condition: Option<ExprRef>) -> ExprRef {
    SqlExpression::new(DeleteExpression {
        table: table.as_expression(),
        where_clause: condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NumericExpression, Value};

    fn assignment_values(expression: &ExprRef) -> Vec<(String, Value)> {
        let assignments = match &expression.kind {
            ExpressionKind::Insert(v) => &v.assignments,
            ExpressionKind::Update(v) => &v.assignments,
            _ => panic!("unexpected {}", expression.kind_name()),
        };
        assignments
            .iter()
            .map(|v| match &v.kind {
                ExpressionKind::ColumnAssignment(v) => match (&v.column.kind, &v.expression.kind) {
                    (ExpressionKind::Column(column), ExpressionKind::Argument(argument)) => {
                        (column.name.clone(), argument.value.clone())
                    }
                    (ExpressionKind::Column(column), _) => (column.name.clone(), Value::Null),
                    _ => panic!("unexpected assignment"),
                },
                _ => panic!("unexpected {}", v.kind_name()),
            })
            .collect()
    }

    #[test]
    fn insert_keeps_order_and_replaces() {
        let employee = Table::new("t_employee");
        let name = employee.column::<String>("name");
        let salary = employee.column::<i64>("salary");
        let manager = employee.column::<i64>("manager_id");
        let insert = insert_expression(&employee, |v| {
            v.set(&name, "vince")
                .set(&salary, 100)
                .set_null(&manager)
                .set(&salary, 200);
        })
        .unwrap();
        assert_eq!(
            assignment_values(&insert),
            vec![
                ("name".to_string(), Value::Varchar(Some("vince".into()))),
                ("salary".to_string(), Value::Int64(Some(200))),
                ("manager_id".to_string(), Value::Int64(None)),
            ]
        );
    }

    #[test]
    fn empty_assignments_are_rejected() {
        let employee = Table::new("t_employee");
        let salary = employee.column::<i64>("salary");
        let error = insert_expression(&employee, |_| {}).unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::EmptyAssignments("insert"))
        );
        let error = update_expression(&employee, |v| {
            v.filter(salary.greater(10));
        })
        .unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::EmptyAssignments("update"))
        );
        assert!(bulk_insert_expression(&employee, |_| {}).is_err());
        assert!(BatchInsertStatement::build(&employee, |v| {
            v.item(|v| {
                v.set(&salary, 1);
            })
            .item(|_| {});
        })
        .is_err());
    }

    #[test]
    fn update_with_expression() {
        let employee = Table::new("t_employee");
        let salary = employee.column::<i64>("salary");
        let id = employee.column::<i64>("id");
        let update = update_expression(&employee, |v| {
            v.filter(id.eq(1)).set_expr(&salary, salary.plus(100));
        })
        .unwrap();
        let ExpressionKind::Update(update) = &update.kind else {
            panic!("expected an update");
        };
        assert_eq!(update.assignments.len(), 1);
        assert!(update.where_clause.is_some());
    }

    #[test]
    fn bulk_insert_rows_must_match() {
        let employee = Table::new("t_employee");
        let name = employee.column::<String>("name");
        let salary = employee.column::<i64>("salary");
        let bulk = bulk_insert_expression(&employee, |v| {
            v.item(|v| {
                v.set(&name, "a").set(&salary, 1);
            })
            .item(|v| {
                v.set(&name, "b").set(&salary, 2);
            });
        })
        .unwrap();
        let ExpressionKind::BulkInsert(bulk) = &bulk.kind else {
            panic!("expected a bulk insert");
        };
        assert_eq!(bulk.rows.len(), 2);
        let error = bulk_insert_expression(&employee, |v| {
            v.item(|v| {
                v.set(&name, "a").set(&salary, 1);
            })
            .item(|v| {
                v.set(&salary, 2).set(&name, "b");
            });
        })
        .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::BatchStructureMismatch { .. })
        ));
    }

    #[test]
    fn batch_update_items() {
        let employee = Table::new("t_employee");
        let salary = employee.column::<i64>("salary");
        let id = employee.column::<i64>("id");
        let updates = BatchUpdateStatement::build(&employee, |batch| {
            for i in 1..=3 {
                batch.item(|v| {
                    v.filter(id.eq(i)).set(&salary, i * 10);
                });
            }
        })
        .unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(
            assignment_values(&updates[2]),
            vec![("salary".to_string(), Value::Int64(Some(30)))]
        );
    }
}
