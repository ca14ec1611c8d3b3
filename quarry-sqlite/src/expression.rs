use quarry_core::{ExprRef, ExtensionExpression, SqlTypeRef};
use std::{any::Any, sync::Arc};

/// `INSERT .. ON CONFLICT [(..)] DO NOTHING | DO UPDATE SET ..`.
///
/// An empty `updates` list means `DO NOTHING`.
#[derive(Debug, Clone)]
pub struct InsertOrUpdateExpression {
    pub table: ExprRef,
    pub assignments: Vec<ExprRef>,
    pub conflict_columns: Vec<ExprRef>,
    pub updates: Vec<ExprRef>,
}

impl ExtensionExpression for InsertOrUpdateExpression {
    fn type_name(&self) -> &'static str {
        "InsertOrUpdate"
    }

    fn children(&self) -> Vec<ExprRef> {
        let mut children = vec![self.table.clone()];
        children.extend(self.assignments.iter().cloned());
        children.extend(self.conflict_columns.iter().cloned());
        children.extend(self.updates.iter().cloned());
        children
    }

    fn with_children(&self, children: Vec<ExprRef>) -> Arc<dyn ExtensionExpression> {
        let mut children = children.into_iter();
        let table = children.next().unwrap_or_else(|| self.table.clone());
        let assignments = children.by_ref().take(self.assignments.len()).collect();
        let conflict_columns = children.by_ref().take(self.conflict_columns.len()).collect();
        Arc::new(Self {
            table,
            assignments,
            conflict_columns,
            updates: children.collect(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `excluded.column` inside an upsert.
#[derive(Debug, Clone)]
pub struct ExcludedExpression {
    pub column: ExprRef,
}

impl ExtensionExpression for ExcludedExpression {
    fn type_name(&self) -> &'static str {
        "Excluded"
    }

    fn sql_type(&self) -> Option<SqlTypeRef> {
        self.column.sql_type()
    }

    fn children(&self) -> Vec<ExprRef> {
        vec![self.column.clone()]
    }

    fn with_children(&self, children: Vec<ExprRef>) -> Arc<dyn ExtensionExpression> {
        Arc::new(Self {
            column: children
                .into_iter()
                .next()
                .unwrap_or_else(|| self.column.clone()),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
