use quarry_core::{ExprRef, ExtensionExpression, SqlTypeRef, Table, TableExpression};
use std::{any::Any, sync::Arc};

/// Action of an `ON CONFLICT` clause.
#[derive(Debug, Clone)]
pub enum ConflictAction {
    DoNothing,
    /// `DO UPDATE SET ..`, column assignment nodes.
    DoUpdate(Vec<ExprRef>),
}

/// `INSERT .. ON CONFLICT (..) DO ..  [RETURNING ..]`.
#[derive(Debug, Clone)]
pub struct InsertOrUpdateExpression {
    pub table: ExprRef,
    pub assignments: Vec<ExprRef>,
    /// Conflict target, may be empty for `DO NOTHING`.
    pub conflict_columns: Vec<ExprRef>,
    pub action: ConflictAction,
    pub returning: Vec<ExprRef>,
}

impl InsertOrUpdateExpression {
    fn updates(&self) -> &[ExprRef] {
        match &self.action {
            ConflictAction::DoNothing => &[],
            ConflictAction::DoUpdate(v) => v,
        }
    }
}

impl ExtensionExpression for InsertOrUpdateExpression {
    fn type_name(&self) -> &'static str {
        "InsertOrUpdate"
    }

    fn children(&self) -> Vec<ExprRef> {
        let mut children = vec![self.table.clone()];
        children.extend(self.assignments.iter().cloned());
        children.extend(self.conflict_columns.iter().cloned());
        children.extend(self.updates().iter().cloned());
        children.extend(self.returning.iter().cloned());
        children
    }

    fn with_children(&self, children: Vec<ExprRef>) -> Arc<dyn ExtensionExpression> {
        let mut children = children.into_iter();
        let table = children.next().unwrap_or_else(|| self.table.clone());
        let assignments = children.by_ref().take(self.assignments.len()).collect();
        let conflict_columns = children.by_ref().take(self.conflict_columns.len()).collect();
        let action = match &self.action {
            ConflictAction::DoNothing => ConflictAction::DoNothing,
            ConflictAction::DoUpdate(v) => {
                ConflictAction::DoUpdate(children.by_ref().take(v.len()).collect())
            }
        };
        Arc::new(Self {
            table,
            assignments,
            conflict_columns,
            action,
            returning: children.collect(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `EXCLUDED.column`, the value proposed for insertion in an `ON CONFLICT DO UPDATE`.
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

/// Case insensitive `LIKE`.
#[derive(Debug, Clone)]
pub struct ILikeExpression {
    pub left: ExprRef,
    pub pattern: ExprRef,
    pub not_ilike: bool,
    pub sql_type: SqlTypeRef,
}

impl ExtensionExpression for ILikeExpression {
    fn type_name(&self) -> &'static str {
        "ILike"
    }

    fn sql_type(&self) -> Option<SqlTypeRef> {
        Some(self.sql_type)
    }

    fn children(&self) -> Vec<ExprRef> {
        vec![self.left.clone(), self.pattern.clone()]
    }

    fn with_children(&self, children: Vec<ExprRef>) -> Arc<dyn ExtensionExpression> {
        let mut children = children.into_iter();
        Arc::new(Self {
            left: children.next().unwrap_or_else(|| self.left.clone()),
            pattern: children.next().unwrap_or_else(|| self.pattern.clone()),
            not_ilike: self.not_ilike,
            sql_type: self.sql_type,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone)]
pub struct DefaultValueExpression {
    pub sql_type: SqlTypeRef,
}

impl ExtensionExpression for DefaultValueExpression {
    fn type_name(&self) -> &'static str {
        "DefaultValue"
    }

    fn sql_type(&self) -> Option<SqlTypeRef> {
        Some(self.sql_type)
    }

    fn children(&self) -> Vec<ExprRef> {
        Vec::new()
    }

    fn with_children(&self, _children: Vec<ExprRef>) -> Arc<dyn ExtensionExpression> {
        Arc::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Key of the [`LockingClause`] in the extra properties of a select.
pub const LOCKING_CLAUSE: &str = "postgres.locking_clause";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockingMode {
    ForUpdate,
    ForNoKeyUpdate,
    ForShare,
    ForKeyShare,
}

impl LockingMode {
    pub fn keyword(&self) -> &'static str {
        match self {
            LockingMode::ForUpdate => "for update",
            LockingMode::ForNoKeyUpdate => "for no key update",
            LockingMode::ForShare => "for share",
            LockingMode::ForKeyShare => "for key share",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockingWait {
    #[default]
    Wait,
    NoWait,
    SkipLocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockingClause {
    pub mode: LockingMode,
    pub tables: Vec<TableExpression>,
    pub wait: LockingWait,
}

impl LockingClause {
    pub fn new(mode: LockingMode) -> Self {
        Self {
            mode,
            tables: Vec::new(),
            wait: LockingWait::Wait,
        }
    }

    /// Lock only the rows coming from `table`.
    pub fn of(mut self, table: &Table) -> Self {
        self.tables.push(table.table_expression().clone());
        self
    }

    pub fn nowait(mut self) -> Self {
        self.wait = LockingWait::NoWait;
        self
    }

    pub fn skip_locked(mut self) -> Self {
        self.wait = LockingWait::SkipLocked;
        self
    }
}
