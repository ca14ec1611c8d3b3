use quarry_core::{ExprRef, ExtensionExpression, SqlTypeRef, TableExpression};
use std::{any::Any, sync::Arc};

/// `INSERT .. ON DUPLICATE KEY UPDATE ..`.
#[derive(Debug, Clone)]
pub struct InsertOrUpdateExpression {
    pub table: ExprRef,
    /// Column assignments of the insert.
    pub assignments: Vec<ExprRef>,
    /// Column assignments applied when the row already exists.
    pub updates: Vec<ExprRef>,
}

impl ExtensionExpression for InsertOrUpdateExpression {
    fn type_name(&self) -> &'static str {
        "InsertOrUpdate"
    }

    fn children(&self) -> Vec<ExprRef> {
        let mut children = Vec::with_capacity(1 + self.assignments.len() + self.updates.len());
        children.push(self.table.clone());
        children.extend(self.assignments.iter().cloned());
        children.extend(self.updates.iter().cloned());
        children
    }

    fn with_children(&self, children: Vec<ExprRef>) -> Arc<dyn ExtensionExpression> {
        let mut children = children.into_iter();
        let table = children.next().unwrap_or_else(|| self.table.clone());
        let assignments = children.by_ref().take(self.assignments.len()).collect();
        let updates = children.collect();
        Arc::new(Self {
            table,
            assignments,
            updates,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `left NATURAL JOIN right`.
#[derive(Debug, Clone)]
pub struct NaturalJoinExpression {
    pub left: ExprRef,
    pub right: ExprRef,
}

impl ExtensionExpression for NaturalJoinExpression {
    fn type_name(&self) -> &'static str {
        "NaturalJoin"
    }

    fn children(&self) -> Vec<ExprRef> {
        vec![self.left.clone(), self.right.clone()]
    }

    fn with_children(&self, children: Vec<ExprRef>) -> Arc<dyn ExtensionExpression> {
        let mut children = children.into_iter();
        Arc::new(Self {
            left: children.next().unwrap_or_else(|| self.left.clone()),
            right: children.next().unwrap_or_else(|| self.right.clone()),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchModifier {
    NaturalLanguageMode,
    NaturalLanguageModeWithQueryExpansion,
    BooleanMode,
    WithQueryExpansion,
}

impl SearchModifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            SearchModifier::NaturalLanguageMode => "in natural language mode",
            SearchModifier::NaturalLanguageModeWithQueryExpansion => {
                "in natural language mode with query expansion"
            }
            SearchModifier::BooleanMode => "in boolean mode",
            SearchModifier::WithQueryExpansion => "with query expansion",
        }
    }
}

/// Full text search: `MATCH (columns) AGAINST (search [modifier])`.
#[derive(Debug, Clone)]
pub struct MatchAgainstExpression {
    pub columns: Vec<ExprRef>,
    pub search: ExprRef,
    pub modifier: Option<SearchModifier>,
    pub sql_type: SqlTypeRef,
}

impl ExtensionExpression for MatchAgainstExpression {
    fn type_name(&self) -> &'static str {
        "MatchAgainst"
    }

    fn sql_type(&self) -> Option<SqlTypeRef> {
        Some(self.sql_type)
    }

    fn children(&self) -> Vec<ExprRef> {
        let mut children = self.columns.clone();
        children.push(self.search.clone());
        children
    }

    fn with_children(&self, mut children: Vec<ExprRef>) -> Arc<dyn ExtensionExpression> {
        let search = if children.len() > self.columns.len() {
            children.pop()
        } else {
            None
        };
        Arc::new(Self {
            columns: children,
            search: search.unwrap_or_else(|| self.search.clone()),
            modifier: self.modifier,
            sql_type: self.sql_type,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The `DEFAULT` keyword, assigns the default value of a column.
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
pub const LOCKING_CLAUSE: &str = "mysql.locking_clause";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockingMode {
    ForUpdate,
    ForShare,
    /// Legacy shared lock, `LOCK IN SHARE MODE`.
    LockInShareMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockingWait {
    #[default]
    Wait,
    NoWait,
    SkipLocked,
}

/// Row locking appended to a select: `FOR UPDATE [OF ..] [NOWAIT | SKIP LOCKED]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockingClause {
    pub mode: LockingMode,
    /// Restrict the lock to these tables.
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

    pub fn of(mut self, table: &quarry_core::Table) -> Self {
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
