use crate::{
    AggregateType, BOOLEAN, BinaryOpType, ExtraProperties, FrameUnit, JoinType, LONG, Order,
    SqlTypeRef, UnaryOpType, Value, WindowFunctionType,
};
use std::{any::Any, fmt::Debug, sync::Arc};

/// Shared handle to an immutable expression node.
pub type ExprRef = Arc<SqlExpression>;

/// Node of the SQL expression tree.
///
/// Nodes are never mutated: every transformation allocates new nodes for the changed path and
/// shares everything else.
#[derive(Debug, Clone)]
pub struct SqlExpression {
    pub kind: ExpressionKind,
    /// Leaves are never parenthesized by the formatter.
    pub is_leaf_node: bool,
    pub extra_properties: ExtraProperties,
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    Table(TableExpression),
    Column(ColumnExpression),
    ColumnDeclaring(ColumnDeclaringExpression),
    Argument(ArgumentExpression),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Between(BetweenExpression),
    InList(InListExpression),
    Exists(ExistsExpression),
    Casting(CastingExpression),
    Function(FunctionExpression),
    Aggregate(AggregateExpression),
    CaseWhen(CaseWhenExpression),
    WindowFunction(WindowFunctionExpression),
    OrderBy(OrderByExpression),
    Join(JoinExpression),
    Select(SelectExpression),
    Union(UnionExpression),
    Insert(InsertExpression),
    InsertFromQuery(InsertFromQueryExpression),
    BulkInsert(BulkInsertExpression),
    Update(UpdateExpression),
    Delete(DeleteExpression),
    ColumnAssignment(ColumnAssignmentExpression),
    /// Dialect specific node, rendered by the dialect formatter.
    Extension(Arc<dyn ExtensionExpression>),
}

/// Node type contributed by a dialect crate.
pub trait ExtensionExpression: Debug + Send + Sync + Any {
    fn type_name(&self) -> &'static str;
    fn sql_type(&self) -> Option<SqlTypeRef> {
        None
    }
    /// Direct children, in a stable order.
    fn children(&self) -> Vec<ExprRef>;
    /// A copy of this node with the children replaced, same order as
    /// [`ExtensionExpression::children`].
    fn with_children(&self, children: Vec<ExprRef>) -> Arc<dyn ExtensionExpression>;
    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableExpression {
    pub name: String,
    pub alias: Option<String>,
    pub schema: Option<String>,
    pub catalog: Option<String>,
}

impl TableExpression {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name used to qualify the columns of this table.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct ColumnExpression {
    pub table: Option<TableExpression>,
    pub name: String,
    pub sql_type: SqlTypeRef,
}

#[derive(Debug, Clone)]
pub struct ColumnDeclaringExpression {
    pub expression: ExprRef,
    /// Output label, rendered as `expression AS declared_name`.
    pub declared_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ArgumentExpression {
    pub value: Value,
    pub sql_type: SqlTypeRef,
}

#[derive(Debug, Clone)]
pub struct UnaryExpression {
    pub operator: UnaryOpType,
    pub operand: ExprRef,
    pub sql_type: SqlTypeRef,
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub operator: BinaryOpType,
    pub left: ExprRef,
    pub right: ExprRef,
    pub sql_type: SqlTypeRef,
}

#[derive(Debug, Clone)]
pub struct BetweenExpression {
    pub expression: ExprRef,
    pub lower: ExprRef,
    pub upper: ExprRef,
    pub not_between: bool,
}

#[derive(Debug, Clone)]
pub enum InListSource {
    Query(ExprRef),
    Values(Vec<ExprRef>),
}

#[derive(Debug, Clone)]
pub struct InListExpression {
    pub left: ExprRef,
    pub source: InListSource,
    pub not_in_list: bool,
}

#[derive(Debug, Clone)]
pub struct ExistsExpression {
    pub query: ExprRef,
    pub not_exists: bool,
}

#[derive(Debug, Clone)]
pub struct CastingExpression {
    pub expression: ExprRef,
    pub sql_type: SqlTypeRef,
}

#[derive(Debug, Clone)]
pub struct FunctionExpression {
    pub name: String,
    pub arguments: Vec<ExprRef>,
    pub sql_type: SqlTypeRef,
}

#[derive(Debug, Clone)]
pub struct AggregateExpression {
    pub aggregate_type: AggregateType,
    /// `None` renders `count(*)`.
    pub argument: Option<ExprRef>,
    pub is_distinct: bool,
    pub sql_type: SqlTypeRef,
}

#[derive(Debug, Clone)]
pub struct CaseWhenExpression {
    pub operand: Option<ExprRef>,
    pub when_clauses: Vec<(ExprRef, ExprRef)>,
    pub else_clause: Option<ExprRef>,
    pub sql_type: SqlTypeRef,
}

#[derive(Debug, Clone)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(ExprRef),
    CurrentRow,
    Following(ExprRef),
    UnboundedFollowing,
}

#[derive(Debug, Clone)]
pub struct WindowFrame {
    pub unit: FrameUnit,
    pub start: FrameBound,
    /// When present the frame renders as `BETWEEN start AND end`.
    pub end: Option<FrameBound>,
}

#[derive(Debug, Clone, Default)]
pub struct WindowSpecification {
    pub partition_by: Vec<ExprRef>,
    /// [`OrderByExpression`] nodes.
    pub order_by: Vec<ExprRef>,
    pub frame: Option<WindowFrame>,
}

#[derive(Debug, Clone)]
pub struct WindowFunctionExpression {
    pub function_type: WindowFunctionType,
    pub arguments: Vec<ExprRef>,
    pub is_distinct: bool,
    pub window: WindowSpecification,
    pub sql_type: SqlTypeRef,
}

#[derive(Debug, Clone)]
pub struct OrderByExpression {
    pub expression: ExprRef,
    pub order: Order,
}

#[derive(Debug, Clone)]
pub struct JoinExpression {
    pub join_type: JoinType,
    pub left: ExprRef,
    pub right: ExprRef,
    pub condition: Option<ExprRef>,
}

#[derive(Debug, Clone)]
pub struct SelectExpression {
    /// [`ColumnDeclaringExpression`] nodes, empty selects every column.
    pub columns: Vec<ExprRef>,
    /// Table, join or aliased sub-query.
    pub from: ExprRef,
    pub where_clause: Option<ExprRef>,
    pub group_by: Vec<ExprRef>,
    pub having: Option<ExprRef>,
    pub is_distinct: bool,
    pub order_by: Vec<ExprRef>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    /// Alias used when the select is a sub-query.
    pub table_alias: Option<String>,
}

impl SelectExpression {
    pub fn new(from: ExprRef) -> Self {
        Self {
            columns: Vec::new(),
            from,
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            is_distinct: false,
            order_by: Vec::new(),
            offset: None,
            limit: None,
            table_alias: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnionExpression {
    pub left: ExprRef,
    pub right: ExprRef,
    pub is_union_all: bool,
    pub order_by: Vec<ExprRef>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub table_alias: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InsertExpression {
    pub table: ExprRef,
    /// [`ColumnAssignmentExpression`] nodes.
    pub assignments: Vec<ExprRef>,
}

#[derive(Debug, Clone)]
pub struct InsertFromQueryExpression {
    pub table: ExprRef,
    pub columns: Vec<ExprRef>,
    pub query: ExprRef,
}

#[derive(Debug, Clone)]
pub struct BulkInsertExpression {
    pub table: ExprRef,
    /// One list of [`ColumnAssignmentExpression`] per row, the first row names the columns.
    pub rows: Vec<Vec<ExprRef>>,
}

#[derive(Debug, Clone)]
pub struct UpdateExpression {
    pub table: ExprRef,
    pub assignments: Vec<ExprRef>,
    pub where_clause: Option<ExprRef>,
}

#[derive(Debug, Clone)]
pub struct DeleteExpression {
    pub table: ExprRef,
    pub where_clause: Option<ExprRef>,
}

#[derive(Debug, Clone)]
pub struct ColumnAssignmentExpression {
    pub column: ExprRef,
    pub expression: ExprRef,
}

macro_rules! impl_into_kind {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$payload> for ExpressionKind {
                fn from(value: $payload) -> Self {
                    ExpressionKind::$variant(value)
                }
            }
        )*
    };
}
impl_into_kind!(
    TableExpression => Table,
    ColumnExpression => Column,
    ColumnDeclaringExpression => ColumnDeclaring,
    ArgumentExpression => Argument,
    UnaryExpression => Unary,
    BinaryExpression => Binary,
    BetweenExpression => Between,
    InListExpression => InList,
    ExistsExpression => Exists,
    CastingExpression => Casting,
    FunctionExpression => Function,
    AggregateExpression => Aggregate,
    CaseWhenExpression => CaseWhen,
    WindowFunctionExpression => WindowFunction,
    OrderByExpression => OrderBy,
    JoinExpression => Join,
    SelectExpression => Select,
    UnionExpression => Union,
    InsertExpression => Insert,
    InsertFromQueryExpression => InsertFromQuery,
    BulkInsertExpression => BulkInsert,
    UpdateExpression => Update,
    DeleteExpression => Delete,
    ColumnAssignmentExpression => ColumnAssignment,
);

impl From<Arc<dyn ExtensionExpression>> for ExpressionKind {
    fn from(value: Arc<dyn ExtensionExpression>) -> Self {
        ExpressionKind::Extension(value)
    }
}

impl SqlExpression {
    pub fn new(kind: impl Into<ExpressionKind>) -> ExprRef {
        let kind = kind.into();
        let is_leaf_node = matches!(
            kind,
            ExpressionKind::Table(..) | ExpressionKind::Column(..) | ExpressionKind::Argument(..)
        );
        Arc::new(Self {
            kind,
            is_leaf_node,
            extra_properties: ExtraProperties::default(),
        })
    }

    /// A node of the same flavor (leaf flag and properties) with a different payload.
    pub fn rebuild(&self, kind: impl Into<ExpressionKind>) -> ExprRef {
        Arc::new(Self {
            kind: kind.into(),
            is_leaf_node: self.is_leaf_node,
            extra_properties: self.extra_properties.clone(),
        })
    }

    pub fn with_leaf_node(&self, is_leaf_node: bool) -> ExprRef {
        Arc::new(Self {
            is_leaf_node,
            ..self.clone()
        })
    }

    pub fn with_property<T: Any + Send + Sync>(&self, key: &'static str, value: T) -> ExprRef {
        Arc::new(Self {
            extra_properties: self.extra_properties.with(key, value),
            ..self.clone()
        })
    }

    /// Result type, `None` for statements, tables and joins.
    pub fn sql_type(&self) -> Option<SqlTypeRef> {
        Some(match &self.kind {
            ExpressionKind::Column(v) => v.sql_type,
            ExpressionKind::ColumnDeclaring(v) => return v.expression.sql_type(),
            ExpressionKind::Argument(v) => v.sql_type,
            ExpressionKind::Unary(v) => v.sql_type,
            ExpressionKind::Binary(v) => v.sql_type,
            ExpressionKind::Between(..)
            | ExpressionKind::InList(..)
            | ExpressionKind::Exists(..) => BOOLEAN,
            ExpressionKind::Casting(v) => v.sql_type,
            ExpressionKind::Function(v) => v.sql_type,
            ExpressionKind::Aggregate(v) => v.sql_type,
            ExpressionKind::CaseWhen(v) => v.sql_type,
            ExpressionKind::WindowFunction(v) => v.sql_type,
            ExpressionKind::OrderBy(v) => return v.expression.sql_type(),
            ExpressionKind::ColumnAssignment(v) => return v.column.sql_type(),
            ExpressionKind::Extension(v) => return v.sql_type(),
            ExpressionKind::Table(..)
            | ExpressionKind::Join(..)
            | ExpressionKind::Select(..)
            | ExpressionKind::Union(..)
            | ExpressionKind::Insert(..)
            | ExpressionKind::InsertFromQuery(..)
            | ExpressionKind::BulkInsert(..)
            | ExpressionKind::Update(..)
            | ExpressionKind::Delete(..) => return None,
        })
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExpressionKind::Table(..) => "Table",
            ExpressionKind::Column(..) => "Column",
            ExpressionKind::ColumnDeclaring(..) => "ColumnDeclaring",
            ExpressionKind::Argument(..) => "Argument",
            ExpressionKind::Unary(..) => "Unary",
            ExpressionKind::Binary(..) => "Binary",
            ExpressionKind::Between(..) => "Between",
            ExpressionKind::InList(..) => "InList",
            ExpressionKind::Exists(..) => "Exists",
            ExpressionKind::Casting(..) => "Casting",
            ExpressionKind::Function(..) => "Function",
            ExpressionKind::Aggregate(..) => "Aggregate",
            ExpressionKind::CaseWhen(..) => "CaseWhen",
            ExpressionKind::WindowFunction(..) => "WindowFunction",
            ExpressionKind::OrderBy(..) => "OrderBy",
            ExpressionKind::Join(..) => "Join",
            ExpressionKind::Select(..) => "Select",
            ExpressionKind::Union(..) => "Union",
            ExpressionKind::Insert(..) => "Insert",
            ExpressionKind::InsertFromQuery(..) => "InsertFromQuery",
            ExpressionKind::BulkInsert(..) => "BulkInsert",
            ExpressionKind::Update(..) => "Update",
            ExpressionKind::Delete(..) => "Delete",
            ExpressionKind::ColumnAssignment(..) => "ColumnAssignment",
            ExpressionKind::Extension(v) => v.type_name(),
        }
    }

    /// Select or union.
    pub fn is_query(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Select(..) | ExpressionKind::Union(..)
        )
    }

    /// Downcast the payload of an extension node.
    pub fn as_extension<T: ExtensionExpression>(&self) -> Option<&T> {
        match &self.kind {
            ExpressionKind::Extension(v) => v.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// Wrap a dialect node.
pub fn extension(value: impl ExtensionExpression) -> ExprRef {
    SqlExpression::new(ExpressionKind::Extension(Arc::new(value)))
}

/// Bound parameter node, the type is inferred from the value.
pub fn argument(value: impl Into<Value>) -> ExprRef {
    let value = value.into();
    let sql_type = crate::sql_type_of(&value);
    SqlExpression::new(ArgumentExpression { value, sql_type })
}

/// `count(*)`.
pub fn count_all_expression() -> ExprRef {
    SqlExpression::new(AggregateExpression {
        aggregate_type: AggregateType::Count,
        argument: None,
        is_distinct: false,
        sql_type: LONG,
    })
}
