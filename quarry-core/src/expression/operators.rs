#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpType {
    IsNull,
    IsNotNull,
    Negative,
    Plus,
    Not,
}

impl UnaryOpType {
    /// `IS NULL` and `IS NOT NULL` follow their operand.
    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOpType::IsNull | UnaryOpType::IsNotNull)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            UnaryOpType::IsNull => "is null",
            UnaryOpType::IsNotNull => "is not null",
            UnaryOpType::Negative => "-",
            UnaryOpType::Plus => "+",
            UnaryOpType::Not => "not",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpType {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Remainder,
    Like,
    NotLike,
    And,
    Or,
    Xor,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl BinaryOpType {
    pub fn keyword(&self) -> &'static str {
        match self {
            BinaryOpType::Addition => "+",
            BinaryOpType::Subtraction => "-",
            BinaryOpType::Multiplication => "*",
            BinaryOpType::Division => "/",
            BinaryOpType::Remainder => "%",
            BinaryOpType::Like => "like",
            BinaryOpType::NotLike => "not like",
            BinaryOpType::And => "and",
            BinaryOpType::Or => "or",
            BinaryOpType::Xor => "xor",
            BinaryOpType::Less => "<",
            BinaryOpType::LessEqual => "<=",
            BinaryOpType::Greater => ">",
            BinaryOpType::GreaterEqual => ">=",
            BinaryOpType::Equal => "=",
            BinaryOpType::NotEqual => "<>",
        }
    }

    /// Whether the result is a boolean regardless of the operand types.
    pub fn is_predicate(&self) -> bool {
        !matches!(
            self,
            BinaryOpType::Addition
                | BinaryOpType::Subtraction
                | BinaryOpType::Multiplication
                | BinaryOpType::Division
                | BinaryOpType::Remainder
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    ASC,
    DESC,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Cross,
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinType::Cross => "cross join",
            JoinType::Inner => "inner join",
            JoinType::Left => "left join",
            JoinType::Right => "right join",
            JoinType::Full => "full join",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateType {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateType {
    pub fn keyword(&self) -> &'static str {
        match self {
            AggregateType::Count => "count",
            AggregateType::Sum => "sum",
            AggregateType::Avg => "avg",
            AggregateType::Max => "max",
            AggregateType::Min => "min",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFunctionType {
    RowNumber,
    Rank,
    DenseRank,
    PercentRank,
    CumeDist,
    Ntile,
    Lag,
    Lead,
    FirstValue,
    LastValue,
    NthValue,
    Aggregate(AggregateType),
}

impl WindowFunctionType {
    pub fn keyword(&self) -> &'static str {
        match self {
            WindowFunctionType::RowNumber => "row_number",
            WindowFunctionType::Rank => "rank",
            WindowFunctionType::DenseRank => "dense_rank",
            WindowFunctionType::PercentRank => "percent_rank",
            WindowFunctionType::CumeDist => "cume_dist",
            WindowFunctionType::Ntile => "ntile",
            WindowFunctionType::Lag => "lag",
            WindowFunctionType::Lead => "lead",
            WindowFunctionType::FirstValue => "first_value",
            WindowFunctionType::LastValue => "last_value",
            WindowFunctionType::NthValue => "nth_value",
            WindowFunctionType::Aggregate(aggregate) => aggregate.keyword(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUnit {
    Rows,
    Range,
    Groups,
}

impl FrameUnit {
    pub fn keyword(&self) -> &'static str {
        match self {
            FrameUnit::Rows => "rows",
            FrameUnit::Range => "range",
            FrameUnit::Groups => "groups",
        }
    }
}
