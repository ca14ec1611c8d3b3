use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed scalar moving between native Rust values, statement parameters and result
/// cells.
///
/// Every variant carries an `Option`: `None` is a NULL that still remembers its type.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
        }
    }

    /// Same type, payload removed.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
        }
    }

    /// Name of the variant, used in logs and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(..) => "boolean",
            Value::Int16(..) => "smallint",
            Value::Int32(..) => "int",
            Value::Int64(..) => "bigint",
            Value::Float32(..) => "float",
            Value::Float64(..) => "double",
            Value::Decimal(..) => "decimal",
            Value::Varchar(..) => "varchar",
            Value::Blob(..) => "blob",
            Value::Date(..) => "date",
            Value::Time(..) => "time",
            Value::Timestamp(..) => "timestamp",
            Value::TimestampWithTimezone(..) => "timestamptz",
            Value::Uuid(..) => "uuid",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! some {
            ($v:expr) => {
                match $v {
                    Some(v) => write!(f, "{}", v),
                    None => f.write_str("null"),
                }
            };
        }
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => some!(v),
            Value::Int16(v) => some!(v),
            Value::Int32(v) => some!(v),
            Value::Int64(v) => some!(v),
            Value::Float32(v) => some!(v),
            Value::Float64(v) => some!(v),
            Value::Decimal(v) => some!(v),
            Value::Varchar(Some(v)) => write!(f, "{}", crate::truncate_long!(v.as_str())),
            Value::Varchar(None) => f.write_str("null"),
            Value::Blob(Some(v)) => write!(f, "x'{}'", hex::encode(v)),
            Value::Blob(None) => f.write_str("null"),
            Value::Date(v) => some!(v),
            Value::Time(v) => some!(v),
            Value::Timestamp(v) => some!(v),
            Value::TimestampWithTimezone(v) => some!(v),
            Value::Uuid(v) => some!(v),
        }
    }
}
