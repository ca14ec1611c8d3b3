use crate::{Error, Result, SqlTypeRef, Value, sql_type_of, truncate_long};
use atoi::FromRadix10SignedChecked;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::any;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::BorrowedFormatItem,
    macros::format_description,
};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// `try_from_value` is the coercion used by result getters: it accepts the canonical variant
/// for the type and, best effort, the other variants that can be converted without surprises
/// (other numeric widths with range checks, numeric text, temporal text, ...).
///
/// ```rust
/// use quarry_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(Value::Varchar(Some("42".into()))).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The NULL of this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Parse the whole input as `Self`.
    fn parse(input: impl AsRef<str>) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input.as_ref()),
            any::type_name::<Self>()
        )))
    }
    /// Codec used to bind and decode values of this type.
    fn sql_type() -> SqlTypeRef
    where
        Self: Sized,
    {
        sql_type_of(&Self::as_empty_value())
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn cannot_convert<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

fn out_of_range<T>(value: impl std::fmt::Display) -> Error {
    Error::msg(format!(
        "Value {value} is out of range for {}",
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                #[allow(unreachable_patterns)]
                let wide: i128 = match value {
                    $destination(Some(v)) => return Ok(v),
                    Value::Int16(Some(v)) => v as _,
                    Value::Int32(Some(v)) => v as _,
                    Value::Int64(Some(v)) => v as _,
                    Value::Boolean(Some(v)) => v as _,
                    Value::Float32(Some(v)) if v.is_finite() => v.trunc() as _,
                    Value::Float64(Some(v)) if v.is_finite() => v.trunc() as _,
                    Value::Decimal(Some(v)) => v
                        .trunc()
                        .to_i128()
                        .ok_or_else(|| out_of_range::<Self>(v))?,
                    Value::Varchar(Some(ref v)) => return Self::parse(v),
                    _ => return Err(cannot_convert::<Self>(&value)),
                };
                <$source>::try_from(wide).map_err(|_| out_of_range::<Self>(wide))
            }
            fn parse(input: impl AsRef<str>) -> Result<Self> {
                let input = input.as_ref().trim();
                let (parsed, len) = <$source>::from_radix_10_signed_checked(input.as_bytes());
                if len == input.len() && len > 0 {
                    return parsed.ok_or_else(|| out_of_range::<Self>(input));
                }
                // Numeric text with a fractional part or an exponent
                let float: f64 = fast_float::parse(input).map_err(|_| {
                    Error::msg(format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>()
                    ))
                })?;
                Self::try_from_value(Value::Float64(Some(float)))
            }
        }
    };
}
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                #[allow(unreachable_patterns)]
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Float32(Some(v)) => Ok(v as _),
                    Value::Float64(Some(v)) => Ok(v as _),
                    Value::Int16(Some(v)) => Ok(v as _),
                    Value::Int32(Some(v)) => Ok(v as _),
                    Value::Int64(Some(v)) => Ok(v as _),
                    Value::Boolean(Some(v)) => Ok(if v { 1.0 } else { 0.0 }),
                    Value::Decimal(Some(v)) => v
                        .to_f64()
                        .map(|v| v as _)
                        .ok_or_else(|| out_of_range::<Self>(v)),
                    Value::Varchar(Some(ref v)) => Self::parse(v),
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
            fn parse(input: impl AsRef<str>) -> Result<Self> {
                let input = input.as_ref().trim();
                fast_float::parse(input).map_err(|_| {
                    Error::msg(format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>()
                    ))
                })
            }
        }
    };
}
impl_as_value_float!(f32, Value::Float32);
impl_as_value_float!(f64, Value::Float64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int16(Some(v)) => Ok(v != 0),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::Decimal(Some(v)) => Ok(!v.is_zero()),
            Value::Varchar(Some(ref v)) => Self::parse(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        match input.as_ref().trim() {
            x if x.eq_ignore_ascii_case("true") || x.eq_ignore_ascii_case("t") || x == "1" => {
                Ok(true)
            }
            x if x.eq_ignore_ascii_case("false") || x.eq_ignore_ascii_case("f") || x == "0" => {
                Ok(false)
            }
            x => Err(Error::msg(format!(
                "Cannot parse boolean from `{}`",
                truncate_long!(x)
            ))),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int16(Some(v)) => Ok(Decimal::from(v)),
            Value::Int32(Some(v)) => Ok(Decimal::from(v)),
            Value::Int64(Some(v)) => Ok(Decimal::from(v)),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| cannot_convert::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| cannot_convert::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => Self::parse(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref().trim();
        input
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(input))
            .map_err(|e| {
                Error::new(e).context(format!(
                    "Cannot parse `{}` as Decimal",
                    truncate_long!(input)
                ))
            })
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Blob(Some(v)) => String::from_utf8(v.into_vec())
                .map_err(|e| Error::new(e).context("Cannot convert a blob to String")),
            v if !v.is_null() => Ok(v.to_string()),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        Ok(input.as_ref().to_string())
    }
}

fn blob_from_value<T>(value: Value) -> Result<Box<[u8]>> {
    match value {
        Value::Blob(Some(v)) => Ok(v),
        Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
        Value::Uuid(Some(v)) => Ok(Box::new(v.into_bytes())),
        _ => Err(cannot_convert::<T>(&value)),
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        blob_from_value::<Self>(value)
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        blob_from_value::<Self>(value).map(Into::into)
    }
}

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMATS: [&[BorrowedFormatItem<'static>]; 3] = [
    format_description!("[hour]:[minute]:[second].[subsecond]"),
    format_description!("[hour]:[minute]:[second]"),
    format_description!("[hour]:[minute]"),
];
const TIMESTAMP_FORMATS: [&[BorrowedFormatItem<'static>]; 6] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];
const TIMESTAMP_OFFSET_FORMATS: [&[BorrowedFormatItem<'static>]; 4] = [
    format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
    ),
];

macro_rules! parse_time {
    ($ty:ty, $input:expr, $formats:expr) => {{
        let input = $input.trim();
        $formats
            .iter()
            .find_map(|format| <$ty>::parse(input, format).ok())
            .ok_or_else(|| {
                Error::msg(format!(
                    "Cannot parse `{}` as {}",
                    truncate_long!(input),
                    any::type_name::<$ty>()
                ))
            })
    }};
}

fn from_unix_timestamp(value: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(value).map_err(|e| {
        Error::new(e).context(format!("Cannot convert {value} seconds since epoch to a timestamp"))
    })
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::TimestampWithTimezone(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        parse_time!(Date, input.as_ref(), [DATE_FORMAT])
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.time()),
            Value::TimestampWithTimezone(Some(v)) => Ok(v.time()),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        parse_time!(Time, input.as_ref(), TIME_FORMATS)
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::TimestampWithTimezone(Some(v)) => {
                let v = v.to_offset(time::UtcOffset::UTC);
                Ok(PrimitiveDateTime::new(v.date(), v.time()))
            }
            Value::Date(Some(v)) => Ok(v.midnight()),
            Value::Int64(Some(v)) => {
                let v = from_unix_timestamp(v)?;
                Ok(PrimitiveDateTime::new(v.date(), v.time()))
            }
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        parse_time!(PrimitiveDateTime, input.as_ref(), TIMESTAMP_FORMATS)
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            Value::Date(Some(v)) => Ok(v.midnight().assume_utc()),
            Value::Int64(Some(v)) => from_unix_timestamp(v),
            Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        parse_time!(OffsetDateTime, input, TIMESTAMP_OFFSET_FORMATS)
            .or_else(|_| {
                <PrimitiveDateTime as AsValue>::parse(input).map(PrimitiveDateTime::assume_utc)
            })
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Blob(Some(ref v)) => Uuid::from_slice(v)
                .map_err(|e| Error::new(e).context(format!("Cannot convert {value:?} to Uuid"))),
            Value::Varchar(Some(ref v)) => Self::parse(v),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref().trim();
        Uuid::parse_str(input).map_err(|e| {
            Error::new(e).context(format!("Cannot parse `{}` as Uuid", truncate_long!(input)))
        })
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
    fn sql_type() -> SqlTypeRef {
        T::sql_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn integers() {
        assert_eq!(i32::try_from_value(Value::Int64(Some(7))).unwrap(), 7);
        assert!(i16::try_from_value(Value::Int64(Some(70_000))).is_err());
        assert_eq!(i64::try_from_value(Value::Float64(Some(3.9))).unwrap(), 3);
        assert_eq!(i64::try_from_value(Value::Varchar(Some(" 12 ".into()))).unwrap(), 12);
        assert_eq!(i32::try_from_value(Value::Varchar(Some("2.5e1".into()))).unwrap(), 25);
        assert!(i32::try_from_value(Value::Varchar(Some("12abc".into()))).is_err());
        assert!(i64::try_from_value(Value::Int64(None)).is_err());
        assert_eq!(Option::<i64>::try_from_value(Value::Int64(None)).unwrap(), None);
    }

    #[test]
    fn floats_and_decimals() {
        assert_eq!(f64::try_from_value(Value::Int32(Some(2))).unwrap(), 2.0);
        assert_eq!(f32::try_from_value(Value::Varchar(Some("1.5".into()))).unwrap(), 1.5);
        assert_eq!(
            Decimal::try_from_value(Value::Varchar(Some("10.25".into()))).unwrap(),
            Decimal::new(1025, 2)
        );
        assert_eq!(
            i64::try_from_value(Value::Decimal(Some(Decimal::new(1099, 2)))).unwrap(),
            10
        );
    }

    #[test]
    fn booleans() {
        assert!(bool::try_from_value(Value::Int64(Some(1))).unwrap());
        assert!(!bool::try_from_value(Value::Varchar(Some("FALSE".into()))).unwrap());
        assert!(bool::try_from_value(Value::Varchar(Some("maybe".into()))).is_err());
    }

    #[test]
    fn temporal() {
        assert_eq!(
            Date::try_from_value(Value::Varchar(Some("2024-02-29".into()))).unwrap(),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            Time::try_from_value(Value::Varchar(Some("10:30".into()))).unwrap(),
            time!(10:30)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2024-01-02 03:04:05.5".into()
            )))
            .unwrap(),
            datetime!(2024-01-02 03:04:05.5)
        );
        assert_eq!(
            OffsetDateTime::try_from_value(Value::Varchar(Some(
                "2024-01-02T03:04:05+02:00".into()
            )))
            .unwrap(),
            datetime!(2024-01-02 03:04:05 +02:00)
        );
        assert_eq!(
            Date::try_from_value(Value::Timestamp(Some(datetime!(2020-05-06 07:08)))).unwrap(),
            date!(2020 - 05 - 06)
        );
    }

    #[test]
    fn strings_and_uuids() {
        assert_eq!(String::try_from_value(Value::Int32(Some(5))).unwrap(), "5");
        let uuid = Uuid::from_u128(0x1234);
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(uuid.to_string()))).unwrap(),
            uuid
        );
        assert_eq!(
            Uuid::try_from_value(Value::Blob(Some(Box::new(uuid.into_bytes())))).unwrap(),
            uuid
        );
    }
}
