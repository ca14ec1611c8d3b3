use crate::{AsValue, CachedRowSet, Result, Statement, Value};
use rust_decimal::Decimal;
use std::fmt::Debug;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Codec of one scalar SQL type: binds values into parameter slots and decodes result columns.
///
/// Implementations are stateless and shared, see the statics in this module.
pub trait SqlType: Debug + Send + Sync {
    fn type_name(&self) -> &'static str;
    /// Typed NULL of this SQL type.
    fn empty_value(&self) -> Value;
    /// Bind `value` into the 1-based parameter `index`, coercing it to this type first.
    fn bind(&self, statement: &mut dyn Statement, index: usize, value: &Value) -> Result<()>;
    /// Decode the 1-based column `index` of the current row.
    fn decode(&self, row_set: &CachedRowSet, index: usize) -> Result<Value>;
}

pub type SqlTypeRef = &'static dyn SqlType;

macro_rules! sql_types {
    ($($(#[$meta:meta])* $name:ident: $codec:ident($native:ty) = $type_name:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Default, Clone, Copy)]
            pub struct $codec;

            impl SqlType for $codec {
                fn type_name(&self) -> &'static str {
                    $type_name
                }
                fn empty_value(&self) -> Value {
                    <$native as AsValue>::as_empty_value()
                }
                fn bind(
                    &self,
                    statement: &mut dyn Statement,
                    index: usize,
                    value: &Value,
                ) -> Result<()> {
                    if value.is_null() {
                        return statement.bind(index, &self.empty_value());
                    }
                    if value.same_type(&self.empty_value()) {
                        return statement.bind(index, value);
                    }
                    let value = <$native as AsValue>::try_from_value(value.clone())?.as_value();
                    statement.bind(index, &value)
                }
                fn decode(&self, row_set: &CachedRowSet, index: usize) -> Result<Value> {
                    let value = row_set.get_value(index)?;
                    if value.is_null() {
                        return Ok(self.empty_value());
                    }
                    if value.same_type(&self.empty_value()) {
                        return Ok(value);
                    }
                    Ok(<$native as AsValue>::try_from_value(value)?.as_value())
                }
            }

            pub static $name: SqlTypeRef = &$codec;
        )*
    };
}

sql_types! {
    BOOLEAN: BooleanSqlType(bool) = "boolean";
    SHORT: ShortSqlType(i16) = "smallint";
    INT: IntSqlType(i32) = "int";
    LONG: LongSqlType(i64) = "bigint";
    FLOAT: FloatSqlType(f32) = "float";
    DOUBLE: DoubleSqlType(f64) = "double";
    DECIMAL: DecimalSqlType(Decimal) = "decimal";
    VARCHAR: VarcharSqlType(String) = "varchar";
    /// Same codec as [`VARCHAR`], for large text columns.
    TEXT: TextSqlType(String) = "text";
    BYTES: BytesSqlType(Box<[u8]>) = "bytes";
    DATE: DateSqlType(Date) = "date";
    TIME: TimeSqlType(Time) = "time";
    TIMESTAMP: TimestampSqlType(PrimitiveDateTime) = "timestamp";
    OFFSET_DATETIME: OffsetDateTimeSqlType(OffsetDateTime) = "timestamptz";
    UUID: UuidSqlType(Uuid) = "uuid";
}

/// Best effort mapping from a runtime value to its codec. Untyped NULL maps to [`VARCHAR`].
pub fn sql_type_of(value: &Value) -> SqlTypeRef {
    match value {
        Value::Boolean(..) => BOOLEAN,
        Value::Int16(..) => SHORT,
        Value::Int32(..) => INT,
        Value::Int64(..) => LONG,
        Value::Float32(..) => FLOAT,
        Value::Float64(..) => DOUBLE,
        Value::Decimal(..) => DECIMAL,
        Value::Varchar(..) | Value::Null => VARCHAR,
        Value::Blob(..) => BYTES,
        Value::Date(..) => DATE,
        Value::Time(..) => TIME,
        Value::Timestamp(..) => TIMESTAMP,
        Value::TimestampWithTimezone(..) => OFFSET_DATETIME,
        Value::Uuid(..) => UUID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnMetadata;

    #[test]
    fn inference() {
        assert_eq!(sql_type_of(&Value::Int64(Some(1))).type_name(), "bigint");
        assert_eq!(sql_type_of(&Value::Null).type_name(), "varchar");
        assert_eq!(<Option<Uuid> as AsValue>::sql_type().type_name(), "uuid");
        assert_eq!(String::sql_type().type_name(), "varchar");
    }

    #[test]
    fn decode_coerces() {
        let mut rows = CachedRowSet::from_parts(
            vec![ColumnMetadata::labeled("n")],
            vec![vec![Value::Varchar(Some("12".into()))], vec![Value::Null]],
        );
        assert!(rows.next());
        assert_eq!(INT.decode(&rows, 1).unwrap(), Value::Int32(Some(12)));
        // Typed reads go through the codec first
        assert_eq!(rows.get_as::<String>(1, DOUBLE).unwrap().as_deref(), Some("12"));
        assert_eq!(rows.get_as::<i64>(1, VARCHAR).unwrap(), Some(12));
        assert!(rows.get_as::<String>(1, BOOLEAN).is_err());
        assert!(rows.next());
        let decoded = LONG.decode(&rows, 1).unwrap();
        assert!(decoded.is_null());
        assert!(decoded.same_type(&Value::Int64(None)));
        assert!(rows.was_null());
    }
}
