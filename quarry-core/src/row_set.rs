use crate::{
    AsValue, ColumnMetadata, Context, Result, RowCursor, SqlError, SqlTypeRef, Value, separated_by,
};
use log::{Level, log_enabled};
use std::{cell::Cell, sync::Arc};

/// Rows and column descriptors of a drained cursor, shared by every clone of a row set.
#[derive(Debug, Default, PartialEq)]
pub struct RowSetData {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<Vec<Value>>,
}

/// Fully materialized, scrollable result of a query.
///
/// Rows are copied out of the driver when the row set is created, the row set stays usable
/// after the connection and the statement are released. The cursor starts before the first
/// row, positions are 1-based and moving past either end clamps to before-first or after-last.
#[derive(Debug, Clone, Default)]
pub struct CachedRowSet {
    data: Arc<RowSetData>,
    /// `0` is before-first, `len + 1` is after-last.
    position: usize,
    was_null: Cell<bool>,
}

/// Addresses a column of a row set, by 1-based index or by case-insensitive label.
pub trait ColumnIndex {
    /// The 1-based index of the column.
    fn resolve(&self, row_set: &CachedRowSet) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn resolve(&self, row_set: &CachedRowSet) -> Result<usize> {
        let count = row_set.column_count();
        if *self == 0 || *self > count {
            return Err(SqlError::InvalidColumnIndex {
                index: *self,
                count,
            }
            .into());
        }
        Ok(*self)
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, row_set: &CachedRowSet) -> Result<usize> {
        row_set
            .find_column(self)
            .ok_or_else(|| SqlError::InvalidColumnLabel(self.to_string()).into())
    }
}

impl ColumnIndex for String {
    fn resolve(&self, row_set: &CachedRowSet) -> Result<usize> {
        self.as_str().resolve(row_set)
    }
}

impl CachedRowSet {
    pub fn from_parts(columns: Vec<ColumnMetadata>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            data: Arc::new(RowSetData { columns, rows }),
            position: 0,
            was_null: Cell::new(false),
        }
    }

    /// Drain a live cursor, the cursor can be dropped right after.
    pub fn from_cursor(cursor: &mut dyn RowCursor) -> Result<Self> {
        let columns = cursor.columns().to_vec();
        let mut rows = Vec::new();
        let trace = log_enabled!(target: "quarry::rows", Level::Trace);
        while let Some(row) = cursor.next_row()? {
            if trace {
                let mut out = String::new();
                separated_by(
                    &mut out,
                    columns.iter().zip(row.iter()),
                    |out, (c, v)| {
                        out.push_str(&c.label);
                        out.push_str(": ");
                        out.push_str(&v.to_string());
                    },
                    ", ",
                );
                log::trace!(target: "quarry::rows", "Row: {{{}}}", out);
            }
            rows.push(row);
        }
        Ok(Self::from_parts(columns, rows))
    }

    pub fn data(&self) -> &RowSetData {
        &self.data
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.data.columns
    }

    pub fn column_count(&self) -> usize {
        self.data.columns.len()
    }

    pub fn len(&self) -> usize {
        self.data.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.rows.is_empty()
    }

    /// 1-based index of the first column having `label`, ignoring the case.
    pub fn find_column(&self, label: &str) -> Option<usize> {
        self.data
            .columns
            .iter()
            .position(|c| c.label.eq_ignore_ascii_case(label))
            .map(|i| i + 1)
    }

    /// Current row number, `0` when the cursor is not on a row.
    pub fn row(&self) -> usize {
        if self.is_on_row() { self.position } else { 0 }
    }

    fn is_on_row(&self) -> bool {
        self.position >= 1 && self.position <= self.len()
    }

    pub fn is_before_first(&self) -> bool {
        !self.is_empty() && self.position == 0
    }

    pub fn is_after_last(&self) -> bool {
        !self.is_empty() && self.position > self.len()
    }

    pub fn is_first(&self) -> bool {
        !self.is_empty() && self.position == 1
    }

    pub fn is_last(&self) -> bool {
        !self.is_empty() && self.position == self.len()
    }

    pub fn next(&mut self) -> bool {
        if self.position <= self.len() {
            self.position += 1;
        }
        self.is_on_row()
    }

    pub fn previous(&mut self) -> bool {
        if self.position > 0 {
            self.position -= 1;
        }
        self.is_on_row()
    }

    pub fn first(&mut self) -> bool {
        self.absolute(1)
    }

    pub fn last(&mut self) -> bool {
        self.absolute(-1)
    }

    pub fn before_first(&mut self) {
        self.position = 0;
    }

    pub fn after_last(&mut self) {
        self.position = self.len() + 1;
    }

    /// Move to row `row`, negative values count backwards from the last row (`-1` is the last).
    pub fn absolute(&mut self, row: i64) -> bool {
        if self.is_empty() {
            return false;
        }
        let len = self.len() as i64;
        let target = if row >= 0 { row } else { len.saturating_add(row) + 1 };
        self.move_to(target)
    }

    /// Move by `rows` rows from the current position.
    pub fn relative(&mut self, rows: i64) -> bool {
        if self.is_empty() {
            return false;
        }
        self.move_to((self.position as i64).saturating_add(rows))
    }

    fn move_to(&mut self, target: i64) -> bool {
        let len = self.len() as i64;
        self.position = target.clamp(0, len + 1) as usize;
        self.is_on_row()
    }

    /// Values of the current row.
    pub fn current_row(&self) -> Result<&[Value]> {
        if !self.is_on_row() {
            return Err(SqlError::InvalidCursorPosition.into());
        }
        Ok(&self.data.rows[self.position - 1])
    }

    /// Raw value of a column in the current row.
    pub fn get_value(&self, index: impl ColumnIndex) -> Result<Value> {
        let index = index.resolve(self)?;
        let value = self.current_row()?[index - 1].clone();
        self.was_null.set(value.is_null());
        Ok(value)
    }

    /// Value of a column in the current row, coerced to `T`. `None` when the value is NULL.
    pub fn get<T: AsValue>(&self, index: impl ColumnIndex) -> Result<Option<T>> {
        self.get_as(index, T::sql_type())
    }

    /// Like [`CachedRowSet::get`], the column is decoded by `sql_type` before becoming a `T`.
    pub fn get_as<T: AsValue>(
        &self,
        index: impl ColumnIndex,
        sql_type: SqlTypeRef,
    ) -> Result<Option<T>> {
        let index = index.resolve(self)?;
        let context = || {
            format!(
                "While decoding the column `{}` at row {} as {}",
                self.data.columns[index - 1].label,
                self.position,
                sql_type.type_name(),
            )
        };
        let value = sql_type.decode(self, index).with_context(context)?;
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some).with_context(context)
    }

    /// Whether the last value read was NULL.
    pub fn was_null(&self) -> bool {
        self.was_null.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: i64) -> CachedRowSet {
        CachedRowSet::from_parts(
            vec![ColumnMetadata::labeled("Number"), ColumnMetadata::labeled("text")],
            (1..=n)
                .map(|i| vec![Value::Int64(Some(i)), Value::Varchar(Some(i.to_string()))])
                .collect(),
        )
    }

    #[test]
    fn empty_navigation() {
        let mut rows = numbers(0);
        assert!(!rows.next());
        assert!(!rows.previous());
        assert!(!rows.first());
        assert!(!rows.last());
        assert!(!rows.absolute(1));
        assert!(!rows.relative(1));
        assert!(!rows.is_before_first());
        assert!(!rows.is_after_last());
        assert_eq!(rows.row(), 0);
        assert!(rows.get::<i64>(1).is_err());
    }

    #[test]
    fn single_row_navigation() {
        let mut rows = numbers(1);
        assert!(rows.is_before_first());
        assert!(rows.next());
        assert!(rows.is_first() && rows.is_last());
        assert_eq!(rows.get::<i64>(1).unwrap(), Some(1));
        assert!(!rows.next());
        assert!(rows.is_after_last());
        assert!(!rows.next());
        assert!(rows.previous());
        assert_eq!(rows.row(), 1);
        assert!(!rows.previous());
        assert!(rows.is_before_first());
    }

    #[test]
    fn many_rows_navigation() {
        let mut rows = numbers(5);
        assert!(rows.last());
        assert_eq!(rows.get::<i64>("number").unwrap(), Some(5));
        assert!(rows.absolute(-2));
        assert_eq!(rows.row(), 4);
        assert!(rows.relative(-3));
        assert_eq!(rows.row(), 1);
        assert!(!rows.relative(-10));
        assert!(rows.is_before_first());
        assert!(!rows.absolute(10));
        assert!(rows.is_after_last());
        assert!(!rows.absolute(0));
        assert!(rows.is_before_first());
        assert!(rows.relative(3));
        assert_eq!(rows.get::<String>(2).unwrap().as_deref(), Some("3"));
        rows.after_last();
        assert!(rows.previous());
        assert_eq!(rows.row(), 5);
        rows.before_first();
        let mut sum = 0;
        while rows.next() {
            sum += rows.get::<i64>(1).unwrap().unwrap();
        }
        assert_eq!(sum, 15);
    }

    #[test]
    fn extreme_offsets() {
        let mut rows = numbers(2);
        assert!(rows.next());
        assert!(!rows.relative(i64::MAX));
        assert!(rows.is_after_last());
        assert!(!rows.relative(i64::MAX));
        assert!(rows.is_after_last());
        assert!(!rows.relative(i64::MIN));
        assert!(rows.is_before_first());
        assert!(!rows.relative(i64::MIN));
        assert!(rows.is_before_first());
        assert!(!rows.absolute(i64::MAX));
        assert!(rows.is_after_last());
        assert!(!rows.absolute(i64::MIN));
        assert!(rows.is_before_first());
        assert!(rows.relative(1));
        assert_eq!(rows.row(), 1);
    }

    #[test]
    fn coercion_and_nulls() {
        let mut rows = CachedRowSet::from_parts(
            vec![ColumnMetadata::labeled("a"), ColumnMetadata::labeled("b")],
            vec![vec![Value::Varchar(Some("42".into())), Value::Int32(None)]],
        );
        assert!(rows.next());
        assert_eq!(rows.get::<i32>("A").unwrap(), Some(42));
        assert!(!rows.was_null());
        assert_eq!(rows.get::<i32>("b").unwrap(), None);
        assert!(rows.was_null());
        assert!(rows.get::<bool>("a").is_err());
        assert!(!rows.was_null());
        let error = rows.get::<i32>(3).unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::InvalidColumnIndex { index: 3, count: 2 })
        );
        let error = rows.get::<i32>("c").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::InvalidColumnLabel(..))
        ));
    }

    #[test]
    fn clones_share_rows() {
        let mut rows = numbers(3);
        assert!(rows.next());
        let mut other = rows.clone();
        assert!(other.next());
        assert_eq!(rows.row(), 1);
        assert_eq!(other.row(), 2);
        assert!(std::ptr::eq(rows.data(), other.data()));
    }
}
