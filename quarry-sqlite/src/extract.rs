use libsqlite3_sys::*;
use quarry_core::{ColumnMetadata, Error, Result, Value};
use std::{
    ffi::{CStr, c_char, c_int},
    ptr,
};

pub(crate) fn extract_value(statement: *mut sqlite3_stmt, index: c_int) -> Result<Value> {
    unsafe {
        let column_type = sqlite3_column_type(statement, index);
        Ok(match column_type {
            SQLITE_NULL => Value::Null,
            SQLITE_INTEGER => Value::Int64(Some(sqlite3_column_int64(statement, index))),
            SQLITE_FLOAT => Value::Float64(Some(sqlite3_column_double(statement, index))),
            SQLITE_BLOB => {
                let ptr = sqlite3_column_blob(statement, index) as *const u8;
                let len = sqlite3_column_bytes(statement, index) as usize;
                if ptr.is_null() {
                    Value::Blob(Some(Box::default()))
                } else {
                    Value::Blob(Some(std::slice::from_raw_parts(ptr, len).into()))
                }
            }
            SQLITE_TEXT => {
                let ptr = sqlite3_column_text(statement, index);
                let len = sqlite3_column_bytes(statement, index) as usize;
                if ptr.is_null() {
                    Value::Varchar(Some(String::new()))
                } else {
                    let bytes = std::slice::from_raw_parts(ptr, len);
                    Value::Varchar(Some(String::from_utf8_lossy(bytes).into_owned()))
                }
            }
            _ => {
                return Err(Error::msg(format!(
                    "Unexpected column type {}",
                    column_type
                )));
            }
        })
    }
}

fn optional_string(ptr: *const c_char) -> String {
    if ptr == ptr::null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr).to_string_lossy().into_owned() }
}

/// Label, origin column, origin table and declared type of each result column.
pub(crate) fn extract_columns(statement: *mut sqlite3_stmt) -> Vec<ColumnMetadata> {
    unsafe {
        let count = sqlite3_column_count(statement);
        (0..count)
            .map(|i| {
                let label = optional_string(sqlite3_column_name(statement, i));
                let name = optional_string(sqlite3_column_origin_name(statement, i));
                ColumnMetadata {
                    name: if name.is_empty() { label.clone() } else { name },
                    label,
                    table_name: optional_string(sqlite3_column_table_name(statement, i)),
                    type_name: optional_string(sqlite3_column_decltype(statement, i)),
                }
            })
            .collect()
    }
}
