mod cbox;
mod connection;
mod dialect;
mod driver;
mod dsl;
mod expression;
mod extract;
mod statement;

pub(crate) use cbox::*;
pub use connection::*;
pub use dialect::*;
pub use driver::*;
pub use dsl::*;
pub use expression::*;
pub use statement::*;

use libsqlite3_sys::{sqlite3, sqlite3_errmsg, sqlite3_extended_errcode};
use quarry_core::{DriverError, Error};
use std::{
    ffi::{CStr, c_char},
    ptr,
};

pub(crate) fn error_message_from_ptr(ptr: *const c_char) -> String {
    if ptr == ptr::null() {
        return "Unknown error (could not extract the error message)".into();
    }
    unsafe { CStr::from_ptr(ptr).to_string_lossy().into_owned() }
}

/// Last error reported on `connection`, wrapped so the translation hook can recognize it.
pub(crate) fn driver_error(connection: *mut sqlite3, sql: Option<&str>) -> Error {
    let (code, message) = unsafe {
        (
            sqlite3_extended_errcode(connection),
            error_message_from_ptr(sqlite3_errmsg(connection)),
        )
    };
    let mut error = DriverError::new(Some(code), message);
    if let Some(sql) = sql {
        error = error.with_sql(sql);
    }
    log::error!("{}", error);
    error.into()
}
