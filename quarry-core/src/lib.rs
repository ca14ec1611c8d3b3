mod as_value;
mod database;
mod dialect;
mod driver;
mod dsl;
mod error;
mod expression;
mod query_row_set;
mod rewrite;
mod row_set;
mod sql_type;
mod transaction;
mod util;
mod value;
mod visitor;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use database::*;
pub use dialect::*;
pub use driver::*;
pub use dsl::*;
pub use error::*;
pub use expression::*;
pub use query_row_set::*;
pub use rewrite::*;
pub use row_set::*;
pub use sql_type::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use visitor::*;
pub use writer::{FormatOptions, FormatterState, KeywordCase, SqlFormatter};

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
