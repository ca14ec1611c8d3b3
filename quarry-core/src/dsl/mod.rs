mod declaring;
mod dml;
mod expr;
mod functions;
mod query;
mod table;

pub use declaring::*;
pub use dml::*;
pub use expr::*;
pub use functions::*;
pub use query::*;
pub use table::*;
