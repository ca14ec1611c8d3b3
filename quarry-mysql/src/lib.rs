mod dialect;
mod dsl;
mod expression;

pub use dialect::*;
pub use dsl::*;
pub use expression::*;
