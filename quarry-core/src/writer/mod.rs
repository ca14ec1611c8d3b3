mod context;
mod formatter;
mod keywords;
mod state;

pub use context::*;
pub use formatter::*;
pub use keywords::*;
pub use state::*;
