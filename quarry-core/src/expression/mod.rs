mod extra;
mod node;
mod operators;

pub use extra::*;
pub use node::*;
pub use operators::*;
