pub use ::quarry_core::*;
