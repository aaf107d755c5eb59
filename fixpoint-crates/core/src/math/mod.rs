//! Saturating integer arithmetic used when bounds are shifted or scaled.
pub mod num_ext;

pub use num_ext::*;
