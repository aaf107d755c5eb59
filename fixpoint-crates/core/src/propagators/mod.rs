//! Propagators which exercise the engine without the constraint layer on top of it.
pub mod arithmetic;

pub use arithmetic::BinaryEqualsPropagator;
pub use arithmetic::BinaryNotEqualsPropagator;
pub use arithmetic::LinearLessOrEqualPropagator;
