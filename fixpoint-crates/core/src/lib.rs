//! # Fixpoint
//! A propagation kernel for finite-domain constraint solvers: integer domains which report every
//! mutation as an event, propagators which filter those domains, and an engine which executes the
//! propagators until a fixpoint is reached or a domain becomes empty.
//!
//! ```rust
//! # use fixpoint_core::PropagationEngine;
//! # use fixpoint_core::ReadDomains;
//! # use fixpoint_core::propagators::BinaryEqualsPropagator;
//! let mut engine = PropagationEngine::default();
//! let x = engine.new_bitset_variable(0, 5);
//! let y = engine.new_bitset_variable(0, 5);
//! let z = engine.new_boolean_variable();
//!
//! // x = y and y = z + 1
//! let _ = engine.add_propagator(BinaryEqualsPropagator::new(x, y, 0));
//! let _ = engine.add_propagator(BinaryEqualsPropagator::new(y, z, 1));
//!
//! engine.run_to_fixpoint().expect("the model is consistent");
//! assert_eq!((1, 2), (engine.lower_bound(x), engine.upper_bound(x)));
//! ```
//!
//! The order in which propagators are executed is determined by a [`SchedulingPolicy`]; every
//! policy reaches the same fixpoint.
pub(crate) mod basic_types;
pub mod containers;
pub mod engine;
#[doc(hidden)]
pub mod fixpoint_asserts;
pub mod math;
pub mod propagators;
pub mod statistics;

pub use convert_case;

pub use crate::engine::notifications::DomainEvent;
pub use crate::engine::notifications::DomainEvents;
pub use crate::engine::propagation::Propagator;
pub use crate::engine::propagation::PropagatorHandle;
pub use crate::engine::propagation::ReadDomains;
pub use crate::engine::variables::DomainId;
pub use crate::engine::Cause;
pub use crate::engine::Contradiction;
pub use crate::engine::EngineOptions;
pub use crate::engine::PropagationEngine;
pub use crate::engine::PropagationStatus;
pub use crate::engine::SchedulingPolicy;
