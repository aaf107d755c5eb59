//! The propagation engine and the data structures it operates on.
pub(crate) mod contradiction;
pub mod domains;
mod engine_statistics;
pub mod notifications;
pub mod propagation;
mod propagation_engine;
pub(crate) mod scheduling;
#[cfg(test)]
pub(crate) mod test_helper;
pub mod variables;

pub use contradiction::Cause;
pub use contradiction::Contradiction;
pub use contradiction::PropagationStatus;
pub use domains::DomainStore;
pub use engine_statistics::EngineStatistics;
pub use propagation::Entailment;
pub use propagation_engine::EngineOptions;
pub use propagation_engine::PropagationEngine;
pub use scheduling::SchedulingPolicy;
