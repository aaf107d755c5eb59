//! The interface between the engine and the filtering routines it schedules.
mod activity;
mod contexts;
mod local_id;
mod propagator;
mod propagator_id;
pub(crate) mod store;

pub(crate) use activity::PropagatorActivities;
pub use activity::PropagatorActivity;
pub use contexts::PropagationContext;
pub use contexts::PropagationContextMut;
pub(crate) use contexts::PropagatorRequests;
pub use contexts::ReadDomains;
pub use local_id::LocalId;
pub use propagator::Entailment;
pub use propagator::Priority;
pub use propagator::Propagator;
pub use propagator_id::PropagatorId;
pub use store::PropagatorHandle;
pub(crate) use store::PropagatorStore;
