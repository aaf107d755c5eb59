//! The pluggable queues holding the pending work of the engine.
mod coarse_queue;
mod fine_queue;
mod policy;
mod propagator_order;
mod scheduler;

pub(crate) use coarse_queue::CoarseQueue;
pub(crate) use fine_queue::FineQueue;
pub(crate) use fine_queue::LocalEvents;
pub(crate) use fine_queue::PairKeyedEvents;
pub(crate) use fine_queue::PropagatorKeyedEvents;
pub use policy::SchedulingPolicy;
pub(crate) use propagator_order::ActivityOrder;
pub(crate) use propagator_order::FifoOrder;
pub(crate) use propagator_order::PriorityBuckets;
pub(crate) use propagator_order::PropagatorOrder;
pub(crate) use scheduler::Scheduler;
