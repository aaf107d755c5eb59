//! Domain events and their routing to the propagators which wait for them.
mod domain_events;
mod event_router;

pub use domain_events::DomainEvent;
pub use domain_events::DomainEvents;
pub use domain_events::PropagatorEvent;
pub(crate) use event_router::EventRouter;
pub(crate) use event_router::Watcher;
