//! The domain representations and the store which owns them.
mod bitset_domain;
mod boolean_domain;
mod delta;
mod domain_store;
mod int_domain;
mod interval_domain;

pub(crate) use bitset_domain::BitsetDomain;
pub(crate) use boolean_domain::BooleanDomain;
pub use delta::DeltaEntry;
pub(crate) use delta::DeltaLog;
pub use delta::DeltaMonitor;
pub use domain_store::DomainNotification;
pub use domain_store::DomainStore;
pub use int_domain::DomainRanges;
pub(crate) use int_domain::DomainSnapshot;
pub use int_domain::DomainValues;
pub(crate) use int_domain::EmptyDomain;
pub(crate) use int_domain::IntDomain;
pub use int_domain::IterationOrder;
pub use int_domain::Representation;
pub(crate) use interval_domain::IntervalDomain;
