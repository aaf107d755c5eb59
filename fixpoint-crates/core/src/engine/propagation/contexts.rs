use std::borrow::Cow;

use enumset::EnumSet;

use super::PropagatorId;
use crate::engine::contradiction::Cause;
use crate::engine::contradiction::Contradiction;
use crate::engine::domains::DomainRanges;
use crate::engine::domains::DomainStore;
use crate::engine::domains::DomainValues;
use crate::engine::domains::IterationOrder;
use crate::engine::notifications::PropagatorEvent;
use crate::engine::variables::DomainId;

/// Read access to the domains.
pub trait ReadDomains {
    fn domains(&self) -> &DomainStore;

    fn lower_bound(&self, domain: DomainId) -> i32 {
        self.domains().lower_bound(domain)
    }

    fn upper_bound(&self, domain: DomainId) -> i32 {
        self.domains().upper_bound(domain)
    }

    fn size(&self, domain: DomainId) -> u32 {
        self.domains().size(domain)
    }

    fn contains(&self, domain: DomainId, value: i32) -> bool {
        self.domains().contains(domain, value)
    }

    fn is_instantiated(&self, domain: DomainId) -> bool {
        self.domains().is_instantiated(domain)
    }

    fn instantiated_value(&self, domain: DomainId) -> Option<i32> {
        self.domains().instantiated_value(domain)
    }

    fn values(&self, domain: DomainId, order: IterationOrder) -> DomainValues<'_> {
        self.domains().values(domain, order)
    }

    fn ranges(&self, domain: DomainId, order: IterationOrder) -> DomainRanges<'_> {
        self.domains().ranges(domain, order)
    }
}

/// A read-only view of the domains, handed to propagators outside of filtering.
#[derive(Clone, Copy, Debug)]
pub struct PropagationContext<'a> {
    domains: &'a DomainStore,
}

impl<'a> PropagationContext<'a> {
    pub(crate) fn new(domains: &'a DomainStore) -> Self {
        PropagationContext { domains }
    }
}

impl ReadDomains for PropagationContext<'_> {
    fn domains(&self) -> &DomainStore {
        self.domains
    }
}

/// What a propagator asked of the engine while it was running.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PropagatorRequests {
    pub(crate) delayed: EnumSet<PropagatorEvent>,
    pub(crate) passive: bool,
}

/// The context in which a propagator filters. Every mutation is attributed to the running
/// propagator, so it is not woken up by its own changes.
#[derive(Debug)]
pub struct PropagationContextMut<'a> {
    domains: &'a mut DomainStore,
    propagator_id: PropagatorId,
    requests: &'a mut PropagatorRequests,
}

impl<'a> PropagationContextMut<'a> {
    pub(crate) fn new(
        domains: &'a mut DomainStore,
        propagator_id: PropagatorId,
        requests: &'a mut PropagatorRequests,
    ) -> Self {
        PropagationContextMut {
            domains,
            propagator_id,
            requests,
        }
    }

    pub fn propagator_id(&self) -> PropagatorId {
        self.propagator_id
    }

    pub fn as_readonly(&self) -> PropagationContext<'_> {
        PropagationContext::new(self.domains)
    }

    /// Reborrow the context, e.g. to hand it to a helper function.
    pub fn reborrow(&mut self) -> PropagationContextMut<'_> {
        PropagationContextMut {
            domains: &mut *self.domains,
            propagator_id: self.propagator_id,
            requests: &mut *self.requests,
        }
    }

    fn cause(&self) -> Cause {
        Cause::Propagator(self.propagator_id)
    }

    pub fn remove(&mut self, domain: DomainId, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.domains.remove(domain, value, cause)
    }

    pub fn remove_interval(
        &mut self,
        domain: DomainId,
        from: i32,
        to: i32,
    ) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.domains.remove_interval(domain, from, to, cause)
    }

    pub fn set_lower_bound(&mut self, domain: DomainId, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.domains.set_lower_bound(domain, value, cause)
    }

    pub fn set_upper_bound(&mut self, domain: DomainId, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.domains.set_upper_bound(domain, value, cause)
    }

    pub fn instantiate(&mut self, domain: DomainId, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.domains.instantiate(domain, value, cause)
    }

    /// Raise a contradiction attributed to the running propagator.
    pub fn fail<T>(
        &self,
        domain: Option<DomainId>,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<T, Contradiction> {
        Err(Contradiction::new(self.cause(), domain, message))
    }

    /// Ask for a coarse-grained pass which runs once all pending fine-grained events of this
    /// propagator have been delivered.
    pub fn request_propagation(&mut self, event: PropagatorEvent) {
        self.requests.delayed |= event.strengthened_mask();
    }

    /// Declare that the propagator will not filter anything until backtracking.
    pub fn set_passive(&mut self) {
        self.requests.passive = true;
    }
}

impl ReadDomains for PropagationContextMut<'_> {
    fn domains(&self) -> &DomainStore {
        self.domains
    }
}
