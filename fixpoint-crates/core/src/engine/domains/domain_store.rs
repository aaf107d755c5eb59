use enum_map::EnumMap;
use log::trace;

use super::BitsetDomain;
use super::BooleanDomain;
use super::DeltaLog;
use super::DomainRanges;
use super::DomainSnapshot;
use super::DomainValues;
use super::EmptyDomain;
use super::IntDomain;
use super::IntervalDomain;
use super::IterationOrder;
use super::Representation;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::engine::contradiction::Cause;
use crate::engine::contradiction::Contradiction;
use crate::engine::notifications::DomainEvent;
use crate::engine::variables::DomainId;
use crate::fixpoint_assert_moderate;

/// A committed domain mutation which has not yet been routed to the watching propagators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainNotification {
    pub domain: DomainId,
    pub event: DomainEvent,
    pub cause: Cause,
}

#[derive(Clone, Copy, Debug)]
enum DomainTrailEntry {
    /// The bounds and cardinality before a mutation.
    Snapshot {
        domain: DomainId,
        snapshot: DomainSnapshot,
    },
    /// An interior bit which was cleared; pushed after the snapshot of the same mutation.
    ClearedValue { domain: DomainId, value: i32 },
}

/// The arena of all domains.
///
/// Every mutation is attributed to a [`Cause`], recorded on the trail so that it can be undone by
/// [`DomainStore::restore_to`], logged in the delta log of the domain if that log is active, and
/// reported exactly once as a [`DomainNotification`].
#[derive(Clone, Debug, Default)]
pub struct DomainStore {
    domains: KeyedVec<DomainId, IntDomain>,
    delta_logs: KeyedVec<DomainId, DeltaLog>,
    trail: Trail<DomainTrailEntry>,
    pending_notifications: Vec<DomainNotification>,
    event_counts: EnumMap<DomainEvent, u64>,
    /// Scratch space for the values vacated by a single mutation.
    vacated: Vec<i32>,
}

impl DomainStore {
    pub(crate) fn grow(&mut self, domain: IntDomain) -> DomainId {
        let _ = self.delta_logs.push(DeltaLog::default());
        self.domains.push(domain)
    }

    pub(crate) fn new_bitset_domain(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        self.grow(IntDomain::Bitset(BitsetDomain::new(lower_bound, upper_bound)))
    }

    pub(crate) fn new_sparse_domain(&mut self, values: &[i32]) -> DomainId {
        self.grow(IntDomain::Bitset(BitsetDomain::from_values(values)))
    }

    pub(crate) fn new_interval_domain(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        self.grow(IntDomain::Interval(IntervalDomain::new(
            lower_bound,
            upper_bound,
        )))
    }

    pub(crate) fn new_boolean_domain(&mut self) -> DomainId {
        self.grow(IntDomain::Boolean(BooleanDomain::Unassigned))
    }

    pub fn num_domains(&self) -> usize {
        self.domains.len()
    }

    pub fn domain_ids(&self) -> impl Iterator<Item = DomainId> {
        self.domains.keys()
    }

    pub fn representation(&self, domain: DomainId) -> Representation {
        self.domains[domain].representation()
    }

    pub fn lower_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].lower_bound()
    }

    pub fn upper_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].upper_bound()
    }

    pub fn size(&self, domain: DomainId) -> u32 {
        self.domains[domain].size()
    }

    pub fn contains(&self, domain: DomainId, value: i32) -> bool {
        self.domains[domain].contains(value)
    }

    pub fn is_instantiated(&self, domain: DomainId) -> bool {
        self.domains[domain].size() == 1
    }

    /// The value of an instantiated domain.
    pub fn instantiated_value(&self, domain: DomainId) -> Option<i32> {
        self.is_instantiated(domain)
            .then(|| self.domains[domain].lower_bound())
    }

    /// The smallest value of the domain strictly larger than `value`.
    pub fn next_value(&self, domain: DomainId, value: i32) -> Option<i32> {
        self.domains[domain].next_value(value)
    }

    /// The largest value of the domain strictly smaller than `value`.
    pub fn previous_value(&self, domain: DomainId, value: i32) -> Option<i32> {
        self.domains[domain].previous_value(value)
    }

    pub fn values(&self, domain: DomainId, order: IterationOrder) -> DomainValues<'_> {
        DomainValues::new(&self.domains[domain], order)
    }

    pub fn ranges(&self, domain: DomainId, order: IterationOrder) -> DomainRanges<'_> {
        DomainRanges::new(&self.domains[domain], order)
    }

    /// Number of committed mutations per event kind, since creation.
    pub fn event_counts(&self) -> &EnumMap<DomainEvent, u64> {
        &self.event_counts
    }

    pub(crate) fn activate_delta(&mut self, domain: DomainId) {
        self.delta_logs[domain].activate();
    }

    /// Whether the removed values of `domain` are recorded.
    pub fn is_delta_active(&self, domain: DomainId) -> bool {
        self.delta_logs[domain].is_active()
    }

    pub(crate) fn delta_log(&self, domain: DomainId) -> &DeltaLog {
        &self.delta_logs[domain]
    }

    /// Removes `value`; returns whether the domain changed.
    pub fn remove(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let snapshot = self.domains[domain].snapshot();
        let result = self.domains[domain].remove(value);
        let Some(event) = self.check(domain, cause, result)? else {
            return Ok(false);
        };

        self.trail.push(DomainTrailEntry::Snapshot { domain, snapshot });
        if self.domains[domain].representation() == Representation::Bitset {
            self.trail
                .push(DomainTrailEntry::ClearedValue { domain, value });
        }
        self.delta_logs[domain].record(value, cause);
        self.notify(domain, event, cause);
        Ok(true)
    }

    /// Removes every value in `[from, to]`; returns whether the domain changed.
    pub fn remove_interval(
        &mut self,
        domain: DomainId,
        from: i32,
        to: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let snapshot = self.domains[domain].snapshot();
        // Only bitsets clear interior bits, which have to be trailed one by one. The other
        // representations only move their bounds.
        let is_bitset = self.domains[domain].representation() == Representation::Bitset;
        if is_bitset {
            self.collect_values_in(
                domain,
                from.max(snapshot.lower_bound),
                to.min(snapshot.upper_bound),
            );
        }
        let result = self.domains[domain].remove_interval(from, to);
        let Some(event) = self.check(domain, cause, result)? else {
            return Ok(false);
        };

        self.trail.push(DomainTrailEntry::Snapshot { domain, snapshot });
        if is_bitset {
            for &value in &self.vacated {
                self.trail
                    .push(DomainTrailEntry::ClearedValue { domain, value });
            }
        } else {
            self.vacated.clear();
            if self.delta_logs[domain].is_active() {
                self.collect_vacated_bounds(domain, snapshot);
            }
        }
        if self.delta_logs[domain].is_active() {
            for &value in &self.vacated {
                self.delta_logs[domain].record(value, cause);
            }
        }
        self.notify(domain, event, cause);
        Ok(true)
    }

    /// Raises the lower bound to `value`; returns whether the domain changed.
    pub fn set_lower_bound(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let snapshot = self.domains[domain].snapshot();
        if self.delta_logs[domain].is_active() {
            self.collect_values_in(domain, snapshot.lower_bound, value.saturating_sub(1));
        }
        let result = self.domains[domain].set_lower_bound(value);
        self.commit_narrowing(domain, snapshot, cause, result)
    }

    /// Lowers the upper bound to `value`; returns whether the domain changed.
    pub fn set_upper_bound(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let snapshot = self.domains[domain].snapshot();
        if self.delta_logs[domain].is_active() {
            self.collect_values_in(domain, value.saturating_add(1), snapshot.upper_bound);
        }
        let result = self.domains[domain].set_upper_bound(value);
        self.commit_narrowing(domain, snapshot, cause, result)
    }

    /// Reduces the domain to `{value}`; returns whether the domain changed.
    pub fn instantiate(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let snapshot = self.domains[domain].snapshot();
        if self.delta_logs[domain].is_active() {
            self.collect_values_in(domain, snapshot.lower_bound, snapshot.upper_bound);
            self.vacated.retain(|&vacated| vacated != value);
        }
        let result = self.domains[domain].instantiate(value);
        self.commit_narrowing(domain, snapshot, cause, result)
    }

    /// Bound updates and instantiations never clear bits, so undoing them only requires the
    /// snapshot.
    fn commit_narrowing(
        &mut self,
        domain: DomainId,
        snapshot: DomainSnapshot,
        cause: Cause,
        result: Result<Option<DomainEvent>,
        EmptyDomain>,
    ) -> Result<bool, Contradiction> {
        let Some(event) = self.check(domain, cause, result)? else {
            return Ok(false);
        };

        self.trail.push(DomainTrailEntry::Snapshot { domain, snapshot });
        if self.delta_logs[domain].is_active() {
            for &value in &self.vacated {
                self.delta_logs[domain].record(value, cause);
            }
        }
        self.notify(domain, event, cause);
        Ok(true)
    }

    fn check(
        &mut self,
        domain: DomainId,
        cause: Cause,
        result: Result<Option<DomainEvent>,
        EmptyDomain>,
    ) -> Result<Option<DomainEvent>, Contradiction> {
        result.map_err(|empty_domain| {
            self.vacated.clear();
            Contradiction::new(cause, Some(domain), empty_domain.message())
        })
    }

    fn collect_values_in(&mut self, domain: DomainId, from: i32, to: i32) {
        self.vacated.clear();
        let domain = &self.domains[domain];
        let mut next = if domain.contains(from) {
            Some(from)
        } else {
            domain.next_value(from)
        };
        while let Some(value) = next.filter(|&value| value <= to) {
            self.vacated.push(value);
            next = domain.next_value(value);
        }
    }

    /// The values between the bounds of `snapshot` and the current bounds, for domains without
    /// holes.
    fn collect_vacated_bounds(&mut self, domain: DomainId, snapshot: DomainSnapshot) {
        let lower_bound = self.domains[domain].lower_bound();
        let upper_bound = self.domains[domain].upper_bound();
        self.vacated.extend(snapshot.lower_bound..lower_bound);
        if upper_bound < snapshot.upper_bound {
            self.vacated.extend(upper_bound + 1..=snapshot.upper_bound);
        }
    }

    fn notify(&mut self, domain: DomainId, event: DomainEvent, cause: Cause) {
        trace!("{domain} {event:?} by {cause}");
        self.event_counts[event] += 1;
        self.pending_notifications.push(DomainNotification {
            domain,
            event,
            cause,
        });
    }

    pub(crate) fn has_pending_notifications(&self) -> bool {
        !self.pending_notifications.is_empty()
    }

    pub(crate) fn drain_notifications(&mut self) -> impl Iterator<Item = DomainNotification> + '_ {
        self.pending_notifications.drain(..)
    }

    pub(crate) fn clear_notifications(&mut self) {
        self.pending_notifications.clear();
    }

    pub(crate) fn new_checkpoint(&mut self) {
        self.trail.new_checkpoint();
    }

    pub(crate) fn get_checkpoint(&self) -> usize {
        self.trail.get_checkpoint()
    }

    /// Undoes every mutation made after `checkpoint` was created. The delta logs are cleared,
    /// since the removals they describe no longer hold.
    pub(crate) fn restore_to(&mut self, checkpoint: usize) {
        fixpoint_assert_moderate!(self.pending_notifications.is_empty());

        for entry in self.trail.synchronise(checkpoint) {
            match entry {
                DomainTrailEntry::Snapshot { domain, snapshot } => {
                    self.domains[domain].restore(snapshot)
                }
                DomainTrailEntry::ClearedValue { domain, value } => {
                    self.domains[domain].reinsert(value)
                }
            }
        }

        self.delta_logs.iter_mut().for_each(DeltaLog::clear);
    }
}
