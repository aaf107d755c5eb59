use super::DomainStore;
use crate::engine::contradiction::Cause;
use crate::engine::propagation::PropagatorId;
use crate::engine::variables::DomainId;

/// A value which was removed from a domain, together with the entity that removed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeltaEntry {
    pub value: i32,
    pub cause: Cause,
}

/// The removed values of one domain, in order of removal.
///
/// Logging is opt-in: while the log is inactive nothing is recorded, so that domains which no
/// propagator observes incrementally do not pay for enumerating the values vacated by a bound
/// update.
#[derive(Clone, Debug, Default)]
pub(crate) struct DeltaLog {
    is_active: bool,
    /// Bumped whenever the log is cleared; monitors from an older generation start over.
    generation: u64,
    entries: Vec<DeltaEntry>,
}

impl DeltaLog {
    pub(crate) fn is_active(&self) -> bool {
        self.is_active
    }

    pub(crate) fn activate(&mut self) {
        self.is_active = true;
    }

    pub(crate) fn record(&mut self, value: i32, cause: Cause) {
        if self.is_active {
            self.entries.push(DeltaEntry { value, cause });
        }
    }

    /// Forgets all entries, e.g. because the removals they describe were undone by backtracking.
    pub(crate) fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.generation += 1;
        }
    }

    pub(crate) fn entries(&self) -> &[DeltaEntry] {
        &self.entries
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

/// A cursor into the [`DeltaLog`] of a domain, owned by a propagator which filters incrementally.
///
/// Every call to [`DeltaMonitor::drain`] yields the values removed since the previous call.
#[derive(Clone, Copy, Debug)]
pub struct DeltaMonitor {
    domain: DomainId,
    generation: u64,
    cursor: usize,
}

impl DeltaMonitor {
    pub fn new(domain: DomainId) -> DeltaMonitor {
        DeltaMonitor {
            domain,
            generation: 0,
            cursor: 0,
        }
    }

    pub fn domain(&self) -> DomainId {
        self.domain
    }

    /// Skip everything that is currently in the log.
    pub fn catch_up(&mut self, domains: &DomainStore) {
        let log = domains.delta_log(self.domain);
        self.generation = log.generation();
        self.cursor = log.entries().len();
    }

    /// Yields the entries recorded since the previous drain.
    pub fn drain<'a>(&mut self, domains: &'a DomainStore) -> impl Iterator<Item = DeltaEntry> + 'a {
        let log = domains.delta_log(self.domain);
        let start = if log.generation() == self.generation {
            self.cursor.min(log.entries().len())
        } else {
            0
        };

        self.generation = log.generation();
        self.cursor = log.entries().len();

        log.entries()[start..].iter().copied()
    }

    /// Yields the values removed since the previous drain by anyone but `owner`.
    pub fn drain_from_others<'a>(
        &mut self,
        domains: &'a DomainStore,
        owner: PropagatorId,
    ) -> impl Iterator<Item = i32> + 'a {
        self.drain(domains)
            .filter(move |entry| entry.cause != Cause::Propagator(owner))
            .map(|entry| entry.value)
    }
}
