use super::BitsetDomain;
use super::BooleanDomain;
use super::IntervalDomain;
use crate::engine::notifications::DomainEvent;

/// The bounds and cardinality of a domain, used to undo mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DomainSnapshot {
    pub(crate) lower_bound: i32,
    pub(crate) upper_bound: i32,
    pub(crate) size: u32,
}

/// Why a mutation would have emptied a domain. The mutation is not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EmptyDomain {
    LastValueRemoved,
    AllValuesRemoved,
    BoundsCrossed,
    ValueNotInDomain,
}

impl EmptyDomain {
    pub(crate) fn message(self) -> &'static str {
        match self {
            EmptyDomain::LastValueRemoved => "removed the last value of the domain",
            EmptyDomain::AllValuesRemoved => "removed every value of the domain",
            EmptyDomain::BoundsCrossed => "the new bound crosses the opposite bound",
            EmptyDomain::ValueNotInDomain => "instantiated to a value outside of the domain",
        }
    }
}

/// How the values of a domain are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Representation {
    /// One bit per value; holes are represented exactly.
    Bitset,
    /// Only the bounds; removing interior values has no effect.
    Interval,
    /// A 0/1 domain.
    Boolean,
}

/// The domain of a single integer variable.
#[derive(Clone, Debug)]
pub(crate) enum IntDomain {
    Bitset(BitsetDomain),
    Interval(IntervalDomain),
    Boolean(BooleanDomain),
}

macro_rules! dispatch {
    ($self:expr, $domain:ident => $body:expr) => {
        match $self {
            IntDomain::Bitset($domain) => $body,
            IntDomain::Interval($domain) => $body,
            IntDomain::Boolean($domain) => $body,
        }
    };
}

impl IntDomain {
    pub(crate) fn representation(&self) -> Representation {
        match self {
            IntDomain::Bitset(_) => Representation::Bitset,
            IntDomain::Interval(_) => Representation::Interval,
            IntDomain::Boolean(_) => Representation::Boolean,
        }
    }

    pub(crate) fn lower_bound(&self) -> i32 {
        dispatch!(self, domain => domain.lower_bound())
    }

    pub(crate) fn upper_bound(&self) -> i32 {
        dispatch!(self, domain => domain.upper_bound())
    }

    pub(crate) fn size(&self) -> u32 {
        dispatch!(self, domain => domain.size())
    }

    pub(crate) fn contains(&self, value: i32) -> bool {
        dispatch!(self, domain => domain.contains(value))
    }

    pub(crate) fn next_value(&self, value: i32) -> Option<i32> {
        dispatch!(self, domain => domain.next_value(value))
    }

    pub(crate) fn previous_value(&self, value: i32) -> Option<i32> {
        dispatch!(self, domain => domain.previous_value(value))
    }

    /// The last value of the maximal run of consecutive values starting at `start`.
    pub(crate) fn range_end(&self, start: i32) -> i32 {
        match self {
            IntDomain::Bitset(domain) => domain.range_end(start),
            IntDomain::Interval(domain) => domain.upper_bound(),
            IntDomain::Boolean(domain) => domain.upper_bound(),
        }
    }

    /// The first value of the maximal run of consecutive values ending at `end`.
    pub(crate) fn range_start(&self, end: i32) -> i32 {
        match self {
            IntDomain::Bitset(domain) => domain.range_start(end),
            IntDomain::Interval(domain) => domain.lower_bound(),
            IntDomain::Boolean(domain) => domain.lower_bound(),
        }
    }

    pub(crate) fn remove(&mut self, value: i32) -> Result<Option<DomainEvent>, EmptyDomain> {
        dispatch!(self, domain => domain.remove(value))
    }

    pub(crate) fn remove_interval(
        &mut self,
        from: i32,
        to: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        dispatch!(self, domain => domain.remove_interval(from, to))
    }

    pub(crate) fn set_lower_bound(
        &mut self,
        value: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        dispatch!(self, domain => domain.set_lower_bound(value))
    }

    pub(crate) fn set_upper_bound(
        &mut self,
        value: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        dispatch!(self, domain => domain.set_upper_bound(value))
    }

    pub(crate) fn instantiate(&mut self, value: i32) -> Result<Option<DomainEvent>, EmptyDomain> {
        dispatch!(self, domain => domain.instantiate(value))
    }

    pub(crate) fn snapshot(&self) -> DomainSnapshot {
        dispatch!(self, domain => domain.snapshot())
    }

    pub(crate) fn restore(&mut self, snapshot: DomainSnapshot) {
        dispatch!(self, domain => domain.restore(snapshot))
    }

    /// Undoes the removal of an interior value; only bitsets represent those.
    pub(crate) fn reinsert(&mut self, value: i32) {
        if let IntDomain::Bitset(domain) = self {
            domain.reinsert(value);
        }
    }
}

/// The direction in which the values or ranges of a domain are visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IterationOrder {
    #[default]
    Ascending,
    Descending,
}

/// A lazy iterator over the values of a domain.
///
/// The iterator borrows the domain, so it can only observe a single state; request a fresh one
/// for every traversal.
#[derive(Clone, Debug)]
pub struct DomainValues<'a> {
    domain: &'a IntDomain,
    next: Option<i32>,
    order: IterationOrder,
}

impl<'a> DomainValues<'a> {
    pub(crate) fn new(domain: &'a IntDomain, order: IterationOrder) -> Self {
        let next = match order {
            IterationOrder::Ascending => domain.lower_bound(),
            IterationOrder::Descending => domain.upper_bound(),
        };
        DomainValues {
            domain,
            next: Some(next),
            order,
        }
    }
}

impl Iterator for DomainValues<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let current = self.next?;
        self.next = match self.order {
            IterationOrder::Ascending => self.domain.next_value(current),
            IterationOrder::Descending => self.domain.previous_value(current),
        };
        Some(current)
    }
}

/// A lazy iterator over the maximal ranges `(first, last)` of consecutive values of a domain.
#[derive(Clone, Debug)]
pub struct DomainRanges<'a> {
    domain: &'a IntDomain,
    next: Option<i32>,
    order: IterationOrder,
}

impl<'a> DomainRanges<'a> {
    pub(crate) fn new(domain: &'a IntDomain, order: IterationOrder) -> Self {
        let next = match order {
            IterationOrder::Ascending => domain.lower_bound(),
            IterationOrder::Descending => domain.upper_bound(),
        };
        DomainRanges {
            domain,
            next: Some(next),
            order,
        }
    }
}

impl Iterator for DomainRanges<'_> {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        let boundary = self.next?;
        match self.order {
            IterationOrder::Ascending => {
                let end = self.domain.range_end(boundary);
                self.next = self.domain.next_value(end);
                Some((boundary, end))
            }
            IterationOrder::Descending => {
                let start = self.domain.range_start(boundary);
                self.next = self.domain.previous_value(start);
                Some((start, boundary))
            }
        }
    }
}
