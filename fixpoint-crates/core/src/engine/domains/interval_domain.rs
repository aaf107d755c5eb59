use super::DomainSnapshot;
use super::EmptyDomain;
use crate::engine::notifications::DomainEvent;
use crate::fixpoint_assert_simple;

/// A domain which is represented only by its bounds.
///
/// Holes cannot be represented: removing a value strictly between the bounds is accepted and
/// reported as "unchanged".
#[derive(Clone, Copy, Debug)]
pub(crate) struct IntervalDomain {
    lower_bound: i32,
    upper_bound: i32,
}

impl IntervalDomain {
    pub(crate) fn new(lower_bound: i32, upper_bound: i32) -> IntervalDomain {
        fixpoint_assert_simple!(
            lower_bound <= upper_bound,
            "cannot create the empty domain [{lower_bound}, {upper_bound}]"
        );
        IntervalDomain {
            lower_bound,
            upper_bound,
        }
    }

    pub(crate) fn lower_bound(&self) -> i32 {
        self.lower_bound
    }

    pub(crate) fn upper_bound(&self) -> i32 {
        self.upper_bound
    }

    pub(crate) fn size(&self) -> u32 {
        (self.upper_bound as i64 - self.lower_bound as i64 + 1).min(u32::MAX as i64) as u32
    }

    pub(crate) fn contains(&self, value: i32) -> bool {
        self.lower_bound <= value && value <= self.upper_bound
    }

    pub(crate) fn next_value(&self, value: i32) -> Option<i32> {
        (value < self.upper_bound).then(|| value.saturating_add(1).max(self.lower_bound))
    }

    pub(crate) fn previous_value(&self, value: i32) -> Option<i32> {
        (value > self.lower_bound).then(|| value.saturating_sub(1).min(self.upper_bound))
    }

    pub(crate) fn remove(&mut self, value: i32) -> Result<Option<DomainEvent>, EmptyDomain> {
        if !self.contains(value) {
            return Ok(None);
        }
        if self.lower_bound == self.upper_bound {
            return Err(EmptyDomain::LastValueRemoved);
        }

        if value == self.lower_bound {
            self.lower_bound += 1;
            Ok(Some(self.bound_event(DomainEvent::LowerBound)))
        } else if value == self.upper_bound {
            self.upper_bound -= 1;
            Ok(Some(self.bound_event(DomainEvent::UpperBound)))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn remove_interval(
        &mut self,
        from: i32,
        to: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        let from = from.max(self.lower_bound);
        let to = to.min(self.upper_bound);
        if from > to {
            return Ok(None);
        }
        if from == self.lower_bound && to == self.upper_bound {
            return Err(EmptyDomain::AllValuesRemoved);
        }

        if from == self.lower_bound {
            self.lower_bound = to + 1;
            Ok(Some(self.bound_event(DomainEvent::LowerBound)))
        } else if to == self.upper_bound {
            self.upper_bound = from - 1;
            Ok(Some(self.bound_event(DomainEvent::UpperBound)))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn set_lower_bound(
        &mut self,
        value: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        if value <= self.lower_bound {
            return Ok(None);
        }
        if value > self.upper_bound {
            return Err(EmptyDomain::BoundsCrossed);
        }

        self.lower_bound = value;
        Ok(Some(self.bound_event(DomainEvent::LowerBound)))
    }

    pub(crate) fn set_upper_bound(
        &mut self,
        value: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        if value >= self.upper_bound {
            return Ok(None);
        }
        if value < self.lower_bound {
            return Err(EmptyDomain::BoundsCrossed);
        }

        self.upper_bound = value;
        Ok(Some(self.bound_event(DomainEvent::UpperBound)))
    }

    pub(crate) fn instantiate(&mut self, value: i32) -> Result<Option<DomainEvent>, EmptyDomain> {
        if !self.contains(value) {
            return Err(EmptyDomain::ValueNotInDomain);
        }
        if self.lower_bound == self.upper_bound {
            return Ok(None);
        }

        self.lower_bound = value;
        self.upper_bound = value;
        Ok(Some(DomainEvent::Instantiate))
    }

    pub(crate) fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot {
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            size: self.size(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: DomainSnapshot) {
        self.lower_bound = snapshot.lower_bound;
        self.upper_bound = snapshot.upper_bound;
    }

    fn bound_event(&self, event: DomainEvent) -> DomainEvent {
        if self.lower_bound == self.upper_bound {
            DomainEvent::Instantiate
        } else {
            event
        }
    }
}
