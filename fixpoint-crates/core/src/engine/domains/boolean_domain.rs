use super::DomainSnapshot;
use super::EmptyDomain;
use crate::engine::notifications::DomainEvent;

/// A 0/1 domain. Every successful narrowing fixes the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BooleanDomain {
    Unassigned,
    Assigned(bool),
}

impl BooleanDomain {
    pub(crate) fn lower_bound(&self) -> i32 {
        match self {
            BooleanDomain::Unassigned => 0,
            BooleanDomain::Assigned(value) => i32::from(*value),
        }
    }

    pub(crate) fn upper_bound(&self) -> i32 {
        match self {
            BooleanDomain::Unassigned => 1,
            BooleanDomain::Assigned(value) => i32::from(*value),
        }
    }

    pub(crate) fn size(&self) -> u32 {
        match self {
            BooleanDomain::Unassigned => 2,
            BooleanDomain::Assigned(_) => 1,
        }
    }

    pub(crate) fn contains(&self, value: i32) -> bool {
        self.lower_bound() <= value && value <= self.upper_bound()
    }

    pub(crate) fn next_value(&self, value: i32) -> Option<i32> {
        (value < self.upper_bound()).then(|| (value + 1).max(self.lower_bound()))
    }

    pub(crate) fn previous_value(&self, value: i32) -> Option<i32> {
        (value > self.lower_bound()).then(|| (value - 1).min(self.upper_bound()))
    }

    pub(crate) fn remove(&mut self, value: i32) -> Result<Option<DomainEvent>, EmptyDomain> {
        match (*self, value) {
            (BooleanDomain::Unassigned, 0 | 1) => {
                *self = BooleanDomain::Assigned(value == 0);
                Ok(Some(DomainEvent::Instantiate))
            }
            (BooleanDomain::Assigned(assigned), _) if i32::from(assigned) == value => {
                Err(EmptyDomain::LastValueRemoved)
            }
            _ => Ok(None),
        }
    }

    pub(crate) fn remove_interval(
        &mut self,
        from: i32,
        to: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        let from = from.max(self.lower_bound());
        let to = to.min(self.upper_bound());
        match to - from {
            diff if diff < 0 => Ok(None),
            0 => self.remove(from),
            _ => Err(EmptyDomain::AllValuesRemoved),
        }
    }

    pub(crate) fn set_lower_bound(
        &mut self,
        value: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        if value <= self.lower_bound() {
            Ok(None)
        } else if value > self.upper_bound() {
            Err(EmptyDomain::BoundsCrossed)
        } else {
            *self = BooleanDomain::Assigned(true);
            Ok(Some(DomainEvent::Instantiate))
        }
    }

    pub(crate) fn set_upper_bound(
        &mut self,
        value: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        if value >= self.upper_bound() {
            Ok(None)
        } else if value < self.lower_bound() {
            Err(EmptyDomain::BoundsCrossed)
        } else {
            *self = BooleanDomain::Assigned(false);
            Ok(Some(DomainEvent::Instantiate))
        }
    }

    pub(crate) fn instantiate(&mut self, value: i32) -> Result<Option<DomainEvent>, EmptyDomain> {
        match *self {
            _ if !self.contains(value) => Err(EmptyDomain::ValueNotInDomain),
            BooleanDomain::Assigned(_) => Ok(None),
            BooleanDomain::Unassigned => {
                *self = BooleanDomain::Assigned(value == 1);
                Ok(Some(DomainEvent::Instantiate))
            }
        }
    }

    pub(crate) fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot {
            lower_bound: self.lower_bound(),
            upper_bound: self.upper_bound(),
            size: self.size(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: DomainSnapshot) {
        *self = if snapshot.lower_bound == snapshot.upper_bound {
            BooleanDomain::Assigned(snapshot.lower_bound == 1)
        } else {
            BooleanDomain::Unassigned
        };
    }
}
