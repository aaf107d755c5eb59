//! Pending fine-grained work: for every scheduled propagator, the coalesced events per scope
//! position.
use std::collections::VecDeque;
use std::fmt::Debug;

use enumset::EnumSet;

use super::PropagatorOrder;
use crate::containers::HashMap;
use crate::containers::KeyedVec;
use crate::engine::notifications::DomainEvent;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagatorId;
use crate::fixpoint_assert_moderate;

/// The coalesced events of one scope position of a propagator.
pub(crate) type LocalEvents = (LocalId, EnumSet<DomainEvent>);

pub(crate) trait FineQueue: Debug {
    /// Called for every propagator added to the engine, in order of their ids.
    fn grow(&mut self, propagator: PropagatorId, arity: usize);

    /// Or's `events` into the pending events of `local_id` of `propagator`. Returns whether a new
    /// work item was created, rather than coalesced into an existing one.
    fn schedule(
        &mut self,
        propagator: PropagatorId,
        local_id: LocalId,
        events: EnumSet<DomainEvent>,
        priority: Priority,
    ) -> bool;

    /// Takes the next propagator out of the queue and appends its pending events to `events`.
    fn pop(&mut self, events: &mut Vec<LocalEvents>) -> Option<PropagatorId>;

    /// Discards all pending events of `propagator`.
    fn remove(&mut self, propagator: PropagatorId);

    fn clear(&mut self);

    fn is_empty(&self) -> bool;

    fn on_execution(&mut self, _propagator: PropagatorId) {}

    fn decay(&mut self) {}
}

#[derive(Debug, Default)]
struct PendingEvents {
    /// Indexed by local id.
    masks: Vec<EnumSet<DomainEvent>>,
    /// The local ids with a non-empty mask, in order of arrival.
    scheduled: Vec<LocalId>,
}

/// Keeps an event mask per scope position of every propagator, and hands out propagators in the
/// order given by `Order`.
#[derive(Debug)]
pub(crate) struct PropagatorKeyedEvents<Order> {
    pending: KeyedVec<PropagatorId, PendingEvents>,
    order: Order,
    num_scheduled: usize,
}

impl<Order> PropagatorKeyedEvents<Order> {
    pub(crate) fn new(order: Order) -> Self {
        PropagatorKeyedEvents {
            pending: KeyedVec::default(),
            order,
            num_scheduled: 0,
        }
    }
}

impl<Order: PropagatorOrder> FineQueue for PropagatorKeyedEvents<Order> {
    fn grow(&mut self, propagator: PropagatorId, arity: usize) {
        let id = self.pending.push(PendingEvents {
            masks: vec![EnumSet::empty(); arity],
            scheduled: Vec::new(),
        });
        fixpoint_assert_moderate!(id == propagator);
        self.order.grow(propagator);
    }

    fn schedule(
        &mut self,
        propagator: PropagatorId,
        local_id: LocalId,
        events: EnumSet<DomainEvent>,
        priority: Priority,
    ) -> bool {
        let pending = &mut self.pending[propagator];
        let mask = &mut pending.masks[local_id.unpack() as usize];
        if !mask.is_empty() {
            *mask |= events;
            return false;
        }

        *mask = events;
        if pending.scheduled.is_empty() {
            self.order.insert(propagator, priority);
            self.num_scheduled += 1;
        }
        pending.scheduled.push(local_id);
        true
    }

    fn pop(&mut self, events: &mut Vec<LocalEvents>) -> Option<PropagatorId> {
        let propagator = self.order.pop()?;
        let pending = &mut self.pending[propagator];
        fixpoint_assert_moderate!(!pending.scheduled.is_empty());

        for local_id in pending.scheduled.drain(..) {
            let mask = std::mem::take(&mut pending.masks[local_id.unpack() as usize]);
            events.push((local_id, mask));
        }
        self.num_scheduled -= 1;
        Some(propagator)
    }

    fn remove(&mut self, propagator: PropagatorId) {
        let pending = &mut self.pending[propagator];
        if pending.scheduled.is_empty() {
            return;
        }

        for local_id in pending.scheduled.drain(..) {
            pending.masks[local_id.unpack() as usize] = EnumSet::empty();
        }
        self.order.remove(propagator);
        self.num_scheduled -= 1;
    }

    fn clear(&mut self) {
        while let Some(propagator) = self.order.pop() {
            let pending = &mut self.pending[propagator];
            for local_id in pending.scheduled.drain(..) {
                pending.masks[local_id.unpack() as usize] = EnumSet::empty();
            }
        }
        self.num_scheduled = 0;
    }

    fn is_empty(&self) -> bool {
        self.num_scheduled == 0
    }

    fn on_execution(&mut self, propagator: PropagatorId) {
        self.order.on_execution(propagator);
    }

    fn decay(&mut self) {
        self.order.decay();
    }
}

/// Keeps one work item per (propagator, scope position) pair in a hash map, instead of an event
/// array per propagator. Items are handed out one pair at a time, first in first out.
#[derive(Debug, Default)]
pub(crate) struct PairKeyedEvents {
    queue: VecDeque<(PropagatorId, LocalId)>,
    masks: HashMap<(PropagatorId, LocalId), EnumSet<DomainEvent>>,
}

impl FineQueue for PairKeyedEvents {
    fn grow(&mut self, _propagator: PropagatorId, _arity: usize) {}

    fn schedule(
        &mut self,
        propagator: PropagatorId,
        local_id: LocalId,
        events: EnumSet<DomainEvent>,
        _priority: Priority,
    ) -> bool {
        let key = (propagator, local_id);
        if let Some(mask) = self.masks.get_mut(&key) {
            *mask |= events;
            return false;
        }

        let _ = self.masks.insert(key, events);
        self.queue.push_back(key);
        true
    }

    fn pop(&mut self, events: &mut Vec<LocalEvents>) -> Option<PropagatorId> {
        let key = self.queue.pop_front()?;
        let mask = self.masks.remove(&key).unwrap_or_default();
        events.push((key.1, mask));
        Some(key.0)
    }

    fn remove(&mut self, propagator: PropagatorId) {
        self.queue.retain(|&(queued, _)| queued != propagator);
        self.masks.retain(|&(queued, _), _| queued != propagator);
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.masks.clear();
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
