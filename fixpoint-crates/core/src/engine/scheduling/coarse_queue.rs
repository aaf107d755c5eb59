use enumset::EnumSet;

use super::PropagatorOrder;
use crate::containers::KeyedVec;
use crate::engine::notifications::PropagatorEvent;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagatorId;
use crate::fixpoint_assert_moderate;

/// Pending coarse-grained work: at most one entry per propagator, carrying the coalesced
/// [`PropagatorEvent`]s it was scheduled with.
#[derive(Debug)]
pub(crate) struct CoarseQueue {
    masks: KeyedVec<PropagatorId, EnumSet<PropagatorEvent>>,
    order: Box<dyn PropagatorOrder>,
    num_scheduled: usize,
}

impl CoarseQueue {
    pub(crate) fn new(order: Box<dyn PropagatorOrder>) -> CoarseQueue {
        CoarseQueue {
            masks: KeyedVec::default(),
            order,
            num_scheduled: 0,
        }
    }

    pub(crate) fn grow(&mut self, propagator: PropagatorId) {
        let id = self.masks.push(EnumSet::empty());
        fixpoint_assert_moderate!(id == propagator);
        self.order.grow(propagator);
    }

    pub(crate) fn is_scheduled(&self, propagator: PropagatorId) -> bool {
        !self.masks[propagator].is_empty()
    }

    /// Or's `events` into the pending mask of `propagator`. Returns whether the propagator was
    /// not scheduled before.
    pub(crate) fn schedule(
        &mut self,
        propagator: PropagatorId,
        events: EnumSet<PropagatorEvent>,
        priority: Priority,
    ) -> bool {
        let is_new = !self.is_scheduled(propagator);
        self.masks[propagator] |= events;
        if is_new {
            self.order.insert(propagator, priority);
            self.num_scheduled += 1;
        }
        is_new
    }

    pub(crate) fn pop(&mut self) -> Option<(PropagatorId, EnumSet<PropagatorEvent>)> {
        let propagator = self.order.pop()?;
        let events = std::mem::take(&mut self.masks[propagator]);
        fixpoint_assert_moderate!(!events.is_empty());
        self.num_scheduled -= 1;
        Some((propagator, events))
    }

    pub(crate) fn remove(&mut self, propagator: PropagatorId) {
        if self.is_scheduled(propagator) {
            self.masks[propagator] = EnumSet::empty();
            self.order.remove(propagator);
            self.num_scheduled -= 1;
        }
    }

    pub(crate) fn clear(&mut self) {
        while let Some(propagator) = self.order.pop() {
            self.masks[propagator] = EnumSet::empty();
        }
        self.num_scheduled = 0;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.num_scheduled == 0
    }

    pub(crate) fn on_execution(&mut self, propagator: PropagatorId) {
        self.order.on_execution(propagator);
    }

    pub(crate) fn decay(&mut self) {
        self.order.decay();
    }
}
