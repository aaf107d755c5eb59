use enumset::EnumSet;

use super::ActivityOrder;
use super::CoarseQueue;
use super::FifoOrder;
use super::FineQueue;
use super::LocalEvents;
use super::PairKeyedEvents;
use super::PriorityBuckets;
use super::PropagatorKeyedEvents;
use super::SchedulingPolicy;
use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::PropagatorEvent;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagatorId;

/// The pending work of the engine: a fine-grained queue of (propagator, scope position, events)
/// items filled by the router, and a coarse-grained queue of (propagator, events) items. The
/// policy decides how both queues order their propagators.
#[derive(Debug)]
pub(crate) struct Scheduler {
    policy: SchedulingPolicy,
    fine: Box<dyn FineQueue>,
    coarse: CoarseQueue,
}

impl Scheduler {
    pub(crate) fn new(policy: SchedulingPolicy, activity_decay: f64) -> Scheduler {
        let (fine, coarse): (Box<dyn FineQueue>, CoarseQueue) = match policy {
            SchedulingPolicy::Fifo => (
                Box::new(PropagatorKeyedEvents::new(FifoOrder::default())),
                CoarseQueue::new(Box::new(FifoOrder::default())),
            ),
            SchedulingPolicy::PairKeyed => (
                Box::new(PairKeyedEvents::default()),
                CoarseQueue::new(Box::new(FifoOrder::default())),
            ),
            SchedulingPolicy::PriorityBuckets => (
                Box::new(PropagatorKeyedEvents::new(PriorityBuckets::default())),
                CoarseQueue::new(Box::new(PriorityBuckets::default())),
            ),
            SchedulingPolicy::Activity => (
                Box::new(PropagatorKeyedEvents::new(ActivityOrder::new(
                    activity_decay,
                ))),
                CoarseQueue::new(Box::new(ActivityOrder::new(activity_decay))),
            ),
        };

        Scheduler {
            policy,
            fine,
            coarse,
        }
    }

    pub(crate) fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    pub(crate) fn grow(&mut self, propagator: PropagatorId, arity: usize) {
        self.fine.grow(propagator, arity);
        self.coarse.grow(propagator);
    }

    pub(crate) fn schedule_fine(
        &mut self,
        propagator: PropagatorId,
        local_id: LocalId,
        events: EnumSet<DomainEvent>,
        priority: Priority,
    ) -> bool {
        self.fine.schedule(propagator, local_id, events, priority)
    }

    pub(crate) fn schedule_coarse(
        &mut self,
        propagator: PropagatorId,
        events: EnumSet<PropagatorEvent>,
        priority: Priority,
    ) -> bool {
        self.coarse.schedule(propagator, events, priority)
    }

    pub(crate) fn pop_fine(&mut self, events: &mut Vec<LocalEvents>) -> Option<PropagatorId> {
        self.fine.pop(events)
    }

    pub(crate) fn pop_coarse(&mut self) -> Option<(PropagatorId, EnumSet<PropagatorEvent>)> {
        self.coarse.pop()
    }

    /// Drops the remaining fine-grained work of `propagator`, e.g. because a full pass will
    /// subsume it.
    pub(crate) fn remove_fine(&mut self, propagator: PropagatorId) {
        self.fine.remove(propagator);
    }

    pub(crate) fn remove(&mut self, propagator: PropagatorId) {
        self.fine.remove(propagator);
        self.coarse.remove(propagator);
    }

    pub(crate) fn clear(&mut self) {
        self.fine.clear();
        self.coarse.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fine.is_empty() && self.coarse.is_empty()
    }

    pub(crate) fn on_execution(&mut self, propagator: PropagatorId) {
        self.fine.on_execution(propagator);
        self.coarse.on_execution(propagator);
    }

    pub(crate) fn decay(&mut self) {
        self.fine.decay();
        self.coarse.decay();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;

    const POLICIES: [SchedulingPolicy; 4] = [
        SchedulingPolicy::Fifo,
        SchedulingPolicy::PairKeyed,
        SchedulingPolicy::PriorityBuckets,
        SchedulingPolicy::Activity,
    ];

    fn scheduler(policy: SchedulingPolicy) -> Scheduler {
        let mut scheduler = Scheduler::new(policy, 0.95);
        for index in 0..3 {
            scheduler.grow(PropagatorId::create_from_index(index), 2);
        }
        scheduler
    }

    #[test]
    fn removing_a_propagator_drops_fine_and_coarse_work() {
        for policy in POLICIES {
            let mut scheduler = scheduler(policy);
            let propagator = PropagatorId::create_from_index(1);
            let _ = scheduler.schedule_fine(
                propagator,
                LocalId::from(1),
                DomainEvent::Removal.strengthened_mask(),
                Priority::Binary,
            );
            let _ = scheduler.schedule_coarse(
                propagator,
                PropagatorEvent::Full.strengthened_mask(),
                Priority::Binary,
            );

            scheduler.remove(propagator);

            assert!(scheduler.is_empty(), "{policy}");
            assert_eq!(None, scheduler.pop_fine(&mut Vec::new()), "{policy}");
            assert_eq!(None, scheduler.pop_coarse(), "{policy}");
        }
    }

    #[test]
    fn clearing_forgets_every_mask() {
        for policy in POLICIES {
            let mut scheduler = scheduler(policy);
            let propagator = PropagatorId::create_from_index(0);
            let _ = scheduler.schedule_coarse(
                propagator,
                PropagatorEvent::Full.strengthened_mask(),
                Priority::Unary,
            );
            scheduler.clear();

            let _ = scheduler.schedule_coarse(
                propagator,
                EnumSet::only(PropagatorEvent::Custom),
                Priority::Unary,
            );

            assert_eq!(
                Some((propagator, EnumSet::only(PropagatorEvent::Custom))),
                scheduler.pop_coarse(),
                "{policy}"
            );
        }
    }
}
