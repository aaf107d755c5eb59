use enumset::EnumSet;

use super::DomainEvent;
use crate::containers::KeyedVec;
use crate::engine::contradiction::Cause;
use crate::engine::domains::DomainNotification;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagatorActivities;
use crate::engine::propagation::PropagatorId;
use crate::engine::scheduling::Scheduler;
use crate::engine::variables::DomainId;

/// A propagator waiting for events on one of its scope positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Watcher {
    pub(crate) propagator: PropagatorId,
    pub(crate) local_id: LocalId,
    pub(crate) conditions: EnumSet<DomainEvent>,
    pub(crate) priority: Priority,
}

/// Fans a domain notification out to the propagators watching that domain.
#[derive(Debug, Default)]
pub(crate) struct EventRouter {
    watchers: KeyedVec<DomainId, Vec<Watcher>>,
}

impl EventRouter {
    pub(crate) fn grow(&mut self) -> DomainId {
        self.watchers.push(Vec::new())
    }

    pub(crate) fn watch(&mut self, domain: DomainId, watcher: Watcher) {
        self.watchers[domain].push(watcher);
    }

    pub(crate) fn unwatch(&mut self, domain: DomainId, propagator: PropagatorId) {
        self.watchers[domain].retain(|watcher| watcher.propagator != propagator);
    }

    /// Schedules every active watcher of the notified domain, other than the cause of the
    /// notification, whose conditions intersect the strengthened event. Returns the number of
    /// new fine-grained work items.
    pub(crate) fn route(
        &self,
        notification: DomainNotification,
        activities: &PropagatorActivities,
        scheduler: &mut Scheduler,
    ) -> usize {
        let strengthened = notification.event.strengthened_mask();
        let mut num_scheduled = 0;

        for watcher in &self.watchers[notification.domain] {
            if notification.cause == Cause::Propagator(watcher.propagator)
                || !activities.is_active(watcher.propagator)
            {
                continue;
            }

            let events = strengthened & watcher.conditions;
            if events.is_empty() {
                continue;
            }

            if scheduler.schedule_fine(
                watcher.propagator,
                watcher.local_id,
                events,
                watcher.priority,
            ) {
                num_scheduled += 1;
            }
        }

        num_scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::notifications::DomainEvents;
    use crate::engine::propagation::PropagatorActivity;
    use crate::engine::scheduling::LocalEvents;
    use crate::engine::scheduling::SchedulingPolicy;

    struct Fixture {
        router: EventRouter,
        activities: PropagatorActivities,
        scheduler: Scheduler,
        x: DomainId,
    }

    /// Two unary propagators on `x`: 0 waits for removals, 1 for instantiation.
    fn fixture() -> Fixture {
        let mut router = EventRouter::default();
        let mut activities = PropagatorActivities::default();
        let mut scheduler = Scheduler::new(SchedulingPolicy::Fifo, 0.999);
        let x = router.grow();

        for (id, conditions) in [DomainEvents::REMOVAL, DomainEvents::INSTANTIATE]
            .into_iter()
            .enumerate()
        {
            let propagator = PropagatorId(id as u32);
            activities.grow(propagator);
            activities.set(propagator, PropagatorActivity::Active);
            scheduler.grow(propagator, 1);
            router.watch(
                x,
                Watcher {
                    propagator,
                    local_id: LocalId::from(0),
                    conditions: conditions.events(),
                    priority: Priority::Unary,
                },
            );
        }

        Fixture {
            router,
            activities,
            scheduler,
            x,
        }
    }

    fn scheduled(scheduler: &mut Scheduler) -> Vec<(PropagatorId, Vec<LocalEvents>)> {
        let mut result = Vec::new();
        loop {
            let mut events = Vec::new();
            let Some(propagator) = scheduler.pop_fine(&mut events) else {
                return result;
            };
            result.push((propagator, events));
        }
    }

    fn notification(domain: DomainId, event: DomainEvent, cause: Cause) -> DomainNotification {
        DomainNotification {
            domain,
            event,
            cause,
        }
    }

    #[test]
    fn instantiation_wakes_up_removal_and_instantiation_watchers() {
        let mut f = fixture();

        let num_scheduled = f.router.route(
            notification(f.x, DomainEvent::Instantiate, Cause::Decision),
            &f.activities,
            &mut f.scheduler,
        );

        assert_eq!(2, num_scheduled);
        let scheduled = scheduled(&mut f.scheduler);
        assert_eq!(
            vec![PropagatorId(0), PropagatorId(1)],
            scheduled.iter().map(|(id, _)| *id).collect::<Vec<_>>()
        );
        assert_eq!(EnumSet::only(DomainEvent::Removal), scheduled[0].1[0].1);
        assert_eq!(EnumSet::only(DomainEvent::Instantiate), scheduled[1].1[0].1);
    }

    #[test]
    fn removal_only_wakes_up_removal_watchers() {
        let mut f = fixture();

        let _ = f.router.route(
            notification(f.x, DomainEvent::Removal, Cause::Decision),
            &f.activities,
            &mut f.scheduler,
        );

        let scheduled = scheduled(&mut f.scheduler);
        assert_eq!(1, scheduled.len());
        assert_eq!(PropagatorId(0), scheduled[0].0);
    }

    #[test]
    fn the_cause_and_inactive_propagators_are_skipped() {
        let mut f = fixture();
        f.activities.set(PropagatorId(1), PropagatorActivity::Passive);

        let cause = Cause::Propagator(PropagatorId(0));
        let num_scheduled = f.router.route(
            notification(f.x, DomainEvent::Instantiate, cause),
            &f.activities,
            &mut f.scheduler,
        );

        assert_eq!(0, num_scheduled);
        assert!(f.scheduler.is_empty());
    }

    #[test]
    fn repeated_events_are_coalesced_into_one_item() {
        let mut f = fixture();

        let first = f.router.route(
            notification(f.x, DomainEvent::LowerBound, Cause::Decision),
            &f.activities,
            &mut f.scheduler,
        );
        let second = f.router.route(
            notification(f.x, DomainEvent::Removal, Cause::Decision),
            &f.activities,
            &mut f.scheduler,
        );

        assert_eq!((1, 0), (first, second));
        assert_eq!(1, scheduled(&mut f.scheduler).len());
    }
}
