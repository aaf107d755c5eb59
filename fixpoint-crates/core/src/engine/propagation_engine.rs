use std::borrow::Cow;

use enumset::EnumSet;
use log::debug;
use log::trace;

use super::contradiction::Cause;
use super::contradiction::Contradiction;
use super::contradiction::PropagationStatus;
use super::domains::DomainStore;
use super::notifications::DomainEvent;
use super::notifications::EventRouter;
use super::notifications::PropagatorEvent;
use super::notifications::Watcher;
use super::propagation::LocalId;
use super::propagation::Priority;
use super::propagation::PropagationContext;
use super::propagation::PropagationContextMut;
use super::propagation::Propagator;
use super::propagation::PropagatorActivities;
use super::propagation::PropagatorActivity;
use super::propagation::PropagatorHandle;
use super::propagation::PropagatorId;
use super::propagation::PropagatorRequests;
use super::propagation::PropagatorStore;
use super::propagation::ReadDomains;
use super::scheduling::LocalEvents;
use super::scheduling::Scheduler;
use super::scheduling::SchedulingPolicy;
use super::variables::DomainId;
use super::EngineStatistics;
use super::Entailment;
use crate::containers::KeyedVec;
use crate::fixpoint_assert_advanced;
use crate::fixpoint_assert_moderate;
use crate::fixpoint_assert_simple;
use crate::statistics::log_statistic;
use crate::statistics::should_log_statistics;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

/// Options which influence the order in which the engine executes propagators.
#[derive(Clone, Copy, Debug)]
pub struct EngineOptions {
    pub scheduling_policy: SchedulingPolicy,
    /// Whether [`PropagationEngine::initialize`] schedules propagators by increasing priority and
    /// arity rather than in the order in which they were added.
    pub sort_propagators_on_initialise: bool,
    /// The decay factor of the [`SchedulingPolicy::Activity`] policy, in `(0, 1]`.
    pub activity_decay: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            scheduling_policy: SchedulingPolicy::Fifo,
            sort_propagators_on_initialise: true,
            activity_decay: 0.999,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PropagatorInfo {
    priority: Priority,
    arity: usize,
    reacts_to_fine_events: bool,
}

/// Narrows the domains by executing propagators until no propagator can narrow them further, or
/// until a domain becomes empty.
///
/// The engine owns the domains and the propagators. Mutations are reported by the domains as
/// notifications, which the engine routes to the watching propagators after every propagator
/// execution. Fine-grained work (a propagator together with the events on its scope positions)
/// is always executed before coarse-grained work (full passes).
///
/// A contradiction aborts [`PropagationEngine::run_to_fixpoint`]. The caller is then expected to
/// [`PropagationEngine::flush`] the pending work and to [`PropagationEngine::restore_to`] a
/// checkpoint from before the decision that led to the contradiction.
#[derive(Debug)]
pub struct PropagationEngine {
    options: EngineOptions,
    domains: DomainStore,
    router: EventRouter,
    propagators: PropagatorStore,
    propagator_info: KeyedVec<PropagatorId, PropagatorInfo>,
    activities: PropagatorActivities,
    scheduler: Scheduler,
    is_initialised: bool,
    /// Scratch space for the events of the propagator which is executed fine-grained.
    fine_events: Vec<LocalEvents>,
    /// Propagators added by [`PropagationEngine::add_temporary_propagator`], with the checkpoint
    /// at which they were added; ordered by that checkpoint.
    temporary_propagators: Vec<(usize, PropagatorId)>,
    /// Propagators which receive a full pass after the next call to
    /// [`PropagationEngine::restore_to`].
    on_backtrack: Vec<PropagatorId>,
    statistics: EngineStatistics,
}

impl Default for PropagationEngine {
    fn default() -> Self {
        PropagationEngine::new(EngineOptions::default())
    }
}

impl PropagationEngine {
    pub fn new(options: EngineOptions) -> PropagationEngine {
        PropagationEngine {
            options,
            domains: DomainStore::default(),
            router: EventRouter::default(),
            propagators: PropagatorStore::default(),
            propagator_info: KeyedVec::default(),
            activities: PropagatorActivities::default(),
            scheduler: Scheduler::new(options.scheduling_policy, options.activity_decay),
            is_initialised: false,
            fine_events: Vec::new(),
            temporary_propagators: Vec::new(),
            on_backtrack: Vec::new(),
            statistics: EngineStatistics::default(),
        }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn scheduling_policy(&self) -> SchedulingPolicy {
        self.scheduler.policy()
    }

    pub fn statistics(&self) -> &EngineStatistics {
        &self.statistics
    }

    pub fn num_propagators(&self) -> usize {
        self.propagators.num_propagators()
    }

    pub fn activity(&self, propagator: PropagatorId) -> PropagatorActivity {
        self.activities.get(propagator)
    }

    /// Whether work is pending; false after every successful fixpoint computation.
    pub fn has_pending_work(&self) -> bool {
        !self.scheduler.is_empty() || self.domains.has_pending_notifications()
    }
}

// Variables
impl PropagationEngine {
    /// Creates a variable with domain `[lower_bound, upper_bound]` in which every value can be
    /// removed.
    pub fn new_bitset_variable(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        let domain = self.domains.new_bitset_domain(lower_bound, upper_bound);
        self.register_domain(domain)
    }

    /// Creates a variable whose domain holds exactly `values`.
    pub fn new_sparse_variable(&mut self, values: &[i32]) -> DomainId {
        let domain = self.domains.new_sparse_domain(values);
        self.register_domain(domain)
    }

    /// Creates a variable which only tracks the bounds of its domain.
    pub fn new_interval_variable(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        let domain = self.domains.new_interval_domain(lower_bound, upper_bound);
        self.register_domain(domain)
    }

    pub fn new_boolean_variable(&mut self) -> DomainId {
        let domain = self.domains.new_boolean_domain();
        self.register_domain(domain)
    }

    fn register_domain(&mut self, domain: DomainId) -> DomainId {
        let watched = self.router.grow();
        fixpoint_assert_moderate!(watched == domain);
        domain
    }

    /// Turns on the delta log of `domain`, e.g. for a propagator which reads it through a
    /// [`DeltaMonitor`](crate::engine::domains::DeltaMonitor) without waiting for removals.
    pub fn activate_delta(&mut self, domain: DomainId) {
        self.domains.activate_delta(domain);
    }
}

// Propagators
impl PropagationEngine {
    /// Adds a propagator; it is executed for the first time by the first call to
    /// [`PropagationEngine::run_to_fixpoint`] after [`PropagationEngine::initialize`].
    pub fn add_propagator<P: Propagator>(&mut self, propagator: P) -> PropagatorHandle<P> {
        let info = PropagatorInfo {
            priority: propagator.priority(),
            arity: propagator.scope().len(),
            reacts_to_fine_events: propagator.reacts_to_fine_events(),
        };
        let watchers = propagator
            .scope()
            .iter()
            .enumerate()
            .map(|(index, &domain)| {
                let local_id = LocalId::from(index as u32);
                (domain, local_id, propagator.propagation_conditions(local_id))
            })
            .collect::<Vec<_>>();
        let name = propagator.name().to_owned();

        let handle = self.propagators.add(propagator);
        let propagator_id = handle.propagator_id();
        let _ = self.propagator_info.push(info);
        self.activities.grow(propagator_id);
        self.scheduler.grow(propagator_id, info.arity);

        for (domain, local_id, conditions) in watchers {
            fixpoint_assert_simple!(
                domain.id() < self.domains.num_domains() as u32,
                "{name} watches {domain} which does not exist"
            );
            self.router.watch(
                domain,
                Watcher {
                    propagator: propagator_id,
                    local_id,
                    conditions,
                    priority: info.priority,
                },
            );
            if info.reacts_to_fine_events && conditions.contains(DomainEvent::Removal) {
                self.domains.activate_delta(domain);
            }
        }

        debug!("Added {name} as {propagator_id}");
        if self.is_initialised {
            self.schedule_full(propagator_id);
        }

        handle
    }

    /// Adds a propagator which is removed again by the first call to
    /// [`PropagationEngine::restore_to`] that restores a checkpoint from before this call.
    pub fn add_temporary_propagator<P: Propagator>(
        &mut self,
        propagator: P,
    ) -> PropagatorHandle<P> {
        let handle = self.add_propagator(propagator);
        let checkpoint = self.get_checkpoint();
        self.temporary_propagators.push((checkpoint, handle.propagator_id()));
        handle
    }

    /// Removes `propagator` for good: its pending work is discarded, it stops watching its scope,
    /// and it is never executed again, not even after backtracking. The handle of the propagator
    /// stays valid.
    pub fn remove_propagator(&mut self, propagator: PropagatorId) {
        if self.activities.get(propagator) == PropagatorActivity::Removed {
            return;
        }
        let name = self.propagators[propagator].name();
        debug!("Removing {name} ({propagator})");

        self.scheduler.remove(propagator);
        for &domain in self.propagators[propagator].scope() {
            self.router.unwatch(domain, propagator);
        }
        self.activities.remove(propagator);
    }

    pub fn get_propagator<P: Propagator>(&self, handle: PropagatorHandle<P>) -> Option<&P> {
        self.propagators.get_propagator(handle)
    }

    pub fn get_propagator_mut<P: Propagator>(
        &mut self,
        handle: PropagatorHandle<P>,
    ) -> Option<&mut P> {
        self.propagators.get_propagator_mut(handle)
    }
}

// Scheduling
impl PropagationEngine {
    /// Schedules every propagator for a full pass. Subsequent calls have no effect.
    pub fn initialize(&mut self) {
        if self.is_initialised {
            return;
        }

        let mut propagators = self.propagators.ids().collect::<Vec<_>>();
        if self.options.sort_propagators_on_initialise {
            let info = &self.propagator_info;
            propagators.sort_by_key(|&propagator| {
                (info[propagator].priority, info[propagator].arity)
            });
        }

        for propagator in propagators {
            self.schedule_full(propagator);
        }
        self.is_initialised = true;
    }

    pub fn is_initialised(&self) -> bool {
        self.is_initialised
    }

    /// Schedules a full pass of `propagator`. Has no effect while a full pass is pending, or if
    /// the propagator is passive or removed.
    pub fn schedule_full(&mut self, propagator: PropagatorId) {
        if matches!(
            self.activities.get(propagator),
            PropagatorActivity::Passive | PropagatorActivity::Removed
        ) {
            return;
        }
        self.schedule_coarse(propagator, PropagatorEvent::Full.strengthened_mask());
    }

    fn schedule_coarse(&mut self, propagator: PropagatorId, events: EnumSet<PropagatorEvent>) {
        let priority = self.propagator_info[propagator].priority;
        if self.scheduler.schedule_coarse(propagator, events, priority) {
            self.statistics.num_scheduled_work_items += 1;
        }
    }

    /// Removes all pending work of `propagator` and makes it passive until backtracking
    /// restores a checkpoint from before this call.
    pub fn deactivate(&mut self, propagator: PropagatorId) {
        self.scheduler.remove(propagator);
        self.activities.set(propagator, PropagatorActivity::Passive);
    }

    /// Schedules a full pass of `propagator` right after the next call to
    /// [`PropagationEngine::restore_to`], whatever checkpoint it restores.
    pub fn propagate_on_backtrack(&mut self, propagator: PropagatorId) {
        if !self.on_backtrack.contains(&propagator) {
            self.on_backtrack.push(propagator);
        }
    }

    /// Discards all pending work without executing it.
    pub fn flush(&mut self) {
        self.scheduler.clear();
        self.domains.clear_notifications();
    }

    /// Executes propagators until all queues are empty. Returns the contradiction raised by a
    /// propagator, if any; in that case the pending work is kept until
    /// [`PropagationEngine::flush`].
    pub fn run_to_fixpoint(&mut self) -> PropagationStatus {
        self.initialize();
        self.scheduler.decay();
        self.route_notifications();

        let result = self.propagate();
        match &result {
            Ok(()) => fixpoint_assert_advanced!(!self.has_pending_work()),
            Err(contradiction) => {
                self.statistics.num_contradictions += 1;
                debug!("{contradiction}");
            }
        }
        result
    }

    fn propagate(&mut self) -> PropagationStatus {
        loop {
            if let Some(propagator) = self.scheduler.pop_fine(&mut self.fine_events) {
                let mut events = std::mem::take(&mut self.fine_events);
                let result = self.execute_fine(propagator, &events);
                events.clear();
                self.fine_events = events;
                result?;
            } else if let Some((propagator, events)) = self.scheduler.pop_coarse() {
                self.execute_coarse(propagator, events)?;
            } else {
                return Ok(());
            }

            self.route_notifications();
        }
    }

    fn execute_fine(
        &mut self,
        propagator: PropagatorId,
        events: &[LocalEvents],
    ) -> PropagationStatus {
        fixpoint_assert_moderate!(self.activities.is_active(propagator));
        self.statistics.num_fine_executions += 1;
        self.scheduler.on_execution(propagator);

        if !self.propagator_info[propagator].reacts_to_fine_events {
            self.scheduler.remove_fine(propagator);
            return self.run_coarse(propagator, PropagatorEvent::Full.strengthened_mask());
        }

        let mut requests = PropagatorRequests::default();
        for &(local_id, event) in events {
            trace!(
                "Propagating {} on {local_id} with {event:?}",
                self.propagators[propagator].name()
            );
            let context = PropagationContextMut::new(&mut self.domains, propagator, &mut requests);
            self.propagators[propagator].propagate_event(context, local_id, event)?;

            if requests.passive {
                self.make_passive(propagator);
                return Ok(());
            }
        }

        if !requests.delayed.is_empty() {
            self.statistics.num_delayed_executions += 1;
            self.run_coarse(propagator, requests.delayed)?;
        }
        Ok(())
    }

    fn execute_coarse(
        &mut self,
        propagator: PropagatorId,
        mut events: EnumSet<PropagatorEvent>,
    ) -> PropagationStatus {
        match self.activities.get(propagator) {
            PropagatorActivity::Passive | PropagatorActivity::Removed => return Ok(()),
            PropagatorActivity::Stateless => {
                self.activities.set(propagator, PropagatorActivity::Active);
                events |= PropagatorEvent::Full.strengthened_mask();
            }
            PropagatorActivity::Active => {}
        }

        self.statistics.num_coarse_executions += 1;
        self.scheduler.on_execution(propagator);
        self.run_coarse(propagator, events)
    }

    /// Runs the coarse-grained routine of `propagator` and makes it passive if it is entailed
    /// afterwards.
    fn run_coarse(
        &mut self,
        propagator: PropagatorId,
        events: EnumSet<PropagatorEvent>,
    ) -> PropagationStatus {
        trace!(
            "Propagating {} with {events:?}",
            self.propagators[propagator].name()
        );

        let mut requests = PropagatorRequests::default();
        let context = PropagationContextMut::new(&mut self.domains, propagator, &mut requests);
        self.propagators[propagator].propagate(context, events)?;

        let entailment =
            self.propagators[propagator].is_entailed(PropagationContext::new(&self.domains));
        if requests.passive || entailment == Entailment::True {
            self.make_passive(propagator);
        } else if !requests.delayed.is_empty() {
            self.schedule_coarse(propagator, requests.delayed);
        }
        Ok(())
    }

    fn make_passive(&mut self, propagator: PropagatorId) {
        debug!("{} is entailed", self.propagators[propagator].name());
        self.statistics.num_entailments += 1;
        self.deactivate(propagator);
    }

    fn route_notifications(&mut self) {
        let PropagationEngine {
            domains,
            router,
            activities,
            scheduler,
            statistics,
            ..
        } = self;

        for notification in domains.drain_notifications() {
            statistics.num_routed_notifications += 1;
            statistics.num_scheduled_work_items +=
                router.route(notification, activities, scheduler) as u64;
        }
    }
}

// Decisions
impl PropagationEngine {
    pub fn remove(&mut self, domain: DomainId, value: i32) -> Result<bool, Contradiction> {
        let result = self.domains.remove(domain, value, Cause::Decision);
        self.count_contradiction(result)
    }

    pub fn remove_interval(
        &mut self,
        domain: DomainId,
        from: i32,
        to: i32,
    ) -> Result<bool, Contradiction> {
        let result = self.domains.remove_interval(domain, from, to, Cause::Decision);
        self.count_contradiction(result)
    }

    pub fn set_lower_bound(&mut self, domain: DomainId, value: i32) -> Result<bool, Contradiction> {
        let result = self.domains.set_lower_bound(domain, value, Cause::Decision);
        self.count_contradiction(result)
    }

    pub fn set_upper_bound(&mut self, domain: DomainId, value: i32) -> Result<bool, Contradiction> {
        let result = self.domains.set_upper_bound(domain, value, Cause::Decision);
        self.count_contradiction(result)
    }

    pub fn instantiate(&mut self, domain: DomainId, value: i32) -> Result<bool, Contradiction> {
        let result = self.domains.instantiate(domain, value, Cause::Decision);
        self.count_contradiction(result)
    }

    /// Raises a contradiction on behalf of `cause`.
    pub fn fail<T>(
        &mut self,
        cause: Cause,
        domain: Option<DomainId>,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<T, Contradiction> {
        self.count_contradiction(Err(Contradiction::new(cause, domain, message)))
    }

    fn count_contradiction<T>(
        &mut self,
        result: Result<T, Contradiction>,
    ) -> Result<T, Contradiction> {
        if let Err(contradiction) = &result {
            self.statistics.num_contradictions += 1;
            debug!("{contradiction}");
        }
        result
    }
}

// Backtracking
impl PropagationEngine {
    pub fn new_checkpoint(&mut self) {
        self.domains.new_checkpoint();
        self.activities.new_checkpoint();
    }

    pub fn get_checkpoint(&self) -> usize {
        self.domains.get_checkpoint()
    }

    /// Undoes every domain mutation and activity change made after `checkpoint` was created.
    ///
    /// Pending work is discarded and temporary propagators added after `checkpoint` are removed.
    /// Every propagator is then synchronised with the restored domains. Propagators which became
    /// stateless again, or which asked for it through
    /// [`PropagationEngine::propagate_on_backtrack`], are scheduled for a full pass.
    pub fn restore_to(&mut self, checkpoint: usize) {
        debug!("Restoring to checkpoint {checkpoint}");
        self.flush();
        while let Some(&(added_at, propagator)) = self.temporary_propagators.last() {
            if added_at <= checkpoint {
                break;
            }
            let _ = self.temporary_propagators.pop();
            self.remove_propagator(propagator);
        }
        self.domains.restore_to(checkpoint);
        let reverted = self.activities.restore_to(checkpoint);

        let context = PropagationContext::new(&self.domains);
        for propagator in self.propagators.iter_propagators_mut() {
            propagator.synchronise(context);
        }

        let on_backtrack = std::mem::take(&mut self.on_backtrack);
        if self.is_initialised {
            for propagator in reverted.into_iter().chain(on_backtrack) {
                self.schedule_full(propagator);
            }
        }
    }
}

// Statistics
impl PropagationEngine {
    /// Logs the engine statistics, the number of events per kind, and the statistics of every
    /// propagator; does nothing unless statistic logging was configured.
    pub fn log_statistics(&self) {
        if !should_log_statistics() {
            return;
        }

        self.statistics.log(StatisticLogger::new(["engine"]));
        for (event, count) in self.domains.event_counts() {
            log_statistic(format!("engine_num_{event:?}_events"), count);
        }
        for (propagator_id, propagator) in self
            .propagators
            .ids()
            .zip(self.propagators.iter_propagators())
        {
            propagator.log_statistics(StatisticLogger::new([
                propagator.name().to_owned(),
                propagator_id.0.to_string(),
            ]));
        }
    }
}

impl ReadDomains for PropagationEngine {
    fn domains(&self) -> &DomainStore {
        &self.domains
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::engine::notifications::DomainEvents;
    use crate::engine::test_helper::take;
    use crate::engine::test_helper::Action;
    use crate::engine::test_helper::Execution;
    use crate::engine::test_helper::ExecutionLog;
    use crate::engine::test_helper::RecordingPropagator;

    const POLICIES: [SchedulingPolicy; 4] = [
        SchedulingPolicy::Fifo,
        SchedulingPolicy::PairKeyed,
        SchedulingPolicy::PriorityBuckets,
        SchedulingPolicy::Activity,
    ];

    fn engine_with(policy: SchedulingPolicy) -> PropagationEngine {
        PropagationEngine::new(EngineOptions {
            scheduling_policy: policy,
            ..Default::default()
        })
    }

    fn full() -> EnumSet<PropagatorEvent> {
        PropagatorEvent::Full.strengthened_mask()
    }

    fn custom() -> EnumSet<PropagatorEvent> {
        EnumSet::only(PropagatorEvent::Custom)
    }

    #[test]
    fn initialisation_schedules_cheap_propagators_first() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let vars = [0, 1, 2].map(|_| engine.new_bitset_variable(0, 3));
        let _ = engine.add_propagator(RecordingPropagator::new(0, &vars, &log));
        let _ = engine.add_propagator(RecordingPropagator::new(1, &vars[..1], &log));

        engine.run_to_fixpoint().expect("nothing fails");

        assert_eq!(
            vec![
                Execution::Coarse { tag: 1, events: full() },
                Execution::Coarse { tag: 0, events: full() },
            ],
            take(&log)
        );
    }

    #[test]
    fn initialisation_keeps_the_insertion_order_if_requested() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::new(EngineOptions {
            sort_propagators_on_initialise: false,
            ..Default::default()
        });
        let vars = [0, 1, 2].map(|_| engine.new_bitset_variable(0, 3));
        let _ = engine.add_propagator(RecordingPropagator::new(0, &vars, &log));
        let _ = engine.add_propagator(RecordingPropagator::new(1, &vars[..1], &log));

        engine.run_to_fixpoint().expect("nothing fails");

        let tags = take(&log)
            .into_iter()
            .map(|execution| match execution {
                Execution::Coarse { tag, .. } | Execution::Fine { tag, .. } => tag,
            })
            .collect::<Vec<_>>();
        assert_eq!(vec![0, 1], tags);
    }

    #[test]
    fn fine_work_is_drained_before_coarse_work() {
        for policy in POLICIES {
            let log = ExecutionLog::default();
            let mut engine = engine_with(policy);
            let x = engine.new_bitset_variable(0, 5);
            let coarse_only = RecordingPropagator::new(0, &[], &log).coarse_only();
            let coarse = engine.add_propagator(coarse_only);
            let _ = engine.add_propagator(RecordingPropagator::new(1, &[x], &log));
            engine.run_to_fixpoint().expect("nothing fails");
            let _ = take(&log);

            engine.schedule_full(coarse.propagator_id());
            let _ = engine.remove(x, 3).expect("3 can be removed");
            engine.run_to_fixpoint().expect("nothing fails");

            assert_eq!(
                vec![
                    Execution::Fine {
                        tag: 1,
                        local_id: LocalId::from(0),
                        events: EnumSet::only(DomainEvent::Removal),
                    },
                    Execution::Coarse { tag: 1, events: custom() },
                    Execution::Coarse { tag: 0, events: full() },
                ],
                take(&log),
                "{policy}"
            );
        }
    }

    #[test]
    fn pending_events_are_coalesced() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 9);
        let _ = engine.add_propagator(RecordingPropagator::new(0, &[x], &log));
        engine.run_to_fixpoint().expect("nothing fails");
        let _ = take(&log);

        let _ = engine.remove(x, 5).expect("5 can be removed");
        let _ = engine.set_lower_bound(x, 2).expect("bound can be raised");
        engine.run_to_fixpoint().expect("nothing fails");

        assert_eq!(
            vec![
                Execution::Fine {
                    tag: 0,
                    local_id: LocalId::from(0),
                    events: DomainEvent::Removal | DomainEvent::LowerBound,
                },
                Execution::Coarse { tag: 0, events: custom() },
            ],
            take(&log)
        );
    }

    #[test]
    fn propagators_are_not_woken_up_by_their_own_changes() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let remover = engine.add_propagator(RecordingPropagator::new(0, &[x], &log).coarse_only());
        let _ = engine.add_propagator(RecordingPropagator::new(1, &[x], &log));
        engine.run_to_fixpoint().expect("nothing fails");
        let _ = take(&log);

        engine
            .get_propagator_mut(remover)
            .expect("handle has the right type")
            .action = Action::Remove(x, 4);
        engine.schedule_full(remover.propagator_id());
        engine.run_to_fixpoint().expect("nothing fails");

        assert_eq!(
            vec![
                Execution::Coarse { tag: 0, events: full() },
                Execution::Fine {
                    tag: 1,
                    local_id: LocalId::from(0),
                    events: EnumSet::only(DomainEvent::Removal),
                },
                Execution::Coarse { tag: 1, events: custom() },
            ],
            take(&log)
        );
    }

    #[test]
    fn conditions_filter_the_routed_events() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let _ = engine.add_propagator(
            RecordingPropagator::new(0, &[x], &log).with_conditions(DomainEvents::UPPER_BOUND),
        );
        engine.run_to_fixpoint().expect("nothing fails");
        let _ = take(&log);

        let _ = engine.set_lower_bound(x, 1).expect("bound can be raised");
        engine.run_to_fixpoint().expect("nothing fails");
        assert!(take(&log).is_empty());

        let _ = engine.set_upper_bound(x, 1).expect("bound can be lowered");
        engine.run_to_fixpoint().expect("nothing fails");
        assert_eq!(
            Execution::Fine {
                tag: 0,
                local_id: LocalId::from(0),
                events: DomainEvent::Instantiate | DomainEvent::UpperBound,
            },
            take(&log)[0]
        );
    }

    #[test]
    fn deactivated_propagators_lose_their_pending_work() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let handle = engine.add_propagator(RecordingPropagator::new(0, &[x], &log));
        engine.run_to_fixpoint().expect("nothing fails");
        let _ = take(&log);

        engine.schedule_full(handle.propagator_id());
        engine.deactivate(handle.propagator_id());
        let _ = engine.remove(x, 2).expect("2 can be removed");
        engine.run_to_fixpoint().expect("nothing fails");

        assert!(take(&log).is_empty());
        assert_eq!(
            PropagatorActivity::Passive,
            engine.activity(handle.propagator_id())
        );

        engine.schedule_full(handle.propagator_id());
        assert!(!engine.has_pending_work());
    }

    #[test]
    fn flushing_discards_work_but_keeps_the_domains() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let handle = engine.add_propagator(RecordingPropagator::new(0, &[x], &log));
        engine.run_to_fixpoint().expect("nothing fails");
        let _ = take(&log);

        engine.schedule_full(handle.propagator_id());
        let _ = engine.remove(x, 2).expect("2 can be removed");
        assert!(engine.has_pending_work());
        engine.flush();
        assert!(!engine.has_pending_work());

        engine.run_to_fixpoint().expect("nothing fails");
        assert!(take(&log).is_empty());
        assert!(!engine.contains(x, 2));
    }

    #[test]
    fn a_contradiction_stops_propagation_until_flushed() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let _ = engine.add_propagator(
            RecordingPropagator::new(0, &[x], &log).with_action(Action::Fail),
        );
        let _ = engine.add_propagator(RecordingPropagator::new(1, &[x], &log));

        let contradiction = engine.run_to_fixpoint().expect_err("propagator 0 fails");

        assert_eq!(Cause::Propagator(PropagatorId(0)), contradiction.cause);
        assert_eq!(1, engine.statistics().num_contradictions);
        assert_eq!(1, take(&log).len());
        assert!(engine.has_pending_work());

        engine.flush();
        assert!(!engine.has_pending_work());
    }

    #[test]
    fn entailed_propagators_are_passive_until_backtracking() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let handle = engine.add_propagator(
            RecordingPropagator::new(0, &[x], &log).with_entailment(Entailment::True),
        );

        engine.new_checkpoint();
        engine.run_to_fixpoint().expect("nothing fails");
        assert_eq!(
            PropagatorActivity::Passive,
            engine.activity(handle.propagator_id())
        );
        assert_eq!(1, engine.statistics().num_entailments);
        let _ = take(&log);

        let _ = engine.remove(x, 1).expect("1 can be removed");
        engine.run_to_fixpoint().expect("nothing fails");
        assert!(take(&log).is_empty());

        engine.restore_to(0);
        assert_eq!(
            PropagatorActivity::Stateless,
            engine.activity(handle.propagator_id())
        );
        assert!(engine.contains(x, 1));

        engine.run_to_fixpoint().expect("nothing fails");
        assert_eq!(
            vec![Execution::Coarse { tag: 0, events: full() }],
            take(&log)
        );
        let propagator = engine.get_propagator(handle).expect("handle has the right type");
        assert_eq!(1, propagator.num_synchronisations);
    }

    #[test]
    fn propagators_can_declare_themselves_passive() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let handle = engine.add_propagator(
            RecordingPropagator::new(0, &[x], &log).with_action(Action::SetPassive),
        );

        engine.run_to_fixpoint().expect("nothing fails");

        assert_eq!(
            PropagatorActivity::Passive,
            engine.activity(handle.propagator_id())
        );
    }

    #[test]
    fn entailment_false_is_not_a_contradiction() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let handle = engine.add_propagator(
            RecordingPropagator::new(0, &[x], &log).with_entailment(Entailment::False),
        );

        engine.run_to_fixpoint().expect("nothing fails");

        assert_eq!(
            PropagatorActivity::Active,
            engine.activity(handle.propagator_id())
        );
    }

    #[test]
    fn propagators_added_later_are_run_at_the_next_fixpoint() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let _ = engine.add_propagator(RecordingPropagator::new(0, &[x], &log));
        engine.run_to_fixpoint().expect("nothing fails");
        let _ = take(&log);

        let _ = engine.add_propagator(RecordingPropagator::new(1, &[x], &log));
        assert!(engine.has_pending_work());
        engine.run_to_fixpoint().expect("nothing fails");

        assert_eq!(
            vec![Execution::Coarse { tag: 1, events: full() }],
            take(&log)
        );
    }

    #[test]
    fn fine_reactive_removal_watchers_activate_the_delta_log() {
        let log: ExecutionLog = Rc::new(RefCell::new(Vec::new()));
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let y = engine.new_bitset_variable(0, 5);
        let z = engine.new_bitset_variable(0, 5);
        let _ = engine.add_propagator(RecordingPropagator::new(0, &[x], &log));
        let _ = engine.add_propagator(RecordingPropagator::new(1, &[y], &log).coarse_only());
        let _ = engine.add_propagator(
            RecordingPropagator::new(2, &[z], &log).with_conditions(DomainEvents::BOUNDS),
        );

        assert!(engine.domains().is_delta_active(x));
        assert!(!engine.domains().is_delta_active(y));
        assert!(!engine.domains().is_delta_active(z));
    }

    #[test]
    fn decision_contradictions_are_counted() {
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 0);

        assert!(engine.set_lower_bound(x, 1).is_err());
        assert!(engine.fail::<()>(Cause::Decision, Some(x), "no reason").is_err());

        assert_eq!(2, engine.statistics().num_contradictions);
    }

    fn tags(executions: &[Execution]) -> Vec<u32> {
        executions
            .iter()
            .map(|execution| match *execution {
                Execution::Coarse { tag, .. } | Execution::Fine { tag, .. } => tag,
            })
            .collect()
    }

    #[test]
    fn removed_propagators_are_never_run_again() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let removed = engine.add_propagator(RecordingPropagator::new(0, &[x], &log));
        let _ = engine.add_propagator(RecordingPropagator::new(1, &[x], &log));
        engine.run_to_fixpoint().expect("nothing fails");
        let _ = take(&log);
        let checkpoint = engine.get_checkpoint();
        engine.new_checkpoint();

        engine.schedule_full(removed.propagator_id());
        engine.remove_propagator(removed.propagator_id());
        let _ = engine.remove(x, 2).expect("2 can be removed");
        engine.run_to_fixpoint().expect("nothing fails");
        engine.restore_to(checkpoint);
        let _ = engine.remove(x, 3).expect("3 can be removed");
        engine.run_to_fixpoint().expect("nothing fails");

        let executed = tags(&take(&log));
        assert!(!executed.is_empty());
        assert!(executed.iter().all(|&tag| tag == 1));
        assert_eq!(
            PropagatorActivity::Removed,
            engine.activity(removed.propagator_id())
        );
        assert!(engine.get_propagator(removed).is_some());

        engine.schedule_full(removed.propagator_id());
        assert!(!engine.has_pending_work());
    }

    #[test]
    fn temporary_propagators_are_removed_by_backtracking() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let _ = engine.add_propagator(RecordingPropagator::new(0, &[x], &log));
        engine.run_to_fixpoint().expect("nothing fails");
        let before = engine.get_checkpoint();
        engine.new_checkpoint();

        let temporary = engine.add_temporary_propagator(
            RecordingPropagator::new(1, &[x], &log)
                .coarse_only()
                .with_action(Action::Remove(x, 4)),
        );
        engine.run_to_fixpoint().expect("nothing fails");
        assert!(!engine.contains(x, 4));

        let after = engine.get_checkpoint();
        engine.new_checkpoint();
        let _ = engine.remove(x, 0).expect("0 can be removed");
        engine.run_to_fixpoint().expect("nothing fails");
        engine.restore_to(after);
        assert_eq!(
            PropagatorActivity::Active,
            engine.activity(temporary.propagator_id())
        );

        engine.restore_to(before);
        assert_eq!(
            PropagatorActivity::Removed,
            engine.activity(temporary.propagator_id())
        );
        assert!(engine.contains(x, 4));

        let _ = take(&log);
        let _ = engine.remove(x, 1).expect("1 can be removed");
        engine.run_to_fixpoint().expect("nothing fails");
        assert!(tags(&take(&log)).iter().all(|&tag| tag == 0));
        assert!(engine.contains(x, 4));
    }

    #[test]
    fn propagators_can_ask_for_a_full_pass_after_backtracking() {
        let log = ExecutionLog::default();
        let mut engine = PropagationEngine::default();
        let x = engine.new_bitset_variable(0, 5);
        let handle = engine.add_propagator(RecordingPropagator::new(0, &[x], &log));
        engine.run_to_fixpoint().expect("nothing fails");
        let checkpoint = engine.get_checkpoint();
        engine.new_checkpoint();
        let _ = engine.remove(x, 1).expect("1 can be removed");
        engine.run_to_fixpoint().expect("nothing fails");
        let _ = take(&log);

        engine.propagate_on_backtrack(handle.propagator_id());
        engine.propagate_on_backtrack(handle.propagator_id());
        engine.restore_to(checkpoint);
        assert!(engine.has_pending_work());
        engine.run_to_fixpoint().expect("nothing fails");
        assert_eq!(
            vec![Execution::Coarse { tag: 0, events: full() }],
            take(&log)
        );

        engine.new_checkpoint();
        engine.restore_to(checkpoint);
        assert!(!engine.has_pending_work());
    }
}
