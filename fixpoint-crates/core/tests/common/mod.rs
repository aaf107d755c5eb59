#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::cell::RefCell;
use std::rc::Rc;

use enumset::EnumSet;
use fixpoint_core::engine::domains::IterationOrder;
use fixpoint_core::engine::notifications::PropagatorEvent;
use fixpoint_core::engine::propagation::LocalId;
use fixpoint_core::engine::propagation::PropagationContextMut;
use fixpoint_core::propagators::BinaryEqualsPropagator;
use fixpoint_core::propagators::BinaryNotEqualsPropagator;
use fixpoint_core::propagators::LinearLessOrEqualPropagator;
use fixpoint_core::Contradiction;
use fixpoint_core::DomainEvent;
use fixpoint_core::DomainEvents;
use fixpoint_core::DomainId;
use fixpoint_core::EngineOptions;
use fixpoint_core::PropagationEngine;
use fixpoint_core::PropagationStatus;
use fixpoint_core::Propagator;
use fixpoint_core::ReadDomains;
use fixpoint_core::SchedulingPolicy;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

pub(crate) const POLICIES: [SchedulingPolicy; 4] = [
    SchedulingPolicy::Fifo,
    SchedulingPolicy::PairKeyed,
    SchedulingPolicy::PriorityBuckets,
    SchedulingPolicy::Activity,
];

pub(crate) fn engine_with(policy: SchedulingPolicy) -> PropagationEngine {
    PropagationEngine::new(EngineOptions {
        scheduling_policy: policy,
        ..Default::default()
    })
}

pub(crate) type EventLog = Rc<RefCell<Vec<(u32, EnumSet<DomainEvent>)>>>;

/// Records the fine-grained events it receives without filtering anything.
#[derive(Debug)]
pub(crate) struct EventRecorder {
    tag: u32,
    scope: [DomainId; 1],
    conditions: DomainEvents,
    log: EventLog,
}

impl EventRecorder {
    pub(crate) fn new(
        tag: u32,
        domain: DomainId,
        conditions: DomainEvents,
        log: &EventLog,
    ) -> Self {
        EventRecorder {
            tag,
            scope: [domain],
            conditions,
            log: Rc::clone(log),
        }
    }
}

impl Propagator for EventRecorder {
    fn name(&self) -> &str {
        "EventRecorder"
    }

    fn scope(&self) -> &[DomainId] {
        &self.scope
    }

    fn propagation_conditions(&self, _local_id: LocalId) -> EnumSet<DomainEvent> {
        self.conditions.events()
    }

    fn reacts_to_fine_events(&self) -> bool {
        true
    }

    fn propagate(
        &mut self,
        _context: PropagationContextMut,
        _event: EnumSet<PropagatorEvent>,
    ) -> PropagationStatus {
        Ok(())
    }

    fn propagate_event(
        &mut self,
        _context: PropagationContextMut,
        _local_id: LocalId,
        event: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        self.log.borrow_mut().push((self.tag, event));
        Ok(())
    }
}

pub(crate) fn take_events(log: &EventLog) -> Vec<(u32, EnumSet<DomainEvent>)> {
    std::mem::take(&mut *log.borrow_mut())
}

/// The values of every domain, in ascending order.
pub(crate) fn snapshot(engine: &PropagationEngine) -> Vec<Vec<i32>> {
    engine
        .domains()
        .domain_ids()
        .map(|domain| engine.values(domain, IterationOrder::Ascending).collect())
        .collect()
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Decision {
    Remove(DomainId, i32),
    LowerBound(DomainId, i32),
    UpperBound(DomainId, i32),
    Instantiate(DomainId, i32),
}

impl Decision {
    pub(crate) fn apply(self, engine: &mut PropagationEngine) -> Result<bool, Contradiction> {
        match self {
            Decision::Remove(domain, value) => engine.remove(domain, value),
            Decision::LowerBound(domain, value) => engine.set_lower_bound(domain, value),
            Decision::UpperBound(domain, value) => engine.set_upper_bound(domain, value),
            Decision::Instantiate(domain, value) => engine.instantiate(domain, value),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Step {
    Decide(Decision),
    Backtrack,
}

pub(crate) const MAX_VALUE: i32 = 8;

/// Builds a random model over bitset, interval and boolean variables.
pub(crate) fn random_model(
    engine: &mut PropagationEngine,
    rng: &mut SmallRng,
    num_variables: usize,
) {
    let variables = (0..num_variables)
        .map(|index| match index % 4 {
            0 | 1 => engine.new_bitset_variable(0, MAX_VALUE),
            2 => engine.new_interval_variable(0, MAX_VALUE),
            _ => engine.new_boolean_variable(),
        })
        .collect::<Vec<_>>();

    // Propagators are not woken up by their own changes, so a variable occurs at most once in
    // every scope.
    for _ in 0..num_variables {
        let a = variables[rng.gen_range(0..num_variables)];
        let b = variables[rng.gen_range(0..num_variables)];
        let c = variables[rng.gen_range(0..num_variables)];
        if a == b || a == c || b == c {
            continue;
        }

        let offset = rng.gen_range(-1..=1);
        match rng.gen_range(0..3) {
            0 => {
                let _ = engine.add_propagator(BinaryEqualsPropagator::new(a, b, offset));
            }
            1 => {
                let _ = engine.add_propagator(BinaryNotEqualsPropagator::new(a, b, offset));
            }
            _ => {
                let weight_a = rng.gen_range(1..=3);
                let weight_b = rng.gen_range(-2..=2);
                let rhs = rng.gen_range(MAX_VALUE..=3 * MAX_VALUE);
                let terms = [(weight_a, a), (weight_b, b), (1, c)];
                let _ = engine.add_propagator(LinearLessOrEqualPropagator::new(terms, rhs));
            }
        }
    }
}

pub(crate) fn random_steps(
    rng: &mut SmallRng,
    num_variables: usize,
    num_steps: usize,
) -> Vec<Step> {
    (0..num_steps)
        .map(|_| {
            if rng.gen_bool(0.2) {
                return Step::Backtrack;
            }

            let domain = DomainId::new(rng.gen_range(0..num_variables) as u32);
            let value = rng.gen_range(0..=MAX_VALUE);
            Step::Decide(match rng.gen_range(0..4) {
                0 => Decision::Remove(domain, value),
                1 => Decision::LowerBound(domain, value),
                2 => Decision::UpperBound(domain, value),
                _ => Decision::Instantiate(domain, value),
            })
        })
        .collect()
}

/// What happened at a single step, together with the domains at the fixpoint after it.
pub(crate) type Trace = Vec<(bool, Vec<Vec<i32>>)>;

/// Executes the steps the way a depth-first search would: every decision gets its own
/// checkpoint, and a failing decision is undone right away.
///
/// The domains at the moment of a contradiction depend on the order of propagation, so only
/// states at a fixpoint are recorded.
pub(crate) fn replay(engine: &mut PropagationEngine, steps: &[Step]) -> Trace {
    let mut trace = Trace::new();
    if engine.run_to_fixpoint().is_err() {
        trace.push((false, Vec::new()));
        return trace;
    }
    trace.push((true, snapshot(engine)));

    for step in steps {
        match *step {
            Step::Decide(decision) => {
                let checkpoint = engine.get_checkpoint();
                engine.new_checkpoint();
                let outcome = decision
                    .apply(engine)
                    .and_then(|_| engine.run_to_fixpoint());
                if outcome.is_err() {
                    engine.flush();
                    engine.restore_to(checkpoint);
                    engine
                        .run_to_fixpoint()
                        .expect("the state before the decision is consistent");
                }
                trace.push((outcome.is_ok(), snapshot(engine)));
            }
            Step::Backtrack => {
                let checkpoint = engine.get_checkpoint();
                if checkpoint > 0 {
                    engine.restore_to(checkpoint - 1);
                    engine
                        .run_to_fixpoint()
                        .expect("a restored fixpoint is consistent");
                }
                trace.push((true, snapshot(engine)));
            }
        }
    }

    trace
}

pub(crate) fn seeded(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}
