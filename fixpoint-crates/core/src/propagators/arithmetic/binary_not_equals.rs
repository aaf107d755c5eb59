use enumset::EnumSet;

use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::DomainEvents;
use crate::engine::notifications::PropagatorEvent;
use crate::engine::propagation::Entailment;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::ReadDomains;
use crate::engine::variables::DomainId;
use crate::engine::PropagationStatus;

/// Propagator for the constraint `a != b + offset`.
///
/// The propagator only acts once one of the variables is instantiated, and is entailed as soon as
/// the two domains can no longer overlap. It also wakes up on bound changes, since the forbidden
/// value of a domain which only tracks its bounds can only be removed once it is a bound.
#[derive(Clone, Debug)]
pub struct BinaryNotEqualsPropagator {
    scope: [DomainId; 2],
    offset: i32,
}

impl BinaryNotEqualsPropagator {
    pub fn new(a: DomainId, b: DomainId, offset: i32) -> Self {
        BinaryNotEqualsPropagator {
            scope: [a, b],
            offset,
        }
    }
}

impl Propagator for BinaryNotEqualsPropagator {
    fn name(&self) -> &str {
        "BinaryNotEquals"
    }

    fn scope(&self) -> &[DomainId] {
        &self.scope
    }

    fn propagation_conditions(&self, _local_id: LocalId) -> EnumSet<DomainEvent> {
        DomainEvents::BOUNDS.events()
    }

    fn propagate(
        &mut self,
        mut context: PropagationContextMut,
        _event: EnumSet<PropagatorEvent>,
    ) -> PropagationStatus {
        let [a, b] = self.scope;

        if let Some(value) = context.instantiated_value(a) {
            if let Some(forbidden) = value.checked_sub(self.offset) {
                let _ = context.remove(b, forbidden)?;
            }
        }
        if let Some(value) = context.instantiated_value(b) {
            if let Some(forbidden) = value.checked_add(self.offset) {
                let _ = context.remove(a, forbidden)?;
            }
        }

        Ok(())
    }

    fn is_entailed(&self, context: PropagationContext) -> Entailment {
        let [a, b] = self.scope;
        let offset = i64::from(self.offset);
        let b_lower_bound = i64::from(context.lower_bound(b)) + offset;
        let b_upper_bound = i64::from(context.upper_bound(b)) + offset;

        if i64::from(context.upper_bound(a)) < b_lower_bound
            || i64::from(context.lower_bound(a)) > b_upper_bound
        {
            return Entailment::True;
        }

        match (context.instantiated_value(a), context.instantiated_value(b)) {
            (Some(a), Some(b)) if i64::from(a) == i64::from(b) + offset => Entailment::False,
            (Some(a), _) => {
                let excluded = (i64::from(a) - offset)
                    .try_into()
                    .map_or(true, |value| !context.contains(b, value));
                if excluded {
                    Entailment::True
                } else {
                    Entailment::Unknown
                }
            }
            _ => Entailment::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::domains::IterationOrder;
    use crate::engine::propagation::PropagatorActivity;
    use crate::engine::PropagationEngine;

    #[test]
    fn an_instantiated_variable_is_removed_from_the_other() {
        let mut engine = PropagationEngine::default();
        let a = engine.new_bitset_variable(0, 5);
        let b = engine.new_bitset_variable(0, 5);
        let handle = engine.add_propagator(BinaryNotEqualsPropagator::new(a, b, 2));
        engine.run_to_fixpoint().expect("no empty domains");

        let _ = engine.instantiate(a, 3).expect("value is in the domain");
        engine.run_to_fixpoint().expect("no empty domains");

        assert_eq!(
            vec![0, 2, 3, 4, 5],
            engine
                .values(b, IterationOrder::Ascending)
                .collect::<Vec<_>>()
        );
        assert_eq!(
            PropagatorActivity::Passive,
            engine.activity(handle.propagator_id())
        );
    }

    #[test]
    fn equal_instantiations_are_a_contradiction() {
        let mut engine = PropagationEngine::default();
        let a = engine.new_bitset_variable(4, 4);
        let b = engine.new_bitset_variable(4, 4);
        let _ = engine.add_propagator(BinaryNotEqualsPropagator::new(a, b, 0));

        let contradiction = engine.run_to_fixpoint().expect_err("4 != 4 does not hold");
        assert_eq!(Some(b), contradiction.domain);
    }

    #[test]
    fn the_forbidden_value_is_removed_once_it_is_a_bound() {
        let mut engine = PropagationEngine::default();
        let a = engine.new_bitset_variable(2, 2);
        let b = engine.new_interval_variable(0, 5);
        let _ = engine.add_propagator(BinaryNotEqualsPropagator::new(a, b, 0));
        engine.run_to_fixpoint().expect("no empty domains");
        assert_eq!((0, 5), (engine.lower_bound(b), engine.upper_bound(b)));

        let _ = engine.set_lower_bound(b, 2).expect("bound can be raised");
        engine.run_to_fixpoint().expect("no empty domains");

        assert_eq!((3, 5), (engine.lower_bound(b), engine.upper_bound(b)));
    }

    #[test]
    fn separated_bounds_are_entailed() {
        let mut engine = PropagationEngine::default();
        let a = engine.new_interval_variable(0, 3);
        let b = engine.new_interval_variable(10, 20);
        let handle = engine.add_propagator(BinaryNotEqualsPropagator::new(a, b, -5));

        engine.run_to_fixpoint().expect("no empty domains");

        assert_eq!(
            PropagatorActivity::Passive,
            engine.activity(handle.propagator_id())
        );
    }
}
