use enumset::EnumSet;

use crate::create_statistics_struct;
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
use crate::math::clamp_to_i32;
use crate::math::NumExt;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

create_statistics_struct!(LinearStatistics {
    num_incremental_updates: u64,
    num_recomputations: u64,
});

/// Propagator for the constraint `\sum scale_i * x_i <= rhs`, enforcing bounds consistency.
///
/// The smallest value of the left-hand side is maintained incrementally from the bound events on
/// the terms; every batch of events is followed by one filtering pass.
#[derive(Clone, Debug)]
pub struct LinearLessOrEqualPropagator {
    scope: Box<[DomainId]>,
    scales: Box<[i32]>,
    rhs: i32,

    /// The smallest value of the left-hand side. This is incremental state.
    lower_bound_left_hand_side: i64,
    /// The value at index `i` is the smallest value of `scale_i * x_i`.
    contributions: Box<[i64]>,

    statistics: LinearStatistics,
}

impl LinearLessOrEqualPropagator {
    /// Terms with a scale of zero are dropped.
    pub fn new(terms: impl IntoIterator<Item = (i32, DomainId)>, rhs: i32) -> Self {
        let (scales, scope): (Vec<i32>, Vec<DomainId>) =
            terms.into_iter().filter(|&(scale, _)| scale != 0).unzip();
        let contributions = vec![0; scope.len()].into();

        // The incremental state is computed by the first full pass.
        LinearLessOrEqualPropagator {
            scope: scope.into(),
            scales: scales.into(),
            rhs,
            lower_bound_left_hand_side: 0,
            contributions,
            statistics: LinearStatistics::default(),
        }
    }

    fn contribution(&self, context: &impl ReadDomains, index: usize) -> i64 {
        let scale = i64::from(self.scales[index]);
        let domain = self.scope[index];
        if scale > 0 {
            i64::from(context.lower_bound(domain)).saturating_map(scale, 0)
        } else {
            i64::from(context.upper_bound(domain)).saturating_map(scale, 0)
        }
    }

    fn largest_contribution(&self, context: &impl ReadDomains, index: usize) -> i64 {
        let scale = i64::from(self.scales[index]);
        let domain = self.scope[index];
        if scale > 0 {
            i64::from(context.upper_bound(domain)).saturating_map(scale, 0)
        } else {
            i64::from(context.lower_bound(domain)).saturating_map(scale, 0)
        }
    }

    fn recalculate_incremental_state(&mut self, context: &impl ReadDomains) {
        self.statistics.num_recomputations += 1;
        for index in 0..self.scope.len() {
            self.contributions[index] = self.contribution(context, index);
        }
        self.lower_bound_left_hand_side = self
            .contributions
            .iter()
            .fold(0_i64, |sum, &contribution| sum.saturating_add(contribution));
    }
}

impl Propagator for LinearLessOrEqualPropagator {
    fn name(&self) -> &str {
        "LinearLeq"
    }

    fn scope(&self) -> &[DomainId] {
        &self.scope
    }

    fn propagation_conditions(&self, local_id: LocalId) -> EnumSet<DomainEvent> {
        if self.scales[local_id.unpack() as usize] > 0 {
            DomainEvents::LOWER_BOUND.events()
        } else {
            DomainEvents::UPPER_BOUND.events()
        }
    }

    fn reacts_to_fine_events(&self) -> bool {
        true
    }

    fn propagate(
        &mut self,
        mut context: PropagationContextMut,
        event: EnumSet<PropagatorEvent>,
    ) -> PropagationStatus {
        if event.contains(PropagatorEvent::Full) {
            self.recalculate_incremental_state(&context);
        }

        let rhs = i64::from(self.rhs);
        if self.lower_bound_left_hand_side > rhs {
            return context.fail(None, "the left-hand side cannot be made small enough");
        }

        for index in 0..self.scope.len() {
            // Kept above i64::MIN so that dividing by -1 cannot overflow.
            let slack = rhs
                .saturating_sub(
                    self.lower_bound_left_hand_side
                        .saturating_sub(self.contributions[index]),
                )
                .max(i64::MIN + 1);
            let scale = i64::from(self.scales[index]);
            let domain = self.scope[index];

            if scale > 0 {
                let bound = clamp_to_i32(<i64 as NumExt>::div_floor(slack, scale));
                let _ = context.set_upper_bound(domain, bound)?;
            } else {
                let bound = clamp_to_i32(<i64 as NumExt>::div_ceil(slack, scale));
                let _ = context.set_lower_bound(domain, bound)?;
            }
        }

        Ok(())
    }

    fn propagate_event(
        &mut self,
        mut context: PropagationContextMut,
        local_id: LocalId,
        _event: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        self.statistics.num_incremental_updates += 1;

        let index = local_id.unpack() as usize;
        let contribution = self.contribution(&context, index);
        self.lower_bound_left_hand_side = self
            .lower_bound_left_hand_side
            .saturating_add(contribution.saturating_sub(self.contributions[index]));
        self.contributions[index] = contribution;

        context.request_propagation(PropagatorEvent::Custom);
        Ok(())
    }

    fn is_entailed(&self, context: PropagationContext) -> Entailment {
        let largest = (0..self.scope.len())
            .map(|index| self.largest_contribution(&context, index))
            .fold(0_i64, i64::saturating_add);

        if largest <= i64::from(self.rhs) {
            Entailment::True
        } else if self.lower_bound_left_hand_side > i64::from(self.rhs) {
            Entailment::False
        } else {
            Entailment::Unknown
        }
    }

    fn synchronise(&mut self, context: PropagationContext) {
        self.recalculate_incremental_state(&context);
    }

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.statistics.log(statistic_logger);
    }
}
