use enumset::EnumSet;

use crate::engine::domains::DeltaMonitor;
use crate::engine::domains::IterationOrder;
use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::PropagatorEvent;
use crate::engine::propagation::Entailment;
use crate::engine::propagation::LocalId;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::PropagationContextMut;
use crate::engine::propagation::Propagator;
use crate::engine::propagation::ReadDomains;
use crate::engine::variables::DomainId;
use crate::engine::PropagationStatus;

/// Propagator for the constraint `a = b + offset`, enforcing domain consistency.
///
/// A full pass compares the two domains value by value. Afterwards only the removed values are
/// mirrored, read from the delta logs of `a` and `b`. Domains which only track their bounds cannot
/// lose interior values, so for those it is the bounds which are kept supported.
#[derive(Clone, Debug)]
pub struct BinaryEqualsPropagator {
    scope: [DomainId; 2],
    offset: i32,
    monitors: [DeltaMonitor; 2],
}

impl BinaryEqualsPropagator {
    pub fn new(a: DomainId, b: DomainId, offset: i32) -> Self {
        BinaryEqualsPropagator {
            scope: [a, b],
            offset,
            monitors: [DeltaMonitor::new(a), DeltaMonitor::new(b)],
        }
    }

    /// The value of the other variable which supports `value` of the variable at `index`, if it
    /// is representable.
    fn support(&self, index: usize, value: i32) -> Option<i32> {
        if index == 0 {
            value.checked_sub(self.offset)
        } else {
            value.checked_add(self.offset)
        }
    }

    fn is_supported(&self, context: &impl ReadDomains, index: usize, value: i32) -> bool {
        self.support(index, value)
            .is_some_and(|support| context.contains(self.scope[1 - index], support))
    }

    /// Removes bounds of the variable at `index` until both are supported.
    fn trim_bounds(&self, context: &mut PropagationContextMut, index: usize) -> PropagationStatus {
        let domain = self.scope[index];
        loop {
            let lower_bound = context.lower_bound(domain);
            if self.is_supported(&*context, index, lower_bound) {
                break;
            }
            let _ = context.remove(domain, lower_bound)?;
        }
        loop {
            let upper_bound = context.upper_bound(domain);
            if self.is_supported(&*context, index, upper_bound) {
                break;
            }
            let _ = context.remove(domain, upper_bound)?;
        }
        Ok(())
    }

    fn catch_up(&mut self, context: &impl ReadDomains) {
        for monitor in self.monitors.iter_mut() {
            monitor.catch_up(context.domains());
        }
    }
}

impl Propagator for BinaryEqualsPropagator {
    fn name(&self) -> &str {
        "BinaryEquals"
    }

    fn scope(&self) -> &[DomainId] {
        &self.scope
    }

    fn reacts_to_fine_events(&self) -> bool {
        true
    }

    fn propagate(
        &mut self,
        mut context: PropagationContextMut,
        _event: EnumSet<PropagatorEvent>,
    ) -> PropagationStatus {
        let [a, b] = self.scope;

        let _ = context.set_lower_bound(a, context.lower_bound(b).saturating_add(self.offset))?;
        let _ = context.set_upper_bound(a, context.upper_bound(b).saturating_add(self.offset))?;
        let _ = context.set_lower_bound(b, context.lower_bound(a).saturating_sub(self.offset))?;
        let _ = context.set_upper_bound(b, context.upper_bound(a).saturating_sub(self.offset))?;

        for (index, domain) in [a, b].into_iter().enumerate() {
            let unsupported = context
                .values(domain, IterationOrder::Ascending)
                .filter(|&value| !self.is_supported(&context, index, value))
                .collect::<Vec<_>>();

            for value in unsupported {
                let _ = context.remove(domain, value)?;
            }
        }
        self.trim_bounds(&mut context, 0)?;
        self.trim_bounds(&mut context, 1)?;

        self.catch_up(&context);
        Ok(())
    }

    fn propagate_event(
        &mut self,
        mut context: PropagationContextMut,
        local_id: LocalId,
        _event: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        let index = local_id.unpack() as usize;
        let other = self.scope[1 - index];
        let removed = self.monitors[index]
            .drain_from_others(context.domains(), context.propagator_id())
            .collect::<Vec<_>>();

        for value in removed {
            if let Some(support) = self.support(index, value) {
                let _ = context.remove(other, support)?;
            }
        }

        self.trim_bounds(&mut context, 0)?;
        self.trim_bounds(&mut context, 1)
    }

    fn is_entailed(&self, context: PropagationContext) -> Entailment {
        let [a, b] = self.scope;
        match (context.instantiated_value(a), context.instantiated_value(b)) {
            (Some(a), Some(b)) if Some(a) == b.checked_add(self.offset) => Entailment::True,
            (Some(_), Some(_)) => Entailment::False,
            _ => Entailment::Unknown,
        }
    }

    fn synchronise(&mut self, context: PropagationContext) {
        self.catch_up(&context);
    }
}
