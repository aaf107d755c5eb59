use downcast_rs::impl_downcast;
use downcast_rs::Downcast;
use enumset::EnumSet;

use super::LocalId;
use super::PropagationContext;
use super::PropagationContextMut;
use crate::engine::contradiction::PropagationStatus;
use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::DomainEvents;
use crate::engine::notifications::PropagatorEvent;
use crate::engine::variables::DomainId;
#[cfg(doc)]
use crate::engine::PropagationEngine;
#[cfg(doc)]
use crate::create_statistics_struct;
use crate::statistics::StatisticLogger;

// Allows retrieving the concrete propagator behind a `PropagatorHandle`.
impl_downcast!(Propagator);

/// A filtering routine over an ordered list of domains (its scope).
///
/// The engine wakes a propagator up in two ways:
/// - coarse-grained, through [`Propagator::propagate`], when the propagator is first run, when it
///   is explicitly scheduled with [`PropagationEngine::schedule_full`], and for every wake-up of a
///   propagator which does not react to fine events;
/// - fine-grained, through [`Propagator::propagate_event`], once for every scope position with
///   pending events, if [`Propagator::reacts_to_fine_events`] holds.
///
/// Propagators are not required to reach a fixpoint on their own; the engine keeps calling them
/// as long as their domains change.
pub trait Propagator: Downcast {
    /// Return the name of the propagator, used for logging.
    fn name(&self) -> &str;

    /// The domains this propagator filters. The position of a domain in this slice is its
    /// [`LocalId`]. The scope is read once, when the propagator is added to the engine.
    fn scope(&self) -> &[DomainId];

    /// Used by the priority based scheduling policies; cheap propagators should have a low
    /// priority number.
    ///
    /// By default the priority is derived from the arity of the propagator.
    fn priority(&self) -> Priority {
        Priority::from_arity(self.scope().len())
    }

    /// The events on the domain at `local_id` for which the propagator has to be woken up. The
    /// conditions are read once, when the propagator is added to the engine.
    fn propagation_conditions(&self, _local_id: LocalId) -> EnumSet<DomainEvent> {
        DomainEvents::ANY.events()
    }

    /// Whether domain events are delivered one scope position at a time through
    /// [`Propagator::propagate_event`]. Otherwise, any event leads to a call to
    /// [`Propagator::propagate`].
    ///
    /// Propagators which react to fine events and wait for [`DomainEvent::Removal`] activate
    /// the delta log of the corresponding domain.
    fn reacts_to_fine_events(&self) -> bool {
        false
    }

    /// Coarse-grained propagation. `event` tells whether this is a full propagation or a
    /// propagator specific request made through [`PropagationContextMut::request_propagation`].
    fn propagate(
        &mut self,
        context: PropagationContextMut,
        event: EnumSet<PropagatorEvent>,
    ) -> PropagationStatus;

    /// Fine-grained propagation for the events `event` on the domain at `local_id`.
    ///
    /// By default this defers to a coarse-grained pass which runs right after all pending fine
    /// events of this propagator were delivered.
    fn propagate_event(
        &mut self,
        mut context: PropagationContextMut,
        _local_id: LocalId,
        _event: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        context.request_propagation(PropagatorEvent::Custom);
        Ok(())
    }

    /// Whether the constraint is satisfied by every assignment of the current domains. A
    /// propagator which is entailed after a coarse-grained pass becomes passive until
    /// backtracking.
    ///
    /// By default entailment is never detected.
    fn is_entailed(&self, _context: PropagationContext) -> Entailment {
        Entailment::Unknown
    }

    /// Called after backtracking, allowing the propagator to update its internal data
    /// structures given the restored domains.
    fn synchronise(&mut self, _context: PropagationContext) {}

    /// Logs statistics of the propagator using the provided [`StatisticLogger`].
    ///
    /// It is recommended to create a struct through the [`create_statistics_struct!`] macro!
    fn log_statistics(&self, _statistic_logger: StatisticLogger) {}
}

/// The answer to [`Propagator::is_entailed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entailment {
    /// Every assignment of the current domains satisfies the constraint.
    True,
    /// No assignment of the current domains satisfies the constraint.
    False,
    Unknown,
}

/// The priority of a propagator; lower is scheduled earlier by the priority based policies.
///
/// Typically, propagators with low computational complexity should be assigned a low priority
/// number, so that cheap filtering happens before expensive filtering.
#[derive(Default, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Priority {
    Unary = 0,
    Binary = 1,
    Ternary = 2,
    Linear = 3,
    Quadratic = 4,
    Cubic = 5,
    #[default]
    VerySlow = 6,
}

impl Priority {
    pub const NUM_PRIORITIES: usize = 7;

    /// The priority of a propagator with linear complexity over `arity` variables.
    pub fn from_arity(arity: usize) -> Priority {
        match arity {
            0 | 1 => Priority::Unary,
            2 => Priority::Binary,
            3 => Priority::Ternary,
            _ => Priority::Linear,
        }
    }
}
