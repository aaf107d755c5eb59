//! A propagator which records how it is executed, for testing the engine.
use std::cell::RefCell;
use std::rc::Rc;

use enumset::EnumSet;

use super::notifications::DomainEvent;
use super::notifications::DomainEvents;
use super::notifications::PropagatorEvent;
use super::propagation::Entailment;
use super::propagation::LocalId;
use super::propagation::PropagationContext;
use super::propagation::PropagationContextMut;
use super::propagation::Propagator;
use super::variables::DomainId;
use super::PropagationStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Execution {
    Coarse {
        tag: u32,
        events: EnumSet<PropagatorEvent>,
    },
    Fine {
        tag: u32,
        local_id: LocalId,
        events: EnumSet<DomainEvent>,
    },
}

pub(crate) type ExecutionLog = Rc<RefCell<Vec<Execution>>>;

/// What the propagator does besides recording.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) enum Action {
    #[default]
    Nothing,
    /// Removes the value from the domain on every coarse pass.
    Remove(DomainId, i32),
    /// Declares itself passive on every coarse pass.
    SetPassive,
    /// Raises a contradiction on every coarse pass.
    Fail,
}

#[derive(Debug)]
pub(crate) struct RecordingPropagator {
    pub(crate) tag: u32,
    pub(crate) scope: Vec<DomainId>,
    pub(crate) conditions: EnumSet<DomainEvent>,
    pub(crate) fine: bool,
    pub(crate) action: Action,
    pub(crate) entailment: Entailment,
    pub(crate) num_synchronisations: usize,
    pub(crate) log: ExecutionLog,
}

impl RecordingPropagator {
    pub(crate) fn new(tag: u32, scope: &[DomainId], log: &ExecutionLog) -> Self {
        RecordingPropagator {
            tag,
            scope: scope.to_vec(),
            conditions: DomainEvents::ANY.events(),
            fine: true,
            action: Action::Nothing,
            entailment: Entailment::Unknown,
            num_synchronisations: 0,
            log: Rc::clone(log),
        }
    }

    pub(crate) fn with_conditions(mut self, conditions: DomainEvents) -> Self {
        self.conditions = conditions.events();
        self
    }

    pub(crate) fn coarse_only(mut self) -> Self {
        self.fine = false;
        self
    }

    pub(crate) fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub(crate) fn with_entailment(mut self, entailment: Entailment) -> Self {
        self.entailment = entailment;
        self
    }
}

impl Propagator for RecordingPropagator {
    fn name(&self) -> &str {
        "Recording"
    }

    fn scope(&self) -> &[DomainId] {
        &self.scope
    }

    fn propagation_conditions(&self, _local_id: LocalId) -> EnumSet<DomainEvent> {
        self.conditions
    }

    fn reacts_to_fine_events(&self) -> bool {
        self.fine
    }

    fn propagate(
        &mut self,
        mut context: PropagationContextMut,
        events: EnumSet<PropagatorEvent>,
    ) -> PropagationStatus {
        self.log.borrow_mut().push(Execution::Coarse {
            tag: self.tag,
            events,
        });

        match self.action {
            Action::Nothing => {}
            Action::Remove(domain, value) => {
                let _ = context.remove(domain, value)?;
            }
            Action::SetPassive => context.set_passive(),
            Action::Fail => return context.fail(None, "asked to fail"),
        }
        Ok(())
    }

    fn propagate_event(
        &mut self,
        mut context: PropagationContextMut,
        local_id: LocalId,
        events: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        self.log.borrow_mut().push(Execution::Fine {
            tag: self.tag,
            local_id,
            events,
        });
        context.request_propagation(PropagatorEvent::Custom);
        Ok(())
    }

    fn is_entailed(&self, _context: PropagationContext) -> Entailment {
        self.entailment
    }

    fn synchronise(&mut self, _context: PropagationContext) {
        self.num_synchronisations += 1;
    }
}

/// Empties the log, returning its entries.
pub(crate) fn take(log: &ExecutionLog) -> Vec<Execution> {
    std::mem::take(&mut *log.borrow_mut())
}
