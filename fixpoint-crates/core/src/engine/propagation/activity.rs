use super::PropagatorId;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::fixpoint_assert_moderate;

/// Whether a propagator takes part in propagation.
///
/// A propagator starts out [`PropagatorActivity::Stateless`] and becomes active when it is
/// propagated coarse-grained for the first time. Once it proves that its constraint is entailed it
/// becomes passive. Both transitions are undone by backtracking. Removal is final.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PropagatorActivity {
    /// Not yet propagated since it was added or reverted by backtracking.
    #[default]
    Stateless,
    /// Subject to scheduling.
    Active,
    /// Entailed; ignored by the engine until backtracking.
    Passive,
    /// Deleted from the engine; never scheduled again, whatever is restored.
    Removed,
}

impl PropagatorActivity {
    pub fn is_active(self) -> bool {
        self == PropagatorActivity::Active
    }
}

/// The activity of every propagator, with changes recorded on a trail so that backtracking
/// restores them.
#[derive(Debug, Default)]
pub(crate) struct PropagatorActivities {
    states: KeyedVec<PropagatorId, PropagatorActivity>,
    trail: Trail<(PropagatorId, PropagatorActivity)>,
}

impl PropagatorActivities {
    pub(crate) fn grow(&mut self, propagator: PropagatorId) {
        let id = self.states.push(PropagatorActivity::Stateless);
        fixpoint_assert_moderate!(id == propagator);
    }

    pub(crate) fn get(&self, propagator: PropagatorId) -> PropagatorActivity {
        self.states[propagator]
    }

    pub(crate) fn is_active(&self, propagator: PropagatorId) -> bool {
        self.states[propagator].is_active()
    }

    pub(crate) fn set(&mut self, propagator: PropagatorId, activity: PropagatorActivity) {
        let previous = self.states[propagator];
        if previous != activity && previous != PropagatorActivity::Removed {
            self.trail.push((propagator, previous));
            self.states[propagator] = activity;
        }
    }

    /// Marks `propagator` as removed. This change is not trailed.
    pub(crate) fn remove(&mut self, propagator: PropagatorId) {
        self.states[propagator] = PropagatorActivity::Removed;
    }

    pub(crate) fn new_checkpoint(&mut self) {
        self.trail.new_checkpoint();
    }

    /// Restores the activities at `checkpoint` and returns the propagators which became
    /// stateless again.
    pub(crate) fn restore_to(&mut self, checkpoint: usize) -> Vec<PropagatorId> {
        let mut reverted = Vec::new();
        for (propagator, activity) in self.trail.synchronise(checkpoint) {
            if self.states[propagator] == PropagatorActivity::Removed {
                continue;
            }
            self.states[propagator] = activity;
            if activity == PropagatorActivity::Stateless {
                reverted.push(propagator);
            }
        }
        reverted
    }
}
