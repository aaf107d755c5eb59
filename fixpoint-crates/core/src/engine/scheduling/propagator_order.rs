//! The orders in which scheduled propagators are handed out.
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::VecDeque;
use std::fmt::Debug;

use crate::containers::KeyValueHeap;
use crate::engine::propagation::Priority;
use crate::engine::propagation::PropagatorId;
use crate::fixpoint_assert_moderate;

/// A set of propagators with an order in which they are popped.
///
/// The queues built on top of an order guarantee that a propagator is inserted at most once
/// until it is popped or removed.
pub(crate) trait PropagatorOrder: Debug {
    /// Called for every propagator added to the engine, in order of their ids.
    fn grow(&mut self, _propagator: PropagatorId) {}

    fn insert(&mut self, propagator: PropagatorId, priority: Priority);

    fn pop(&mut self) -> Option<PropagatorId>;

    fn remove(&mut self, propagator: PropagatorId);

    /// Called every time a propagator is executed.
    fn on_execution(&mut self, _propagator: PropagatorId) {}

    /// Called once at the start of every fixpoint computation.
    fn decay(&mut self) {}
}

/// First in, first out.
#[derive(Debug, Default)]
pub(crate) struct FifoOrder {
    queue: VecDeque<PropagatorId>,
}

impl PropagatorOrder for FifoOrder {
    fn insert(&mut self, propagator: PropagatorId, _priority: Priority) {
        self.queue.push_back(propagator);
    }

    fn pop(&mut self) -> Option<PropagatorId> {
        self.queue.pop_front()
    }

    fn remove(&mut self, propagator: PropagatorId) {
        self.queue.retain(|&queued| queued != propagator);
    }
}

/// One FIFO queue per priority level; the lowest non-empty level is drained first.
#[derive(Debug)]
pub(crate) struct PriorityBuckets {
    queues: Vec<VecDeque<PropagatorId>>,
    present_priorities: BinaryHeap<Reverse<usize>>,
}

impl Default for PriorityBuckets {
    fn default() -> Self {
        PriorityBuckets {
            queues: vec![VecDeque::new(); Priority::NUM_PRIORITIES],
            present_priorities: BinaryHeap::new(),
        }
    }
}

impl PropagatorOrder for PriorityBuckets {
    fn insert(&mut self, propagator: PropagatorId, priority: Priority) {
        let level = priority as usize;
        fixpoint_assert_moderate!(level < self.queues.len());

        if self.queues[level].is_empty() {
            self.present_priorities.push(Reverse(level));
        }
        self.queues[level].push_back(propagator);
    }

    fn pop(&mut self) -> Option<PropagatorId> {
        let Reverse(level) = *self.present_priorities.peek()?;
        fixpoint_assert_moderate!(!self.queues[level].is_empty());

        let propagator = self.queues[level].pop_front();
        if self.queues[level].is_empty() {
            let _ = self.present_priorities.pop();
        }
        propagator
    }

    fn remove(&mut self, propagator: PropagatorId) {
        let mut emptied = false;
        for queue in self.queues.iter_mut().filter(|queue| !queue.is_empty()) {
            queue.retain(|&queued| queued != propagator);
            emptied |= queue.is_empty();
        }

        if emptied {
            let queues = &self.queues;
            self.present_priorities
                .retain(|&Reverse(level)| !queues[level].is_empty());
        }
    }
}

const DEFAULT_ACTIVITY_INCREMENT: f64 = 1.0;
const DEFAULT_ACTIVITY_MAX_THRESHOLD: f64 = 1e100;

/// Pops the propagator with the highest activity.
///
/// Every execution bumps the activity of the executed propagator by an increment, and decaying
/// multiplies the increment by `1 / decay_factor`, so that recent executions weigh more than old
/// ones. Once an activity would exceed the maximum threshold, all activities and the increment are
/// scaled down.
#[derive(Debug)]
pub(crate) struct ActivityOrder {
    heap: KeyValueHeap<PropagatorId, f64>,
    increment: f64,
    max_threshold: f64,
    decay_factor: f64,
}

impl ActivityOrder {
    pub(crate) fn new(decay_factor: f64) -> ActivityOrder {
        fixpoint_assert_moderate!(
            decay_factor > 0.0 && decay_factor <= 1.0,
            "the decay factor should be in (0, 1]"
        );
        ActivityOrder {
            heap: KeyValueHeap::default(),
            increment: DEFAULT_ACTIVITY_INCREMENT,
            max_threshold: DEFAULT_ACTIVITY_MAX_THRESHOLD,
            decay_factor,
        }
    }

    #[cfg(test)]
    pub(crate) fn activity(&self, propagator: PropagatorId) -> f64 {
        self.heap.get_value(propagator)
    }
}

impl PropagatorOrder for ActivityOrder {
    fn grow(&mut self, propagator: PropagatorId) {
        self.heap.grow(propagator, 0.0);
    }

    fn insert(&mut self, propagator: PropagatorId, _priority: Priority) {
        self.heap.restore_key(propagator);
    }

    fn pop(&mut self) -> Option<PropagatorId> {
        self.heap.pop_max()
    }

    fn remove(&mut self, propagator: PropagatorId) {
        self.heap.delete_key(propagator);
    }

    fn on_execution(&mut self, propagator: PropagatorId) {
        let activity = self.heap.get_value(propagator);
        if activity + self.increment >= self.max_threshold {
            self.heap.divide_values(self.max_threshold);
            self.increment /= self.max_threshold;
        }
        self.heap.increment(propagator, self.increment);
    }

    fn decay(&mut self) {
        self.increment *= 1.0 / self.decay_factor;
    }
}
