use std::fmt::Display;

/// The queue discipline used by the [`PropagationEngine`](crate::engine::PropagationEngine).
///
/// Every policy drains fine-grained work before coarse-grained work and reaches the same fixpoint;
/// they only differ in the order in which propagators are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SchedulingPolicy {
    /// Propagators are executed in the order in which they were scheduled.
    #[default]
    Fifo,
    /// Like [`SchedulingPolicy::Fifo`], but pending events are kept per (propagator, variable)
    /// pair instead of in an event array per propagator.
    PairKeyed,
    /// One queue per [`Priority`](crate::engine::propagation::Priority); lower priority numbers
    /// are drained first.
    PriorityBuckets,
    /// Propagators with the highest decaying execution count go first.
    Activity,
}

impl Display for SchedulingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingPolicy::Fifo => write!(f, "fifo"),
            SchedulingPolicy::PairKeyed => write!(f, "pair-keyed"),
            SchedulingPolicy::PriorityBuckets => write!(f, "priority-buckets"),
            SchedulingPolicy::Activity => write!(f, "activity"),
        }
    }
}
