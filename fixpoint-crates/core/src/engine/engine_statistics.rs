use crate::create_statistics_struct;

create_statistics_struct!(
    /// Counters kept by the [`PropagationEngine`](crate::engine::PropagationEngine).
    pub EngineStatistics {
        /// The number of fine-grained work items which were executed.
        num_fine_executions: u64,
        /// The number of coarse-grained work items which were executed.
        num_coarse_executions: u64,
        /// The number of coarse-grained passes requested during a fine-grained pass.
        num_delayed_executions: u64,
        num_contradictions: u64,
        /// The number of times a propagator became passive.
        num_entailments: u64,
        num_routed_notifications: u64,
        /// The number of work items which were not coalesced into an already pending item.
        num_scheduled_work_items: u64,
});
