use std::ops::ControlFlow;

use fixpoint_core::create_statistics_struct;
use fixpoint_core::engine::domains::IterationOrder;
use fixpoint_core::DomainId;
use fixpoint_core::PropagationEngine;
use fixpoint_core::PropagationStatus;
use fixpoint_core::ReadDomains;
use log::debug;
use rand::rngs::SmallRng;
use rand::Rng;

create_statistics_struct!(pub(crate) SearchStatistics {
    num_decisions: u64,
    num_failures: u64,
    num_solutions: u64,
});

/// A depth-first search which branches on `x = v` and then `x != v`, for the unfixed variable `x`
/// with the smallest domain and a random value `v` of its domain.
///
/// Every branch gets its own checkpoint; after a contradiction the pending work is flushed and the
/// checkpoint is restored.
#[derive(Debug)]
pub(crate) struct DepthFirstSearch {
    variables: Vec<DomainId>,
    random_generator: SmallRng,
    all_solutions: bool,
    statistics: SearchStatistics,
}

impl DepthFirstSearch {
    pub(crate) fn new(
        variables: Vec<DomainId>,
        random_generator: SmallRng,
        all_solutions: bool,
    ) -> Self {
        DepthFirstSearch {
            variables,
            random_generator,
            all_solutions,
            statistics: SearchStatistics::default(),
        }
    }

    pub(crate) fn statistics(&self) -> SearchStatistics {
        self.statistics
    }

    /// Explores the search tree below the current (propagated) state, calling `on_solution` for
    /// every solution found. Stops after the first solution unless all solutions are requested.
    pub(crate) fn solve(
        &mut self,
        engine: &mut PropagationEngine,
        on_solution: &mut impl FnMut(&[i32]),
    ) {
        let _ = self.search(engine, on_solution);
    }

    fn search(
        &mut self,
        engine: &mut PropagationEngine,
        on_solution: &mut impl FnMut(&[i32]),
    ) -> ControlFlow<()> {
        let Some(variable) = self.select_variable(engine) else {
            self.statistics.num_solutions += 1;
            let solution = self
                .variables
                .iter()
                .map(|&variable| engine.lower_bound(variable))
                .collect::<Vec<_>>();
            on_solution(&solution);

            return if self.all_solutions {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            };
        };
        let value = self.select_value(engine, variable);

        self.branch(engine, on_solution, |engine| {
            engine.instantiate(variable, value).map(|_| ())
        })?;
        self.branch(engine, on_solution, |engine| {
            engine.remove(variable, value).map(|_| ())
        })
    }

    fn branch(
        &mut self,
        engine: &mut PropagationEngine,
        on_solution: &mut impl FnMut(&[i32]),
        decide: impl FnOnce(&mut PropagationEngine) -> PropagationStatus,
    ) -> ControlFlow<()> {
        let checkpoint = engine.get_checkpoint();
        engine.new_checkpoint();
        self.statistics.num_decisions += 1;

        let status = decide(engine).and_then(|_| engine.run_to_fixpoint());
        match status {
            Ok(()) => self.search(engine, on_solution)?,
            Err(contradiction) => {
                debug!("Backtracking at depth {checkpoint}: {contradiction}");
                self.statistics.num_failures += 1;
                engine.flush();
            }
        }

        engine.restore_to(checkpoint);
        ControlFlow::Continue(())
    }

    fn select_variable(&self, engine: &PropagationEngine) -> Option<DomainId> {
        self.variables
            .iter()
            .copied()
            .filter(|&variable| !engine.is_instantiated(variable))
            .min_by_key(|&variable| engine.size(variable))
    }

    fn select_value(&mut self, engine: &PropagationEngine, variable: DomainId) -> i32 {
        let index = self.random_generator.gen_range(0..engine.size(variable));
        engine
            .values(variable, IterationOrder::Ascending)
            .nth(index as usize)
            .unwrap_or(engine.lower_bound(variable))
    }
}
