use std::fmt::Display;

use clap::ValueEnum;
use fixpoint_core::propagators::BinaryEqualsPropagator;
use fixpoint_core::propagators::BinaryNotEqualsPropagator;
use fixpoint_core::propagators::LinearLessOrEqualPropagator;
use fixpoint_core::DomainId;
use fixpoint_core::PropagationEngine;

use crate::result::FixpointError;
use crate::result::FixpointResult;

/// The models which can be generated from a size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Model {
    /// Place `size` queens on a `size` by `size` board such that no two attack each other.
    #[default]
    Queens,
    /// `size` variables over `0..size` where every variable is one larger than the next; a
    /// single fixpoint computation fixes all of them.
    Chain,
    /// `size` variables over `0..size` which sum up to `size`, where neighbours differ.
    Linear,
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::Queens => write!(f, "queens"),
            Model::Chain => write!(f, "chain"),
            Model::Linear => write!(f, "linear"),
        }
    }
}

impl Model {
    fn minimum_size(self) -> u32 {
        match self {
            Model::Queens => 1,
            Model::Chain | Model::Linear => 2,
        }
    }

    /// Creates the variables and propagators of the model; returns the variables to branch on.
    pub(crate) fn build(
        self,
        engine: &mut PropagationEngine,
        size: u32,
    ) -> FixpointResult<Vec<DomainId>> {
        if size < self.minimum_size() {
            return Err(FixpointError::InvalidSize {
                model: self.to_string(),
                minimum: self.minimum_size(),
                size,
            });
        }

        let n = size as i32;
        let variables = (0..n)
            .map(|_| engine.new_bitset_variable(0, n - 1))
            .collect::<Vec<_>>();

        match self {
            Model::Queens => {
                for (i, &row) in variables.iter().enumerate() {
                    for (j, &other) in variables.iter().enumerate().skip(i + 1) {
                        let distance = (j - i) as i32;
                        for offset in [0, distance, -distance] {
                            let propagator = BinaryNotEqualsPropagator::new(row, other, offset);
                            let _ = engine.add_propagator(propagator);
                        }
                    }
                }
            }
            Model::Chain => {
                for pair in variables.windows(2) {
                    let _ = engine.add_propagator(BinaryEqualsPropagator::new(pair[0], pair[1], 1));
                }
            }
            Model::Linear => {
                let _ = engine.add_propagator(LinearLessOrEqualPropagator::new(
                    variables.iter().map(|&variable| (1, variable)),
                    n,
                ));
                let _ = engine.add_propagator(LinearLessOrEqualPropagator::new(
                    variables.iter().map(|&variable| (-1, variable)),
                    -n,
                ));
                for pair in variables.windows(2) {
                    let _ =
                        engine.add_propagator(BinaryNotEqualsPropagator::new(pair[0], pair[1], 0));
                }
            }
        }

        Ok(variables)
    }
}
