use std::borrow::Cow;

use thiserror::Error;

use super::propagation::PropagatorId;
use super::variables::DomainId;

/// The result of any operation which can wipe out a domain.
pub type PropagationStatus = Result<(), Contradiction>;

/// The entity which requested a domain mutation.
///
/// The cause is used to avoid waking up a propagator for its own changes, and is recorded in the
/// delta log so that propagators can skip their own removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cause {
    /// A propagator changed the domain while filtering.
    Propagator(PropagatorId),
    /// The search driver changed the domain outside of propagation.
    Decision,
}

impl std::fmt::Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cause::Propagator(propagator_id) => write!(f, "{propagator_id}"),
            Cause::Decision => write!(f, "decision"),
        }
    }
}

/// Signals that a domain was narrowed to the empty set, or that an impossible instantiation or
/// bound was requested.
///
/// This is the only recoverable error of the kernel. It unwinds out of the running propagator and
/// out of [`crate::engine::PropagationEngine::run_to_fixpoint`]; the caller is expected to call
/// [`crate::engine::PropagationEngine::flush`] before undoing the decision which led to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contradiction raised by {cause}{}: {message}", DisplayDomain(.domain))]
pub struct Contradiction {
    pub cause: Cause,
    /// The domain that was wiped out, if the contradiction is tied to a single domain.
    pub domain: Option<DomainId>,
    pub message: Cow<'static, str>,
}

impl Contradiction {
    pub fn new(
        cause: Cause,
        domain: Option<DomainId>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Contradiction {
            cause,
            domain,
            message: message.into(),
        }
    }
}

struct DisplayDomain<'a>(&'a Option<DomainId>);

impl std::fmt::Display for DisplayDomain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(domain) => write!(f, " on {domain}"),
            None => Ok(()),
        }
    }
}
