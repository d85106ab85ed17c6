use crate::{PolicyViolation, RangeStatus};

/// Everything the orchestration surfaces to the user. None of these are
/// fatal; each one leaves the state machine in a usable idle state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestrationError {
    #[error("could not look up channel: {0}")]
    Discovery(String),
    #[error(transparent)]
    PolicyViolation(#[from] PolicyViolation),
    #[error("no channel selected")]
    MissingChannel,
    #[error("range rejected: {0}")]
    RangeRejected(RangeStatus),
    #[error("a job is already running")]
    JobActive,
    #[error("job submission failed: {0}")]
    Submission(String),
    #[error("progress polling gave up after {failures} failed ticks in a row")]
    PollGaveUp { failures: u32 },
}
