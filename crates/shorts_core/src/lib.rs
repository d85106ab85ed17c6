//! Shorts core: pure orchestration state machine and view-model helpers.
mod effect;
mod error;
mod job;
mod msg;
mod progress;
mod range;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, StopReason};
pub use error::OrchestrationError;
pub use job::{JobHandle, JobId, JobOutcome, TickLedger};
pub use msg::Msg;
pub use progress::{
    reconcile, DisplaySnapshot, Feed, Pipeline, ProgressReport, Ratio, Stage, StageProgress,
    TerminationRule,
};
pub use range::{validate_range, BoundState, ChannelRef, PolicyViolation, RangeSelection, RangeStatus};
pub use state::{ActiveJob, JobPhase, OrchestrationState, Policy};
pub use update::update;
pub use url::Url;
pub use view_model::AppViewModel;
