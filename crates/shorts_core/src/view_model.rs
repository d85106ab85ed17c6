use crate::{BoundState, DisplaySnapshot, OrchestrationError, RangeSelection, RangeStatus};

/// Immutable snapshot handed to presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub channel: Option<String>,
    pub range: RangeSelection,
    pub range_status: RangeStatus,
    pub policy_cap: u32,
    pub bound: BoundState,
    /// A channel lookup is in flight.
    pub validating: bool,
    /// A submission is in flight or a job is being polled.
    pub loading: bool,
    pub progress: DisplaySnapshot,
    pub last_error: Option<OrchestrationError>,
    pub dirty: bool,
}
