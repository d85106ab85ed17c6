use crate::{ChannelRef, JobId, RangeSelection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Look up the item count of `channel`. Supersedes any earlier lookup.
    DiscoverBound {
        seq: u64,
        channel: ChannelRef,
        range: RangeSelection,
    },
    SubmitJob {
        job_id: JobId,
        channel: ChannelRef,
        range: RangeSelection,
    },
    StartPolling { job_id: JobId },
    /// Fetch the download feed, then the conversion feed once the download
    /// stage calls for it.
    FetchProgress { job_id: JobId, tick: u64 },
    StopPolling { job_id: JobId, reason: StopReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    Abandoned,
    Cancelled,
}
