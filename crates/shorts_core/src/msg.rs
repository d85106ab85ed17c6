use crate::{JobHandle, JobId, ProgressReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the channel input. Blank input clears the channel.
    ChannelChanged(String),
    /// User edited the first item index (inclusive).
    StartChanged(u32),
    /// User edited the last item index (exclusive).
    EndChanged(u32),
    /// Result of the discovery request tagged `seq`.
    BoundDiscovered {
        seq: u64,
        result: Result<u32, String>,
    },
    /// User confirmed the download.
    SubmitClicked,
    /// Result of the submission request for `job_id`.
    JobSubmitted {
        job_id: JobId,
        result: Result<JobHandle, String>,
    },
    /// Poll timer fired.
    PollTick { job_id: JobId },
    /// Result of poll tick `tick`.
    ProgressFetched {
        job_id: JobId,
        tick: u64,
        result: Result<ProgressReport, String>,
    },
    /// User abandoned the running job.
    CancelClicked,
    /// User acknowledged the last error.
    DismissError,
    NoOp,
}
