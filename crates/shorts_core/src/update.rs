use crate::{Effect, Msg, OrchestrationState, RangeSelection};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: OrchestrationState, msg: Msg) -> (OrchestrationState, Vec<Effect>) {
    let effects = match msg {
        Msg::ChannelChanged(raw) => state.change_channel(&raw),
        Msg::StartChanged(start) => {
            let end = state.range().end;
            state.set_range(RangeSelection::new(start, end));
            Vec::new()
        }
        Msg::EndChanged(end) => {
            let start = state.range().start;
            state.set_range(RangeSelection::new(start, end));
            Vec::new()
        }
        Msg::BoundDiscovered { seq, result } => {
            // Superseded lookups are dropped without touching state.
            state.apply_discovery(seq, result);
            Vec::new()
        }
        Msg::SubmitClicked => state.begin_submission(),
        Msg::JobSubmitted { job_id, result } => state.finish_submission(job_id, result),
        Msg::PollTick { job_id } => state.issue_tick(job_id),
        Msg::ProgressFetched {
            job_id,
            tick,
            result,
        } => state.apply_progress(job_id, tick, result),
        Msg::CancelClicked => state.cancel(),
        Msg::DismissError => {
            state.dismiss_error();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
