//! Plain-text presentation of view snapshots. Reads snapshots only; never
//! touches state.

use shorts_core::{AppViewModel, DisplaySnapshot, Feed};

pub fn render_line(view: &AppViewModel) -> String {
    if let Some(error) = &view.last_error {
        return format!("error: {error}");
    }
    if view.validating {
        return match view.bound.stale() {
            Some(count) => format!("checking channel (previously {count} items)"),
            None => "checking channel".to_string(),
        };
    }

    let progress = &view.progress;
    if let Some(link) = &progress.artifact_link {
        return format!("completed: {} ready at {link}", counters(progress));
    }
    match progress.feed {
        Feed::None if view.loading => "waiting for progress".to_string(),
        Feed::None => selection_line(view),
        Feed::Download | Feed::Conversion => {
            format!("{}: {}", progress.stage.label(), counters(progress))
        }
    }
}

fn counters(progress: &DisplaySnapshot) -> String {
    match progress.ratio.percent() {
        Some(percent) => format!(
            "{}/{} ({percent:.0}%)",
            progress.completed, progress.total
        ),
        None => format!("{}/?", progress.completed),
    }
}

fn selection_line(view: &AppViewModel) -> String {
    let range = view.range;
    match view.bound.resolved() {
        Some(count) => format!(
            "channel has {count} items, selected {}..{} ({})",
            range.start, range.end, view.range_status
        ),
        None => format!("selected {}..{}", range.start, range.end),
    }
}
