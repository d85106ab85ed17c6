//! Stage feeds, the tagged pipeline state and the reconciler that turns
//! them into one display snapshot.

use crate::{JobHandle, JobOutcome};

const COMPLETED_LABEL: &str = "Completed";
const CONVERTING_PREFIX: &str = "Converting";
const DOWNLOADING_PREFIX: &str = "Download";

/// Backend-reported phase. Only `Converting` and `Completed` drive control
/// flow; every other label is carried through for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Stage {
    /// Not reported yet (the backend answers `{}` before a job starts).
    #[default]
    Idle,
    Downloading(String),
    Converting(String),
    Completed,
    Other(String),
}

impl Stage {
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() {
            Stage::Idle
        } else if label == COMPLETED_LABEL {
            Stage::Completed
        } else if label.starts_with(CONVERTING_PREFIX) {
            Stage::Converting(label.to_owned())
        } else if label.starts_with(DOWNLOADING_PREFIX) {
            Stage::Downloading(label.to_owned())
        } else {
            Stage::Other(label.to_owned())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Stage::Idle => "",
            Stage::Completed => COMPLETED_LABEL,
            Stage::Downloading(label) | Stage::Converting(label) | Stage::Other(label) => label,
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Stage::Idle)
    }

    /// Whether the conversion feed carries information at this stage.
    pub fn follows_conversion(&self) -> bool {
        matches!(self, Stage::Converting(_) | Stage::Completed)
    }

    fn rank(&self) -> u8 {
        match self {
            Stage::Idle => 0,
            Stage::Downloading(_) | Stage::Other(_) => 1,
            Stage::Converting(_) => 2,
            Stage::Completed => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageProgress {
    pub stage: Stage,
    pub completed: u32,
    /// Zero means "not measured yet".
    pub total: u32,
}

impl StageProgress {
    /// `completed` is clamped to `total` once `total` is known.
    pub fn new(stage: Stage, completed: u32, total: u32) -> Self {
        let completed = if total > 0 {
            completed.min(total)
        } else {
            completed
        };
        Self {
            stage,
            completed,
            total,
        }
    }

    pub fn ratio(&self) -> Ratio {
        if self.total == 0 {
            Ratio::Unmeasured
        } else {
            Ratio::Measured(f64::from(self.completed) / f64::from(self.total))
        }
    }

    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Unmeasured,
    Measured(f64),
}

impl Ratio {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Ratio::Unmeasured => None,
            Ratio::Measured(ratio) => Some(ratio * 100.0),
        }
    }
}

/// Both feeds as observed by one poll tick. `conversion` is `None` when
/// the tick did not fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub download: StageProgress,
    pub conversion: Option<StageProgress>,
}

/// When a job counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminationRule {
    /// Download stage `Completed` and the conversion feed observed as done:
    /// `completed == total`, or a zero total when nothing needed converting.
    #[default]
    RequireConversion,
    /// Download stage `Completed` alone. Conversion is still shown while
    /// the backend reports it.
    DownloadOnly,
}

impl TerminationRule {
    pub fn is_satisfied(&self, download: &StageProgress, conversion: Option<&StageProgress>) -> bool {
        if download.stage != Stage::Completed {
            return false;
        }
        match self {
            TerminationRule::RequireConversion => conversion
                .is_some_and(|conversion| conversion.total == 0 || conversion.is_finished()),
            TerminationRule::DownloadOnly => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    None,
    Download,
    Conversion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    pub feed: Feed,
    pub stage: Stage,
    pub completed: u32,
    pub total: u32,
    pub ratio: Ratio,
    pub artifact_link: Option<String>,
}

/// Merges the two feeds into what the user sees. Conversion supersedes
/// download as soon as it has been observed.
pub fn reconcile(
    download: &StageProgress,
    conversion: &StageProgress,
    outcome: Option<&JobOutcome>,
) -> DisplaySnapshot {
    let (feed, shown) = if conversion.stage.is_set() {
        (Feed::Conversion, conversion)
    } else if download.stage.is_set() {
        (Feed::Download, download)
    } else {
        (Feed::None, download)
    };
    DisplaySnapshot {
        feed,
        stage: shown.stage.clone(),
        completed: shown.completed,
        total: shown.total,
        ratio: shown.ratio(),
        artifact_link: outcome.map(|outcome| outcome.artifact_link.clone()),
    }
}

/// Progress of the active job. Conversion counters only exist once the
/// backend has entered conversion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Pipeline {
    #[default]
    Idle,
    Downloading(StageProgress),
    Converting(StageProgress, StageProgress),
    Completed(JobOutcome),
}

impl Pipeline {
    pub fn download(&self) -> Option<&StageProgress> {
        match self {
            Pipeline::Idle => None,
            Pipeline::Downloading(download) | Pipeline::Converting(download, _) => Some(download),
            Pipeline::Completed(outcome) => Some(&outcome.download),
        }
    }

    pub fn conversion(&self) -> Option<&StageProgress> {
        match self {
            Pipeline::Converting(_, conversion) => Some(conversion),
            Pipeline::Completed(outcome) => Some(&outcome.conversion),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&JobOutcome> {
        match self {
            Pipeline::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Pipeline::Completed(_))
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        let unset = StageProgress::default();
        match self {
            Pipeline::Idle => reconcile(&unset, &unset, None),
            Pipeline::Downloading(download) => reconcile(download, &unset, None),
            Pipeline::Converting(download, conversion) => reconcile(download, conversion, None),
            Pipeline::Completed(outcome) => {
                reconcile(&outcome.download, &outcome.conversion, Some(outcome))
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Pipeline::Idle => 0,
            Pipeline::Downloading(download) => download.stage.rank().max(1),
            Pipeline::Converting(download, _) => download.stage.rank().max(2),
            Pipeline::Completed(_) => u8::MAX,
        }
    }

    /// Folds one tick's report into the pipeline. Reports whose download
    /// stage ranks below the current phase leave it untouched.
    pub fn advance(self, report: ProgressReport, rule: TerminationRule, handle: &JobHandle) -> Pipeline {
        let ProgressReport {
            download,
            conversion,
        } = report;
        if download.stage.rank() < self.rank() {
            return self;
        }

        let conversion = conversion
            .filter(|conversion| conversion.stage.is_set())
            .or_else(|| self.conversion().cloned());
        if rule.is_satisfied(&download, conversion.as_ref()) {
            return Pipeline::Completed(JobOutcome {
                job_id: handle.job_id,
                artifact_link: handle.artifact_url.to_string(),
                download,
                conversion: conversion.unwrap_or_default(),
            });
        }

        match download.stage {
            Stage::Idle => Pipeline::Idle,
            Stage::Converting(_) | Stage::Completed => {
                Pipeline::Converting(download, conversion.unwrap_or_default())
            }
            Stage::Downloading(_) | Stage::Other(_) => Pipeline::Downloading(download),
        }
    }
}
