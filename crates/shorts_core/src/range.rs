use std::fmt;

/// Source channel as typed by the user. Opaque to the client; the backend
/// decides what it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelRef(String);

impl ChannelRef {
    /// Returns `None` for blank input, which clears the channel.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Half-open item range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSelection {
    pub start: u32,
    pub end: u32,
}

impl Default for RangeSelection {
    fn default() -> Self {
        Self { start: 0, end: 10 }
    }
}

impl RangeSelection {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Client-side batch size guard. Never touches the network.
    pub fn check_policy(&self, cap: u32) -> Result<(), PolicyViolation> {
        if self.len() > cap {
            Err(PolicyViolation { cap })
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a single job may contain at most {cap} items")]
pub struct PolicyViolation {
    pub cap: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStatus {
    Valid,
    /// No resolved bound to check `end` against.
    Unvalidated,
    Empty,
    ExceedsCap { cap: u32 },
    ExceedsBound { bound: u32 },
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeStatus::Valid => write!(f, "valid"),
            RangeStatus::Unvalidated => write!(f, "channel size not known yet"),
            RangeStatus::Empty => write!(f, "start must be below end"),
            RangeStatus::ExceedsCap { cap } => write!(f, "more than {cap} items selected"),
            RangeStatus::ExceedsBound { bound } => {
                write!(f, "the channel has only {bound} items")
            }
        }
    }
}

/// Checks a selection against the policy cap and the discovered bound.
pub fn validate_range(range: RangeSelection, bound: Option<u32>, cap: u32) -> RangeStatus {
    if range.is_empty() {
        return RangeStatus::Empty;
    }
    if range.check_policy(cap).is_err() {
        return RangeStatus::ExceedsCap { cap };
    }
    match bound {
        None => RangeStatus::Unvalidated,
        Some(bound) if range.end > bound => RangeStatus::ExceedsBound { bound },
        Some(_) => RangeStatus::Valid,
    }
}

/// Lifecycle of the discovered item count for the current channel.
///
/// A value that survives a channel change or a failed lookup is only ever
/// carried as `stale`; [`BoundState::resolved`] never returns it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoundState {
    #[default]
    Unset,
    Pending {
        stale: Option<u32>,
    },
    Resolved(u32),
    Failed {
        stale: Option<u32>,
        message: String,
    },
}

impl BoundState {
    pub fn resolved(&self) -> Option<u32> {
        match self {
            BoundState::Resolved(count) => Some(*count),
            _ => None,
        }
    }

    pub fn stale(&self) -> Option<u32> {
        match self {
            BoundState::Pending { stale } | BoundState::Failed { stale, .. } => *stale,
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, BoundState::Pending { .. })
    }

    pub(crate) fn last_known(&self) -> Option<u32> {
        self.resolved().or_else(|| self.stale())
    }
}
