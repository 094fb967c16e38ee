use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::DarkMakerError;

/// Session life cycle, used for progress logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Validating,
    GroupedProcessing,
    SingleSetProcessing,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Validating => write!(f, "Validating"),
            Self::GroupedProcessing => write!(f, "Processing groups"),
            Self::SingleSetProcessing => write!(f, "Processing selection"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    Completed { written: Vec<PathBuf> },
    Failed(DarkMakerError),
    /// Cancellation was observed between groups; `written` lists the
    /// masters finished before that.
    Cancelled { written: Vec<PathBuf> },
}

impl SessionOutcome {
    pub fn state(&self) -> SessionState {
        match self {
            Self::Completed { .. } => SessionState::Completed,
            Self::Failed(_) => SessionState::Failed,
            Self::Cancelled { .. } => SessionState::Cancelled,
        }
    }
}

/// Cooperative cancellation flag, polled between groups.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
