use modelfetch_catalog::Source;

/// Phases of a single fetch.
///
/// Every attempt starts again at `Connecting`, so a sink can treat that
/// phase as "reset the indicator".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Connecting,

    /// Streaming body chunks into the staging file.
    Downloading,

    /// Body exhausted; comparing size and digest.
    Verifying,

    /// Renaming the staging file over the destination.
    Committing,

    Completed,
}

impl std::fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Verifying => write!(f, "Verifying"),
            FetchPhase::Committing => write!(f, "Committing"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Snapshot handed to the progress sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Bytes received in the current attempt.
    pub bytes_downloaded: u64,

    /// Expected size from the file spec, if it has one.
    pub total_bytes: Option<u64>,

    /// 1-based attempt number within the current locator.
    pub attempt: u32,

    pub source: Source,
}

impl Progress {
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                if self.is_completed() { 100.0 } else { 0.0 }
            } else {
                (self.bytes_downloaded as f64 / total as f64) * 100.0
            }
        })
    }

    #[must_use]
    pub fn is_completed(&self) -> bool { self.phase == FetchPhase::Completed }

    #[must_use]
    pub fn is_retry(&self) -> bool { self.attempt > 1 }
}
