use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use modelfetch_fetch::{FetchPhase, Progress, ProgressSink};
use once_cell::sync::Lazy;

const PB_STYLE: &str = "{spinner:.blue} {prefix:>18.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

/// Terminal bar for one catalog entry, driven by fetch progress events.
#[derive(Clone)]
pub struct ProgressTracker {
    pb: ProgressBar,
}

impl ProgressTracker {
    pub fn observe(&self, progress: &Progress) {
        match progress.phase {
            FetchPhase::Connecting => {
                self.pb.reset();
                if progress.is_retry() {
                    self.pb.set_message(format!("attempt {} ({})", progress.attempt, progress.source));
                } else {
                    self.pb.set_message("connecting");
                }
            }
            FetchPhase::Downloading => self.pb.set_position(progress.bytes_downloaded),
            FetchPhase::Verifying => self.pb.set_message("verifying"),
            FetchPhase::Committing => self.pb.set_message("placing"),
            FetchPhase::Completed => {
                self.pb.set_position(progress.bytes_downloaded);
                let msg = if progress.attempt == 0 { "already present" } else { "done" };
                self.pb.finish_with_message(msg);
            }
        }
    }

    pub fn sink(self) -> ProgressSink { Arc::new(move |progress: &Progress| self.observe(progress)) }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTrackerBuilder {
    len:    Option<u64>,
    prefix: Option<String>,
}

impl ProgressTrackerBuilder {
    pub fn with_len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn build(self) -> ProgressTracker {
        let pb = match self.len {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        let pb = match PB_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };

        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }
        ProgressTracker { pb }
    }
}
