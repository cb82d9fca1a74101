use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::cancel::CancelFlag;
use super::progress::Progress;
use crate::error::{FetchError, Result};

/// Default body chunk size: 128 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 128 << 10;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

pub type ProgressSink = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Configuration for one fetch.
///
/// # Examples
///
/// ```
/// use modelfetch_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_attempts(5)
///     .chunk_size(64 << 10)
///     .retry_backoff(Duration::from_millis(250));
/// assert!(options.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Largest slice written and hashed per step. Must be non-zero.
    pub chunk_size: usize,

    /// Attempts per locator, including the first. Must be at least 1.
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts.
    ///
    /// Not applied when an interstitial page rewrote the locator.
    pub retry_backoff: Duration,

    /// Return early when the destination already matches the spec.
    pub skip_verified: bool,

    pub on_progress: Option<ProgressSink>,

    /// Raced against every body read and backoff sleep; once set the fetch
    /// ends with [`FetchError::Cancelled`].
    pub cancel: Option<CancelFlag>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("chunk_size", &self.chunk_size)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff", &self.retry_backoff)
            .field("skip_verified", &self.skip_verified)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            chunk_size:    DEFAULT_CHUNK_SIZE,
            max_attempts:  DEFAULT_MAX_ATTEMPTS,
            retry_backoff: Duration::from_millis(100),
            skip_verified: true,
            on_progress:   None,
            cancel:        None,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn skip_verified(mut self, skip_verified: bool) -> Self {
        self.skip_verified = skip_verified;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: ProgressSink) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    #[must_use]
    pub fn cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(FetchError::InvalidOptions("max_attempts must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(FetchError::InvalidOptions("chunk_size must be non-zero"));
        }
        Ok(())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// Resolves when the cancel flag is set; never without one.
    pub(crate) async fn cancelled(&self) {
        match self.cancel {
            Some(ref flag) => flag.cancelled().await,
            None => std::future::pending().await,
        }
    }

    pub(crate) fn report(&self, progress: Progress) {
        if let Some(ref sink) = self.on_progress {
            sink(&progress);
        }
    }
}
