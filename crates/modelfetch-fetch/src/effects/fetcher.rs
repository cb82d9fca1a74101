use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use modelfetch_catalog::{FileSpec, Source};
use modelfetch_fs::StagedFile;
use modelfetch_verify::{AnyHasher, Checksum, Hasher};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::{
    AttemptBudget, AttemptFailure, AttemptOutcome, ConfirmLinkDetector, INTERSTITIAL_LIMIT,
    ObstructionDetector, backoff, validate,
};
use crate::data::{FetchOptions, FetchPhase, Progress};
use crate::effects::http::{BoxStream, HttpClient};
use crate::error::{FetchError, Result};

/// Downloads one [`FileSpec`] at a time: retry, verify, place atomically.
pub struct Fetcher<C: HttpClient> {
    client:   C,
    detector: Arc<dyn ObstructionDetector>,
}

/// Per-attempt state. Dropped (with its staging file) before the next
/// attempt begins.
struct DownloadAttempt {
    staged:         StagedFile,
    bytes_received: u64,
    hasher:         Option<AnyHasher>,
    sniff:          Vec<u8>,
}

/// A staged body that passed validation.
struct Verified {
    staged: StagedFile,
    bytes:  u64,
}

impl DownloadAttempt {
    fn new(spec: &FileSpec) -> Result<Self> {
        Ok(Self {
            staged:         StagedFile::new(&spec.destination)?,
            bytes_received: 0,
            hasher:         spec.expected_checksum.as_ref().map(Checksum::hasher).transpose()?,
            sniff:          Vec::new(),
        })
    }

    fn absorb(&mut self, chunk: &[u8]) {
        self.bytes_received += chunk.len() as u64;
        if let Some(ref mut h) = self.hasher {
            h.update(chunk);
        }
        if self.bytes_received < INTERSTITIAL_LIMIT as u64 {
            self.sniff.extend_from_slice(chunk);
        } else if !self.sniff.is_empty() {
            self.sniff = Vec::new();
        }
    }

    fn fail(self, error: FetchError) -> AttemptFailure {
        AttemptFailure::with_body(error, self.bytes_received, self.sniff)
    }
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            detector: Arc::new(ConfirmLinkDetector::default()),
        }
    }

    /// Replace the interstitial detector.
    pub fn with_detector(mut self, detector: impl ObstructionDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    pub fn client(&self) -> &C { &self.client }

    /// Fetch `spec` from the chosen locator.
    ///
    /// On success the destination holds exactly the validated bytes and no
    /// staging files for it remain. On failure the destination is untouched.
    #[tracing::instrument(skip_all, fields(destination = %spec.destination.display(), %source))]
    pub async fn fetch(&self, spec: &FileSpec, source: Source, options: &FetchOptions) -> Result<PathBuf> {
        options.validate()?;
        let mut url = spec.url(source).ok_or(FetchError::MissingSource(source))?.to_string();
        modelfetch_fs::ensure_parent(&spec.destination)?;

        if options.skip_verified && already_valid(spec).await {
            info!("destination already valid, skipping download");
            options.report(Progress {
                phase: FetchPhase::Completed,
                bytes_downloaded: spec.expected_size.unwrap_or(0),
                total_bytes: spec.expected_size,
                attempt: 0,
                source,
            });
            return Ok(spec.destination.clone());
        }

        let mut budget = AttemptBudget::new(options.max_attempts);
        loop {
            if options.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            let attempt = budget.start();
            debug!(attempt, %url, "starting attempt");
            let result = self.attempt(&url, spec, source, attempt, options).await;

            match budget.settle(result) {
                AttemptOutcome::Success(verified) => {
                    return self.commit(verified, spec, source, attempt, options);
                }
                AttemptOutcome::Exhausted(error) => {
                    warn!(attempts = budget.used(), %error, "fetch failed");
                    return Err(error);
                }
                AttemptOutcome::Recoverable(failure) => {
                    warn!(
                        attempt,
                        remaining = budget.remaining(),
                        bytes = failure.bytes_received,
                        error = %failure.error,
                        "attempt failed, retrying"
                    );
                    if let Some(next) = failure.body.as_deref().and_then(|body| self.detector.detect(&url, body)) {
                        info!(from = %url, to = %next, "following interstitial confirmation link");
                        url = next;
                        continue;
                    }
                    let delay = backoff(attempt, options.retry_backoff);
                    if !delay.is_zero() {
                        tokio::select! {
                            biased;
                            _ = options.cancelled() => return Err(FetchError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        spec: &FileSpec,
        source: Source,
        attempt: u32,
        options: &FetchOptions,
    ) -> std::result::Result<Verified, AttemptFailure> {
        let progress = |phase, bytes_downloaded| Progress {
            phase,
            bytes_downloaded,
            total_bytes: spec.expected_size,
            attempt,
            source,
        };
        options.report(progress(FetchPhase::Connecting, 0));

        let opened = tokio::select! {
            biased;
            _ = options.cancelled() => return Err(FetchError::Cancelled.into()),
            opened = self.client.stream(url) => opened,
        };
        let body = opened.map_err(|e| FetchError::Transport(e.to_string()))?;

        let mut state = DownloadAttempt::new(spec)?;
        if let Err(error) = stream_to_staging(body, &mut state, options, &progress).await {
            return Err(state.fail(error));
        }

        options.report(progress(FetchPhase::Verifying, state.bytes_received));
        let digest = state.hasher.take().map(Hasher::finalize);
        if let Err(error) = validate(spec, state.bytes_received, digest.as_deref()) {
            return Err(state.fail(error));
        }

        Ok(Verified {
            bytes:  state.bytes_received,
            staged: state.staged,
        })
    }

    fn commit(
        &self,
        verified: Verified,
        spec: &FileSpec,
        source: Source,
        attempt: u32,
        options: &FetchOptions,
    ) -> Result<PathBuf> {
        let report = |phase| {
            options.report(Progress {
                phase,
                bytes_downloaded: verified.bytes,
                total_bytes: spec.expected_size,
                attempt,
                source,
            })
        };
        report(FetchPhase::Committing);
        let placed = verified.staged.commit()?;

        let swept = modelfetch_fs::sweep_staging(&placed);
        if swept > 0 {
            debug!(swept, "removed stale staging files");
        }
        info!(bytes = verified.bytes, attempts = attempt, "placed {}", placed.display());
        report(FetchPhase::Completed);
        Ok(placed)
    }
}

async fn stream_to_staging<E, P>(
    mut body: BoxStream<'static, std::result::Result<Bytes, E>>,
    state: &mut DownloadAttempt,
    options: &FetchOptions,
    progress: &P,
) -> Result<()>
where
    E: std::error::Error,
    P: Fn(FetchPhase, u64) -> Progress,
{
    let mut file = tokio::fs::File::create(state.staged.path()).await?;

    loop {
        let item = tokio::select! {
            biased;
            _ = options.cancelled() => return Err(FetchError::Cancelled),
            item = body.next() => item,
        };
        let Some(item) = item else {
            break;
        };
        let mut bytes = item.map_err(|e| FetchError::Transport(e.to_string()))?;
        while !bytes.is_empty() {
            let chunk = bytes.split_to(bytes.len().min(options.chunk_size));
            file.write_all(&chunk).await?;
            state.absorb(&chunk);
            options.report(progress(FetchPhase::Downloading, state.bytes_received));
        }
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

/// `true` if `spec.destination` exists and passes every check the spec has.
async fn already_valid(spec: &FileSpec) -> bool {
    if !spec.is_verifiable() {
        return false;
    }
    let Ok(meta) = tokio::fs::metadata(&spec.destination).await else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    if let Some(size) = spec.expected_size
        && meta.len() != size
    {
        debug!(expected = size, actual = meta.len(), "existing destination has wrong size");
        return false;
    }
    let Some(checksum) = spec.expected_checksum.clone() else {
        return true;
    };

    let path = spec.destination.clone();
    match tokio::task::spawn_blocking(move || modelfetch_verify::verify_file(&path, &checksum)).await {
        Ok(Ok(_)) => true,
        Ok(Err(error)) => {
            debug!(%error, "existing destination failed verification");
            false
        }
        Err(_) => false,
    }
}
