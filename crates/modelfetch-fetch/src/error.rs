//! Error types for modelfetch-fetch.

use std::io;

use modelfetch_catalog::Source;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, non-success status, or a broken body stream.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("gave up after {attempts} attempts: {last}")]
    AttemptsExhausted {
        attempts: u32,
        #[source]
        last:     Box<FetchError>,
    },

    #[error("no {0} locator configured")]
    MissingSource(Source),

    #[error("invalid fetch options: {0}")]
    InvalidOptions(&'static str),

    #[error("download cancelled")]
    Cancelled,

    /// The expected digest cannot be computed by this build.
    #[error(transparent)]
    Verification(#[from] modelfetch_verify::VerificationError),

    #[error(transparent)]
    Fs(#[from] modelfetch_fs::Error),

    #[error("file I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// `true` for [`FetchError::SizeMismatch`] and [`FetchError::ChecksumMismatch`].
    pub fn is_integrity(&self) -> bool {
        matches!(self, FetchError::SizeMismatch { .. } | FetchError::ChecksumMismatch { .. })
    }

    /// Whether another attempt (or another locator) could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            FetchError::Cancelled
                | FetchError::InvalidOptions(_)
                | FetchError::MissingSource(_)
                | FetchError::Verification(_)
        )
    }

    /// The innermost cause, looking through [`FetchError::AttemptsExhausted`].
    pub fn last_cause(&self) -> &FetchError {
        match self {
            FetchError::AttemptsExhausted { last, .. } => last.last_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
