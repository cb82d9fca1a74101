use modelfetch_catalog::FileSpec;
use modelfetch_verify::VerificationError;

use crate::error::{FetchError, Result};

/// Check a finished attempt against the spec: size first, then digest.
///
/// `digest` is `None` when the spec carries no checksum.
pub fn validate(spec: &FileSpec, bytes_received: u64, digest: Option<&[u8]>) -> Result<()> {
    if let Some(expected) = spec.expected_size
        && expected != bytes_received
    {
        return Err(FetchError::SizeMismatch {
            expected,
            actual: bytes_received,
        });
    }

    if let (Some(checksum), Some(actual)) = (&spec.expected_checksum, digest)
        && let Err(VerificationError::Mismatch { expected, actual }) = checksum.verify(actual)
    {
        return Err(FetchError::ChecksumMismatch { expected, actual });
    }

    Ok(())
}
