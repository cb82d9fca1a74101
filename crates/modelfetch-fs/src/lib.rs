//! Staging files and atomic placement for downloaded artifacts.
//!
//! A download never writes to its destination directly. Bytes land in a
//! [`StagedFile`] that sits beside the destination (same directory, so the
//! final move is a same-filesystem rename) and carries a random suffix, so two
//! attempts never share a staging path. The staged file is either promoted
//! with [`StagedFile::commit`] or removed when dropped.

mod error;
mod staging;

pub use error::{Error, Result};
pub use staging::{StagedFile, atomic_replace, ensure_parent, staging_path, staging_prefix, sweep_staging};
