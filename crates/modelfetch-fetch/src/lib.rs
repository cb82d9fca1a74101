//! Resilient downloading of large model files.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable options and progress snapshots
//! - [`core`] - Pure decisions: attempt budget, validation, backoff,
//!   interstitial detection
//! - `effects` - The transport seam ([`HttpClient`]), the retry loop
//!   ([`Fetcher::fetch`]) and the primary/alternate driver
//!   ([`Fetcher::fetch_with_fallback`])
//!
//! Each attempt streams into a fresh staging file beside the destination,
//! hashing as it writes. Only a body that passes the size and digest checks
//! is renamed into place; everything else is deleted before the next attempt.

pub mod core;
pub mod data;
mod effects;
mod error;

pub use crate::core::{ConfirmLinkDetector, NoDetector, ObstructionDetector};
pub use data::{CancelFlag, FetchOptions, FetchPhase, Progress, ProgressSink};
pub use effects::{BoxStream, CatalogReport, Fetcher, HttpClient};
pub use error::{FetchError, Result};

#[cfg(feature = "reqwest")]
pub use effects::{ClientSettings, ReqwestClient};

pub use modelfetch_catalog::{Catalog, CatalogEntry, FileSpec, Source};
