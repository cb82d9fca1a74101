//! Content verification for downloaded artifacts.
//!
//! Digests are computed incrementally as bytes stream past, so a download is
//! hashed in the same pass that writes it to disk.
//!
//! # Example
//!
//! ```
//! use modelfetch_verify::{Checksum, Hasher};
//!
//! let expected: Checksum = "md5:5eb63bbbe01eeed093cb22bb8f5acdc3".parse().unwrap();
//! let mut hasher = expected.hasher().unwrap();
//! hasher.update(b"hello ");
//! hasher.update(b"world");
//! expected.verify(&hasher.finalize()).unwrap();
//! ```

#[cfg(not(any(feature = "md5", feature = "sha256")))]
compile_error!("enable at least one of the `md5` or `sha256` features");

pub use self::checksum::{Algorithm, Checksum};
pub use self::error::{Result, VerificationError};
pub use self::hasher::{AnyHasher, Hasher};
pub use self::reader::{VerifiedReader, verify_file};

#[cfg(feature = "md5")]
pub use self::hasher::Md5Hasher;

#[cfg(feature = "sha256")]
pub use self::hasher::Sha256Hasher;

mod checksum;
mod error;
mod hasher;
mod reader;
