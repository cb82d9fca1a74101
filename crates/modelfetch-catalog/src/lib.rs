//! Which files to fetch, where they come from, and what they must look like.
//!
//! A [`Catalog`] maps logical names to [`FileSpec`]s. It is built once at
//! startup, either from the [`builtin`] table or from a record list on disk,
//! and handed to the fetcher by reference.

mod builtin;
mod catalog;
mod error;
mod record;
mod spec;

pub use builtin::{EVA3D_DEEPFASHION, SMPL, builtin};
pub use catalog::{Catalog, CatalogEntry};
pub use error::{CatalogError, Result};
pub use record::CatalogRecord;
pub use spec::{FileSpec, Source};

pub use modelfetch_verify::Checksum;
