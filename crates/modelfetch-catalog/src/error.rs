use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("no catalog entry named {0:?}")]
    NotFound(String),

    #[error("catalog entry {0:?} is defined twice")]
    DuplicateName(String),

    #[error("entries {first:?} and {second:?} share destination {path}")]
    DuplicateDestination {
        first:  String,
        second: String,
        path:   PathBuf,
    },

    #[error("entry {name:?} has an invalid checksum")]
    InvalidChecksum {
        name:   String,
        #[source]
        source: modelfetch_verify::VerificationError,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(String),

    #[error("failed to read catalog {path}")]
    Read {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
