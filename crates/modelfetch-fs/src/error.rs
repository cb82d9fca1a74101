use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create directory {path}")]
    CreateDir {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {from} into place at {to}")]
    Rename {
        from:   PathBuf,
        to:     PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
