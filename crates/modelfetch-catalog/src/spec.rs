use std::path::{Path, PathBuf};

use modelfetch_verify::Checksum;

/// Which of a file's two locators a fetch uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    Primary,
    Alternate,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Primary => write!(f, "primary"),
            Source::Alternate => write!(f, "alternate"),
        }
    }
}

/// Everything needed to fetch and validate one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub primary_url: String,

    /// Fallback locator. `None` when the file has no mirror.
    pub alternate_url: Option<String>,

    /// Exact byte count; `None` skips the size check.
    pub expected_size: Option<u64>,

    /// Expected digest; `None` skips the checksum check.
    pub expected_checksum: Option<Checksum>,

    pub destination: PathBuf,
}

impl FileSpec {
    pub fn new(primary_url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            primary_url: primary_url.into(),
            alternate_url: None,
            expected_size: None,
            expected_checksum: None,
            destination: destination.into(),
        }
    }

    /// Set the fallback locator. An empty string means no fallback.
    pub fn alternate_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.alternate_url = (!url.trim().is_empty()).then_some(url);
        self
    }

    pub fn expected_size(mut self, size: u64) -> Self {
        self.expected_size = Some(size);
        self
    }

    pub fn expected_checksum(mut self, checksum: Checksum) -> Self {
        self.expected_checksum = Some(checksum);
        self
    }

    pub fn destination(&self) -> &Path { &self.destination }

    pub fn url(&self, source: Source) -> Option<&str> {
        match source {
            Source::Primary => Some(self.primary_url.as_str()),
            Source::Alternate => self.alternate_url.as_deref(),
        }
    }

    /// `true` if an existing file can be checked against this spec.
    pub fn is_verifiable(&self) -> bool {
        self.expected_size.is_some() || self.expected_checksum.is_some()
    }
}
