use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Catalog, CatalogError, FileSpec, Result};

/// One catalog entry as written in a TOML or JSON record list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogRecord {
    pub name:              String,
    pub primary_url:       String,
    #[serde(default)]
    pub alternate_url:     Option<String>,
    #[serde(default)]
    pub expected_size:     Option<u64>,
    #[serde(default)]
    pub expected_checksum: Option<String>,
    pub destination:       PathBuf,
}

#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default, rename = "file")]
    files: Vec<CatalogRecord>,
}

impl CatalogRecord {
    pub fn into_entry(self) -> Result<(String, FileSpec)> {
        let mut spec = FileSpec::new(self.primary_url, self.destination);
        if let Some(alt) = self.alternate_url {
            spec = spec.alternate_url(alt);
        }
        if let Some(size) = self.expected_size {
            spec = spec.expected_size(size);
        }
        if let Some(hex) = self.expected_checksum.filter(|s| !s.trim().is_empty()) {
            let checksum = hex.parse().map_err(|source| CatalogError::InvalidChecksum {
                name: self.name.clone(),
                source,
            })?;
            spec = spec.expected_checksum(checksum);
        }
        Ok((self.name, spec))
    }
}

impl Catalog {
    pub fn from_records(records: impl IntoIterator<Item = CatalogRecord>) -> Result<Self> {
        let entries = records
            .into_iter()
            .map(CatalogRecord::into_entry)
            .collect::<Result<Vec<_>>>()?;
        Catalog::new(entries)
    }

    /// Parse a TOML list of `[[file]]` tables.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let parsed: TomlCatalog = toml::from_str(s).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_records(parsed.files)
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let records: Vec<CatalogRecord> =
            serde_json::from_str(s).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_records(records)
    }

    /// Load a catalog file; `.json` is read as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }
}
