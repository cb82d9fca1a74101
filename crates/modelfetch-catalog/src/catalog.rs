use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::{CatalogError, FileSpec, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub spec: FileSpec,
}

/// Ordered, immutable mapping from logical name to [`FileSpec`].
///
/// Names and destinations are unique; iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FileSpec)>,
        S: Into<String>,
    {
        let entries: Vec<_> = entries
            .into_iter()
            .map(|(name, spec)| CatalogEntry {
                name: name.into(),
                spec,
            })
            .collect();
        check_unique(&entries)?;
        Ok(Self { entries })
    }

    pub fn lookup(&self, name: &str) -> Result<&FileSpec> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.spec)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// Entries for `names`, in the order given. An empty slice selects the
    /// whole catalog.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&CatalogEntry>> {
        if names.is_empty() {
            return Ok(self.entries.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.entries
                    .iter()
                    .find(|e| e.name == name)
                    .ok_or_else(|| CatalogError::NotFound(name.to_string()))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> { self.entries.iter() }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.entries.iter().map(|e| e.name.as_str()) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Resolve relative destinations against `root`.
    pub fn rebase(self, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let entries: Vec<_> = self
            .entries
            .into_iter()
            .map(|mut e| {
                if e.spec.destination.is_relative() {
                    e.spec.destination = root.join(&e.spec.destination);
                }
                e
            })
            .collect();
        check_unique(&entries)?;
        Ok(Self { entries })
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter { self.entries.iter() }
}

fn check_unique(entries: &[CatalogEntry]) -> Result<()> {
    let mut names: HashSet<&str> = HashSet::with_capacity(entries.len());
    let mut destinations: HashMap<&PathBuf, &str> = HashMap::with_capacity(entries.len());

    for entry in entries {
        if !names.insert(entry.name.as_str()) {
            return Err(CatalogError::DuplicateName(entry.name.clone()));
        }
        if let Some(first) = destinations.insert(&entry.spec.destination, entry.name.as_str()) {
            return Err(CatalogError::DuplicateDestination {
                first:  first.to_string(),
                second: entry.name.clone(),
                path:   entry.spec.destination.clone(),
            });
        }
    }
    Ok(())
}
