use std::path::PathBuf;

use modelfetch_catalog::{CatalogEntry, FileSpec, Source};
use tracing::{info, warn};

use crate::data::FetchOptions;
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

/// Outcome of a catalog run, in catalog order.
#[derive(Debug, Default)]
pub struct CatalogReport {
    pub fetched: Vec<(String, PathBuf)>,
    pub failed:  Vec<(String, FetchError)>,

    /// Set when the run stopped early on a non-retryable error.
    pub aborted: bool,
}

impl CatalogReport {
    pub fn is_success(&self) -> bool { self.failed.is_empty() && !self.aborted }
}

impl<C: HttpClient> Fetcher<C> {
    /// Fetch from the primary locator; if that fails for any retryable
    /// reason, try the alternate once.
    pub async fn fetch_with_fallback(&self, spec: &FileSpec, options: &FetchOptions) -> Result<PathBuf> {
        let primary_error = match self.fetch(spec, Source::Primary, options).await {
            Ok(path) => return Ok(path),
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) => error,
        };

        if spec.url(Source::Alternate).is_none() {
            return Err(primary_error);
        }
        warn!(
            destination = %spec.destination.display(),
            error = %primary_error,
            "primary download failed, trying alternate server"
        );
        self.fetch(spec, Source::Alternate, options).await
    }

    /// Fetch every entry in order.
    ///
    /// A failed entry does not stop the run; a cancellation does.
    /// `options_for` builds per-entry options, typically to attach a
    /// progress sink labelled with the entry name.
    pub async fn fetch_catalog<'a, I, F>(&self, entries: I, mut options_for: F) -> CatalogReport
    where
        I: IntoIterator<Item = &'a CatalogEntry>,
        F: FnMut(&CatalogEntry) -> FetchOptions,
    {
        let mut report = CatalogReport::default();
        for entry in entries {
            info!(name = %entry.name, "fetching");
            let options = options_for(entry);
            match self.fetch_with_fallback(&entry.spec, &options).await {
                Ok(path) => report.fetched.push((entry.name.clone(), path)),
                Err(error) => {
                    let fatal = !error.is_retryable();
                    report.failed.push((entry.name.clone(), error));
                    if fatal {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }
        report
    }
}
