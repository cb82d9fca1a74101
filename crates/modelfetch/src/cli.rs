use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use modelfetch_catalog::Catalog;
use modelfetch_fetch::data::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ATTEMPTS};
use modelfetch_fetch::{CancelFlag, ClientSettings, FetchOptions, Fetcher};
use tracing::{error, info};

use crate::progress::ProgressTrackerBuilder;
use crate::table::{EntryRow, Formatter, missing_summary};

#[derive(Clone, Debug, Parser)]
#[command(name = "modelfetch", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "f", name = "fetch", about = "Download catalog entries and verify them")]
    Fetch(FetchArg),
    #[command(alias = "ls", name = "list", about = "Show catalog entries and their local state")]
    List(ListArg),
}

#[derive(Args, Clone, Debug)]
pub struct CatalogArg {
    /// TOML or JSON record list; the builtin table when absent.
    #[arg(long, env = "MODELFETCH_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Directory that relative destinations are placed under.
    #[arg(long, env = "MODELFETCH_ROOT")]
    pub root: Option<PathBuf>,
}

impl CatalogArg {
    pub fn load(&self) -> Result<Catalog> {
        let catalog = match self.catalog {
            Some(ref path) => {
                Catalog::load(path).with_context(|| format!("failed to load catalog {}", path.display()))?
            }
            None => modelfetch_catalog::builtin()?,
        };
        match self.root {
            Some(ref root) => Ok(catalog.rebase(root)?),
            None => Ok(catalog),
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct FetchArg {
    /// Entries to fetch, in order. All entries when empty.
    pub names: Vec<String>,

    #[command(flatten)]
    pub catalog: CatalogArg,

    /// Attempts per server, including the first.
    #[arg(long, env = "MODELFETCH_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub attempts: u32,

    #[arg(long, env = "MODELFETCH_CHUNK_KIB", default_value_t = DEFAULT_CHUNK_SIZE >> 10)]
    pub chunk_kib: usize,

    /// Base delay between attempts, doubled after each failure.
    #[arg(long, env = "MODELFETCH_BACKOFF_MS", default_value_t = 100)]
    pub backoff_ms: u64,

    /// Download even when the destination already verifies.
    #[arg(long, env = "MODELFETCH_FORCE")]
    pub force: bool,

    #[arg(long, env = "MODELFETCH_PROXY")]
    pub proxy: Option<String>,
}

impl FetchArg {
    pub fn options(&self, cancel: CancelFlag) -> FetchOptions {
        FetchOptions::default()
            .max_attempts(self.attempts)
            .chunk_size(self.chunk_kib << 10)
            .retry_backoff(Duration::from_millis(self.backoff_ms))
            .skip_verified(!self.force)
            .cancel(cancel)
    }
}

#[derive(Args, Clone, Debug)]
pub struct ListArg {
    #[command(flatten)]
    pub catalog: CatalogArg,
}

pub async fn fetch(arg: FetchArg, cancel: CancelFlag) -> Result<()> {
    let catalog = arg.catalog.load()?;
    let entries = catalog.select(arg.names.as_slice())?;
    let base = arg.options(cancel);
    base.validate()?;

    let settings = ClientSettings {
        proxy: arg.proxy.clone(),
        ..Default::default()
    };
    let fetcher = Fetcher::new(settings.build().context("failed to build HTTP client")?);

    let total = entries.len();
    let report = fetcher
        .fetch_catalog(entries, |entry| {
            let mut builder = ProgressTrackerBuilder::default().with_prefix(&entry.name);
            if let Some(len) = entry.spec.expected_size {
                builder = builder.with_len(len);
            }
            base.clone().on_progress(builder.build().sink())
        })
        .await;

    for (name, path) in &report.fetched {
        info!(name = %name, "ready at {}", path.display());
    }
    for (name, err) in &report.failed {
        error!(name = %name, "{err}");
    }

    if report.aborted {
        bail!("stopped after {} of {} entries", report.fetched.len() + report.failed.len(), total);
    }
    if !report.failed.is_empty() {
        bail!("{} of {} entries failed", report.failed.len(), total);
    }
    Ok(())
}

pub fn list(arg: ListArg) -> Result<()> {
    let catalog = arg.catalog.load()?;
    let rows: Vec<EntryRow> = catalog.iter().map(EntryRow::from).collect();
    let table = Formatter {
        header: Some(format!("{} entries", catalog.len())),
        footer: missing_summary(&rows),
    }
    .build(rows);
    println!("{table}");
    Ok(())
}
