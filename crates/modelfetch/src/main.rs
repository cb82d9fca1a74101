use anyhow::Result;
use clap::Parser;
use modelfetch_fetch::CancelFlag;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{App, Commands};

mod cli;
mod progress;
mod table;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let app = App::parse();
    init_tracing(app.verbose);

    match app.cmd {
        Commands::Fetch(arg) => {
            let cancel = CancelFlag::new();
            watch_interrupt(cancel.clone());
            cli::fetch(arg, cancel).await
        }
        Commands::List(arg) => cli::list(arg),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "modelfetch=info",
        _ => "modelfetch=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// First Ctrl-C cancels the running fetch; a second one exits at once.
fn watch_interrupt(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("interrupted, cancelling download (press Ctrl-C again to quit)");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}
