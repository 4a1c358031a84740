//! AtlasTree CLI
//!
//! Reads operator commands from stdin and applies them to a tree file.
//!
//! ```text
//! atlastree-cli data.bt 3   # create (truncate) with t=3
//! atlastree-cli data.bt     # reopen existing file
//! ```

use std::io::{self, BufWriter};
use std::path::PathBuf;

use atlastree::{Config, Engine, SyncStrategy};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// AtlasTree CLI
#[derive(Parser, Debug)]
#[command(name = "atlastree-cli")]
#[command(about = "Operator console for an AtlasTree B-tree file")]
#[command(version)]
struct Args {
    /// Tree file
    path: PathBuf,

    /// Minimum degree t; when given, the file is created (or truncated)
    order: Option<u32>,

    /// fsync after every insert/delete
    #[arg(long)]
    sync: bool,
}

fn main() {
    // Logs go to stderr so stdout carries only protocol replies
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("AtlasTree CLI v{}", atlastree::VERSION);

    let mut builder = Config::builder().path(&args.path);
    if let Some(order) = args.order {
        builder = builder.order(order);
    }
    if args.sync {
        builder = builder.sync_strategy(SyncStrategy::EveryOperation);
    }
    let config = builder.build();

    let opened = match args.order {
        Some(_) => Engine::create(config),
        None => Engine::open_existing(config),
    };
    let mut engine = match opened {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", args.path.display(), e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = BufWriter::new(io::stdout().lock());

    match engine.serve(stdin.lock(), &mut stdout) {
        Ok(stats) => {
            tracing::debug!(
                "Session ended: {} commands, {} rejected",
                stats.commands,
                stats.rejected
            );
        }
        Err(e) => {
            tracing::error!("Session aborted: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close tree: {}", e);
        std::process::exit(1);
    }
}
