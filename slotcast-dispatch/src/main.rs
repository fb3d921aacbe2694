//! slotcast-dispatch - Background daemon for slot-based posting
//!
//! Monitors the post queue and delivers queued posts to their target
//! platforms when their scheduled slot arrives.

use clap::Parser;
use libslotcast::dispatch::Dispatcher;
use libslotcast::publish::create_publishers;
use libslotcast::{Config, Database, Result, SlotcastError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "slotcast-dispatch")]
#[command(version)]
#[command(about = "Background daemon for slot-based posting")]
#[command(long_about = "\
slotcast-dispatch - Background daemon for slot-based posting

DESCRIPTION:
    slotcast-dispatch is a long-running daemon that monitors the Slotcast
    queue and delivers queued posts when their scheduled slot arrives.

    It polls the database at regular intervals, attempts each due post
    independently, and marks successfully delivered posts as published.
    Posts that cannot be delivered (the user has not connected the target
    platform, or the platform rejected the post) stay queued and are
    retried on later ticks.

USAGE:
    # Run in foreground (logs to stderr)
    slotcast-dispatch

    # Run with custom poll interval
    slotcast-dispatch --poll-interval 30

    # Enable verbose logging
    slotcast-dispatch --verbose

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current tick)

CONFIGURATION:
    Configuration file: ~/.config/slotcast/config.toml
    Database location: ~/.local/share/slotcast/queue.db

    [dispatch]
    poll_interval = 60  # seconds between ticks

    Override with environment variables:
        SLOTCAST_CONFIG      - Path to config file
        SLOTCAST_LOG_FORMAT  - Log format: text, json, pretty
        SLOTCAST_LOG_LEVEL   - Log level filter

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Configuration error
")]
struct Cli {
    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    #[arg(help = "How often to check for due posts (default: from config)")]
    poll_interval: Option<u64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    #[arg(help = "Enable verbose logging (useful for debugging)")]
    verbose: bool,

    /// Run one tick and exit (for testing)
    #[arg(long, hide = true)]
    #[arg(help = "Dispatch due posts once and exit (for testing)")]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libslotcast::logging::init_default(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;
    let registry = create_publishers(&config);

    if registry.is_empty() {
        info!("no platforms enabled; all queued posts will wait");
    } else {
        info!(platforms = ?registry.platforms(), "publishers ready");
    }

    let dispatcher = Dispatcher::new(db, registry);

    info!("slotcast-dispatch daemon starting");

    if cli.once {
        let now = chrono::Utc::now().naive_utc();
        let report = dispatcher.run_tick(now).await?;
        info!(
            due = report.due,
            published = report.published,
            "dispatched once, exiting"
        );
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let poll_interval = cli.poll_interval.unwrap_or(config.dispatch.poll_interval);
    dispatcher.run_loop(poll_interval, shutdown).await?;

    info!("slotcast-dispatch daemon stopped");
    Ok(())
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])
        .map_err(|e| SlotcastError::InvalidInput(format!("Signal setup failed: {}", e)))?;

    let shutdown_clone = shutdown.clone();
    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping gracefully...");
                    shutdown_clone.store(true, Ordering::Relaxed);
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(())
}
