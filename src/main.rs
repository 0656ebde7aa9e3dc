//! watchbell: watchkeeping chimes and alerts for Linux.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use watchbell::alert::{day_schedule, AlertMode};
use watchbell::config::Config;
use watchbell::service::WatchService;

#[derive(Parser, Debug)]
#[command(name = "watchbell", about = "Ship's bell chimes and watch alerts")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable or disable the half-hour chimes (overrides config)
    #[arg(long)]
    chimes: Option<bool>,

    /// Repeating alert: off, every_5, every_10 or every_15 (overrides config)
    #[arg(short, long)]
    alert_mode: Option<AlertMode>,

    /// Print today's chime and alert schedule, then exit
    #[arg(long)]
    schedule: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging (keep audio decoder internals quiet)
    let filter = if args.verbose {
        EnvFilter::new("debug,symphonia=warn,rodio=info")
    } else {
        EnvFilter::new("info,symphonia=warn,rodio=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::load(args.config.as_deref());
    if let Some(chimes) = args.chimes {
        config.watch.chimes = chimes;
    }
    if let Some(mode) = args.alert_mode {
        config.watch.alert_mode = mode;
    }

    if args.schedule {
        for (day, selection) in day_schedule(config.watch.chimes, config.watch.alert_mode) {
            println!("{day}  {selection}");
        }
        return Ok(());
    }

    info!("watchbell starting");
    info!("Config: {:?}", config.watch);

    WatchService::new(config).run().await?;

    Ok(())
}
