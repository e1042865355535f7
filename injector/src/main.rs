//! Main entry point for the injector binary
//!
//! Wires the real store implementations into the pipeline driver and
//! runs the periodic injection loop until Ctrl+C.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use injector::{
    services::{CassandraLeadStore, RedisQueueStore},
    Injector, InjectorConfig, InjectorResult, ZipCodeCache,
};

/// Lead injector for outbound dialing campaigns
#[derive(Parser)]
#[command(name = "injector")]
#[command(about = "Moves dialable leads into per-workspace call queues on a fixed cycle")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Seconds between injection cycles
    #[arg(long, default_value = "300")]
    pub interval_secs: u64,

    /// Upper bound on concurrently processed workspaces
    #[arg(long, default_value = "4")]
    pub workers: usize,

    /// Representative zip code for schedule evaluation (server-local
    /// time is used when omitted)
    #[arg(long)]
    pub schedule_zip: Option<String>,

    /// Path to a GeoNames-format zip code TSV to preload
    #[arg(long)]
    pub zip_data: Option<PathBuf>,

    /// Run a single injection cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[tokio::main]
async fn main() -> InjectorResult<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    shared::logging::init_tracing(Some(&args.log_level));

    if args.interval_secs == 0 {
        return Err(injector::InjectorError::config("interval_secs"));
    }

    let zip_cache = Arc::new(ZipCodeCache::new());
    if let Some(path) = &args.zip_data {
        let reader = BufReader::new(File::open(path)?);
        let loaded = zip_cache.load_from_tsv(reader)?;
        info!("loaded {} zip codes from {}", loaded, path.display());
    } else if args.schedule_zip.is_some() {
        warn!("--schedule-zip set without --zip-data; schedule lookups will fail");
    }

    // Both stores must be reachable at startup; there is no point
    // running cycles without them.
    let contact_points = shared::config::cassandra_contact_points();
    let keyspace = shared::config::cassandra_keyspace();
    let lead_store = Arc::new(CassandraLeadStore::connect(&contact_points, &keyspace).await?);

    let redis_url = shared::config::redis_url();
    let queue_store = Arc::new(RedisQueueStore::connect(&redis_url).await?);

    let config = InjectorConfig {
        cycle_interval: Duration::from_secs(args.interval_secs),
        max_workspace_workers: args.workers,
        schedule_zip: args.schedule_zip.clone(),
    };

    let mut injector = Injector::new(lead_store, queue_store, zip_cache, config);

    if args.once {
        let summary = injector.run_cycle().await?;
        info!(
            "single cycle finished: {} leads injected across {} campaigns",
            summary.leads_injected, summary.campaigns_processed
        );
        return Ok(());
    }

    // Graceful shutdown on Ctrl+C.
    let shutdown_sender = injector.get_shutdown_sender();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C signal");
                let _ = shutdown_sender.send(()).await;
            }
            Err(err) => {
                error!("signal handling failed: {}", err);
            }
        }
    });

    injector.run().await?;

    info!("injector stopped gracefully");
    Ok(())
}
