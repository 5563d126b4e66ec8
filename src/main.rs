//! health-collector daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   collector.toml ──▶ config ──▶ store (targets) ◀──── watcher (reload)
//!                                   │
//!   Scheduler tick ──▶ Collector ───┤
//!                        │          ▼
//!                        ├──▶ resolver ──▶ transport ──▶ target /health
//!                        ├──▶ notifications (debounce, sink)
//!                        └──▶ reconciler ──▶ store (executions, history)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use health_collector::collector::{Collector, Scheduler};
use health_collector::config::{load_config, Config, ConfigWatcher};
use health_collector::lifecycle::{wait_for_signal, Shutdown};
use health_collector::notifications::RecordingNotifier;
use health_collector::observability::{logging, metrics};
use health_collector::report::ReqwestTransport;
use health_collector::store::{InMemoryStore, Store};
use health_collector::targets::{AddressCache, EndpointResolver, StaticHostAddress};

#[derive(Parser)]
#[command(name = "health-collector")]
#[command(about = "Collects health reports from configured endpoints", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single collection cycle and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        targets = config.targets.len(),
        interval_secs = config.collector.interval_secs,
        "health-collector starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = match &config.storage.snapshot_path {
        Some(path) => InMemoryStore::open_snapshot(path).await?,
        None => InMemoryStore::new(),
    };
    store.sync_configurations(config.target_configurations()).await;
    let shared: Arc<dyn Store> = Arc::new(store.clone());

    let cache = AddressCache::new();
    let resolver = EndpointResolver::new(
        cache,
        Arc::new(StaticHostAddress::new(&config.host.listen_address)),
    );
    let transport = Arc::new(ReqwestTransport::new(
        config.collector.request_timeout(),
        &config.collector.user_agent,
    )?);
    let notifier = Arc::new(
        RecordingNotifier::new(shared.clone()).with_min_interval(config.collector.min_between_notifications()),
    );
    let collector = Arc::new(Collector::new(
        shared,
        resolver,
        transport,
        notifier,
        config.collector.clone(),
    ));

    let shutdown = Shutdown::new();

    if cli.once {
        let cycle = collector.collect(&shutdown.subscribe()).await?;
        for outcome in &cycle.outcomes {
            tracing::info!(target_name = %outcome.name, status = %outcome.status, "Collected");
        }
        for failure in &cycle.failures {
            tracing::error!(error = %failure, "Target failed");
        }
        return Ok(());
    }

    let (mut updates, _watcher) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(w) => (updates, Some(w)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    (updates, None)
                }
            }
        }
        None => (tokio::sync::mpsc::unbounded_channel().1, None),
    };

    let reload_store = store.clone();
    let reload_collector = collector.clone();
    let reload_shutdown = shutdown.subscribe();
    let reloader = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(next) = updates.recv() => {
                    apply_reload(&reload_store, &reload_collector, next).await;
                }
                _ = reload_shutdown.cancelled() => break,
            }
        }
    });

    let scheduler = tokio::spawn(
        Scheduler::new(collector.clone(), config.collector.interval()).run(shutdown.subscribe()),
    );

    wait_for_signal().await;
    shutdown.trigger();

    scheduler.await?;
    reloader.await?;
    store.flush().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn apply_reload(store: &InMemoryStore, collector: &Collector, config: Config) {
    let stale = store.sync_configurations(config.target_configurations()).await;
    for id in &stale {
        collector.resolver().evict(*id);
    }
    collector.update_settings(config.collector);
    tracing::info!(
        targets = config.targets.len(),
        evicted = stale.len(),
        "Configuration reloaded"
    );
}
