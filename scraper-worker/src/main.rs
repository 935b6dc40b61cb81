//! Scraper worker binary.

use std::env;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scraper_worker::browser::HttpBrowser;
use scraper_worker::config::Config;
use scraper_worker::control_plane::{ApiKey, ControlPlaneClient};
use scraper_worker::scrapers::builtin_registry;
use scraper_worker::worker::{watch_interrupts, Interrupt};
use scraper_worker::{Error, Worker, WorkerIdentity, WorkerSettings};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("scraper-worker {}", VERSION);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Make sure config.toml exists or set SCRAPER__SCRAPER__CUSTOM_ID.",
            e
        )
    })?;

    let Some(api_key) = config.control_plane.api_key() else {
        return Err("API key is required: set API_KEY or SCRAPER__CONTROL_PLANE__API_KEY".into());
    };
    let custom_id = config.scraper.custom_id.clone();
    tracing::info!(
        "Starting scraper-worker: {} against {}",
        custom_id,
        config.control_plane.base_url
    );

    let browser = Arc::new(HttpBrowser::new(&config.browser)?);
    let registry = builtin_registry(browser);
    let handlers = registry.get(&custom_id).ok_or_else(|| {
        tracing::error!("Known scrapers: {}", registry.custom_ids().join(", "));
        Error::UnknownScraper(custom_id.clone())
    })?;

    let identity = WorkerIdentity::new(custom_id, ApiKey::new(api_key));
    let client = ControlPlaneClient::new(&config.control_plane.base_url, identity.api_key().clone());
    tracing::info!("Instance id: {}", identity.instance_id());

    let worker = Worker::bootstrap(client, identity, handlers, WorkerSettings::from(&config.worker))
        .await
        .map_err(|e| {
            tracing::error!("Failed to configure scraper: {}", e);
            e
        })?;

    // First Ctrl-C stops between work items, the second exits right away
    let shutdown = worker.shutdown_token();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, shutdown).await == Interrupt::Forced {
            std::process::exit(130);
        }
    });

    worker.run().await?;

    Ok(())
}
