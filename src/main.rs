//! Wicket - content-addressed upload gateway

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wicket::{config::Args, server, staging::StagingArea, storage::KuboClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("wicket={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("==================================");
    info!("  Wicket - upload gateway");
    info!("==================================");
    info!("Listen: {}", args.listen);
    info!("Storage node: {}", args.ipfs_url);
    info!("Staging dir: {}", args.staging_dir.display());
    info!("Request timeout: {} ms", args.request_timeout_ms);
    info!("Max upload: {} bytes", args.max_upload_bytes);
    info!("==================================");

    // Construct the storage client once; handlers share it by reference
    let store = match KuboClient::new(&args) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    // Prepare the staging area before accepting any upload
    let staging = match StagingArea::new(&args.staging_dir).await {
        Ok(staging) => staging,
        Err(e) => {
            error!(
                "Failed to prepare staging directory {}: {}",
                args.staging_dir.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let state = Arc::new(server::AppState::new(args, store, staging));

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
