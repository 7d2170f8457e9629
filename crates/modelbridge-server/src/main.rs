//! ModelBridge Server - Main entry point

use anyhow::Result;
use modelbridge_common::logging::{init_logging, LogConfig};
use tracing::info;

use modelbridge_server::{api, config::Config, ingest::IngestService};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("modelbridge-server")
        .filter_directives("modelbridge_server=debug,tower_http=debug")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    info!("Starting ModelBridge Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let ingest = IngestService::new(&config.aps)?;

    api::serve(config, ingest).await
}
