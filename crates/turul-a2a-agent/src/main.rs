//! turul-a2a-agent binary

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use turul_a2a_agent::logging::init_tracing;
use turul_a2a_agent::{Settings, build_llm_backend, build_server};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    init_tracing(&settings.log_level)?;
    debug!("Loaded settings: {:?}", settings);

    info!("Starting {} v{}", settings.app_name, settings.app_version);
    let llm = build_llm_backend(&settings)?;
    let server = build_server(&settings, llm)?;

    info!("Listening on http://{}", server.config().bind_address);
    server.run().await?;
    Ok(())
}
