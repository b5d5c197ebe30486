mod server;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use nfreg_core::{bootstrap::load_config, logging};

use server::NfRegServer;

#[derive(Parser, Debug)]
#[command(name = "nfreg")]
#[command(about = "NF registration and heartbeat manager for the NRF", long_about = None)]
struct Args {
    /// Path to the YAML config file
    #[arg(short, long, env = "NFREG_CONFIG_PATH")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load and validate configuration
    let config = load_config(args.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!(version = env!("CARGO_PKG_VERSION"), "nfreg starting...");
    config.log_loaded();
    info!("NF instance: {} ({})", config.nf.instance_id, config.nf.nf_type);
    info!("SBI address: {}", config.sbi_address());
    info!("NRF: {}", config.nrf.uri);

    // 3. Run until a shutdown signal arrives
    let server = NfRegServer::new(config)?;
    server.run().await
}
