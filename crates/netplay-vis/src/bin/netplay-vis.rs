//! Netplay view server
//!
//! Open a network and serve the editing and playback frontend.
//!
//! ```text
//! netplay-vis [port] [network.json]
//! ```

use std::env;

use netplay_vis::{NetworkStore, ViewConfig, VisServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netplay_vis=info,netplay_topology=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ViewConfig::from_env()?;

    // Parse command line args
    let args: Vec<String> = env::args().collect();

    let port: u16 = match args.get(1) {
        Some(raw) => raw.parse()?,
        None => config.port,
    };

    let store = NetworkStore::new();
    let guid = match args.get(2) {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            let guid = store.import(path.as_str(), &json)?;
            tracing::info!(%path, network = %guid, "network imported");
            guid
        }
        None => store.create("Untitled network"),
    };

    let server = VisServer::new(&config, store, guid)?;
    server.serve(port).await?;

    Ok(())
}
