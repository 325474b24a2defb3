mod config;
mod wiring;

use std::{error::Error, path::Path, sync::Arc};

use core_sim::{CatalogError, JsonScenarioProvider};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = config::Config::from_env()?;
    let scenarios = load_scenarios(&config.data_path)?;
    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.listen_addr,
        tick_ms = config.tick_interval_ms,
        "time machine listening"
    );

    axum::serve(
        listener,
        wiring::build_app(Arc::new(scenarios), config.sim_config()),
    )
    .await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn load_scenarios(path: &str) -> Result<JsonScenarioProvider, CatalogError> {
    let provider = JsonScenarioProvider::from_path(Path::new(path))?;
    if provider.is_empty() {
        tracing::warn!(path, "scenario file defines no eras");
    } else {
        tracing::info!(path, eras = provider.len(), "loaded scenarios");
    }
    Ok(provider)
}
