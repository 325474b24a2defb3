use std::sync::Arc;

use api::AppState;
use axum::{routing::get, Router};
use core_sim::{ScenarioProvider, SimConfig};

pub fn build_app(scenarios: Arc<dyn ScenarioProvider>, sim_config: SimConfig) -> Router {
    api::app(AppState::new(scenarios, sim_config)).route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
