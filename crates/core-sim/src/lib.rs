mod catalog;
mod config;
mod dataset;
mod state;

pub use catalog::{CatalogError, Era, EraSummary, JsonScenarioProvider, ScenarioProvider};
pub use config::SimConfig;
pub use dataset::{DatasetError, MarketData, MarketDataset, MarketEvent, UncheckedDataset};
pub use state::RunState;
