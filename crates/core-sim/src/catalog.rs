use std::{collections::HashSet, fs, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetError, MarketData, MarketDataset, MarketEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EraSummary {
    pub id: String,
    pub name: String,
    pub year_start: i32,
    pub year_end: i32,
    pub description: String,
}

/// A named historical period with its own market dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Era {
    pub id: String,
    pub name: String,
    pub year_start: i32,
    pub year_end: i32,
    pub description: String,
    #[serde(flatten)]
    dataset: Arc<MarketDataset>,
}

impl Era {
    pub fn dataset(&self) -> &Arc<MarketDataset> {
        &self.dataset
    }

    pub fn summary(&self) -> EraSummary {
        EraSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            year_start: self.year_start,
            year_end: self.year_end,
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UncheckedEra {
    id: String,
    name: String,
    year_start: i32,
    year_end: i32,
    #[serde(default)]
    description: String,
    market_data: MarketData,
    #[serde(default)]
    events: Vec<MarketEvent>,
}

#[derive(Debug, Deserialize)]
struct UncheckedCatalog {
    eras: Vec<UncheckedEra>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("scenario file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("era `{id}` has an invalid dataset: {source}")]
    InvalidEra {
        id: String,
        #[source]
        source: DatasetError,
    },
    #[error("era id `{0}` is defined more than once")]
    DuplicateEraId(String),
}

/// Source of simulation eras. The JSON file backend is the only one today;
/// a market data API can slot in behind the same trait.
pub trait ScenarioProvider: Send + Sync {
    fn scenarios(&self) -> Vec<EraSummary>;

    fn era(&self, era_id: &str) -> Option<Arc<Era>>;
}

#[derive(Debug, Clone, Default)]
pub struct JsonScenarioProvider {
    eras: Vec<Arc<Era>>,
}

impl JsonScenarioProvider {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: UncheckedCatalog = serde_json::from_str(json)?;

        let mut seen = HashSet::new();
        let mut eras = Vec::with_capacity(catalog.eras.len());
        for unchecked in catalog.eras {
            if !seen.insert(unchecked.id.clone()) {
                return Err(CatalogError::DuplicateEraId(unchecked.id));
            }

            let dataset = MarketDataset::new(unchecked.market_data, unchecked.events).map_err(
                |source| CatalogError::InvalidEra {
                    id: unchecked.id.clone(),
                    source,
                },
            )?;

            eras.push(Arc::new(Era {
                id: unchecked.id,
                name: unchecked.name,
                year_start: unchecked.year_start,
                year_end: unchecked.year_end,
                description: unchecked.description,
                dataset: Arc::new(dataset),
            }));
        }

        Ok(Self { eras })
    }

    pub fn len(&self) -> usize {
        self.eras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eras.is_empty()
    }
}

impl ScenarioProvider for JsonScenarioProvider {
    fn scenarios(&self) -> Vec<EraSummary> {
        self.eras.iter().map(|era| era.summary()).collect()
    }

    fn era(&self, era_id: &str) -> Option<Arc<Era>> {
        self.eras.iter().find(|era| era.id == era_id).cloned()
    }
}
