use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// A calendar event that is surfaced when the simulation reaches its date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub date: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub timestamps: Vec<String>,
    pub prices: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UncheckedDataset {
    pub market_data: MarketData,
    #[serde(default)]
    pub events: Vec<MarketEvent>,
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("timestamp sequence is empty")]
    EmptyTimeline,
    #[error("timestamp `{0}` appears more than once")]
    DuplicateTimestamp(String),
    #[error("price series for {ticker} has {actual} entries, expected {expected}")]
    SeriesLengthMismatch {
        ticker: String,
        expected: usize,
        actual: usize,
    },
    #[error("price {index} of {ticker} is not a finite number")]
    NonFinitePrice { ticker: String, index: usize },
    #[error("baseline price of {ticker} must be positive")]
    NonPositiveBaseline { ticker: String },
    #[error("dataset is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Price history, timeline and events for one simulation, checked once on load.
///
/// Every price series has exactly one entry per timestamp and a positive
/// baseline, so stepping code can index without further checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedDataset")]
pub struct MarketDataset {
    market_data: MarketData,
    events: Vec<MarketEvent>,
}

impl TryFrom<UncheckedDataset> for MarketDataset {
    type Error = DatasetError;

    fn try_from(unchecked: UncheckedDataset) -> Result<Self, Self::Error> {
        Self::new(unchecked.market_data, unchecked.events)
    }
}

impl MarketDataset {
    pub fn new(market_data: MarketData, events: Vec<MarketEvent>) -> Result<Self, DatasetError> {
        validate_timeline(&market_data.timestamps)?;

        let expected = market_data.timestamps.len();
        for (ticker, series) in &market_data.prices {
            if series.len() != expected {
                return Err(DatasetError::SeriesLengthMismatch {
                    ticker: ticker.clone(),
                    expected,
                    actual: series.len(),
                });
            }
            if let Some(index) = series.iter().position(|price| !price.is_finite()) {
                return Err(DatasetError::NonFinitePrice {
                    ticker: ticker.clone(),
                    index,
                });
            }
            if series[0] <= 0.0 {
                return Err(DatasetError::NonPositiveBaseline {
                    ticker: ticker.clone(),
                });
            }
        }

        Ok(Self {
            market_data,
            events,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let unchecked: UncheckedDataset = serde_json::from_str(json)?;
        Self::try_from(unchecked)
    }

    pub fn market_data(&self) -> &MarketData {
        &self.market_data
    }

    pub fn timeline_len(&self) -> usize {
        self.market_data.timestamps.len()
    }

    pub fn timestamps(&self) -> &[String] {
        &self.market_data.timestamps
    }

    pub fn timestamp(&self, step: usize) -> Option<&str> {
        self.market_data.timestamps.get(step).map(String::as_str)
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.market_data.prices.keys().map(String::as_str)
    }

    pub fn has_ticker(&self, ticker: &str) -> bool {
        self.market_data.prices.contains_key(ticker)
    }

    pub fn price(&self, ticker: &str, step: usize) -> Option<f64> {
        self.market_data
            .prices
            .get(ticker)
            .and_then(|series| series.get(step))
            .copied()
    }

    pub fn baseline_price(&self, ticker: &str) -> Option<f64> {
        self.price(ticker, 0)
    }

    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    /// Events dated exactly `date`, in dataset order.
    pub fn events_on<'a>(&'a self, date: &'a str) -> impl Iterator<Item = &'a MarketEvent> {
        self.events.iter().filter(move |event| event.date == date)
    }

    /// Case-insensitive substring match over ticker symbols.
    pub fn search_tickers(&self, query: &str) -> Vec<&str> {
        let query = query.to_uppercase();
        self.tickers()
            .filter(|ticker| ticker.to_uppercase().contains(&query))
            .collect()
    }
}

fn validate_timeline(timestamps: &[String]) -> Result<(), DatasetError> {
    if timestamps.is_empty() {
        return Err(DatasetError::EmptyTimeline);
    }

    let mut seen = HashSet::with_capacity(timestamps.len());
    for timestamp in timestamps {
        if !seen.insert(timestamp.as_str()) {
            return Err(DatasetError::DuplicateTimestamp(timestamp.clone()));
        }
    }

    Ok(())
}
