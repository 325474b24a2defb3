use std::collections::BTreeMap;

use core_sim::MarketDataset;
use serde::{Deserialize, Serialize};

/// Slack allowed when fractions built from percentages do not sum exactly.
pub const ALLOCATION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("allocation exceeds 100% (total fraction {total})")]
    OverAllocation { total: f64 },
    #[error("fraction for {ticker} must be a finite value between 0 and 1")]
    InvalidFraction { ticker: String },
    #[error("ticker {0} has no price series in this dataset")]
    UnknownTicker(String),
}

/// Share of the starting capital bought into each ticker at step 0.
///
/// Fractions are each within `[0, 1]` and sum to at most `1.0`; whatever is
/// left over stays in cash.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Allocation {
    weights: BTreeMap<String, f64>,
}

impl Allocation {
    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self, AllocationError> {
        for (ticker, fraction) in &weights {
            if !fraction.is_finite() || !(0.0..=1.0).contains(fraction) {
                return Err(AllocationError::InvalidFraction {
                    ticker: ticker.clone(),
                });
            }
        }

        let total: f64 = weights.values().sum();
        if total > 1.0 + ALLOCATION_TOLERANCE {
            return Err(AllocationError::OverAllocation { total });
        }

        Ok(Self { weights })
    }

    /// Builds an allocation from whole percentages, as picked on a slider.
    pub fn from_percentages(percentages: BTreeMap<String, u32>) -> Result<Self, AllocationError> {
        let weights = percentages
            .into_iter()
            .map(|(ticker, pct)| (ticker, f64::from(pct) / 100.0))
            .collect();
        Self::new(weights)
    }

    pub fn all_cash() -> Self {
        Self::default()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn cash_fraction(&self) -> f64 {
        1.0 - self.total()
    }

    pub fn fraction(&self, ticker: &str) -> Option<f64> {
        self.weights.get(ticker).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights
            .iter()
            .map(|(ticker, fraction)| (ticker.as_str(), *fraction))
    }

    pub fn ensure_tickers_present(&self, dataset: &MarketDataset) -> Result<(), AllocationError> {
        match self.weights.keys().find(|ticker| !dataset.has_ticker(ticker)) {
            Some(ticker) => Err(AllocationError::UnknownTicker(ticker.clone())),
            None => Ok(()),
        }
    }
}

/// Allocation as requested by a caller, before validation.
///
/// Deserializes from `{"allocation": {ticker: fraction}}` or
/// `{"allocation_pct": {ticker: percent}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum AllocationInput {
    #[serde(rename = "allocation")]
    Fractions(BTreeMap<String, f64>),
    #[serde(rename = "allocation_pct")]
    Percentages(BTreeMap<String, u32>),
}

impl AllocationInput {
    pub fn resolve(self) -> Result<Allocation, AllocationError> {
        match self {
            Self::Fractions(weights) => Allocation::new(weights),
            Self::Percentages(percentages) => Allocation::from_percentages(percentages),
        }
    }
}
