use core_sim::MarketEvent;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step: usize,
    pub label: String,
    pub value: f64,
    pub events: Vec<MarketEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    Advanced(StepRecord),
    Exhausted,
}
