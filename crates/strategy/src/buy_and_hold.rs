use core_sim::MarketDataset;

use crate::allocation::Allocation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValuationError {
    #[error("step {step} is outside a timeline of {len} timestamps")]
    StepOutOfRange { step: usize, len: usize },
    #[error("no price series for {0}")]
    UnknownTicker(String),
}

pub fn position_value(allocated_cash: f64, start_price: f64, current_price: f64) -> f64 {
    allocated_cash * (current_price / start_price)
}

/// Portfolio value at `step` when every position was bought at step 0 and held.
///
/// Step 0 is the baseline and always equals `starting_capital`. Later steps
/// depend only on the step's price relative to the baseline price, never on
/// intermediate steps. Unallocated cash is carried at face value.
pub fn compute_value(
    step: usize,
    allocation: &Allocation,
    dataset: &MarketDataset,
    starting_capital: f64,
) -> Result<f64, ValuationError> {
    let len = dataset.timeline_len();
    if step >= len {
        return Err(ValuationError::StepOutOfRange { step, len });
    }
    if step == 0 {
        return Ok(starting_capital);
    }

    let mut value = 0.0;
    for (ticker, fraction) in allocation.iter() {
        let (Some(start_price), Some(current_price)) =
            (dataset.baseline_price(ticker), dataset.price(ticker, step))
        else {
            return Err(ValuationError::UnknownTicker(ticker.to_string()));
        };
        value += position_value(starting_capital * fraction, start_price, current_price);
    }

    value += starting_capital * allocation.cash_fraction();
    Ok(value)
}
