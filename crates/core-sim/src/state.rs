/// Mutable state of a single simulation run.
///
/// Owned by the run that advances it; a fresh value is built for every run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunState {
    pub step: usize,
    pub starting_capital: f64,
    pub current_value: f64,
}

impl RunState {
    pub fn new(starting_capital: f64) -> Self {
        Self {
            step: 0,
            starting_capital,
            current_value: starting_capital,
        }
    }

    pub fn is_exhausted(&self, timeline_len: usize) -> bool {
        self.step >= timeline_len
    }

    pub fn is_at_or_above_start(&self) -> bool {
        self.current_value >= self.starting_capital
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(crate::SimConfig::default().starting_capital)
    }
}
