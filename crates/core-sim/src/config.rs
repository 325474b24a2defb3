#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    pub starting_capital: f64,
    pub tick_interval_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            starting_capital: 10_000.0,
            tick_interval_ms: 500,
        }
    }
}

impl SimConfig {
    pub fn with_tick_interval_ms(tick_interval_ms: u64) -> Self {
        Self {
            tick_interval_ms,
            ..Self::default()
        }
    }
}
