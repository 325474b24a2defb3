pub mod controller;
pub mod engine;
pub mod events;
pub mod export;
pub mod logging;
pub mod scheduler;
pub mod series;

pub use controller::{SimulationController, StartRunError};
pub use engine::SimulationRun;
pub use events::{RunId, StepRecord, StepResult};
pub use logging::{
    InMemoryRunLogWriter, RunLogEvent, RunLogEventKind, RunLogWriter, TracingRunLogWriter,
};
pub use scheduler::{
    IntervalHandle, IntervalScheduler, ManualHandle, ManualScheduler, PeriodicTask, Scheduler,
    TaskHandle, TickOutcome,
};
pub use series::{SeriesPoint, SeriesSink, SeriesSnapshot, SharedSeries};
