use std::sync::Arc;

use core_sim::{MarketDataset, SimConfig};
use strategy::{AllocationError, AllocationInput};

use crate::{
    engine::SimulationRun,
    events::RunId,
    logging::{RunLogEvent, RunLogWriter},
    scheduler::{Scheduler, TaskHandle},
    series::SeriesSink,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StartRunError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("run id space exhausted")]
    RunIdOverflow,
}

struct ActiveRun<H> {
    run_id: RunId,
    handle: H,
}

/// Owns the single active simulation run and its tick handle.
///
/// Starting a run validates the allocation first; a rejected start leaves
/// the previous run and its series untouched. An accepted start cancels the
/// previous run's pending tick before the series is reset.
pub struct SimulationController<Sch, L, S>
where
    Sch: Scheduler,
{
    scheduler: Sch,
    log: L,
    series: S,
    config: SimConfig,
    last_run_id: u64,
    active: Option<ActiveRun<Sch::Handle>>,
}

impl<Sch, L, S> SimulationController<Sch, L, S>
where
    Sch: Scheduler,
    L: RunLogWriter + Clone + Send + 'static,
    S: SeriesSink + Clone + Send + 'static,
{
    pub fn new(scheduler: Sch, log: L, series: S, config: SimConfig) -> Self {
        Self {
            scheduler,
            log,
            series,
            config,
            last_run_id: 0,
            active: None,
        }
    }

    pub fn config(&self) -> SimConfig {
        self.config
    }

    pub fn start_run(
        &mut self,
        dataset: Arc<MarketDataset>,
        input: AllocationInput,
    ) -> Result<RunId, StartRunError> {
        let allocation = input
            .resolve()
            .and_then(|allocation| {
                allocation.ensure_tickers_present(&dataset)?;
                Ok(allocation)
            })
            .map_err(|err| self.reject(err))?;

        let run_id = self
            .last_run_id
            .checked_add(1)
            .map(RunId)
            .ok_or(StartRunError::RunIdOverflow)?;
        self.last_run_id = run_id.0;

        self.cancel();
        self.series.begin_run(run_id);
        self.log.write(RunLogEvent::run_started(run_id));
        tracing::info!(
            run_id = run_id.0,
            steps = dataset.timeline_len(),
            invested = allocation.total(),
            "simulation run started"
        );

        let run = SimulationRun::new(
            run_id,
            dataset,
            allocation,
            self.config,
            self.log.clone(),
            self.series.clone(),
        );
        let handle = self.scheduler.schedule(Box::new(run));
        self.active = Some(ActiveRun { run_id, handle });

        Ok(run_id)
    }

    /// Stops the active run's pending ticks, if there is one.
    pub fn cancel(&mut self) {
        if let Some(mut active) = self.active.take() {
            if !active.handle.is_finished() {
                tracing::info!(run_id = active.run_id.0, "cancelling simulation run");
            }
            active.handle.cancel();
        }
    }

    pub fn active_run_id(&self) -> Option<RunId> {
        self.active.as_ref().map(|active| active.run_id)
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    fn reject(&mut self, err: AllocationError) -> StartRunError {
        let event = match &err {
            AllocationError::OverAllocation { .. } => RunLogEvent::over_allocation(),
            other => RunLogEvent::run_rejected(other),
        };
        tracing::warn!(error = %err, "simulation run rejected");
        self.log.write(event);
        StartRunError::Allocation(err)
    }
}
