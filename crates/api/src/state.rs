use std::sync::Arc;

use core_sim::{Era, EraSummary, ScenarioProvider, SimConfig};
use runtime::{IntervalScheduler, RunId, SeriesSnapshot, SimulationController};
use serde::Serialize;
use strategy::AllocationInput;
use tokio::sync::{broadcast, Mutex};

use crate::{
    error::{AppError, AppResult},
    feed::{RunFeed, ServerEvent},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub type AppController = SimulationController<IntervalScheduler, RunFeed, RunFeed>;

struct RunSlot {
    controller: AppController,
    era_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StartedRun {
    pub run_id: RunId,
    pub era_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSnapshot {
    pub era_id: String,
    pub running: bool,
    #[serde(flatten)]
    pub series: SeriesSnapshot,
}

#[derive(Clone)]
pub struct AppState {
    scenarios: Arc<dyn ScenarioProvider>,
    feed: RunFeed,
    run: Arc<Mutex<RunSlot>>,
}

impl AppState {
    pub fn new(scenarios: Arc<dyn ScenarioProvider>, config: SimConfig) -> Self {
        let feed = RunFeed::new(config.starting_capital, EVENT_CHANNEL_CAPACITY);
        let controller = SimulationController::new(
            IntervalScheduler::from_millis(config.tick_interval_ms),
            feed.clone(),
            feed.clone(),
            config,
        );

        Self {
            scenarios,
            feed,
            run: Arc::new(Mutex::new(RunSlot {
                controller,
                era_id: None,
            })),
        }
    }

    pub fn scenarios(&self) -> Vec<EraSummary> {
        self.scenarios.scenarios()
    }

    pub fn era(&self, era_id: &str) -> AppResult<Arc<Era>> {
        self.scenarios.era(era_id).ok_or(AppError::EraNotFound)
    }

    /// Starts a run over `era_id`, replacing the current run if one is active.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start_run(&self, era_id: &str, input: AllocationInput) -> AppResult<StartedRun> {
        let era = self.era(era_id)?;
        let mut slot = self.run.lock().await;

        let run_id = slot
            .controller
            .start_run(Arc::clone(era.dataset()), input)?;
        slot.era_id = Some(era.id.clone());

        Ok(StartedRun {
            run_id,
            era_id: era.id.clone(),
        })
    }

    pub async fn cancel_run(&self) -> AppResult<()> {
        let mut slot = self.run.lock().await;
        if slot.era_id.is_none() {
            return Err(AppError::NoRun);
        }
        slot.controller.cancel();
        Ok(())
    }

    pub async fn current_run(&self) -> AppResult<RunSnapshot> {
        let slot = self.run.lock().await;
        let era_id = slot.era_id.clone().ok_or(AppError::NoRun)?;

        Ok(RunSnapshot {
            era_id,
            running: slot.controller.is_running(),
            series: self.feed.series().snapshot(),
        })
    }

    pub async fn active_run_id(&self) -> Option<RunId> {
        self.run.lock().await.controller.active_run_id()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ServerEvent> {
        self.feed.subscribe()
    }
}
