use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Complete,
}

/// Work advanced one step per tick until it reports completion.
pub trait PeriodicTask: Send + 'static {
    fn on_tick(&mut self) -> TickOutcome;

    /// Called once, right after the tick that returned `Complete`.
    fn on_complete(&mut self);
}

pub trait TaskHandle: Send {
    /// Stops further ticks. Cancelling a finished task is a no-op.
    fn cancel(&mut self);

    fn is_finished(&self) -> bool;
}

pub trait Scheduler {
    type Handle: TaskHandle;

    fn schedule(&mut self, task: Box<dyn PeriodicTask>) -> Self::Handle;
}

/// Ticks on a tokio interval. The first tick fires one period after scheduling.
#[derive(Debug, Clone, Copy)]
pub struct IntervalScheduler {
    period: Duration,
}

impl IntervalScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn from_millis(period_ms: u64) -> Self {
        Self::new(Duration::from_millis(period_ms))
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Scheduler for IntervalScheduler {
    type Handle = IntervalHandle;

    fn schedule(&mut self, task: Box<dyn PeriodicTask>) -> Self::Handle {
        IntervalHandle {
            join: tokio::spawn(run_periodic(task, self.period)),
        }
    }
}

async fn run_periodic(mut task: Box<dyn PeriodicTask>, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if task.on_tick() == TickOutcome::Complete {
            task.on_complete();
            return;
        }
    }
}

#[derive(Debug)]
pub struct IntervalHandle {
    join: JoinHandle<()>,
}

impl TaskHandle for IntervalHandle {
    fn cancel(&mut self) {
        self.join.abort();
    }

    fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

struct ManualSlot {
    generation: u64,
    task: Box<dyn PeriodicTask>,
}

#[derive(Default)]
struct ManualState {
    generation: u64,
    slot: Option<ManualSlot>,
}

/// Scheduler driven by explicit `tick` calls instead of a clock.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one tick of the scheduled task, if any.
    pub fn tick(&self) -> Option<TickOutcome> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = state.slot.as_mut()?;

        let outcome = slot.task.on_tick();
        if outcome == TickOutcome::Complete {
            slot.task.on_complete();
            state.slot = None;
        }
        Some(outcome)
    }

    /// Ticks until the scheduled task completes or is gone; returns the tick count.
    pub fn run_until_idle(&self) -> usize {
        let mut ticks = 0;
        while let Some(outcome) = self.tick() {
            ticks += 1;
            if outcome == TickOutcome::Complete {
                break;
            }
        }
        ticks
    }

    pub fn has_pending_task(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slot
            .is_some()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualHandle;

    fn schedule(&mut self, task: Box<dyn PeriodicTask>) -> Self::Handle {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.generation += 1;
        let generation = state.generation;
        state.slot = Some(ManualSlot { generation, task });

        ManualHandle {
            state: Arc::clone(&self.state),
            generation,
        }
    }
}

pub struct ManualHandle {
    state: Arc<Mutex<ManualState>>,
    generation: u64,
}

impl TaskHandle for ManualHandle {
    fn cancel(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state
            .slot
            .as_ref()
            .is_some_and(|slot| slot.generation == self.generation)
        {
            state.slot = None;
        }
    }

    fn is_finished(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        !state
            .slot
            .as_ref()
            .is_some_and(|slot| slot.generation == self.generation)
    }
}
