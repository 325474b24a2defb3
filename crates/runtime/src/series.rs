use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::events::RunId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub step: usize,
    pub label: String,
    pub value: f64,
}

/// Receives the portfolio value series, one point per tick.
pub trait SeriesSink {
    /// Drops any previous points; called before the first tick of `run_id`.
    fn begin_run(&mut self, run_id: RunId);

    fn push(&mut self, run_id: RunId, point: SeriesPoint);

    fn finish(&mut self, run_id: RunId);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesSnapshot {
    pub run_id: Option<RunId>,
    pub points: Vec<SeriesPoint>,
    pub completed: bool,
}

/// Series buffer shared between the controller, the ticking run and readers.
///
/// Writes tagged with a run id other than the current one are dropped, so a
/// tick from a cancelled run that was already in flight cannot leak into the
/// next run's series.
#[derive(Debug, Clone, Default)]
pub struct SharedSeries {
    inner: Arc<Mutex<SeriesSnapshot>>,
}

impl SharedSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SeriesSnapshot {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn start(&self, run_id: RunId) {
        let mut series = self.lock();
        *series = SeriesSnapshot {
            run_id: Some(run_id),
            points: Vec::new(),
            completed: false,
        };
    }

    /// True when `run_id` is the run the series was last started for,
    /// finished or not.
    pub fn is_current(&self, run_id: RunId) -> bool {
        self.lock().run_id == Some(run_id)
    }

    /// Appends `point` if `run_id` is the current, unfinished run.
    pub fn record(&self, run_id: RunId, point: SeriesPoint) -> bool {
        let mut series = self.lock();
        if series.run_id != Some(run_id) || series.completed {
            return false;
        }
        series.points.push(point);
        true
    }

    pub fn mark_finished(&self, run_id: RunId) -> bool {
        let mut series = self.lock();
        if series.run_id != Some(run_id) || series.completed {
            return false;
        }
        series.completed = true;
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SeriesSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SeriesSink for SharedSeries {
    fn begin_run(&mut self, run_id: RunId) {
        self.start(run_id);
    }

    fn push(&mut self, run_id: RunId, point: SeriesPoint) {
        self.record(run_id, point);
    }

    fn finish(&mut self, run_id: RunId) {
        self.mark_finished(run_id);
    }
}
