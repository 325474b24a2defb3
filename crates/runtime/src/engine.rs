use std::sync::Arc;

use core_sim::{MarketDataset, RunState, SimConfig};
use strategy::{compute_value, Allocation, ValuationError};

use crate::{
    events::{RunId, StepRecord, StepResult},
    logging::{RunLogEvent, RunLogWriter},
    scheduler::{PeriodicTask, TickOutcome},
    series::{SeriesPoint, SeriesSink},
};

/// One buy-and-hold replay over a dataset, advanced one timestamp per tick.
pub struct SimulationRun<L, S> {
    run_id: RunId,
    dataset: Arc<MarketDataset>,
    allocation: Allocation,
    state: RunState,
    log: L,
    series: S,
    aborted: bool,
    completion_reported: bool,
}

impl<L, S> SimulationRun<L, S>
where
    L: RunLogWriter,
    S: SeriesSink,
{
    pub fn new(
        run_id: RunId,
        dataset: Arc<MarketDataset>,
        allocation: Allocation,
        config: SimConfig,
        log: L,
        series: S,
    ) -> Self {
        Self {
            run_id,
            dataset,
            allocation,
            state: RunState::new(config.starting_capital),
            log,
            series,
            aborted: false,
            completion_reported: false,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Values the current step, publishes it and any events dated on it,
    /// then moves to the next step.
    pub fn step_once(&mut self) -> Result<StepResult, ValuationError> {
        let step = self.state.step;
        let Some(label) = self.dataset.timestamp(step).map(str::to_owned) else {
            return Ok(StepResult::Exhausted);
        };

        let value = compute_value(
            step,
            &self.allocation,
            &self.dataset,
            self.state.starting_capital,
        )?;
        self.state.current_value = value;

        self.series.push(
            self.run_id,
            SeriesPoint {
                step,
                label: label.clone(),
                value,
            },
        );

        let events: Vec<_> = self.dataset.events_on(&label).cloned().collect();
        for event in &events {
            self.log
                .write(RunLogEvent::event_surfaced(self.run_id, step, event));
        }

        self.state.step += 1;
        Ok(StepResult::Advanced(StepRecord {
            step,
            label,
            value,
            events,
        }))
    }
}

impl<L, S> PeriodicTask for SimulationRun<L, S>
where
    L: RunLogWriter + Send + 'static,
    S: SeriesSink + Send + 'static,
{
    fn on_tick(&mut self) -> TickOutcome {
        match self.step_once() {
            Ok(StepResult::Advanced(record)) => {
                tracing::debug!(
                    run_id = self.run_id.0,
                    step = record.step,
                    label = %record.label,
                    value = record.value,
                    "simulation step"
                );
                TickOutcome::Continue
            }
            Ok(StepResult::Exhausted) => TickOutcome::Complete,
            Err(err) => {
                tracing::error!(run_id = self.run_id.0, step = self.state.step, error = %err, "simulation step failed");
                self.log
                    .write(RunLogEvent::run_aborted(self.run_id, self.state.step, &err));
                self.aborted = true;
                TickOutcome::Complete
            }
        }
    }

    fn on_complete(&mut self) {
        if self.completion_reported {
            return;
        }
        self.completion_reported = true;

        if !self.aborted {
            self.log
                .write(RunLogEvent::run_complete(self.run_id, self.state.step));
            tracing::info!(run_id = self.run_id.0, steps = self.state.step, "simulation complete");
        }
        self.series.finish(self.run_id);
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use core_sim::{MarketDataset, SimConfig};
    use strategy::Allocation;

    use super::SimulationRun;
    use crate::{
        events::{RunId, StepResult},
        logging::{InMemoryRunLogWriter, RunLogEventKind},
        scheduler::{PeriodicTask, TickOutcome},
        series::{SeriesSink, SharedSeries},
    };

    fn run_over(
        json: &str,
        allocation: Allocation,
    ) -> (
        SimulationRun<InMemoryRunLogWriter, SharedSeries>,
        InMemoryRunLogWriter,
        SharedSeries,
    ) {
        let dataset = Arc::new(MarketDataset::from_json_str(json).unwrap());
        let log = InMemoryRunLogWriter::new();
        let mut series = SharedSeries::new();
        series.begin_run(RunId(1));
        let run = SimulationRun::new(
            RunId(1),
            dataset,
            allocation,
            SimConfig::default(),
            log.clone(),
            series.clone(),
        );
        (run, log, series)
    }

    fn all_in(ticker: &str) -> Allocation {
        Allocation::new(BTreeMap::from([(ticker.to_string(), 1.0)])).unwrap()
    }

    #[test]
    fn event_surfaces_only_on_its_step() {
        let (mut run, log, _) = run_over(
            r#"{
                "market_data": {"timestamps": ["d0", "d1"], "prices": {"A": [100.0, 110.0]}},
                "events": [{"date": "d1", "title": "Shock", "description": "Prices jump"}]
            }"#,
            all_in("A"),
        );

        let StepResult::Advanced(first) = run.step_once().unwrap() else {
            panic!("step 0 should advance");
        };
        assert!(first.events.is_empty());
        assert!(log.events().is_empty());

        let StepResult::Advanced(second) = run.step_once().unwrap() else {
            panic!("step 1 should advance");
        };
        assert_eq!(second.events.len(), 1);
        let events = log.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, RunLogEventKind::EventSurfaced);
        assert_eq!(events[0].step, Some(1));
        assert_eq!(events[0].line, "EVENT: [Shock] - Prices jump");
    }

    #[test]
    fn all_events_sharing_a_date_surface_in_order() {
        let (mut run, log, _) = run_over(
            r#"{
                "market_data": {"timestamps": ["d0"], "prices": {}},
                "events": [
                    {"date": "d0", "title": "First", "description": "a"},
                    {"date": "zz", "title": "Unmatched", "description": "b"},
                    {"date": "d0", "title": "Second", "description": "c"}
                ]
            }"#,
            Allocation::all_cash(),
        );

        run.step_once().unwrap();

        assert_eq!(
            log.lines(),
            vec!["EVENT: [First] - a", "EVENT: [Second] - c"]
        );
    }

    #[test]
    fn publishes_one_point_per_step_then_exhausts() {
        let (mut run, _, series) = run_over(
            r#"{"market_data": {"timestamps": ["d0", "d1", "d2"], "prices": {"A": [100.0, 110.0, 90.0]}}}"#,
            all_in("A"),
        );

        for _ in 0..3 {
            assert!(matches!(run.step_once().unwrap(), StepResult::Advanced(_)));
        }
        assert_eq!(run.step_once().unwrap(), StepResult::Exhausted);

        let points = series.snapshot().points;
        let labels: Vec<_> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["d0", "d1", "d2"]);
        assert_eq!(points[0].value, 10_000.0);
        assert!((points[1].value - 11_000.0).abs() < 1e-9);
        assert!((points[2].value - 9_000.0).abs() < 1e-9);
        assert_eq!(run.state().step, 3);
    }

    #[test]
    fn completion_is_reported_once() {
        let (mut run, log, series) = run_over(
            r#"{"market_data": {"timestamps": ["d0"], "prices": {}}}"#,
            Allocation::all_cash(),
        );

        assert_eq!(run.on_tick(), TickOutcome::Continue);
        assert_eq!(run.on_tick(), TickOutcome::Complete);
        run.on_complete();
        run.on_complete();

        let complete: Vec<_> = log
            .events()
            .into_iter()
            .filter(|event| event.kind == RunLogEventKind::RunComplete)
            .collect();
        assert_eq!(complete.len(), 1);
        assert_eq!(complete[0].line, "SIMULATION COMPLETE.");
        assert!(series.snapshot().completed);
    }

    #[test]
    fn valuation_failure_aborts_without_completion_line() {
        let unknown = Allocation::new(BTreeMap::from([("B".to_string(), 0.5)])).unwrap();
        let (mut run, log, _) = run_over(
            r#"{"market_data": {"timestamps": ["d0", "d1"], "prices": {"A": [1.0, 2.0]}}}"#,
            unknown,
        );

        assert_eq!(run.on_tick(), TickOutcome::Continue);
        assert_eq!(run.on_tick(), TickOutcome::Complete);
        run.on_complete();

        let kinds: Vec<_> = log.events().into_iter().map(|event| event.kind).collect();
        assert_eq!(kinds, vec![RunLogEventKind::RunAborted]);
    }
}
