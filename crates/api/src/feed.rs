use runtime::{
    RunId, RunLogEvent, RunLogEventKind, RunLogWriter, SeriesPoint, SeriesSink, SharedSeries,
    TracingRunLogWriter,
};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTrend {
    Up,
    Down,
}

impl ValueTrend {
    pub fn against(value: f64, starting_capital: f64) -> Self {
        if value >= starting_capital {
            Self::Up
        } else {
            Self::Down
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected {
        run_id: Option<RunId>,
    },
    RunStarted {
        run_id: RunId,
    },
    Tick {
        run_id: RunId,
        step: usize,
        label: String,
        value: f64,
        trend: ValueTrend,
    },
    Log {
        run_id: Option<RunId>,
        kind: RunLogEventKind,
        line: String,
    },
    RunComplete {
        run_id: RunId,
    },
}

/// Chart and log collaborator for runs started through the API.
///
/// Keeps the series for HTTP readers and fans every accepted point and log
/// line out to WebSocket subscribers.
#[derive(Clone, Debug)]
pub struct RunFeed {
    series: SharedSeries,
    events_tx: broadcast::Sender<ServerEvent>,
    starting_capital: f64,
}

impl RunFeed {
    pub fn new(starting_capital: f64, capacity: usize) -> Self {
        let (events_tx, _) = broadcast::channel(capacity);
        Self {
            series: SharedSeries::new(),
            events_tx,
            starting_capital,
        }
    }

    pub fn series(&self) -> &SharedSeries {
        &self.series
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events_tx.subscribe()
    }

    fn publish(&self, event: ServerEvent) {
        let _ = self.events_tx.send(event);
    }
}

impl RunLogWriter for RunFeed {
    fn write(&mut self, event: RunLogEvent) {
        if event.run_id.is_some_and(|run_id| !self.series.is_current(run_id)) {
            return;
        }
        TracingRunLogWriter.write(event.clone());
        self.publish(ServerEvent::Log {
            run_id: event.run_id,
            kind: event.kind,
            line: event.line,
        });
    }
}

impl SeriesSink for RunFeed {
    fn begin_run(&mut self, run_id: RunId) {
        self.series.start(run_id);
        self.publish(ServerEvent::RunStarted { run_id });
    }

    fn push(&mut self, run_id: RunId, point: SeriesPoint) {
        let event = ServerEvent::Tick {
            run_id,
            step: point.step,
            label: point.label.clone(),
            value: point.value,
            trend: ValueTrend::against(point.value, self.starting_capital),
        };
        if self.series.record(run_id, point) {
            self.publish(event);
        }
    }

    fn finish(&mut self, run_id: RunId) {
        if self.series.mark_finished(run_id) {
            self.publish(ServerEvent::RunComplete { run_id });
        }
    }
}
