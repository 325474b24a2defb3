use std::sync::{Arc, Mutex, PoisonError};

use core_sim::MarketEvent;
use serde::Serialize;

use crate::events::RunId;

pub const RUN_STARTED_LINE: &str = "Started simulation...";
pub const RUN_COMPLETE_LINE: &str = "SIMULATION COMPLETE.";
pub const OVER_ALLOCATION_LINE: &str = "ERROR: Allocation exceeds 100%";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLogEventKind {
    RunStarted,
    EventSurfaced,
    RunComplete,
    OverAllocation,
    RunRejected,
    RunAborted,
}

/// One line for the run log panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLogEvent {
    pub run_id: Option<RunId>,
    pub step: Option<usize>,
    pub kind: RunLogEventKind,
    pub line: String,
}

impl RunLogEvent {
    pub fn new(
        run_id: Option<RunId>,
        step: Option<usize>,
        kind: RunLogEventKind,
        line: impl Into<String>,
    ) -> Self {
        Self {
            run_id,
            step,
            kind,
            line: line.into(),
        }
    }

    pub fn run_started(run_id: RunId) -> Self {
        Self::new(
            Some(run_id),
            None,
            RunLogEventKind::RunStarted,
            RUN_STARTED_LINE,
        )
    }

    pub fn event_surfaced(run_id: RunId, step: usize, event: &MarketEvent) -> Self {
        Self::new(
            Some(run_id),
            Some(step),
            RunLogEventKind::EventSurfaced,
            format!("EVENT: [{}] - {}", event.title, event.description),
        )
    }

    pub fn run_complete(run_id: RunId, steps: usize) -> Self {
        Self::new(
            Some(run_id),
            Some(steps),
            RunLogEventKind::RunComplete,
            RUN_COMPLETE_LINE,
        )
    }

    pub fn over_allocation() -> Self {
        Self::new(
            None,
            None,
            RunLogEventKind::OverAllocation,
            OVER_ALLOCATION_LINE,
        )
    }

    pub fn run_rejected(reason: impl std::fmt::Display) -> Self {
        Self::new(
            None,
            None,
            RunLogEventKind::RunRejected,
            format!("ERROR: {reason}"),
        )
    }

    pub fn run_aborted(run_id: RunId, step: usize, reason: impl std::fmt::Display) -> Self {
        Self::new(
            Some(run_id),
            Some(step),
            RunLogEventKind::RunAborted,
            format!("ERROR: run stopped at step {step}: {reason}"),
        )
    }
}

pub trait RunLogWriter {
    fn write(&mut self, event: RunLogEvent);
}

/// Collects log events in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunLogWriter {
    events: Arc<Mutex<Vec<RunLogEvent>>>,
}

impl InMemoryRunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunLogEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.line).collect()
    }
}

impl RunLogWriter for InMemoryRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Forwards run log lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRunLogWriter;

impl RunLogWriter for TracingRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        let run_id = event.run_id.map(|id| id.0);
        match event.kind {
            RunLogEventKind::OverAllocation
            | RunLogEventKind::RunRejected
            | RunLogEventKind::RunAborted => {
                tracing::warn!(?run_id, step = event.step, kind = ?event.kind, "{}", event.line);
            }
            _ => {
                tracing::info!(?run_id, step = event.step, kind = ?event.kind, "{}", event.line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use core_sim::MarketEvent;

    use super::{InMemoryRunLogWriter, RunLogEvent, RunLogEventKind, RunLogWriter};
    use crate::events::RunId;

    #[test]
    fn event_line_includes_title_and_description() {
        let event = MarketEvent {
            date: "2008-09".to_string(),
            title: "Lehman".to_string(),
            description: "Lehman Brothers files for bankruptcy".to_string(),
        };

        let log = RunLogEvent::event_surfaced(RunId(3), 1, &event);

        assert_eq!(log.line, "EVENT: [Lehman] - Lehman Brothers files for bankruptcy");
        assert_eq!(log.step, Some(1));
        assert_eq!(log.kind, RunLogEventKind::EventSurfaced);
    }

    #[test]
    fn clones_share_one_buffer() {
        let reader = InMemoryRunLogWriter::new();
        let mut writer = reader.clone();

        writer.write(RunLogEvent::run_started(RunId(1)));
        writer.write(RunLogEvent::over_allocation());

        assert_eq!(
            reader.lines(),
            vec!["Started simulation...", "ERROR: Allocation exceeds 100%"]
        );
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let value = serde_json::to_value(RunLogEventKind::OverAllocation).unwrap();

        assert_eq!(value, serde_json::json!("over_allocation"));
    }
}
