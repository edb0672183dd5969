//! Assertion helpers over event streams and run snapshots.

use rf_protocol::{AgentId, Event, PipelineRun, RunStatus};
use tokio::sync::mpsc;

/// Collect every event currently buffered in the channel.
pub fn drain(events_rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        events.push(event);
    }
    events
}

/// Stages in the order they were announced as started.
#[allow(dead_code)]
pub fn started_stages(events: &[Event]) -> Vec<AgentId> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StageStarted { agent, .. } => Some(*agent),
            _ => None,
        })
        .collect()
}

/// Stages in the order they were announced as completed.
#[allow(dead_code)]
pub fn completed_stages(events: &[Event]) -> Vec<AgentId> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StageCompleted { agent, .. } => Some(*agent),
            _ => None,
        })
        .collect()
}

/// Assert the run began with `RunStarted` and ended in exactly one
/// terminal event, with nothing but highlight changes after it.
#[allow(dead_code)]
pub fn assert_event_sequence(events: &[Event]) {
    assert!(!events.is_empty(), "Event sequence is empty");
    assert!(
        matches!(events[0], Event::RunStarted { .. }),
        "First event should be RunStarted, got: {:?}",
        events[0]
    );

    let terminal: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_terminal())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(terminal.len(), 1, "Expected one terminal event: {events:?}");

    for event in &events[terminal[0] + 1..] {
        assert!(
            matches!(event, Event::HighlightChanged { agent: None, .. }),
            "Unexpected event after terminal: {event:?}"
        );
    }
}

/// Terminal runs hold no loading indicators and no highlight.
#[allow(dead_code)]
pub fn assert_clean_finish(run: &PipelineRun, status: RunStatus) {
    assert_eq!(run.status, status);
    assert!(
        run.active_agents.is_empty(),
        "active agents left: {:?}",
        run.active_agents
    );
    assert_eq!(run.highlighted, None);
    assert!(run.finished_at.is_some());
}
