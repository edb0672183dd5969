//! Integration tests for the Orchestrator.
//!
//! Covers submission rules, cooperative stop, reset, research mode
//! selection and the operation loop.

mod common;

use common::*;
use rf_core::state::manager::SubmitError;
use rf_protocol::{AgentId, Event, Op, ResearchMode, RunStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_submit_rejected_while_running() {
    let model = Arc::new(ScriptedModel::new().block_on(AgentId::RouterAgent));
    let Harness {
        orchestrator,
        mut events_rx,
    } = harness(model.clone());

    let first = orchestrator.submit("first query").await.unwrap();
    tokio::time::timeout(WAIT, model.entered.notified())
        .await
        .expect("router should be invoked");

    assert_eq!(
        orchestrator.submit("second query").await,
        Err(SubmitError::RunInProgress)
    );
    let run = orchestrator.snapshot().await;
    assert_eq!(run.run_id, Some(first));
    assert_eq!(run.query, "first query");

    orchestrator.handle_op(Op::SubmitQuery { query: "third".to_string() }).await;
    let events = drain(&mut events_rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SubmissionRejected { reason } if reason.contains("in progress"))));

    orchestrator.stop().await;
    orchestrator.join().await;
}

#[tokio::test]
async fn test_blank_query_is_rejected() {
    let Harness { orchestrator, .. } = harness(Arc::new(ScriptedModel::new()));

    assert_eq!(orchestrator.submit("   ").await, Err(SubmitError::EmptyQuery));
    assert_eq!(orchestrator.snapshot().await.status, RunStatus::Idle);
}

#[tokio::test]
async fn test_stop_mid_worker_research_keeps_prior_outputs() {
    let model = Arc::new(
        ScriptedModel::routing("complex")
            .reply(AgentId::WorkerRetrieval, "retrieved passages")
            .block_on(AgentId::WorkerResearch),
    );
    let Harness {
        orchestrator,
        mut events_rx,
    } = harness(model.clone());

    orchestrator.submit("Compare X and Y").await.unwrap();
    tokio::time::timeout(WAIT, model.entered.notified())
        .await
        .expect("worker-research should be invoked");

    assert!(orchestrator.stop().await);
    let status = tokio::time::timeout(WAIT, orchestrator.join())
        .await
        .expect("engine should observe the stop promptly");
    assert_eq!(status, Some(RunStatus::Stopped));

    let run = orchestrator.snapshot().await;
    assert_eq!(run.output(AgentId::WorkerRetrieval), Some("retrieved passages"));
    assert!(run.output(AgentId::WorkerResearch).is_none());
    assert!(!model.was_invoked(AgentId::WorkerAnalysis));
    assert_clean_finish(&run, RunStatus::Stopped);

    let events = drain(&mut events_rx);
    assert_event_sequence(&events);
    assert!(matches!(
        events.iter().rev().find(|e| e.is_terminal()),
        Some(Event::RunStopped { .. })
    ));
}

#[tokio::test]
async fn test_stop_when_idle_is_noop() {
    let Harness {
        orchestrator,
        mut events_rx,
    } = harness(Arc::new(ScriptedModel::new()));

    assert!(!orchestrator.stop().await);
    assert_eq!(orchestrator.snapshot().await.status, RunStatus::Idle);
    assert!(drain(&mut events_rx).is_empty());
}

#[tokio::test]
async fn test_stop_after_completion_keeps_completed() {
    let Harness { orchestrator, .. } = harness(Arc::new(ScriptedModel::routing("simple")));

    orchestrator.submit("What is 2+2?").await.unwrap();
    orchestrator.join().await;

    assert!(!orchestrator.stop().await);
    assert_eq!(orchestrator.snapshot().await.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_reset_discards_run_and_keeps_mode() {
    let model = Arc::new(ScriptedModel::routing("complex").block_on(AgentId::DecomposeQuery));
    let Harness {
        orchestrator,
        mut events_rx,
    } = harness(model.clone());

    orchestrator.set_research_mode(ResearchMode::Perplexity).await;
    orchestrator.submit("Compare X and Y").await.unwrap();
    tokio::time::timeout(WAIT, model.entered.notified())
        .await
        .expect("decompose-query should be invoked");

    orchestrator.reset().await;
    let status = tokio::time::timeout(WAIT, orchestrator.join())
        .await
        .expect("engine should observe the reset promptly");
    assert_eq!(status, Some(RunStatus::Stopped));

    let run = orchestrator.snapshot().await;
    assert_eq!(run.status, RunStatus::Idle);
    assert!(run.run_id.is_none());
    assert!(run.stage_outputs.is_empty());
    assert!(run.active_agents.is_empty());
    assert_eq!(orchestrator.research_mode().await, ResearchMode::Perplexity);

    let events = drain(&mut events_rx);
    assert!(matches!(events.last(), Some(Event::RunReset)));
}

#[tokio::test]
async fn test_resubmit_during_grace_supersedes_previous_run() {
    let model = Arc::new(ScriptedModel::routing("simple"));
    let Harness { orchestrator, .. } = harness(model.clone());

    let first = orchestrator.submit("What is 2+2?").await.unwrap();
    // Wait for completion but not for the highlight grace.
    loop {
        if orchestrator.snapshot().await.status == RunStatus::Completed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let second = orchestrator.submit("What is Rust?").await.unwrap();
    assert_ne!(first, second);
    orchestrator.join().await;

    let run = orchestrator.snapshot().await;
    assert_eq!(run.run_id, Some(second));
    assert_eq!(run.query, "What is Rust?");
    assert_clean_finish(&run, RunStatus::Completed);
}

#[tokio::test]
async fn test_mode_change_applies_to_next_run() {
    let research = Arc::new(RecordingResearch::default());
    let model = Arc::new(ScriptedModel::routing("complex"));
    let Harness {
        orchestrator,
        mut events_rx,
    } = harness_with(model, research.clone());

    orchestrator.set_research_mode(ResearchMode::Exa).await;
    orchestrator.submit("Compare X and Y").await.unwrap();
    orchestrator.set_research_mode(ResearchMode::Perplexity).await;
    orchestrator.join().await;

    let run = orchestrator.snapshot().await;
    assert_eq!(run.research_mode, ResearchMode::Exa);
    assert_eq!(research.modes(), vec![ResearchMode::Exa]);

    let events = drain(&mut events_rx);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::RunStarted { research_mode: ResearchMode::Exa, .. }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        Event::ResearchModeChanged { mode: ResearchMode::Perplexity }
    )));
}

#[tokio::test]
async fn test_optimize_prompt_op_reports_result() {
    let model = Arc::new(ScriptedModel::new());
    let Harness {
        orchestrator,
        mut events_rx,
    } = harness(model.clone());

    orchestrator.optimize_prompt("how does ml work?").await;
    orchestrator.optimize_prompt("  ").await;

    let events = drain(&mut events_rx);
    assert!(matches!(
        &events[0],
        Event::PromptOptimized { original, optimized }
            if original == "how does ml work?" && optimized == "optimized: how does ml work?"
    ));
    assert!(matches!(&events[1], Event::PromptOptimizationFailed { .. }));
    assert_eq!(model.optimizer_requests(), 1);
}

#[tokio::test]
async fn test_serve_loop_handles_ops_until_shutdown() {
    let model = Arc::new(ScriptedModel::routing("simple"));
    let Harness {
        orchestrator,
        mut events_rx,
    } = harness(model);
    let (ops_tx, ops_rx) = mpsc::unbounded_channel();

    let server = tokio::spawn(Arc::clone(&orchestrator).serve(ops_rx));

    ops_tx
        .send(Op::SetResearchMode { mode: ResearchMode::Exa })
        .unwrap();
    ops_tx.send(Op::GetRunSnapshot).unwrap();
    ops_tx.send(Op::Shutdown).unwrap();

    tokio::time::timeout(WAIT, server)
        .await
        .expect("serve should exit on shutdown")
        .unwrap();

    let events = drain(&mut events_rx);
    assert!(matches!(
        events[0],
        Event::ResearchModeChanged { mode: ResearchMode::Exa }
    ));
    assert!(matches!(
        &events[1],
        Event::Snapshot { run } if run.status == RunStatus::Idle
    ));
}
