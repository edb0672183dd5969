//! Event handling for the TUI.
//!
//! - Core events are folded into a local [`PipelineRun`] mirror
//! - Keys go to the composer first, then to navigation
//! - Submitted lines become [`Op`]s on the core channel

use crate::app::{App, Notice};
use crate::widgets::detail_view::DetailView;
use crate::widgets::ComposerAction;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rf_protocol::{AgentId, Event, Op, PipelineRun, ResearchMode, RunStatus};
use uuid::Uuid;

/// Lines moved by PageUp and PageDown in the detail view.
pub const DETAIL_PAGE: usize = 10;

/// Something the user should be told about after a core event.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Info(String),
    Error(String),
    /// An optimized prompt, offered back in the composer.
    Optimized(String),
}

/// Fold one core event into the run mirror.
///
/// Run-scoped events for any run other than the mirrored one are ignored.
pub fn handle_core_event(
    run: &mut PipelineRun,
    research_mode: &mut ResearchMode,
    event: Event,
) -> Option<Feedback> {
    let is_current = |run: &PipelineRun, run_id: Uuid| run.run_id == Some(run_id);

    match event {
        Event::RunStarted {
            run_id,
            query,
            research_mode: mode,
        } => {
            *run = PipelineRun {
                run_id: Some(run_id),
                query,
                status: RunStatus::Running,
                ..PipelineRun::idle(mode)
            };
        }
        Event::RunStatusUpdate { run_id, status } if is_current(run, run_id) => {
            run.status = status;
        }
        Event::RouterDecided { run_id, decision } if is_current(run, run_id) => {
            run.decision = Some(decision);
        }
        Event::StageStarted { run_id, agent } if is_current(run, run_id) => {
            run.active_agents.insert(agent);
        }
        Event::StageCompleted {
            run_id,
            agent,
            output,
        } if is_current(run, run_id) => {
            run.active_agents.remove(&agent);
            run.stage_outputs.entry(agent).or_insert(output);
        }
        Event::StageFailed {
            run_id,
            agent,
            marker,
        } if is_current(run, run_id) => {
            run.active_agents.remove(&agent);
            run.stage_outputs.entry(agent).or_insert(marker);
        }
        Event::HighlightChanged { run_id, agent } if is_current(run, run_id) => {
            run.highlighted = agent;
        }
        Event::RunCompleted { run_id } if is_current(run, run_id) => {
            run.status = RunStatus::Completed;
            run.active_agents.clear();
        }
        Event::RunStopped { run_id } if is_current(run, run_id) => {
            run.status = RunStatus::Stopped;
            run.active_agents.clear();
            return Some(Feedback::Info("Run stopped".to_string()));
        }
        Event::RunFailed { run_id, error } if is_current(run, run_id) => {
            run.status = RunStatus::Failed;
            run.active_agents.clear();
            return Some(Feedback::Error(error));
        }
        Event::RunReset => {
            *run = PipelineRun::idle(*research_mode);
            return Some(Feedback::Info("Run cleared".to_string()));
        }
        Event::SubmissionRejected { reason } => return Some(Feedback::Error(reason)),
        Event::ResearchModeChanged { mode } => {
            *research_mode = mode;
            return Some(Feedback::Info(format!("Research mode: {mode}")));
        }
        Event::PromptOptimized { optimized, .. } => return Some(Feedback::Optimized(optimized)),
        Event::PromptOptimizationFailed { error } => {
            return Some(Feedback::Error(format!("Optimization failed: {error}")))
        }
        Event::Snapshot { run: snapshot } => *run = snapshot,
        _ => {}
    }
    None
}

/// Handle a key press.
pub fn handle_keyboard_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_exit = true;
        return;
    }
    if app.composer.handle_key_event(key).is_consumed() {
        return;
    }

    match key.code {
        KeyCode::Enter => submit_command(app),
        KeyCode::Esc => app.composer.clear(),
        KeyCode::Up => {
            let index = app.selected.saturating_sub(1);
            select_stage(app, index);
        }
        KeyCode::Down => {
            let index = (app.selected + 1).min(AgentId::ALL.len() - 1);
            select_stage(app, index);
        }
        KeyCode::PageUp => app.detail.page_up(DETAIL_PAGE),
        KeyCode::PageDown => {
            let max = DetailView::max_offset(app.run.output(app.selected_agent()), DETAIL_PAGE);
            app.detail.page_down(DETAIL_PAGE, max);
        }
        _ => {}
    }
}

fn select_stage(app: &mut App, index: usize) {
    if index != app.selected {
        app.selected = index;
        app.detail.scroll_to_top();
    }
}

/// Interpret the composer line and act on it.
fn submit_command(app: &mut App) {
    match app.composer.parse_command() {
        Ok(None) => {}
        Ok(Some(action)) => {
            app.composer.clear();
            app.notice = None;
            match action {
                ComposerAction::Send(op) => send(app, op),
                ComposerAction::CycleMode => {
                    let mode = app.research_mode.next();
                    send(app, Op::SetResearchMode { mode });
                }
                ComposerAction::Quit => app.should_exit = true,
            }
        }
        Err(message) => app.notice = Some(Notice::Error(message)),
    }
}

fn send(app: &mut App, op: Op) {
    if app.op_tx.send(op).is_err() {
        tracing::warn!("core channel closed, exiting");
        app.should_exit = true;
    }
}
