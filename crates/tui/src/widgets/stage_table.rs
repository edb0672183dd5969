//! Stage table: one row per pipeline stage with its live state.
//!
//! Rows follow [`AgentId::ALL`]. The highlighted stage is marked with a
//! star and the selected row drives the detail view.

use rf_core::engine::plan_for;
use rf_core::state::run::is_error_marker;
use rf_protocol::{AgentId, PipelineRun};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};
use ratatui::Frame;

/// Display state of one stage within the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Running,
    Done,
    Failed,
    /// Not on the path the router chose.
    Skipped,
}

impl StageState {
    pub fn of(agent: AgentId, run: &PipelineRun) -> Self {
        if run.active_agents.contains(&agent) {
            return StageState::Running;
        }
        if let Some(output) = run.output(agent) {
            return if is_error_marker(output) {
                StageState::Failed
            } else {
                StageState::Done
            };
        }
        match run.decision {
            Some(decision)
                if agent != AgentId::RouterAgent && !plan_for(decision).contains(&agent) =>
            {
                StageState::Skipped
            }
            _ => StageState::Pending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StageState::Pending => "pending",
            StageState::Running => "running",
            StageState::Done => "done",
            StageState::Failed => "failed",
            StageState::Skipped => "skipped",
        }
    }

    fn style(self) -> Style {
        match self {
            StageState::Pending => Style::default().fg(Color::Gray),
            StageState::Running => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            StageState::Done => Style::default().fg(Color::Green),
            StageState::Failed => Style::default().fg(Color::Red),
            StageState::Skipped => Style::default().fg(Color::DarkGray),
        }
    }
}

/// Render the table with `selected` as the focused row.
pub fn render_stage_table(frame: &mut Frame, area: Rect, run: &PipelineRun, selected: usize) {
    let rows: Vec<Row> = AgentId::ALL
        .iter()
        .map(|&agent| {
            let state = StageState::of(agent, run);
            let marker = if run.highlighted == Some(agent) { "★" } else { "" };
            Row::new(vec![
                Cell::from(marker).style(Style::default().fg(Color::Yellow)),
                Cell::from(agent.label()),
                Cell::from(state.label()).style(state.style()),
                Cell::from(preview(run.output(agent))),
            ])
        })
        .collect();

    let header = Row::new(vec!["", "Stage", "Status", "Output"])
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));

    let widths = [
        Constraint::Length(2),
        Constraint::Length(18),
        Constraint::Length(9),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Pipeline"))
        .row_highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut state = TableState::default();
    state.select(Some(selected.min(AgentId::ALL.len() - 1)));
    frame.render_stateful_widget(table, area, &mut state);
}

/// First non-empty line of an output.
fn preview(output: Option<&str>) -> String {
    output
        .and_then(|text| text.lines().find(|line| !line.trim().is_empty()))
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_protocol::{ResearchMode, RouterDecision, RunStatus};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(run: &PipelineRun, selected: usize) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(100, 16)).unwrap();
        terminal
            .draw(|frame| render_stage_table(frame, frame.area(), run, selected))
            .unwrap();
        terminal
    }

    fn content(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_stage_states_follow_the_run() {
        let mut run = PipelineRun::idle(ResearchMode::Local);
        assert_eq!(StageState::of(AgentId::SynthesisAgent, &run), StageState::Pending);

        run.status = RunStatus::Running;
        run.decision = Some(RouterDecision::Simple);
        run.stage_outputs.insert(AgentId::RouterAgent, "simple".to_string());
        run.stage_outputs.insert(
            AgentId::DirectGeneration,
            "[ERROR in direct-generation]: timeout".to_string(),
        );
        run.active_agents.insert(AgentId::ResponseDelivery);

        assert_eq!(StageState::of(AgentId::RouterAgent, &run), StageState::Done);
        assert_eq!(StageState::of(AgentId::DirectGeneration, &run), StageState::Failed);
        assert_eq!(StageState::of(AgentId::ResponseDelivery, &run), StageState::Running);
        assert_eq!(StageState::of(AgentId::LangsmithLogging, &run), StageState::Pending);
        assert_eq!(StageState::of(AgentId::SynthesisAgent, &run), StageState::Skipped);
    }

    #[test]
    fn test_renders_every_stage() {
        let terminal = render(&PipelineRun::idle(ResearchMode::Local), 0);
        let text = content(&terminal);

        assert!(text.contains("Stage"));
        for agent in AgentId::ALL {
            assert!(text.contains(agent.label()), "{agent} row missing");
        }
    }

    #[test]
    fn test_highlight_marker_and_output_preview() {
        let mut run = PipelineRun::idle(ResearchMode::Local);
        run.highlighted = Some(AgentId::ResponseDelivery);
        run.stage_outputs.insert(
            AgentId::ResponseDelivery,
            "\nThe answer is 4.\nMore detail".to_string(),
        );

        let text = content(&render(&run, 0));
        assert!(text.contains("★"));
        assert!(text.contains("The answer is 4."));
        assert!(!text.contains("More detail"));
    }

    #[test]
    fn test_selected_row_is_highlighted() {
        let terminal = render(&PipelineRun::idle(ResearchMode::Local), 3);
        let buffer = terminal.backend().buffer();

        let found_blue_bg = (0..buffer.area().height)
            .any(|y| (0..buffer.area().width).any(|x| buffer[(x, y)].bg == Color::Blue));
        assert!(found_blue_bg, "selected row should have a blue background");
    }
}
