//! TUI application state and event loop.
//!
//! `App` mirrors the current run from core events and renders three
//! panels: the stage table, the detail view for the selected stage, and
//! the command composer, with a status line between the last two.

use anyhow::Result;
use crossterm::event::KeyEvent;
use rf_protocol::{AgentId, Event, Op, PipelineRun, ResearchMode, RunStatus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use tokio::select;
use tokio::sync::mpsc::{Receiver, UnboundedSender};
use tokio_stream::StreamExt;

use crate::event_handler::{self, Feedback};
use crate::tui::{Tui, TuiEvent};
use crate::widgets::{render_stage_table, CommandComposer, DetailView};

/// One-line message shown in the status bar until the next command.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub struct App {
    /// Local mirror of the current run.
    pub run: PipelineRun,
    /// Research mode the next run will use.
    pub research_mode: ResearchMode,
    /// Index into [`AgentId::ALL`].
    pub selected: usize,
    pub detail: DetailView,
    pub composer: CommandComposer,
    pub notice: Option<Notice>,
    pub op_tx: UnboundedSender<Op>,
    pub event_rx: Receiver<Event>,
    pub should_exit: bool,
}

impl App {
    pub fn new(op_tx: UnboundedSender<Op>, event_rx: Receiver<Event>, research_mode: ResearchMode) -> Self {
        Self {
            run: PipelineRun::idle(research_mode),
            research_mode,
            selected: 0,
            detail: DetailView::new(),
            composer: CommandComposer::new(),
            notice: None,
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    pub fn selected_agent(&self) -> AgentId {
        AgentId::ALL[self.selected.min(AgentId::ALL.len() - 1)]
    }

    /// Main event loop.
    ///
    /// Uses `tokio::select!` to handle keyboard input and core events concurrently.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();
        let frames = tui.frame_requester();
        frames.schedule_frame();

        while !self.should_exit {
            select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => {
                        self.handle_core_event(event);
                        frames.schedule_frame();
                    }
                    None => self.should_exit = true,
                },
                Some(tui_event) = tui_events.next() => match tui_event {
                    TuiEvent::Key(key) => {
                        self.handle_key_event(key);
                        frames.schedule_frame();
                    }
                    TuiEvent::Paste(text) => {
                        for c in text.chars().filter(|c| !c.is_control()) {
                            self.composer.insert_char(c);
                        }
                        frames.schedule_frame();
                    }
                    TuiEvent::Draw => tui.draw(|frame| self.render(frame))?,
                },
            }
        }

        Ok(())
    }

    pub fn handle_core_event(&mut self, event: Event) {
        if matches!(event, Event::RunStarted { .. }) {
            self.detail.scroll_to_top();
        }
        match event_handler::handle_core_event(&mut self.run, &mut self.research_mode, event) {
            Some(Feedback::Info(message)) => self.notice = Some(Notice::Info(message)),
            Some(Feedback::Error(message)) => self.notice = Some(Notice::Error(message)),
            Some(Feedback::Optimized(prompt)) => {
                self.composer.set_input(&prompt);
                self.notice = Some(Notice::Info("Optimized prompt ready, press Enter to send".to_string()));
            }
            None => {}
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        event_handler::handle_keyboard_event(self, key);
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(AgentId::ALL.len() as u16 + 3),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

        render_stage_table(frame, chunks[0], &self.run, self.selected);
        let agent = self.selected_agent();
        self.detail.render(frame, chunks[1], agent, self.run.output(agent));
        frame.render_widget(self.status_line(), chunks[2]);
        self.composer.render(chunks[3], frame.buffer_mut());

        if self.composer.should_show_popup() {
            let popup = popup_area(chunks[1], self.composer.suggestions().len());
            frame.render_widget(Clear, popup);
            self.composer.render_popup(popup, frame.buffer_mut());
        }
    }

    fn status_line(&self) -> Paragraph<'_> {
        let status_color = match self.run.status {
            RunStatus::Idle => Color::Gray,
            RunStatus::Running => Color::Yellow,
            RunStatus::Completed => Color::Green,
            RunStatus::Stopped => Color::Magenta,
            RunStatus::Failed => Color::Red,
        };
        let decision = self
            .run
            .decision
            .map_or_else(|| "-".to_string(), |d| format!("{d:?}").to_lowercase());

        let mut mode = self.research_mode.to_string();
        if self.run.run_id.is_some() && self.run.research_mode != self.research_mode {
            mode = format!("{mode} (this run: {})", self.run.research_mode);
        }

        let mut spans = vec![
            Span::styled(
                format!(" {:?} ", self.run.status).to_uppercase(),
                Style::default().fg(status_color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" path: {decision} | mode: {mode} ")),
        ];
        match &self.notice {
            Some(Notice::Info(message)) => spans.push(Span::styled(
                format!("| {message}"),
                Style::default().fg(Color::Cyan),
            )),
            Some(Notice::Error(message)) => spans.push(Span::styled(
                format!("| {message}"),
                Style::default().fg(Color::Red),
            )),
            None => {}
        }
        Paragraph::new(Line::from(spans))
    }
}

/// Bottom-aligned popup inside `area`, tall enough for `items` rows.
fn popup_area(area: Rect, items: usize) -> Rect {
    let height = (items as u16 + 2).min(area.height);
    Rect {
        x: area.x,
        y: area.y + area.height - height,
        width: area.width,
        height,
    }
}
