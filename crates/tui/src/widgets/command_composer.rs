//! Command composer with slash command autocomplete.
//!
//! Plain text is submitted as a query. Input starting with `/` is a
//! command; typing `/` opens a suggestion popup that narrows as the user
//! types and completes with Tab.

use crate::event::EventStatus;
use crossterm::event::{KeyCode, KeyEvent};
use rf_protocol::{Op, ResearchMode};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Available slash commands with their descriptions.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/stop", "Stop the running query"),
    ("/reset", "Clear the current run"),
    ("/mode [exa|perplexity|local]", "Set or cycle the research mode"),
    ("/optimize <prompt>", "Rewrite a prompt for retrieval"),
    ("/quit", "Exit ragflow"),
];

/// What the app should do with a submitted line.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerAction {
    Send(Op),
    /// `/mode` without an argument.
    CycleMode,
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct CommandComposer {
    input: String,
    /// Cursor position in chars.
    cursor_pos: usize,
    show_popup: bool,
    selected_index: usize,
}

impl CommandComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the input and move the cursor to its end.
    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.cursor_pos = self.input.chars().count();
        self.update_popup_state();
    }

    pub fn should_show_popup(&self) -> bool {
        self.show_popup
    }

    /// Commands whose name starts with the typed command word.
    pub fn suggestions(&self) -> Vec<(&'static str, &'static str)> {
        if !self.input.starts_with('/') {
            return Vec::new();
        }
        let typed = self.input.split_whitespace().next().unwrap_or("/");
        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(typed))
            .copied()
            .collect()
    }

    pub fn selected_suggestion(&self) -> Option<(&'static str, &'static str)> {
        self.suggestions().get(self.selected_index).copied()
    }

    /// Editing and popup keys. Enter, Esc and everything else fall through.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> EventStatus {
        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Tab if self.show_popup => self.complete_with_selection(),
            KeyCode::Up if self.show_popup => self.move_selection_up(),
            KeyCode::Down if self.show_popup => self.move_selection_down(),
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor_pos);
        self.input.insert(at, c);
        self.cursor_pos += 1;
        self.update_popup_state();
    }

    /// Backspace.
    pub fn delete_char(&mut self) {
        if self.cursor_pos == 0 {
            return;
        }
        let at = self.byte_index(self.cursor_pos - 1);
        self.input.remove(at);
        self.cursor_pos -= 1;
        self.update_popup_state();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor_pos = (self.cursor_pos + 1).min(self.input.chars().count());
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.suggestions().len() {
            self.selected_index += 1;
        }
    }

    /// Fill in the selected command name, dropping its argument hint.
    pub fn complete_with_selection(&mut self) {
        if let Some((cmd, _)) = self.selected_suggestion() {
            let name = cmd.split_whitespace().next().unwrap_or(cmd);
            self.input = format!("{name} ");
            self.cursor_pos = self.input.chars().count();
            self.show_popup = false;
            self.selected_index = 0;
        }
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn update_popup_state(&mut self) {
        self.show_popup = self.input.starts_with('/') && !self.input.contains(' ');
        let count = self.suggestions().len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Query (Enter to send, / for commands, Ctrl-C to quit)");
        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(format!("> {}", self.input))
            .style(Style::default().fg(Color::Yellow))
            .render(inner, buf);
    }

    pub fn render_popup(&self, area: Rect, buf: &mut Buffer) {
        if !self.show_popup {
            return;
        }
        let suggestions = self.suggestions();
        if suggestions.is_empty() {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().bg(Color::Black));
        let inner = block.inner(area);
        block.render(area, buf);

        for (i, (cmd, desc)) in suggestions.iter().enumerate().take(usize::from(inner.height)) {
            let style = if i == self.selected_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let line = Line::from(vec![
                Span::styled(format!("{cmd:<30}"), style),
                Span::styled(*desc, style.fg(Color::Gray)),
            ]);
            let y = inner.y + u16::try_from(i).unwrap_or(u16::MAX);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }

    /// Interpret the current input.
    ///
    /// Returns `Ok(None)` for blank input and `Err` with a message for an
    /// unknown or malformed command.
    pub fn parse_command(&self) -> Result<Option<ComposerAction>, String> {
        let input = self.input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        if !input.starts_with('/') {
            return Ok(Some(ComposerAction::Send(Op::SubmitQuery {
                query: input.to_string(),
            })));
        }

        let (cmd, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
        let rest = rest.trim();
        let action = match cmd {
            "/stop" => ComposerAction::Send(Op::StopRun),
            "/reset" => ComposerAction::Send(Op::ResetRun),
            "/mode" if rest.is_empty() => ComposerAction::CycleMode,
            "/mode" => ComposerAction::Send(Op::SetResearchMode {
                mode: rest.parse::<ResearchMode>()?,
            }),
            "/optimize" if rest.is_empty() => return Err("Missing prompt to optimize".to_string()),
            "/optimize" => ComposerAction::Send(Op::OptimizePrompt {
                prompt: rest.to_string(),
            }),
            "/quit" => ComposerAction::Quit,
            _ => return Err(format!("Unknown command: {cmd}")),
        };
        Ok(Some(action))
    }
}
