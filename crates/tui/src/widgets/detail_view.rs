//! Detail view for the selected stage's output.
//!
//! Long outputs scroll line by line or a page at a time; a scrollbar
//! appears once the text is taller than the panel.

use rf_protocol::AgentId;
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

/// Scroll position over the output being shown.
#[derive(Debug, Default)]
pub struct DetailView {
    pub scroll_offset: usize,
}

impl DetailView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `output` for `agent`. `None` means the stage has not produced
    /// anything in the current run.
    pub fn render(&self, frame: &mut Frame, area: Rect, agent: AgentId, output: Option<&str>) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} ({agent})", agent.label()));

        let text = output.unwrap_or("No output yet.");
        let paragraph = Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(self.scroll_offset).unwrap_or(u16::MAX), 0));
        frame.render_widget(paragraph, area);

        let total_lines = text.lines().count();
        let visible_lines = Self::page_size(area);
        if total_lines > visible_lines {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .viewport_content_length(visible_lines)
                .position(self.scroll_offset);
            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));
            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    /// Lines visible inside the bordered panel.
    pub fn page_size(area: Rect) -> usize {
        usize::from(area.height.saturating_sub(2))
    }

    /// Largest useful offset for `output` in a panel of `page_size` lines.
    pub fn max_offset(output: Option<&str>, page_size: usize) -> usize {
        output
            .map(|text| text.lines().count())
            .unwrap_or_default()
            .saturating_sub(page_size)
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self, max: usize) {
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(page_size);
    }

    pub fn page_down(&mut self, page_size: usize, max: usize) {
        self.scroll_offset = (self.scroll_offset + page_size).min(max);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }
}
