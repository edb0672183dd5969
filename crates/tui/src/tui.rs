//! Terminal setup, input streaming and frame scheduling.
//!
//! [`Tui`] owns the ratatui terminal. Raw mode, bracketed paste and the
//! alternate screen are enabled on init and restored on drop, and also by
//! a panic hook so a crash never leaves the shell unusable.
//!
//! Redraws are requested through a [`FrameRequester`]; requests arriving
//! before the pending deadline are coalesced into a single draw.

use anyhow::Result;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, Event, KeyEvent};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::select;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::{Stream, StreamExt};

pub type TerminalBackend = CrosstermBackend<Stdout>;

/// Input and redraw notifications consumed by the app loop.
#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    Draw,
}

pub struct Tui {
    terminal: Terminal<TerminalBackend>,
    frame_tx: mpsc::UnboundedSender<Instant>,
    draw_tx: broadcast::Sender<()>,
}

impl Tui {
    /// Enter raw mode on the alternate screen.
    pub fn init() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnableBracketedPaste, EnterAlternateScreen)?;
        install_panic_hook();

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (draw_tx, _) = broadcast::channel(1);
        tokio::spawn(coalesce_frames(frame_rx, draw_tx.clone()));

        Ok(Self {
            terminal,
            frame_tx,
            draw_tx,
        })
    }

    pub fn restore(&mut self) -> Result<()> {
        restore_terminal()?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn frame_requester(&self) -> FrameRequester {
        FrameRequester {
            frame_tx: self.frame_tx.clone(),
        }
    }

    /// Keys, pastes and scheduled draws as one stream. Resizes become draws.
    pub fn event_stream(&self) -> Pin<Box<dyn Stream<Item = TuiEvent> + Send + 'static>> {
        let mut input = crossterm::event::EventStream::new();
        let mut draw_rx = self.draw_tx.subscribe();

        Box::pin(async_stream::stream! {
            loop {
                select! {
                    Some(Ok(event)) = input.next() => match event {
                        Event::Key(key) => yield TuiEvent::Key(key),
                        Event::Paste(text) => yield TuiEvent::Paste(text),
                        Event::Resize(_, _) => yield TuiEvent::Draw,
                        _ => {}
                    },
                    result = draw_rx.recv() => match result {
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => yield TuiEvent::Draw,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    pub fn draw<F>(&mut self, render: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(render)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Cheap handle for asking the terminal to redraw.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    frame_tx: mpsc::UnboundedSender<Instant>,
}

impl FrameRequester {
    pub fn schedule_frame(&self) {
        let _ = self.frame_tx.send(Instant::now());
    }

    pub fn schedule_frame_in(&self, delay: Duration) {
        let _ = self.frame_tx.send(Instant::now() + delay);
    }
}

/// Fire one draw per earliest pending deadline. Exits when every
/// requester is dropped.
async fn coalesce_frames(mut frame_rx: mpsc::UnboundedReceiver<Instant>, draw_tx: broadcast::Sender<()>) {
    let mut deadline: Option<Instant> = None;
    loop {
        let wake = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
        select! {
            requested = frame_rx.recv() => match requested {
                Some(at) => deadline = Some(deadline.map_or(at, |current| current.min(at))),
                None => break,
            },
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(wake)) => {
                if deadline.take().is_some() {
                    let _ = draw_tx.send(());
                }
            }
        }
    }
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;
    Ok(())
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        previous(info);
    }));
}
