//! Terminal event handling.

use color_eyre::Result;
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Terminal events.
#[derive(Debug)]
pub enum Event {
    /// Periodic tick; deadlines are checked here.
    Tick,
    /// Key press.
    Key(KeyEvent),
    /// Terminal resize (width, height).
    #[allow(dead_code)]
    Resize(u16, u16),
}

/// Merges crossterm input with a fixed-rate tick.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Spawn the poller; it stops when `cancel` fires or the handler is dropped.
    pub fn new(tick_rate_ms: u64, cancel: CancellationToken) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tick_rate = Duration::from_millis(tick_rate_ms.max(10));

        tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut interval = tokio::time::interval(tick_rate);
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => Some(Event::Tick),
                    maybe = reader.next() => match maybe {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            Some(Event::Key(key))
                        }
                        Some(Ok(CrosstermEvent::Resize(w, h))) => Some(Event::Resize(w, h)),
                        Some(Ok(_)) => None,
                        Some(Err(e)) => {
                            tracing::warn!("Terminal event error: {}", e);
                            None
                        }
                        None => break,
                    },
                };
                if let Some(event) = event
                    && tx.send(event).is_err()
                {
                    break;
                }
            }
            tracing::debug!("Event poller stopped");
        });

        Self { rx }
    }

    /// Next terminal event.
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| color_eyre::eyre::eyre!("Event channel closed"))
    }
}
