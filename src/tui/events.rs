//! TUI event source.
//!
//! Terminal input is merged with a steady tick. The tick drives redraws and
//! lets the navigator poll its in-flight action without blocking input.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::time::{Interval, MissedTickBehavior};

use crate::error::{ArborError, Result};

/// Application events.
#[derive(Debug, Clone)]
pub enum Event {
    /// Periodic tick.
    Tick,
    /// Key press.
    Key(KeyEvent),
    /// Terminal resize.
    Resize(u16, u16),
}

/// Asynchronous event handler over crossterm's event stream.
pub struct EventHandler {
    stream: EventStream,
    tick: Interval,
}

impl EventHandler {
    /// Create an event handler with the given tick cadence.
    pub fn new(tick_rate: Duration) -> Self {
        let mut tick = tokio::time::interval(tick_rate);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            stream: EventStream::new(),
            tick,
        }
    }

    /// Wait for the next event.
    pub async fn next(&mut self) -> Result<Event> {
        loop {
            tokio::select! {
                _ = self.tick.tick() => return Ok(Event::Tick),
                maybe = self.stream.next() => match maybe {
                    Some(Ok(CrosstermEvent::Key(key))) => {
                        // Windows terminals report key releases as well
                        if key.kind != KeyEventKind::Release {
                            return Ok(Event::Key(key));
                        }
                    }
                    Some(Ok(CrosstermEvent::Resize(width, height))) => {
                        return Ok(Event::Resize(width, height));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Err(ArborError::io("failed to read terminal events", e));
                    }
                    None => {
                        return Err(ArborError::io(
                            "terminal event stream closed",
                            std::io::ErrorKind::UnexpectedEof.into(),
                        ));
                    }
                },
            }
        }
    }
}
