//! Short-lived on-screen notices (joins, leaves, game over)
//!
//! One notice is shown at a time. Newer ones wait in line until the active
//! notice expires or is dismissed.

use shared::NOTICE_DURATION_MS;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct NoticeBoard {
    active: Option<(String, Instant)>,
    pending: VecDeque<String>,
    duration: Duration,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::with_duration(Duration::from_millis(NOTICE_DURATION_MS))
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            active: None,
            pending: VecDeque::new(),
            duration,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        if self.active.is_none() {
            self.active = Some((message, now));
        } else {
            self.pending.push_back(message);
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.active.as_ref().map(|(message, _)| message.as_str())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Replaces the active notice with the next queued one.
    pub fn dismiss(&mut self, now: Instant) {
        self.active = self.pending.pop_front().map(|message| (message, now));
    }

    /// Drops the active notice once it has been shown for the full duration.
    pub fn expire(&mut self, now: Instant) {
        let expired = match &self.active {
            Some((_, shown_at)) => now.duration_since(*shown_at) >= self.duration,
            None => false,
        };

        if expired {
            self.dismiss(now);
        }
    }

}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}
