//! Trailing-edge debounce with a change counter
//!
//! Every change pushes the deadline out by the full window and bumps the
//! sequence number. The sequence lets the pipeline tell whether a finished
//! recompute still reflects the latest change.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
    sequence: u64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            sequence: 0,
        }
    }

    /// Record a change at `now`; returns its sequence number
    pub fn touch(&mut self, now: Instant) -> u64 {
        self.sequence += 1;
        self.deadline = Some(now + self.window);
        self.sequence
    }

    /// Disarm without firing
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Disarm after the deadline passed; returns the sequence it fired for
    pub fn fire(&mut self) -> Option<u64> {
        self.deadline.take().map(|_| self.sequence)
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Sequence number of the latest change
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Resolves at `deadline`, never if there is none
pub(crate) async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
