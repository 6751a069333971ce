//! Timing helpers

use std::time::{Duration, Instant};

/// Wall-clock timer for one labelled step
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Log the elapsed time at debug level and return it in milliseconds
    pub fn stop(self) -> u64 {
        let ms = self.elapsed_ms();
        tracing::debug!("{} took {}ms", self.label, ms);
        ms
    }
}
