use std::time::{Duration, SystemTime, SystemTimeError};

/// Wall-clock stopwatch for timing a whole run.
pub struct Timer {
    started: SystemTime,
}

impl Timer {
    pub fn now() -> Self {
        Self {
            started: SystemTime::now(),
        }
    }

    /// Time since construction; `Err` when the clock moved backwards.
    pub fn elapsed(&self) -> Result<Duration, SystemTimeError> {
        self.started.elapsed()
    }
}
