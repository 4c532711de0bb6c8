/// What a single call to [`SessionTimer::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// One second was taken off the clock.
    Counted,
    /// The clock just reached zero. Returned exactly once.
    Expired,
    /// Paused, stopped, or already expired.
    Ignored,
}

/// Countdown clock for a session, driven by an external 1 Hz scheduler.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    total_seconds: u64,
    remaining_seconds: u64,
    paused: bool,
    running: bool,
}

impl SessionTimer {
    pub fn new(total_seconds: u64) -> Self {
        Self {
            total_seconds,
            remaining_seconds: total_seconds,
            paused: false,
            running: total_seconds > 0,
        }
    }

    pub fn tick(&mut self) -> TimerTick {
        if !self.running || self.paused {
            return TimerTick::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.running = false;
            TimerTick::Expired
        } else {
            TimerTick::Counted
        }
    }

    /// Returns true if the timer was running and unpaused.
    pub fn pause(&mut self) -> bool {
        if !self.running || self.paused {
            return false;
        }
        self.paused = true;
        true
    }

    /// Returns true if the timer was paused. Missed seconds are not caught up.
    pub fn resume(&mut self) -> bool {
        if !self.running || !self.paused {
            return false;
        }
        self.paused = false;
        true
    }

    /// Freeze the clock where it is. Used when the session is submitted by hand.
    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.total_seconds - self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
