use std::time::{Duration, Instant};

/// Periodic timetable refresh. Polled from the UI loop, so it never fires
/// while a fetch is in progress.
pub struct PeriodicRefresher {
    interval: Option<Duration>,
    last: Instant,
}

impl PeriodicRefresher {
    /// A zero interval disables automatic refreshes.
    pub fn new(interval_secs: u64, now: Instant) -> Self {
        let interval = (interval_secs > 0).then(|| Duration::from_secs(interval_secs));
        Self { interval, last: now }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.interval
            .is_some_and(|interval| now.saturating_duration_since(self.last) >= interval)
    }

    /// Called after every load, manual or automatic.
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }
}
