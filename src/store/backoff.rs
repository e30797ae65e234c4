use std::time::Duration;

/// Doubling delay between lock attempts, capped at `max`
pub struct Backoff {
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.max(Duration::from_millis(1));
        Self {
            max: max.max(initial),
            current: initial,
        }
    }

    /// Returns the delay to wait now and pushes the next one out
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }
}
