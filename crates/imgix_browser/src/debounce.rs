// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use tokio::time::Instant;

/// Window used for page changes and search submissions unless configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Leading-edge debounce.
///
/// The first call of a burst is admitted immediately; every call (admitted or
/// not) pushes the end of the window to `wait` after itself, and calls inside
/// the window are dropped. Nothing fires on the trailing edge.
#[derive(Debug, Clone)]
pub struct LeadingDebounce {
    wait: Duration,
    window_end: Option<Instant>,
}

impl LeadingDebounce {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            window_end: None,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Admits or drops a call made now.
    pub fn admit(&mut self) -> bool {
        self.admit_at(Instant::now())
    }

    /// Admits or drops a call made at `now`.
    pub fn admit_at(&mut self, now: Instant) -> bool {
        let inside_window = matches!(self.window_end, Some(end) if now < end);
        self.window_end = Some(now + self.wait);
        !inside_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(1000);

    #[test]
    fn first_call_fires_immediately() {
        let mut debounce = LeadingDebounce::new(WAIT);
        assert!(debounce.admit_at(Instant::now()));
    }

    #[test]
    fn calls_inside_the_window_are_dropped() {
        let start = Instant::now();
        let mut debounce = LeadingDebounce::new(WAIT);
        assert!(debounce.admit_at(start));
        assert!(!debounce.admit_at(start + Duration::from_millis(10)));
        assert!(!debounce.admit_at(start + Duration::from_millis(900)));
    }

    #[test]
    fn dropped_calls_extend_the_window() {
        let start = Instant::now();
        let mut debounce = LeadingDebounce::new(WAIT);
        assert!(debounce.admit_at(start));
        assert!(!debounce.admit_at(start + Duration::from_millis(800)));
        // 1500ms after the start but only 700ms after the last call.
        assert!(!debounce.admit_at(start + Duration::from_millis(1500)));
        assert!(debounce.admit_at(start + Duration::from_millis(2600)));
    }

    #[test]
    fn quiet_period_starts_a_new_burst() {
        let start = Instant::now();
        let mut debounce = LeadingDebounce::new(WAIT);
        assert!(debounce.admit_at(start));
        assert!(debounce.admit_at(start + WAIT));
    }
}
