//! Connection staleness watchdog
//!
//! Tracks when data last arrived from the device and flags the connection
//! offline after a quiet period. Only connection flags live here; analysis
//! buffers belong to the engine and are never touched.

use std::time::{Duration, Instant};

/// Quiet period after which a connected device is considered offline.
pub const STALE_AFTER: Duration = Duration::from_secs(15);

/// Suggested period between [`ConnectionWatchdog::check`] calls.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Connection state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// First data after being offline confirms the connection
    Online,
    /// No data for longer than the stale period
    Offline {
        /// Time since the last sample
        stale_for: Duration,
    },
}

/// Staleness watchdog for one device feed.
///
/// Callers pass `now` explicitly so the watchdog can be driven from a timer
/// or from tests without sleeping.
#[derive(Clone, Debug)]
pub struct ConnectionWatchdog {
    stale_after: Duration,
    connected: bool,
    last_data_at: Option<Instant>,
    continuous_since: Option<Instant>,
}

impl Default for ConnectionWatchdog {
    fn default() -> Self {
        Self::new(STALE_AFTER)
    }
}

impl ConnectionWatchdog {
    /// Create a watchdog with a custom stale period.
    #[must_use]
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            connected: false,
            last_data_at: None,
            continuous_since: None,
        }
    }

    /// Record that a sample arrived.
    ///
    /// Returns [`ConnectionEvent::Online`] when this sample is the first one
    /// since the device was offline.
    pub fn on_sample(&mut self, now: Instant) -> Option<ConnectionEvent> {
        self.last_data_at = Some(now);
        self.continuous_since.get_or_insert(now);

        if self.connected {
            None
        } else {
            self.connected = true;
            tracing::info!("Device online: data received");
            Some(ConnectionEvent::Online)
        }
    }

    /// Periodic staleness check.
    pub fn check(&mut self, now: Instant) -> Option<ConnectionEvent> {
        if !self.connected {
            return None;
        }
        let stale_for = now.saturating_duration_since(self.last_data_at?);
        if stale_for <= self.stale_after {
            return None;
        }

        self.connected = false;
        self.continuous_since = None;
        tracing::info!("Device offline: no data for {:.1}s", stale_for.as_secs_f64());
        Some(ConnectionEvent::Offline { stale_for })
    }

    /// Whether the device is considered connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// When the last sample arrived.
    #[must_use]
    pub fn last_data_at(&self) -> Option<Instant> {
        self.last_data_at
    }

    /// Length of the current uninterrupted collection.
    #[must_use]
    pub fn continuous_duration(&self, now: Instant) -> Duration {
        self.continuous_since
            .map_or(Duration::ZERO, |since| now.saturating_duration_since(since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_marks_online() {
        let start = Instant::now();
        let mut watchdog = ConnectionWatchdog::default();

        assert!(!watchdog.is_connected());
        assert_eq!(watchdog.on_sample(start), Some(ConnectionEvent::Online));
        assert_eq!(watchdog.on_sample(start + Duration::from_millis(10)), None);
        assert!(watchdog.is_connected());
    }

    #[test]
    fn test_offline_after_quiet_period() {
        let start = Instant::now();
        let mut watchdog = ConnectionWatchdog::default();
        watchdog.on_sample(start);

        assert_eq!(watchdog.check(start + Duration::from_secs(10)), None);
        assert_eq!(watchdog.check(start + STALE_AFTER), None);

        let later = start + Duration::from_secs(16);
        assert_eq!(
            watchdog.check(later),
            Some(ConnectionEvent::Offline {
                stale_for: Duration::from_secs(16)
            })
        );
        assert!(!watchdog.is_connected());
        assert_eq!(watchdog.continuous_duration(later), Duration::ZERO);

        // Already offline
        assert_eq!(watchdog.check(later + CHECK_INTERVAL), None);
    }

    #[test]
    fn test_continuous_duration_restarts_after_offline() {
        let start = Instant::now();
        let mut watchdog = ConnectionWatchdog::default();
        watchdog.on_sample(start);
        watchdog.on_sample(start + Duration::from_secs(5));
        assert_eq!(
            watchdog.continuous_duration(start + Duration::from_secs(6)),
            Duration::from_secs(6)
        );

        watchdog.check(start + Duration::from_secs(30));
        let resumed = start + Duration::from_secs(40);
        assert_eq!(watchdog.on_sample(resumed), Some(ConnectionEvent::Online));
        assert_eq!(
            watchdog.continuous_duration(resumed + Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_check_without_data_is_quiet() {
        let mut watchdog = ConnectionWatchdog::default();
        assert_eq!(watchdog.check(Instant::now()), None);
    }
}
