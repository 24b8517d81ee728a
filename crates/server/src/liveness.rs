//! Heartbeat scheduling and pong-timeout detection.

use std::time::{Duration, Instant};

use tetris_versus_types::PlayerId;

use crate::registry::PlayerSession;

#[derive(Debug)]
pub struct LivenessMonitor {
    ping_interval: Duration,
    pong_timeout: Duration,
    last_ping: Instant,
}

impl LivenessMonitor {
    pub fn new(ping_interval: Duration, pong_timeout: Duration, now: Instant) -> Self {
        Self {
            ping_interval,
            pong_timeout,
            last_ping: now,
        }
    }

    /// True once per `ping_interval`; the caller then pings every validated
    /// session.
    pub fn ping_due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_ping) < self.ping_interval {
            return false;
        }
        self.last_ping = now;
        true
    }

    /// Strictly more than `pong_timeout` has passed since `last_pong`.
    pub fn is_expired(&self, last_pong: Instant, now: Instant) -> bool {
        now.saturating_duration_since(last_pong) > self.pong_timeout
    }

    /// Validated sessions that went silent and are not already being closed.
    pub fn expired<'a>(
        &self,
        sessions: impl Iterator<Item = &'a PlayerSession>,
        now: Instant,
    ) -> Vec<PlayerId> {
        sessions
            .filter(|s| s.validated && !s.closing && self.is_expired(s.last_pong, now))
            .map(|s| s.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tetris_versus_types::PlayerDescription;

    fn session(id: PlayerId, last_pong: Instant) -> PlayerSession {
        PlayerSession {
            id,
            validated: true,
            last_pong,
            descriptor: PlayerDescription {
                unique_id: id,
                avatar_id: 0,
            },
            closing: false,
        }
    }

    #[test]
    fn ping_fires_once_per_interval() {
        let start = Instant::now();
        let mut monitor =
            LivenessMonitor::new(Duration::from_millis(100), Duration::from_secs(1), start);
        assert!(!monitor.ping_due(start + Duration::from_millis(50)));
        assert!(monitor.ping_due(start + Duration::from_millis(100)));
        assert!(!monitor.ping_due(start + Duration::from_millis(150)));
        assert!(monitor.ping_due(start + Duration::from_millis(210)));
    }

    #[test]
    fn timeout_is_strictly_greater() {
        let start = Instant::now();
        let monitor =
            LivenessMonitor::new(Duration::from_secs(2), Duration::from_millis(5000), start);
        assert!(!monitor.is_expired(start, start + Duration::from_millis(5000)));
        assert!(monitor.is_expired(start, start + Duration::from_millis(5001)));
    }

    #[test]
    fn expired_skips_closing_and_fresh_sessions() {
        let start = Instant::now();
        let monitor = LivenessMonitor::new(Duration::from_secs(2), Duration::from_secs(5), start);
        let now = start + Duration::from_secs(6);

        let stale = session(10_000, start);
        let fresh = session(10_001, start + Duration::from_secs(4));
        let mut closing = session(10_002, start);
        closing.closing = true;

        let sessions = [stale, fresh, closing];
        assert_eq!(monitor.expired(sessions.iter(), now), vec![10_000]);
    }
}
