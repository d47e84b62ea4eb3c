//! Configuration for the Gavel engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Lifecycle scheduler configuration.
    pub scheduler: SchedulerConfig,
    /// Number of automatic internal retries when a bid placement hits a
    /// concurrency conflict, before surfacing the failure to the caller.
    pub bid_conflict_retries: u32,
    /// Path to the journal file (write-ahead log). `None` disables
    /// persistence — acceptable only in tests.
    pub journal_path: Option<String>,
    /// Capacity of the event broadcast channel.
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            bid_conflict_retries: constants::DEFAULT_BID_CONFLICT_RETRIES,
            journal_path: None,
            event_buffer: constants::DEFAULT_EVENT_BUFFER,
        }
    }
}

/// Lifecycle scheduler timing.
///
/// Boundary crossings are detected, not predicted: an auction may be
/// observed late by at most one polling interval. Countdowns always
/// recompute from wall-clock timestamps, so this slack is invisible to
/// readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between lifecycle polls.
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(constants::DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.scheduler.poll_interval.as_millis(), 250);
        assert_eq!(cfg.bid_conflict_retries, 1);
        assert!(cfg.journal_path.is_none());
        assert!(cfg.event_buffer > 0);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(
            cfg.scheduler.poll_interval,
            back.scheduler.poll_interval
        );
        assert_eq!(cfg.bid_conflict_retries, back.bid_conflict_retries);
    }
}
