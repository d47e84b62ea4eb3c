//! System-wide constants for the Gavel engine.

/// Default lifecycle scheduler polling interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default number of automatic internal retries on a bid placement
/// concurrency conflict.
pub const DEFAULT_BID_CONFLICT_RETRIES: u32 = 1;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// Maximum length of an auction title.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of an auction description.
pub const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Gavel";
