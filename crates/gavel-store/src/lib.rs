//! # gavel-store
//!
//! **Auction State Store** and **Bid Ledger**: the canonical record of
//! every auction and every bid attempt, plus the pure countdown
//! projection and a JSON-lines journal so state survives restart.
//!
//! ## Architecture
//!
//! 1. **AuctionStore**: single source of truth for auction records.
//!    Updates are compare-and-set — conditioned on an expected prior
//!    state or value, never blind overwrites — so concurrent writers are
//!    detectable and retryable rather than silently lossy
//! 2. **BidLedger**: append-only record of every placement attempt,
//!    accepted or rejected, ordered by per-auction sequence
//! 3. **countdown**: pure point-in-time status/remaining-seconds
//!    projection, safe to call at arbitrarily high frequency
//! 4. **Journal**: write-ahead log; the current bid and lifecycle state
//!    are never in-memory-only once a journal is attached

pub mod auction_store;
pub mod bid_ledger;
pub mod countdown;
pub mod journal;

pub use auction_store::AuctionStore;
pub use bid_ledger::BidLedger;
pub use countdown::{Countdown, CountdownStatus, countdown, countdown_at};
pub use journal::{Journal, JournalEvent};
