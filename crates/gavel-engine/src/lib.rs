//! # gavel-engine
//!
//! The **Auction Bidding & Wallet Settlement Engine**: bid placement,
//! lifecycle scheduling, and settlement over the stores and wallet
//! ledger.
//!
//! ## Architecture
//!
//! 1. **KeyedLocks**: per-auction critical sections — concurrent bids
//!    on different auctions proceed independently, bids on the same
//!    auction are strictly ordered
//! 2. **BidCoordinator**: validates, reserves funds, releases the prior
//!    leader's hold, and records the new leader atomically per auction
//! 3. **LifecycleScheduler**: bounded-interval polling that drives
//!    `scheduled → active → ended → settled` exactly once each
//! 4. **SettlementEngine**: idempotent final fund movement — capture the
//!    winner, refund everyone else — plus the administrative cancel
//! 5. **AuctionEngine**: facade wiring the pieces together; the surface
//!    the presentation layer calls
//!
//! ## Bid Flow
//!
//! ```text
//! place_bid → KeyedLocks.lock(auction)
//!           → validate → WalletLedger.reserve(new)
//!           → AuctionStore.record_leader (CAS)
//!           → WalletLedger.release(old) → BidLedger.append
//!           → AuctionEvent::LeadershipChanged
//! ```

pub mod auction_locks;
pub mod coordinator;
pub mod engine;
pub mod scheduler;
pub mod settlement;

pub use auction_locks::KeyedLocks;
pub use coordinator::BidCoordinator;
pub use engine::AuctionEngine;
pub use scheduler::LifecycleScheduler;
pub use settlement::SettlementEngine;
