//! # gavel-types
//!
//! Shared types, errors, and configuration for the **Gavel** auction
//! bidding and wallet settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AuctionId`], [`BidId`], [`UserId`], [`ReservationId`], [`SettlementId`]
//! - **Money**: [`Money`] — integer minor-unit amounts in a single currency
//! - **Auction model**: [`Auction`], [`AuctionKind`], [`AuctionState`]
//! - **Bid model**: [`Bid`], [`BidOutcome`]
//! - **Reservation model**: [`Reservation`], [`ReservationState`]
//! - **Wallet model**: [`WalletEntry`]
//! - **Events**: [`AuctionEvent`] broadcast to the presentation layer
//! - **Receipts**: [`SettlementReceipt`] audit artifacts
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`GavelError`] with `GV_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod auction;
pub mod bid;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod money;
pub mod receipt;
pub mod reservation;
pub mod wallet;

// Re-export all primary types at crate root for ergonomic imports:
//   use gavel_types::{Auction, Bid, Money, Reservation, ...};

pub use auction::*;
pub use bid::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use money::*;
pub use receipt::*;
pub use reservation::*;
pub use wallet::*;

// Constants are accessed via `gavel_types::constants::FOO`
// (not re-exported to avoid name collisions).
