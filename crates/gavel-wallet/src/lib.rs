//! # gavel-wallet
//!
//! **Wallet Ledger Adapter**: per-user balance accounting, reservation
//! lifecycle, and the trait seam the engine consumes.
//!
//! ## Architecture
//!
//! 1. **WalletBook**: tracks `balance` / `held` per user; every mutation
//!    is atomic — either the full operation succeeds or the wallet is
//!    unchanged
//! 2. **ReservationManager**: holds funds and mints reservations; drives
//!    the HELD → RELEASED | CAPTURED lifecycle
//! 3. **WalletLedger**: the trait the engine calls `reserve` / `release`
//!    / `capture` through; [`LocalWalletLedger`] is the in-process
//!    implementation providing the adapter's atomicity contract
//!
//! ## Fund Flow
//!
//! ```text
//! reserve()  → WalletBook.hold()          → Reservation (HELD)
//! release()  → WalletBook.release_hold()  → Reservation (RELEASED)
//! capture()  → WalletBook.consume_held()
//!            + WalletBook.credit(seller)  → Reservation (CAPTURED)
//! ```

pub mod ledger;
pub mod reservations;
pub mod wallet_book;

pub use ledger::{LocalWalletLedger, WalletLedger};
pub use reservations::ReservationManager;
pub use wallet_book::WalletBook;
