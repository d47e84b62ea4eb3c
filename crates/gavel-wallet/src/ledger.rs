//! The `WalletLedger` trait seam between the engine and the wallet.
//!
//! The engine never touches balances directly; it calls `reserve`,
//! `release`, and `capture` through this trait. Each call is atomic with
//! respect to every other call on the same ledger, so one user bidding
//! on two auctions simultaneously cannot double-spend a balance — the
//! engine needs no global wallet lock, only correct sequencing of its
//! own calls.

use std::sync::Mutex;

use gavel_types::{AuctionId, Money, Reservation, ReservationId, Result, UserId, WalletEntry};

use crate::reservations::ReservationManager;
use crate::wallet_book::WalletBook;

/// Atomic balance/reservation primitives the engine depends on.
///
/// Implementations must guarantee that concurrent calls never observe a
/// wallet whose held total exceeds its balance, and that a reservation
/// transitions out of HELD exactly once.
pub trait WalletLedger: Send + Sync {
    /// Top up a wallet. Balance increases are opaque to the engine.
    ///
    /// # Errors
    /// `BalanceOverflow` if the balance cannot represent the sum.
    fn deposit(&self, user_id: UserId, amount: Money) -> Result<()>;

    /// Current wallet entry for a user.
    fn entry(&self, user_id: UserId) -> WalletEntry;

    /// Funds the user can commit to new bids.
    fn available(&self, user_id: UserId) -> Money {
        self.entry(user_id).available()
    }

    /// Hold `amount` against the user's wallet.
    ///
    /// # Errors
    /// `InsufficientFunds` if the available balance cannot cover it.
    fn reserve(&self, user_id: UserId, auction_id: AuctionId, amount: Money)
    -> Result<ReservationId>;

    /// Refund a hold. Idempotent on an already-released id.
    fn release(&self, id: ReservationId) -> Result<()>;

    /// Convert a hold into a debit plus a credit to `payee`.
    ///
    /// # Errors
    /// `ReservationInvalid` if the reservation is not HELD.
    fn capture(&self, id: ReservationId, payee: UserId) -> Result<()>;

    /// Look up a reservation for audit purposes.
    fn reservation(&self, id: ReservationId) -> Option<Reservation>;

    /// Number of HELD reservations on one auction.
    fn held_count_for_auction(&self, auction_id: AuctionId) -> usize;
}

/// In-process wallet ledger: a [`WalletBook`] plus a
/// [`ReservationManager`] behind one mutex.
///
/// The single mutex is the atomicity contract: every trait call locks,
/// mutates, and unlocks, so no interleaving can observe a half-applied
/// operation.
pub struct LocalWalletLedger {
    inner: Mutex<Inner>,
}

struct Inner {
    book: WalletBook,
    reservations: ReservationManager,
}

impl LocalWalletLedger {
    /// Create an empty in-process ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                book: WalletBook::new(),
                reservations: ReservationManager::new(),
            }),
        }
    }

    /// Total funds across all wallets; conserved by everything except
    /// deposits.
    #[must_use]
    pub fn total_supply(&self) -> Money {
        self.lock().book.total_supply()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("wallet ledger lock poisoned")
    }
}

impl Default for LocalWalletLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletLedger for LocalWalletLedger {
    fn deposit(&self, user_id: UserId, amount: Money) -> Result<()> {
        self.lock().book.deposit(user_id, amount)
    }

    fn entry(&self, user_id: UserId) -> WalletEntry {
        self.lock().book.entry(user_id)
    }

    fn reserve(
        &self,
        user_id: UserId,
        auction_id: AuctionId,
        amount: Money,
    ) -> Result<ReservationId> {
        let inner = &mut *self.lock();
        let id = inner
            .reservations
            .reserve(&mut inner.book, user_id, auction_id, amount)?;
        tracing::debug!(reservation = %id, user = %user_id, %amount, "funds held");
        Ok(id)
    }

    fn release(&self, id: ReservationId) -> Result<()> {
        let inner = &mut *self.lock();
        inner.reservations.release(&mut inner.book, id)?;
        tracing::debug!(reservation = %id, "hold released");
        Ok(())
    }

    fn capture(&self, id: ReservationId, payee: UserId) -> Result<()> {
        let inner = &mut *self.lock();
        inner.reservations.capture(&mut inner.book, id, payee)?;
        tracing::debug!(reservation = %id, payee = %payee, "hold captured");
        Ok(())
    }

    fn reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.lock().reservations.get(&id).cloned()
    }

    fn held_count_for_auction(&self, auction_id: AuctionId) -> usize {
        self.lock().reservations.held_count_for_auction(auction_id)
    }
}
