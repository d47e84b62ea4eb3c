//! Balance management for the wallet ledger.
//!
//! Tracks per-user balances with balance/held accounting. All mutations
//! are atomic: either the full operation succeeds or the wallet is
//! unchanged. The invariant `available = balance − held ≥ 0` holds
//! after every call.

use std::collections::HashMap;

use gavel_types::{GavelError, Money, Result, UserId, WalletEntry};

/// Manages user wallets with balance/held accounting.
///
/// The WalletBook is the source of truth for all balance state. The
/// ReservationManager calls into it to hold/release funds when minting
/// or resolving reservations.
pub struct WalletBook {
    /// Per-user wallet entries.
    wallets: HashMap<UserId, WalletEntry>,
}

impl WalletBook {
    /// Create a new empty wallet book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wallets: HashMap::new(),
        }
    }

    /// Deposit funds (increases balance). Top-ups from the external
    /// payment provider land here; their origin is opaque to the engine.
    ///
    /// # Errors
    /// Returns `BalanceOverflow` if the balance cannot represent the sum.
    pub fn deposit(&mut self, user_id: UserId, amount: Money) -> Result<()> {
        let entry = self.wallets.entry(user_id).or_default();
        entry.balance = entry
            .balance
            .checked_add(amount)
            .ok_or(GavelError::BalanceOverflow)?;
        Ok(())
    }

    /// Credit funds (settlement — receiving side). Same effect as a
    /// deposit; kept separate so audit logs can tell the flows apart.
    ///
    /// # Errors
    /// Returns `BalanceOverflow` if the balance cannot represent the sum.
    pub fn credit(&mut self, user_id: UserId, amount: Money) -> Result<()> {
        let entry = self.wallets.entry(user_id).or_default();
        entry.balance = entry
            .balance
            .checked_add(amount)
            .ok_or(GavelError::BalanceOverflow)?;
        Ok(())
    }

    /// Hold funds against a wallet (available → held). Used when
    /// minting a reservation.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if available < amount.
    pub fn hold(&mut self, user_id: UserId, amount: Money) -> Result<()> {
        let entry =
            self.wallets
                .get_mut(&user_id)
                .ok_or(GavelError::InsufficientFunds {
                    needed: amount,
                    available: Money::ZERO,
                })?;

        if entry.available() < amount {
            return Err(GavelError::InsufficientFunds {
                needed: amount,
                available: entry.available(),
            });
        }

        entry.held = entry
            .held
            .checked_add(amount)
            .ok_or(GavelError::BalanceOverflow)?;
        Ok(())
    }

    /// Release held funds (held → available). Used when a reservation
    /// is released.
    ///
    /// # Errors
    /// Returns `InsufficientHeld` if held < amount.
    pub fn release_hold(&mut self, user_id: UserId, amount: Money) -> Result<()> {
        let entry = self
            .wallets
            .get_mut(&user_id)
            .ok_or(GavelError::InsufficientHeld)?;

        if entry.held < amount {
            return Err(GavelError::InsufficientHeld);
        }

        entry.held = entry
            .held
            .checked_sub(amount)
            .ok_or(GavelError::BalanceOverflow)?;
        Ok(())
    }

    /// Consume held funds (for capture). Both held and balance decrease;
    /// nothing is added back to available.
    ///
    /// # Errors
    /// Returns `InsufficientHeld` if held < amount.
    pub fn consume_held(&mut self, user_id: UserId, amount: Money) -> Result<()> {
        let entry = self
            .wallets
            .get_mut(&user_id)
            .ok_or(GavelError::InsufficientHeld)?;

        if entry.held < amount {
            return Err(GavelError::InsufficientHeld);
        }

        entry.held = entry
            .held
            .checked_sub(amount)
            .ok_or(GavelError::BalanceOverflow)?;
        entry.balance = entry
            .balance
            .checked_sub(amount)
            .ok_or(GavelError::BalanceOverflow)?;
        Ok(())
    }

    /// Get the wallet entry for a user.
    #[must_use]
    pub fn entry(&self, user_id: UserId) -> WalletEntry {
        self.wallets.get(&user_id).cloned().unwrap_or_default()
    }

    /// Funds the user can commit to new bids.
    #[must_use]
    pub fn available(&self, user_id: UserId) -> Money {
        self.entry(user_id).available()
    }

    /// Total funds across all wallets. Bidding and settlement only move
    /// funds between users, so this is conserved by everything except
    /// deposits and credits.
    #[must_use]
    pub fn total_supply(&self) -> Money {
        self.wallets
            .values()
            .fold(Money::ZERO, |acc, entry| acc + entry.balance)
    }
}

impl Default for WalletBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_increases_balance() {
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.deposit(user, Money::new(1000)).unwrap();
        let entry = book.entry(user);
        assert_eq!(entry.balance, Money::new(1000));
        assert_eq!(entry.held, Money::ZERO);
        assert_eq!(entry.available(), Money::new(1000));
    }

    #[test]
    fn hold_moves_to_held() {
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.deposit(user, Money::new(1000)).unwrap();
        book.hold(user, Money::new(400)).unwrap();
        let entry = book.entry(user);
        assert_eq!(entry.available(), Money::new(600));
        assert_eq!(entry.held, Money::new(400));
        assert_eq!(entry.balance, Money::new(1000));
    }

    #[test]
    fn hold_insufficient_fails() {
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.deposit(user, Money::new(100)).unwrap();
        let err = book.hold(user, Money::new(200)).unwrap_err();
        assert!(matches!(err, GavelError::InsufficientFunds { .. }));
        // Wallet unchanged
        assert_eq!(book.available(user), Money::new(100));
    }

    #[test]
    fn hold_respects_existing_holds() {
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.deposit(user, Money::new(100)).unwrap();
        book.hold(user, Money::new(80)).unwrap();
        // Only 20 available now; the same balance cannot back two holds.
        let err = book.hold(user, Money::new(50)).unwrap_err();
        assert!(matches!(err, GavelError::InsufficientFunds { .. }));
    }

    #[test]
    fn release_hold_restores_available() {
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.deposit(user, Money::new(1000)).unwrap();
        book.hold(user, Money::new(400)).unwrap();
        book.release_hold(user, Money::new(400)).unwrap();
        let entry = book.entry(user);
        assert_eq!(entry.available(), Money::new(1000));
        assert_eq!(entry.held, Money::ZERO);
    }

    #[test]
    fn consume_held_debits_balance() {
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.deposit(user, Money::new(1000)).unwrap();
        book.hold(user, Money::new(500)).unwrap();
        book.consume_held(user, Money::new(500)).unwrap();
        let entry = book.entry(user);
        assert_eq!(entry.balance, Money::new(500));
        assert_eq!(entry.held, Money::ZERO);
        assert_eq!(entry.available(), Money::new(500));
    }

    #[test]
    fn credit_adds_to_balance() {
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.credit(user, Money::new(120)).unwrap();
        assert_eq!(book.entry(user).balance, Money::new(120));
    }

    #[test]
    fn deposit_overflow_rejected() {
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.deposit(user, Money::new(i64::MAX)).unwrap();

        let err = book.deposit(user, Money::new(1)).unwrap_err();
        assert!(matches!(err, GavelError::BalanceOverflow));
        // Wallet unchanged.
        assert_eq!(book.entry(user).balance, Money::new(i64::MAX));
    }

    #[test]
    fn credit_overflow_rejected() {
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.credit(user, Money::new(i64::MAX)).unwrap();

        let err = book.credit(user, Money::new(1)).unwrap_err();
        assert!(matches!(err, GavelError::BalanceOverflow));
        assert_eq!(book.entry(user).balance, Money::new(i64::MAX));
    }

    #[test]
    fn total_supply_sums_all_wallets() {
        let mut book = WalletBook::new();
        let a = UserId::new();
        let b = UserId::new();
        book.deposit(a, Money::new(1000)).unwrap();
        book.deposit(b, Money::new(500)).unwrap();
        book.hold(a, Money::new(300)).unwrap();
        assert_eq!(book.total_supply(), Money::new(1500));
    }

    #[test]
    fn nonexistent_wallet_is_zero() {
        let book = WalletBook::new();
        assert!(book.entry(UserId::new()).is_zero());
    }
}
