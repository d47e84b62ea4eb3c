//! Wallet balance types for the escrow model.
//!
//! Every user has a `balance` (total funds) and a `held` amount locked
//! by reservations on active bids. The invariant `available ≥ 0` holds
//! at all times.

use serde::{Deserialize, Serialize};

use crate::Money;

/// A single user's wallet entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletEntry {
    /// Total funds in the wallet.
    pub balance: Money,
    /// Funds locked by HELD reservations.
    pub held: Money,
}

impl WalletEntry {
    /// Create an empty wallet entry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balance: Money::ZERO,
            held: Money::ZERO,
        }
    }

    /// Funds usable for new bids: `balance − held`.
    #[must_use]
    pub fn available(&self) -> Money {
        self.balance - self.held
    }

    /// Whether this entry has no funds at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.balance.is_zero() && self.held.is_zero()
    }
}

impl Default for WalletEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zero() {
        let entry = WalletEntry::default();
        assert!(entry.is_zero());
        assert_eq!(entry.available(), Money::ZERO);
    }

    #[test]
    fn available_subtracts_held() {
        let entry = WalletEntry {
            balance: Money::new(150),
            held: Money::new(50),
        };
        assert_eq!(entry.available(), Money::new(100));
        assert!(!entry.is_zero());
    }

    #[test]
    fn serde_roundtrip() {
        let entry = WalletEntry {
            balance: Money::new(12345),
            held: Money::new(678),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: WalletEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
