//! Reservation manager — holds funds and drives reservation lifecycle.
//!
//! `reserve` atomically holds funds and mints a HELD reservation; if the
//! hold fails, nothing is minted. `release` refunds a hold and is
//! idempotent on an already-released id. `capture` consumes the hold and
//! credits the payee; a reservation can be captured at most once.

use std::collections::HashMap;

use chrono::Utc;
use gavel_types::{
    AuctionId, GavelError, Money, Reservation, ReservationId, ReservationState, Result, UserId,
};

use crate::wallet_book::WalletBook;

/// Manages the reservation lifecycle: minting, releasing, capturing.
pub struct ReservationManager {
    /// All reservations indexed by their ID. Retained after resolution
    /// for audit lookups.
    reservations: HashMap<ReservationId, Reservation>,
}

impl ReservationManager {
    /// Create a new empty reservation manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reservations: HashMap::new(),
        }
    }

    /// Atomically hold funds and mint a reservation.
    ///
    /// If the hold fails (insufficient available balance), no
    /// reservation is minted and the wallet is unchanged.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if available < amount.
    pub fn reserve(
        &mut self,
        book: &mut WalletBook,
        user_id: UserId,
        auction_id: AuctionId,
        amount: Money,
    ) -> Result<ReservationId> {
        book.hold(user_id, amount)?;

        let reservation = Reservation::held(user_id, auction_id, amount);
        let id = reservation.id;
        self.reservations.insert(id, reservation);
        Ok(id)
    }

    /// Release a reservation, refunding the hold.
    ///
    /// Idempotent on an already-released id: releasing twice is a no-op,
    /// not an error. Releasing a captured reservation is an error — the
    /// funds are gone.
    ///
    /// # Errors
    /// - `ReservationNotFound` if the id is unknown
    /// - `ReservationInvalid` if the reservation was captured
    pub fn release(&mut self, book: &mut WalletBook, id: ReservationId) -> Result<()> {
        let reservation = self
            .reservations
            .get_mut(&id)
            .ok_or(GavelError::ReservationNotFound(id))?;

        match reservation.state {
            ReservationState::Released => Ok(()),
            ReservationState::Captured => Err(GavelError::ReservationInvalid {
                reason: format!("{id} already captured, cannot release"),
            }),
            ReservationState::Held => {
                book.release_hold(reservation.user_id, reservation.amount)?;
                reservation.state = ReservationState::Released;
                reservation.resolved_at = Some(Utc::now());
                Ok(())
            }
        }
    }

    /// Capture a reservation: consume the bidder's held funds and credit
    /// the payee. Both sides happen or neither does.
    ///
    /// # Errors
    /// - `ReservationNotFound` if the id is unknown
    /// - `ReservationInvalid` if the reservation is not HELD
    pub fn capture(
        &mut self,
        book: &mut WalletBook,
        id: ReservationId,
        payee: UserId,
    ) -> Result<()> {
        let reservation = self
            .reservations
            .get_mut(&id)
            .ok_or(GavelError::ReservationNotFound(id))?;

        if reservation.state != ReservationState::Held {
            return Err(GavelError::ReservationInvalid {
                reason: format!("{id} is {}, not HELD", reservation.state),
            });
        }

        // Pre-check the credit so the debit and credit land together or
        // not at all.
        if book
            .entry(payee)
            .balance
            .checked_add(reservation.amount)
            .is_none()
        {
            return Err(GavelError::BalanceOverflow);
        }

        // Debit the bidder first; only then credit the payee. consume_held
        // cannot fail after the HELD check unless the book and the
        // reservation disagree, which is an invariant violation.
        book.consume_held(reservation.user_id, reservation.amount)?;
        book.credit(payee, reservation.amount)?;

        reservation.state = ReservationState::Captured;
        reservation.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// Look up a reservation by ID.
    #[must_use]
    pub fn get(&self, id: &ReservationId) -> Option<&Reservation> {
        self.reservations.get(id)
    }

    /// Whether a reservation is currently HELD.
    #[must_use]
    pub fn is_held(&self, id: &ReservationId) -> bool {
        self.reservations.get(id).is_some_and(Reservation::is_held)
    }

    /// Number of reservations tracked.
    #[must_use]
    pub fn count(&self) -> usize {
        self.reservations.len()
    }

    /// Number of HELD reservations across all auctions.
    #[must_use]
    pub fn held_count(&self) -> usize {
        self.reservations
            .values()
            .filter(|r| r.state == ReservationState::Held)
            .count()
    }

    /// Number of HELD reservations on one auction. The bid placement
    /// invariant keeps this at most 1 (the current leader's).
    #[must_use]
    pub fn held_count_for_auction(&self, auction_id: AuctionId) -> usize {
        self.reservations
            .values()
            .filter(|r| r.auction_id == auction_id && r.state == ReservationState::Held)
            .count()
    }
}

impl Default for ReservationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ReservationManager, WalletBook, UserId, AuctionId) {
        let rm = ReservationManager::new();
        let mut book = WalletBook::new();
        let user = UserId::new();
        book.deposit(user, Money::new(1000)).unwrap();
        (rm, book, user, AuctionId::new())
    }

    #[test]
    fn reserve_holds_and_mints() {
        let (mut rm, mut book, user, auction) = setup();
        let id = rm.reserve(&mut book, user, auction, Money::new(400)).unwrap();

        assert_eq!(book.available(user), Money::new(600));
        assert_eq!(book.entry(user).held, Money::new(400));
        assert!(rm.is_held(&id));
        assert_eq!(rm.held_count_for_auction(auction), 1);
    }

    #[test]
    fn reserve_insufficient_mints_nothing() {
        let (mut rm, mut book, user, auction) = setup();
        let err = rm
            .reserve(&mut book, user, auction, Money::new(2000))
            .unwrap_err();
        assert!(matches!(err, GavelError::InsufficientFunds { .. }));
        assert_eq!(rm.count(), 0);
        assert_eq!(book.available(user), Money::new(1000));
    }

    #[test]
    fn release_refunds_hold() {
        let (mut rm, mut book, user, auction) = setup();
        let id = rm.reserve(&mut book, user, auction, Money::new(400)).unwrap();

        rm.release(&mut book, id).unwrap();
        assert_eq!(book.available(user), Money::new(1000));
        assert!(!rm.is_held(&id));
        assert_eq!(rm.get(&id).unwrap().state, ReservationState::Released);
    }

    #[test]
    fn release_is_idempotent() {
        let (mut rm, mut book, user, auction) = setup();
        let id = rm.reserve(&mut book, user, auction, Money::new(400)).unwrap();

        rm.release(&mut book, id).unwrap();
        rm.release(&mut book, id).unwrap();
        // The refund happened exactly once.
        assert_eq!(book.available(user), Money::new(1000));
        assert_eq!(book.entry(user).held, Money::ZERO);
    }

    #[test]
    fn capture_debits_bidder_credits_payee() {
        let (mut rm, mut book, user, auction) = setup();
        let seller = UserId::new();
        let id = rm.reserve(&mut book, user, auction, Money::new(400)).unwrap();

        rm.capture(&mut book, id, seller).unwrap();

        assert_eq!(book.entry(user).balance, Money::new(600));
        assert_eq!(book.entry(user).held, Money::ZERO);
        assert_eq!(book.entry(seller).balance, Money::new(400));
        assert_eq!(rm.get(&id).unwrap().state, ReservationState::Captured);
    }

    #[test]
    fn capture_conserves_supply() {
        let (mut rm, mut book, user, auction) = setup();
        let seller = UserId::new();
        let before = book.total_supply();
        let id = rm.reserve(&mut book, user, auction, Money::new(400)).unwrap();
        rm.capture(&mut book, id, seller).unwrap();
        assert_eq!(book.total_supply(), before);
    }

    #[test]
    fn double_capture_blocked() {
        let (mut rm, mut book, user, auction) = setup();
        let seller = UserId::new();
        let id = rm.reserve(&mut book, user, auction, Money::new(400)).unwrap();

        rm.capture(&mut book, id, seller).unwrap();
        let err = rm.capture(&mut book, id, seller).unwrap_err();
        assert!(matches!(err, GavelError::ReservationInvalid { .. }));
        // No second credit.
        assert_eq!(book.entry(seller).balance, Money::new(400));
    }

    #[test]
    fn capture_overflowing_payee_leaves_hold_intact() {
        let (mut rm, mut book, user, auction) = setup();
        let seller = UserId::new();
        book.credit(seller, Money::new(i64::MAX)).unwrap();
        let id = rm.reserve(&mut book, user, auction, Money::new(400)).unwrap();

        let err = rm.capture(&mut book, id, seller).unwrap_err();
        assert!(matches!(err, GavelError::BalanceOverflow));
        // Neither side moved: the bidder's hold stands and the
        // reservation is still HELD.
        assert_eq!(book.entry(user).held, Money::new(400));
        assert_eq!(book.entry(user).balance, Money::new(1000));
        assert_eq!(book.entry(seller).balance, Money::new(i64::MAX));
        assert!(rm.is_held(&id));
    }

    #[test]
    fn released_cannot_be_captured() {
        let (mut rm, mut book, user, auction) = setup();
        let id = rm.reserve(&mut book, user, auction, Money::new(400)).unwrap();

        rm.release(&mut book, id).unwrap();
        let err = rm.capture(&mut book, id, UserId::new()).unwrap_err();
        assert!(matches!(err, GavelError::ReservationInvalid { .. }));
    }

    #[test]
    fn captured_cannot_be_released() {
        let (mut rm, mut book, user, auction) = setup();
        let id = rm.reserve(&mut book, user, auction, Money::new(400)).unwrap();

        rm.capture(&mut book, id, UserId::new()).unwrap();
        let err = rm.release(&mut book, id).unwrap_err();
        assert!(matches!(err, GavelError::ReservationInvalid { .. }));
    }

    #[test]
    fn nonexistent_reservation_errors() {
        let (mut rm, mut book, _, _) = setup();
        let fake = ReservationId::new();
        let err = rm.release(&mut book, fake).unwrap_err();
        assert!(matches!(err, GavelError::ReservationNotFound(_)));
    }
}
