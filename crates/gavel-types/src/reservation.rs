//! # Reservation — the fund-hold primitive
//!
//! A `Reservation` earmarks funds against a bidder's wallet balance,
//! reducing their available balance without transferring ownership.
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐  settlement   ┌──────────┐
//!   │ HELD ├──────────────▶│ CAPTURED │
//!   └──┬───┘               └──────────┘
//!      │ outbid/cancel
//!      ▼
//!   ┌──────────┐
//!   │ RELEASED │
//!   └──────────┘
//! ```
//!
//! A reservation transitions **exactly once** out of HELD. That single
//! transition is what guarantees no bidder is ever charged more than
//! their locked bid and no hold is double-spent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuctionId, Money, ReservationId, UserId};

/// The lifecycle state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationState {
    /// Funds are held against the bidder's wallet.
    Held,
    /// The hold was refunded (bidder outbid, or auction cancelled).
    Released,
    /// Settlement converted the hold into a debit plus a seller credit.
    /// **Irreversible.**
    Captured,
}

impl ReservationState {
    /// Can this reservation transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Held, Self::Released | Self::Captured)
        )
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Held => write!(f, "HELD"),
            Self::Released => write!(f, "RELEASED"),
            Self::Captured => write!(f, "CAPTURED"),
        }
    }
}

/// Funds earmarked against a wallet balance for one accepted bid.
///
/// Owned by the wallet ledger; referenced (never mutated) by the bid
/// placement coordinator through its [`ReservationId`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    /// The bidder whose balance is held.
    pub user_id: UserId,
    /// The auction the backing bid was placed on.
    pub auction_id: AuctionId,
    pub amount: Money,
    pub state: ReservationState,
    pub created_at: DateTime<Utc>,
    /// When the reservation left HELD, if it has.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Create a fresh HELD reservation.
    #[must_use]
    pub fn held(user_id: UserId, auction_id: AuctionId, amount: Money) -> Self {
        Self {
            id: ReservationId::new(),
            user_id,
            auction_id,
            amount,
            state: ReservationState::Held,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.state == ReservationState::Held
    }

    /// Attempt to transition to RELEASED.
    ///
    /// # Errors
    /// Returns `ReservationInvalid` if the current state is not HELD.
    pub fn mark_released(&mut self) -> crate::Result<()> {
        if !self.state.can_transition_to(ReservationState::Released) {
            return Err(crate::GavelError::ReservationInvalid {
                reason: format!("cannot transition {} from {} to RELEASED", self.id, self.state),
            });
        }
        self.state = ReservationState::Released;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// Attempt to transition to CAPTURED.
    ///
    /// # Errors
    /// Returns `ReservationInvalid` if the current state is not HELD.
    pub fn mark_captured(&mut self) -> crate::Result<()> {
        if !self.state.can_transition_to(ReservationState::Captured) {
            return Err(crate::GavelError::ReservationInvalid {
                reason: format!("cannot transition {} from {} to CAPTURED", self.id, self.state),
            });
        }
        self.state = ReservationState::Captured;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }
}
