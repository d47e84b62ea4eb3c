//! Bid records for the append-only bid ledger.
//!
//! Every placement attempt — accepted or rejected — yields exactly one
//! `Bid` record. Records are never deleted; they are the audit trail
//! from which the current leader can always be recomputed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuctionId, BidId, Money, ReservationId, UserId};

/// Whether a placement attempt was accepted into the auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidOutcome {
    Accepted,
    Rejected,
}

impl std::fmt::Display for BidOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// One bid placement attempt on one auction.
///
/// `sequence` is assigned by the bid ledger and increases monotonically
/// per auction. `reservation_id` is present iff the bid was accepted.
/// `outbid_at` is the ledger's note that the reservation backing this
/// bid was released because a higher bid took over leadership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    /// Monotonically increasing per auction, assigned on append.
    pub sequence: u64,
    pub bidder_id: UserId,
    pub amount: Money,
    pub placed_at: DateTime<Utc>,
    pub outcome: BidOutcome,
    /// Machine-readable reason code; present iff rejected.
    pub reject_reason: Option<String>,
    /// The wallet reservation backing this bid; present iff accepted.
    pub reservation_id: Option<ReservationId>,
    /// When this bid lost leadership and its reservation was released.
    pub outbid_at: Option<DateTime<Utc>>,
}

impl Bid {
    /// Whether this bid was accepted and still leads (not yet outbid).
    #[must_use]
    pub fn is_leading(&self) -> bool {
        self.outcome == BidOutcome::Accepted && self.outbid_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_accepted() -> Bid {
        Bid {
            id: BidId::new(),
            auction_id: AuctionId::new(),
            sequence: 1,
            bidder_id: UserId::new(),
            amount: Money::new(100),
            placed_at: Utc::now(),
            outcome: BidOutcome::Accepted,
            reject_reason: None,
            reservation_id: Some(ReservationId::new()),
            outbid_at: None,
        }
    }

    #[test]
    fn accepted_bid_is_leading() {
        let bid = make_accepted();
        assert!(bid.is_leading());
    }

    #[test]
    fn outbid_bid_is_not_leading() {
        let mut bid = make_accepted();
        bid.outbid_at = Some(Utc::now());
        assert!(!bid.is_leading());
    }

    #[test]
    fn rejected_bid_is_not_leading() {
        let mut bid = make_accepted();
        bid.outcome = BidOutcome::Rejected;
        bid.reservation_id = None;
        bid.reject_reason = Some("insufficient_funds".to_string());
        assert!(!bid.is_leading());
    }

    #[test]
    fn outcome_display() {
        assert_eq!(format!("{}", BidOutcome::Accepted), "ACCEPTED");
        assert_eq!(format!("{}", BidOutcome::Rejected), "REJECTED");
    }

    #[test]
    fn bid_serde_roundtrip() {
        let bid = make_accepted();
        let json = serde_json::to_string(&bid).unwrap();
        let back: Bid = serde_json::from_str(&json).unwrap();
        assert_eq!(bid.id, back.id);
        assert_eq!(bid.amount, back.amount);
        assert_eq!(bid.outcome, back.outcome);
    }
}
