//! Auction model and lifecycle state machine.
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────────┐      ┌────────┐      ┌───────┐      ┌─────────┐
//!   │ SCHEDULED ├─────▶│ ACTIVE ├─────▶│ ENDED ├─────▶│ SETTLED │
//!   └─────┬─────┘      └───┬────┘      └───────┘      └─────────┘
//!         │ admin cancel   │ admin cancel
//!         ▼                ▼
//!       ┌───────────────────┐
//!       │     CANCELLED     │
//!       └───────────────────┘
//! ```
//!
//! Transitions are **forward-only**: an auction never returns to an
//! earlier state, and `current_bid` (once set) strictly increases over
//! the auction's life.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuctionId, Money, UserId};

/// The two auction modalities sharing this engine's lifecycle and
/// bidding semantics. They differ only in external presentation and
/// timing conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionKind {
    /// Time-boxed, real-time competitive bidding.
    Live,
    /// Asynchronous, longer-running bidding.
    Settled,
}

impl std::fmt::Display for AuctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "LIVE"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// Lifecycle state of an auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionState {
    /// Created, waiting for its start time.
    Scheduled,
    /// Accepting bids.
    Active,
    /// Past its end time; settlement pending or retrying.
    Ended,
    /// Settlement complete. Terminal.
    Settled,
    /// Administratively cancelled. Terminal.
    Cancelled,
}

impl AuctionState {
    /// Can this state transition to the given target state?
    ///
    /// Only forward transitions are allowed; `Cancelled` is reachable
    /// from `Scheduled` and `Active` only.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Scheduled, Self::Active | Self::Cancelled)
                | (Self::Active, Self::Ended | Self::Cancelled)
                | (Self::Ended, Self::Settled)
        )
    }

    /// Whether this state accepts no further processing.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Cancelled)
    }
}

impl std::fmt::Display for AuctionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "SCHEDULED"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Ended => write!(f, "ENDED"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Canonical auction record, owned exclusively by the auction store.
///
/// `state` is mutated only by the lifecycle scheduler (and the admin
/// cancel path); `current_bid` / `current_bidder` only by the bid
/// placement coordinator. Records are retained forever once settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub kind: AuctionKind,
    pub title: String,
    pub description: String,
    pub seller_id: UserId,
    /// Minimum amount for the first bid.
    pub starting_price: Money,
    /// Minimum amount a new bid must exceed the current one by.
    pub min_increment: Money,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Highest accepted bid so far, if any. Strictly increasing.
    pub current_bid: Option<Money>,
    /// The current leader, if any.
    pub current_bidder: Option<UserId>,
    pub state: AuctionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    /// The smallest amount the next bid must reach to be accepted:
    /// `current_bid + min_increment`, or `starting_price` if nobody
    /// has bid yet. Saturates at [`Money::MAX`], which no wallet can
    /// cover, so bidding simply stops at the ceiling.
    #[must_use]
    pub fn min_acceptable_bid(&self) -> Money {
        match self.current_bid {
            Some(current) => current.checked_add(self.min_increment).unwrap_or(Money::MAX),
            None => self.starting_price,
        }
    }

    /// Whether an auction in this record's state accepts bids.
    #[must_use]
    pub fn is_biddable(&self) -> bool {
        self.state == AuctionState::Active
    }
}

/// Test helpers. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Auction {
    /// A dummy auction that started a minute ago and runs for an hour.
    pub fn dummy(kind: AuctionKind, starting_price: Money, min_increment: Money) -> Self {
        let now = Utc::now();
        Self {
            id: AuctionId::new(),
            kind,
            title: "Dummy lot".to_string(),
            description: "A dummy auction for unit tests".to_string(),
            seller_id: UserId::new(),
            starting_price,
            min_increment,
            start_time: now - chrono::Duration::minutes(1),
            end_time: now + chrono::Duration::hours(1),
            current_bid: None,
            current_bidder: None,
            state: AuctionState::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// A dummy auction still waiting for its start time.
    pub fn dummy_scheduled(kind: AuctionKind, starting_price: Money) -> Self {
        let now = Utc::now();
        let mut auction = Self::dummy(kind, starting_price, Money::new(1));
        auction.state = AuctionState::Scheduled;
        auction.start_time = now + chrono::Duration::minutes(5);
        auction.end_time = now + chrono::Duration::hours(1);
        auction
    }
}
