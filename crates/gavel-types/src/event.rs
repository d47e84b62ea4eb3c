//! Events broadcast to the presentation layer.
//!
//! The engine emits one event per observable state change so pollers
//! and dashboards can refresh without re-reading the whole store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuctionId, BidId, Money, UserId};

/// A state change observable by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuctionEvent {
    /// The auction crossed its start boundary and accepts bids.
    Opened { auction_id: AuctionId, at: DateTime<Utc> },
    /// A new bid took over leadership.
    LeadershipChanged {
        auction_id: AuctionId,
        bid_id: BidId,
        bidder_id: UserId,
        amount: Money,
        /// The previous leader whose reservation was released, if any.
        previous_leader: Option<UserId>,
    },
    /// The auction crossed its end boundary; settlement pending.
    Ended { auction_id: AuctionId, at: DateTime<Utc> },
    /// Settlement completed. `winner` is `None` for a no-sale.
    Settled {
        auction_id: AuctionId,
        winner: Option<UserId>,
        amount: Option<Money>,
    },
    /// The auction was administratively cancelled.
    Cancelled { auction_id: AuctionId, reason: String },
}

impl AuctionEvent {
    /// The auction this event concerns.
    #[must_use]
    pub fn auction_id(&self) -> AuctionId {
        match self {
            Self::Opened { auction_id, .. }
            | Self::LeadershipChanged { auction_id, .. }
            | Self::Ended { auction_id, .. }
            | Self::Settled { auction_id, .. }
            | Self::Cancelled { auction_id, .. } => *auction_id,
        }
    }
}
