//! Settlement receipts for the audit trail.
//!
//! Every completed settlement produces a [`SettlementReceipt`] whose
//! payload hash commits to the outcome: the winner, the captured
//! amount, and the seller credited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuctionId, Money, SettlementId, UserId};

/// Proof that an auction was settled, with a hash committing to the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Deterministic per auction: duplicate settlement attempts produce
    /// the same id and are detectable in logs.
    pub id: SettlementId,
    pub auction_id: AuctionId,
    pub seller_id: UserId,
    /// `None` for a no-sale (zero accepted bids).
    pub winner: Option<UserId>,
    /// The captured amount; `None` for a no-sale.
    pub amount: Option<Money>,
    /// SHA-256 hash over the canonical settlement payload.
    pub payload_hash: [u8; 32],
    pub settled_at: DateTime<Utc>,
}

impl SettlementReceipt {
    /// Build a receipt, computing the payload hash.
    #[must_use]
    pub fn new(
        auction_id: AuctionId,
        seller_id: UserId,
        winner: Option<UserId>,
        amount: Option<Money>,
    ) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"gavel:settlement:v1:");
        hasher.update(auction_id.0.as_bytes());
        hasher.update(seller_id.0.as_bytes());
        if let Some(w) = winner {
            hasher.update(w.0.as_bytes());
        }
        if let Some(a) = amount {
            hasher.update(a.minor_units().to_le_bytes());
        }
        let payload_hash: [u8; 32] = hasher.finalize().into();
        Self {
            id: SettlementId::for_auction(auction_id),
            auction_id,
            seller_id,
            winner,
            amount,
            payload_hash,
            settled_at: Utc::now(),
        }
    }

    /// Hex rendering of the payload hash for logs and operator tooling.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.payload_hash)
    }
}
