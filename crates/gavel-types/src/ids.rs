//! Globally unique identifiers used throughout Gavel.
//!
//! All entity IDs use UUIDv7 for time-ordered lexicographic sorting,
//! except `SettlementId` which is derived deterministically from the
//! auction it settles.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AuctionId
// ---------------------------------------------------------------------------

/// Globally unique auction identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AuctionId(pub Uuid);

impl AuctionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for AuctionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BidId
// ---------------------------------------------------------------------------

/// Globally unique bid identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BidId(pub Uuid);

impl BidId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BidId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Unique identifier for a user (bidder or seller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ReservationId
// ---------------------------------------------------------------------------

/// Unique identifier for a wallet reservation (funds held against a bid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ReservationId(pub Uuid);

impl ReservationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rsv:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SettlementId
// ---------------------------------------------------------------------------

/// Identifier for a settlement run, derived deterministically from the
/// auction being settled.
///
/// Settling the same auction always yields the same `SettlementId`, which
/// makes duplicate settlement attempts trivially detectable in audit logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SettlementId(pub Uuid);

impl SettlementId {
    /// Deterministic `SettlementId` for an auction.
    #[must_use]
    pub fn for_auction(auction_id: AuctionId) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"gavel:settlement_id:v1:");
        hasher.update(auction_id.0.as_bytes());
        let hash = hasher.finalize();
        let bytes: [u8; 16] = hash[..16].try_into().expect("SHA-256 produces 32 bytes");
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stl:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auction_id_uniqueness() {
        let a = AuctionId::new();
        let b = AuctionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn auction_id_ordering() {
        let a = AuctionId::new();
        let b = AuctionId::new();
        assert!(a < b);
    }

    #[test]
    fn bid_id_uniqueness() {
        let a = BidId::new();
        let b = BidId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn settlement_id_deterministic() {
        let auction = AuctionId::new();
        let a = SettlementId::for_auction(auction);
        let b = SettlementId::for_auction(auction);
        assert_eq!(a, b);
        let c = SettlementId::for_auction(AuctionId::new());
        assert_ne!(a, c);
    }

    #[test]
    fn reservation_id_display_prefix() {
        let id = ReservationId::new();
        assert!(format!("{id}").starts_with("rsv:"));
    }

    #[test]
    fn serde_roundtrips() {
        let aid = AuctionId::new();
        let json = serde_json::to_string(&aid).unwrap();
        let back: AuctionId = serde_json::from_str(&json).unwrap();
        assert_eq!(aid, back);

        let rid = ReservationId::new();
        let json = serde_json::to_string(&rid).unwrap();
        let back: ReservationId = serde_json::from_str(&json).unwrap();
        assert_eq!(rid, back);
    }
}
