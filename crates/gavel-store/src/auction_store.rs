//! The auction state store — single source of truth for auction records.
//!
//! All updates are compare-and-set: a transition only applies if the
//! record is still in the expected predecessor state, and a leader
//! update only applies if the current bid is still the one the writer
//! validated against. A concurrent writer that lost the race gets a
//! `StateConflict` instead of silently clobbering.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use gavel_types::{
    Auction, AuctionId, AuctionKind, AuctionState, GavelError, Money, Result, UserId,
};

use crate::journal::{Journal, JournalEvent};

/// Canonical store of auction records.
pub struct AuctionStore {
    auctions: RwLock<HashMap<AuctionId, Auction>>,
    journal: Option<Arc<Journal>>,
}

impl AuctionStore {
    /// Create an empty, unjournaled store (tests and ephemeral use).
    #[must_use]
    pub fn new() -> Self {
        Self {
            auctions: RwLock::new(HashMap::new()),
            journal: None,
        }
    }

    /// Create a store that journals every mutation.
    #[must_use]
    pub fn with_journal(journal: Arc<Journal>) -> Self {
        Self {
            auctions: RwLock::new(HashMap::new()),
            journal: Some(journal),
        }
    }

    /// Insert a new auction record.
    ///
    /// # Errors
    /// - `DuplicateAuction` if the id already exists
    /// - `InvalidAuction` if the record fails basic validation
    pub fn insert(&self, auction: Auction) -> Result<()> {
        validate(&auction)?;
        {
            let mut auctions = self.write();
            if auctions.contains_key(&auction.id) {
                return Err(GavelError::DuplicateAuction(auction.id));
            }
            auctions.insert(auction.id, auction.clone());
        }
        self.journal_upsert(&auction)
    }

    /// Fetch an auction by id.
    pub fn get(&self, id: AuctionId) -> Result<Auction> {
        self.read()
            .get(&id)
            .cloned()
            .ok_or(GavelError::AuctionNotFound(id))
    }

    /// All currently active auctions of one kind, soonest-ending first.
    #[must_use]
    pub fn list_active(&self, kind: AuctionKind) -> Vec<Auction> {
        let mut out: Vec<Auction> = self
            .read()
            .values()
            .filter(|a| a.kind == kind && a.state == AuctionState::Active)
            .cloned()
            .collect();
        out.sort_by_key(|a| a.end_time);
        out
    }

    /// All ended or settled auctions of one kind, most recent first.
    #[must_use]
    pub fn list_ended(&self, kind: AuctionKind) -> Vec<Auction> {
        let mut out: Vec<Auction> = self
            .read()
            .values()
            .filter(|a| {
                a.kind == kind
                    && matches!(a.state, AuctionState::Ended | AuctionState::Settled)
            })
            .cloned()
            .collect();
        out.sort_by_key(|a| std::cmp::Reverse(a.end_time));
        out
    }

    /// A point-in-time copy of every record. Used by the lifecycle
    /// scheduler's poll.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Auction> {
        self.read().values().cloned().collect()
    }

    /// Compare-and-set state transition: applies only if the record is
    /// still in `from`. Returns the updated record.
    ///
    /// # Errors
    /// - `AuctionNotFound` if the id is unknown
    /// - `InvalidTransition` if `from → to` is not a legal transition
    /// - `StateConflict` if the record is no longer in `from`
    pub fn transition(
        &self,
        id: AuctionId,
        from: AuctionState,
        to: AuctionState,
    ) -> Result<Auction> {
        if !from.can_transition_to(to) {
            return Err(GavelError::InvalidTransition { from, to });
        }
        let updated = {
            let mut auctions = self.write();
            let auction = auctions.get_mut(&id).ok_or(GavelError::AuctionNotFound(id))?;
            if auction.state != from {
                return Err(GavelError::StateConflict {
                    expected: from.to_string(),
                    actual: auction.state.to_string(),
                });
            }
            auction.state = to;
            auction.updated_at = Utc::now();
            auction.clone()
        };
        self.journal_upsert(&updated)?;
        Ok(updated)
    }

    /// Compare-and-set leader update: applies only if the auction is
    /// still active and its current bid is still `expected_bid`. The new
    /// amount must strictly exceed the old one.
    ///
    /// # Errors
    /// - `AuctionNotFound` if the id is unknown
    /// - `StateConflict` if the state or current bid moved underneath
    ///   the caller
    /// - `BidBelowMinimum` if `amount` does not increase the current bid
    pub fn record_leader(
        &self,
        id: AuctionId,
        expected_bid: Option<Money>,
        amount: Money,
        bidder: UserId,
    ) -> Result<Auction> {
        let updated = {
            let mut auctions = self.write();
            let auction = auctions.get_mut(&id).ok_or(GavelError::AuctionNotFound(id))?;
            if auction.state != AuctionState::Active {
                return Err(GavelError::StateConflict {
                    expected: AuctionState::Active.to_string(),
                    actual: auction.state.to_string(),
                });
            }
            if auction.current_bid != expected_bid {
                return Err(GavelError::StateConflict {
                    expected: format!("{expected_bid:?}"),
                    actual: format!("{:?}", auction.current_bid),
                });
            }
            if amount < auction.min_acceptable_bid() {
                return Err(GavelError::BidBelowMinimum {
                    required: auction.min_acceptable_bid(),
                    offered: amount,
                });
            }
            auction.current_bid = Some(amount);
            auction.current_bidder = Some(bidder);
            auction.updated_at = Utc::now();
            auction.clone()
        };
        self.journal_upsert(&updated)?;
        Ok(updated)
    }

    /// Blind upsert used only when rebuilding from a journal replay.
    pub fn restore(&self, auction: Auction) {
        self.write().insert(auction.id, auction);
    }

    fn journal_upsert(&self, auction: &Auction) -> Result<()> {
        if let Some(journal) = &self.journal {
            journal.append(&JournalEvent::AuctionUpserted(auction.clone()))?;
        }
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<AuctionId, Auction>> {
        self.auctions.read().expect("auction store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<AuctionId, Auction>> {
        self.auctions.write().expect("auction store lock poisoned")
    }
}

impl Default for AuctionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(auction: &Auction) -> Result<()> {
    if auction.end_time <= auction.start_time {
        return Err(GavelError::InvalidAuction {
            reason: "end_time must be after start_time".to_string(),
        });
    }
    if auction.starting_price.is_negative() || auction.starting_price.is_zero() {
        return Err(GavelError::InvalidAuction {
            reason: "starting_price must be positive".to_string(),
        });
    }
    if auction.min_increment.is_negative() || auction.min_increment.is_zero() {
        return Err(GavelError::InvalidAuction {
            reason: "min_increment must be positive".to_string(),
        });
    }
    if auction.title.len() > gavel_types::constants::MAX_TITLE_LEN {
        return Err(GavelError::InvalidAuction {
            reason: "title too long".to_string(),
        });
    }
    if auction.description.len() > gavel_types::constants::MAX_DESCRIPTION_LEN {
        return Err(GavelError::InvalidAuction {
            reason: "description too long".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(auction: &Auction) -> AuctionStore {
        let store = AuctionStore::new();
        store.insert(auction.clone()).unwrap();
        store
    }

    #[test]
    fn insert_and_get() {
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        let store = store_with(&auction);
        let got = store.get(auction.id).unwrap();
        assert_eq!(got.id, auction.id);
        assert_eq!(got.state, AuctionState::Active);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        let store = store_with(&auction);
        let err = store.insert(auction).unwrap_err();
        assert!(matches!(err, GavelError::DuplicateAuction(_)));
    }

    #[test]
    fn invalid_times_rejected() {
        let mut auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        auction.end_time = auction.start_time;
        let store = AuctionStore::new();
        let err = store.insert(auction).unwrap_err();
        assert!(matches!(err, GavelError::InvalidAuction { .. }));
    }

    #[test]
    fn get_missing_errors() {
        let store = AuctionStore::new();
        let err = store.get(AuctionId::new()).unwrap_err();
        assert!(matches!(err, GavelError::AuctionNotFound(_)));
    }

    #[test]
    fn transition_cas_succeeds_once() {
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        let store = store_with(&auction);

        let updated = store
            .transition(auction.id, AuctionState::Active, AuctionState::Ended)
            .unwrap();
        assert_eq!(updated.state, AuctionState::Ended);

        // Second identical transition finds the wrong predecessor.
        let err = store
            .transition(auction.id, AuctionState::Active, AuctionState::Ended)
            .unwrap_err();
        assert!(matches!(err, GavelError::StateConflict { .. }));
    }

    #[test]
    fn illegal_transition_rejected() {
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        let store = store_with(&auction);
        let err = store
            .transition(auction.id, AuctionState::Active, AuctionState::Settled)
            .unwrap_err();
        assert!(matches!(err, GavelError::InvalidTransition { .. }));
    }

    #[test]
    fn record_leader_cas() {
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        let store = store_with(&auction);
        let bidder = UserId::new();

        let updated = store
            .record_leader(auction.id, None, Money::new(100), bidder)
            .unwrap();
        assert_eq!(updated.current_bid, Some(Money::new(100)));
        assert_eq!(updated.current_bidder, Some(bidder));

        // A writer that validated against the stale (None) bid loses.
        let err = store
            .record_leader(auction.id, None, Money::new(200), UserId::new())
            .unwrap_err();
        assert!(matches!(err, GavelError::StateConflict { .. }));

        // A writer with the fresh expected value wins.
        store
            .record_leader(
                auction.id,
                Some(Money::new(100)),
                Money::new(110),
                UserId::new(),
            )
            .unwrap();
    }

    #[test]
    fn record_leader_requires_active() {
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        let store = store_with(&auction);
        store
            .transition(auction.id, AuctionState::Active, AuctionState::Ended)
            .unwrap();
        let err = store
            .record_leader(auction.id, None, Money::new(100), UserId::new())
            .unwrap_err();
        assert!(matches!(err, GavelError::StateConflict { .. }));
    }

    #[test]
    fn record_leader_enforces_increment() {
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        let store = store_with(&auction);
        store
            .record_leader(auction.id, None, Money::new(100), UserId::new())
            .unwrap();
        let err = store
            .record_leader(
                auction.id,
                Some(Money::new(100)),
                Money::new(109),
                UserId::new(),
            )
            .unwrap_err();
        assert!(matches!(err, GavelError::BidBelowMinimum { .. }));
    }

    #[test]
    fn listings_filter_by_kind_and_state() {
        let store = AuctionStore::new();
        let live = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        let settled_kind = Auction::dummy(AuctionKind::Settled, Money::new(100), Money::new(10));
        store.insert(live.clone()).unwrap();
        store.insert(settled_kind.clone()).unwrap();

        assert_eq!(store.list_active(AuctionKind::Live).len(), 1);
        assert_eq!(store.list_active(AuctionKind::Settled).len(), 1);
        assert!(store.list_ended(AuctionKind::Live).is_empty());

        store
            .transition(live.id, AuctionState::Active, AuctionState::Ended)
            .unwrap();
        assert!(store.list_active(AuctionKind::Live).is_empty());
        assert_eq!(store.list_ended(AuctionKind::Live).len(), 1);
    }
}
