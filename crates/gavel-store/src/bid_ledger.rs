//! Append-only bid ledger.
//!
//! Every placement attempt yields exactly one record — accepted or
//! rejected — so the current winner can always be recomputed and every
//! rejection is auditable. Records are never deleted; the only
//! after-the-fact annotation is the outbid note on a superseded leader.
//!
//! Appends commit to the in-memory history first; the journal write is
//! best-effort. A failed journal write is logged, not surfaced — the
//! bid already stands and cannot be un-accepted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use gavel_types::{
    AuctionId, Bid, BidId, BidOutcome, GavelError, Money, ReservationId, Result, UserId,
};

use crate::journal::{Journal, JournalEvent};

/// Per-auction append-only bid history.
pub struct BidLedger {
    bids: RwLock<HashMap<AuctionId, Vec<Bid>>>,
    journal: Option<Arc<Journal>>,
}

impl BidLedger {
    /// Create an empty, unjournaled ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bids: RwLock::new(HashMap::new()),
            journal: None,
        }
    }

    /// Create a ledger that journals every append.
    #[must_use]
    pub fn with_journal(journal: Arc<Journal>) -> Self {
        Self {
            bids: RwLock::new(HashMap::new()),
            journal: Some(journal),
        }
    }

    /// Append an accepted bid. Assigns the next per-auction sequence.
    pub fn append_accepted(
        &self,
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Money,
        reservation_id: ReservationId,
    ) -> Bid {
        self.append(
            auction_id,
            bidder_id,
            amount,
            BidOutcome::Accepted,
            None,
            Some(reservation_id),
        )
    }

    /// Append a rejected bid with its machine-readable reason code.
    pub fn append_rejected(
        &self,
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Money,
        reason: &str,
    ) -> Bid {
        self.append(
            auction_id,
            bidder_id,
            amount,
            BidOutcome::Rejected,
            Some(reason.to_string()),
            None,
        )
    }

    fn append(
        &self,
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Money,
        outcome: BidOutcome,
        reject_reason: Option<String>,
        reservation_id: Option<ReservationId>,
    ) -> Bid {
        let bid = {
            let mut bids = self.write();
            let history = bids.entry(auction_id).or_default();
            let bid = Bid {
                id: BidId::new(),
                auction_id,
                sequence: history.len() as u64 + 1,
                bidder_id,
                amount,
                placed_at: Utc::now(),
                outcome,
                reject_reason,
                reservation_id,
                outbid_at: None,
            };
            history.push(bid.clone());
            bid
        };
        if let Some(journal) = &self.journal {
            if let Err(err) = journal.append(&JournalEvent::BidRecorded(bid.clone())) {
                tracing::error!(
                    auction = %auction_id,
                    bid = %bid.id,
                    error = %err,
                    "journal append failed, bid recorded in memory only"
                );
            }
        }
        bid
    }

    /// All bids for an auction, ordered by sequence.
    #[must_use]
    pub fn bids_for(&self, auction_id: AuctionId) -> Vec<Bid> {
        self.read().get(&auction_id).cloned().unwrap_or_default()
    }

    /// The current leader's bid: the latest accepted bid that has not
    /// been outbid.
    #[must_use]
    pub fn leader(&self, auction_id: AuctionId) -> Option<Bid> {
        self.read()
            .get(&auction_id)?
            .iter()
            .rev()
            .find(|b| b.is_leading())
            .cloned()
    }

    /// Note that a previously accepted bid lost leadership and its
    /// reservation was released.
    ///
    /// # Errors
    /// Returns `Internal` if the bid is not in this auction's history.
    pub fn note_outbid(&self, auction_id: AuctionId, bid_id: BidId) -> Result<()> {
        let at = Utc::now();
        {
            let mut bids = self.write();
            let history = bids
                .get_mut(&auction_id)
                .ok_or_else(|| GavelError::Internal(format!("no bids for {auction_id}")))?;
            let bid = history
                .iter_mut()
                .find(|b| b.id == bid_id)
                .ok_or_else(|| GavelError::Internal(format!("bid {bid_id} not in ledger")))?;
            bid.outbid_at = Some(at);
        }
        if let Some(journal) = &self.journal {
            if let Err(err) = journal.append(&JournalEvent::BidOutbid {
                auction_id,
                bid_id,
                at,
            }) {
                tracing::error!(
                    auction = %auction_id,
                    bid = %bid_id,
                    error = %err,
                    "journal append failed, outbid note recorded in memory only"
                );
            }
        }
        Ok(())
    }

    /// Accepted bids on an auction whose reservations have not been
    /// noted released. At most one — the leader — under the placement
    /// invariant; settlement walks this list to release stragglers.
    #[must_use]
    pub fn open_reservations(&self, auction_id: AuctionId) -> Vec<(BidId, ReservationId)> {
        self.read()
            .get(&auction_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|b| b.is_leading())
                    .filter_map(|b| b.reservation_id.map(|r| (b.id, r)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Blind append used only when rebuilding from a journal replay.
    pub fn restore(&self, bid: Bid) {
        self.write().entry(bid.auction_id).or_default().push(bid);
    }

    /// Replay-side counterpart of [`Self::note_outbid`]: no journaling.
    pub fn restore_outbid(&self, auction_id: AuctionId, bid_id: BidId, at: chrono::DateTime<Utc>) {
        if let Some(history) = self.write().get_mut(&auction_id) {
            if let Some(bid) = history.iter_mut().find(|b| b.id == bid_id) {
                bid.outbid_at = Some(at);
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<AuctionId, Vec<Bid>>> {
        self.bids.read().expect("bid ledger lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<AuctionId, Vec<Bid>>> {
        self.bids.write().expect("bid ledger lock poisoned")
    }
}

impl Default for BidLedger {
    fn default() -> Self {
        Self::new()
    }
}
