//! Bid placement coordinator — the concurrency-critical core.
//!
//! Serializes concurrent bid attempts per auction, enforces the
//! monotonic-increase and minimum-increment rules, and drives fund
//! lock/unlock against the wallet ledger.
//!
//! ## Placement algorithm
//!
//! 1. Acquire the per-auction critical section
//! 2. Validate against the latest auction record (stale reads from
//!    before the lock cannot slip through)
//! 3. Reserve the new amount from the bidder's wallet
//! 4. Compare-and-set the new leader on the auction store
//! 5. Append the accepted bid; release the prior leader's reservation
//! 6. Release the critical section; emit a leadership-changed event
//!
//! The ordering is **reserve-new-then-release-old**: at no instant is
//! leadership ambiguous while neither bidder's funds are held. The
//! store update happens before the old release so a failed update can
//! roll back the *new* reservation instead of stranding the old leader
//! unheld. No reservation is ever leaked by a failed attempt: the only
//! side effect before step 4 commits is the new hold, and every failure
//! path after step 3 releases it. Once step 4 commits the attempt is
//! accepted; bookkeeping failures after it are logged, never surfaced —
//! a bid the store and the wallet both show cannot be reported rejected.

use std::sync::Arc;

use gavel_store::{AuctionStore, BidLedger};
use gavel_types::{
    AuctionEvent, AuctionId, BidId, GavelError, Money, Result, UserId,
};
use gavel_wallet::WalletLedger;
use tokio::sync::broadcast;

use crate::auction_locks::KeyedLocks;

/// Accepts or rejects bid placement attempts, one auction at a time.
pub struct BidCoordinator {
    store: Arc<AuctionStore>,
    bids: Arc<BidLedger>,
    ledger: Arc<dyn WalletLedger>,
    locks: Arc<KeyedLocks>,
    events: broadcast::Sender<AuctionEvent>,
    /// Automatic internal retries on a concurrency conflict before the
    /// failure is surfaced to the caller.
    conflict_retries: u32,
}

impl BidCoordinator {
    #[must_use]
    pub fn new(
        store: Arc<AuctionStore>,
        bids: Arc<BidLedger>,
        ledger: Arc<dyn WalletLedger>,
        locks: Arc<KeyedLocks>,
        events: broadcast::Sender<AuctionEvent>,
        conflict_retries: u32,
    ) -> Self {
        Self {
            store,
            bids,
            ledger,
            locks,
            events,
            conflict_retries,
        }
    }

    /// Place a bid. Returns the accepted bid's id, or the rejection.
    ///
    /// Every call yields exactly one bid ledger entry, accepted or
    /// rejected — the engine never silently drops an attempt.
    ///
    /// # Errors
    /// - `AuctionNotFound` / `AuctionNotActive` / `BidBelowMinimum` /
    ///   `SelfOutbid` — validation failures, in that precedence order
    /// - `InsufficientFunds` — the wallet cannot cover the amount
    /// - `StateConflict` — lost a race even after the internal retry;
    ///   the caller may retry
    pub fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Money,
    ) -> Result<BidId> {
        let outcome = {
            let entry = self.locks.entry(auction_id);
            let _guard = entry.lock().expect("auction lock poisoned");

            let mut attempt = 0;
            loop {
                match self.try_place(auction_id, bidder_id, amount) {
                    Err(err)
                        if matches!(err, GavelError::StateConflict { .. })
                            && attempt < self.conflict_retries =>
                    {
                        attempt += 1;
                        tracing::debug!(
                            auction = %auction_id,
                            attempt,
                            "stale state on bid placement, revalidating"
                        );
                    }
                    outcome => break outcome,
                }
            }
        };
        // Critical section released; record rejections and notify.
        match outcome {
            Ok(placed) => {
                let _ = self.events.send(AuctionEvent::LeadershipChanged {
                    auction_id,
                    bid_id: placed.bid_id,
                    bidder_id,
                    amount,
                    previous_leader: placed.previous_leader,
                });
                Ok(placed.bid_id)
            }
            Err(err) => {
                self.bids
                    .append_rejected(auction_id, bidder_id, amount, err.reason_code());
                Err(err)
            }
        }
    }

    /// One placement attempt under the lock. On failure, no reservation
    /// remains held for this attempt.
    fn try_place(
        &self,
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Money,
    ) -> Result<Placed> {
        // Preconditions, first failure wins.
        let auction = self.store.get(auction_id)?;
        if !auction.is_biddable() {
            return Err(GavelError::AuctionNotActive {
                state: auction.state,
            });
        }
        let required = auction.min_acceptable_bid();
        if amount < required {
            return Err(GavelError::BidBelowMinimum {
                required,
                offered: amount,
            });
        }
        if auction.current_bidder == Some(bidder_id) {
            return Err(GavelError::SelfOutbid);
        }
        let available = self.ledger.available(bidder_id);
        if available < amount {
            return Err(GavelError::InsufficientFunds {
                needed: amount,
                available,
            });
        }

        let previous = self.bids.leader(auction_id);

        // Reserve the new amount first. The ledger re-checks headroom
        // atomically, closing the race with another hold on the same
        // wallet from a different auction.
        let reservation_id = self.ledger.reserve(bidder_id, auction_id, amount)?;

        // CAS the leader. A conflict here means the record moved after
        // our read; roll back the fresh hold and let the caller retry.
        if let Err(err) =
            self.store
                .record_leader(auction_id, auction.current_bid, amount, bidder_id)
        {
            self.ledger.release(reservation_id)?;
            return Err(err);
        }

        let bid = self
            .bids
            .append_accepted(auction_id, bidder_id, amount, reservation_id);

        // Refund the outbid leader only now that the new hold is
        // committed. A release failure is left for settlement's sweep
        // of open reservations rather than failing the accepted bid.
        let previous_leader = previous.as_ref().map(|p| p.bidder_id);
        if let Some(prev) = previous {
            if let Some(prev_rsv) = prev.reservation_id {
                match self.ledger.release(prev_rsv) {
                    Ok(()) => {
                        if let Err(err) = self.bids.note_outbid(auction_id, prev.id) {
                            tracing::error!(
                                auction = %auction_id,
                                bid = %prev.id,
                                error = %err,
                                "failed to note outbid on released leader"
                            );
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            auction = %auction_id,
                            bid = %prev.id,
                            error = %err,
                            "failed to release outbid reservation, deferring to settlement"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            auction = %auction_id,
            bid = %bid.id,
            %amount,
            "bid accepted"
        );
        Ok(Placed {
            bid_id: bid.id,
            previous_leader,
        })
    }
}

struct Placed {
    bid_id: BidId,
    previous_leader: Option<UserId>,
}
