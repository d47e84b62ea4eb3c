//! Idempotent settlement: the final fund movement of an auction.
//!
//! Settlement captures the winning reservation to the seller, releases
//! every other open hold, and moves the auction `ENDED → SETTLED`
//! exactly once. Re-invocations are no-ops once the auction is settled,
//! and a retry after a partial failure resumes where the previous
//! attempt stopped — the reservation state machine makes every step
//! individually idempotent.
//!
//! Failure handling splits in two:
//! - transient (`LedgerUnavailable`): the auction stays ENDED and the
//!   lifecycle scheduler retries on its next poll
//! - permanent (`ReservationInvalid` on the winner's hold): the auction
//!   is flagged for manual reconciliation and excluded from automatic
//!   retry

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gavel_store::{AuctionStore, BidLedger};
use gavel_types::{
    Auction, AuctionEvent, AuctionId, AuctionState, Bid, GavelError, ReservationState, Result,
    SettlementReceipt,
};
use gavel_wallet::WalletLedger;

use crate::auction_locks::KeyedLocks;
use tokio::sync::broadcast;

/// Drives the terminal fund movement for ended auctions, plus the
/// administrative cancel path.
pub struct SettlementEngine {
    store: Arc<AuctionStore>,
    bids: Arc<BidLedger>,
    ledger: Arc<dyn WalletLedger>,
    locks: Arc<KeyedLocks>,
    events: broadcast::Sender<AuctionEvent>,
    receipts: Mutex<HashMap<AuctionId, SettlementReceipt>>,
    /// Auctions needing manual operator reconciliation, with the reason.
    /// Excluded from the scheduler's automatic settlement retry.
    flagged: Mutex<HashMap<AuctionId, String>>,
}

impl SettlementEngine {
    #[must_use]
    pub fn new(
        store: Arc<AuctionStore>,
        bids: Arc<BidLedger>,
        ledger: Arc<dyn WalletLedger>,
        locks: Arc<KeyedLocks>,
        events: broadcast::Sender<AuctionEvent>,
    ) -> Self {
        Self {
            store,
            bids,
            ledger,
            locks,
            events,
            receipts: Mutex::new(HashMap::new()),
            flagged: Mutex::new(HashMap::new()),
        }
    }

    /// Settle an ended auction. Idempotent: settling an already-settled
    /// auction succeeds without moving any funds.
    ///
    /// # Errors
    /// - `AuctionNotFound` if the id is unknown
    /// - `InvalidTransition` if the auction has not ended (or was
    ///   cancelled)
    /// - `LedgerUnavailable` if the wallet ledger failed transiently;
    ///   the auction stays ENDED for retry
    /// - `ReconciliationRequired` if the winner's reservation is
    ///   unusable; the auction is flagged and kept out of auto-retry
    pub fn settle(&self, auction_id: AuctionId) -> Result<()> {
        let entry = self.locks.entry(auction_id);
        let _guard = entry.lock().expect("auction lock poisoned");

        let auction = self.store.get(auction_id)?;
        match auction.state {
            AuctionState::Settled => return Ok(()),
            AuctionState::Ended => {}
            other => {
                return Err(GavelError::InvalidTransition {
                    from: other,
                    to: AuctionState::Settled,
                });
            }
        }

        let winner = self.bids.leader(auction_id);
        let (winner_id, amount) = match &winner {
            Some(lead) => {
                self.capture_winner(&auction, lead)?;
                (Some(lead.bidder_id), Some(lead.amount))
            }
            None => (None, None),
        };

        // Sweep holds the placement path could not release (it defers
        // failed releases here). The winner's bid is skipped; it was
        // just captured.
        let winner_bid_id = winner.as_ref().map(|b| b.id);
        for (bid_id, reservation_id) in self.bids.open_reservations(auction_id) {
            if Some(bid_id) == winner_bid_id {
                continue;
            }
            match self.ledger.release(reservation_id) {
                Ok(()) => self.bids.note_outbid(auction_id, bid_id)?,
                Err(err) => {
                    tracing::warn!(
                        auction = %auction_id,
                        reservation = %reservation_id,
                        error = %err,
                        "failed to release straggler hold during settlement"
                    );
                    return Err(GavelError::SettlementFailed {
                        reason: format!("release of {reservation_id} failed: {err}"),
                    });
                }
            }
        }

        self.store
            .transition(auction_id, AuctionState::Ended, AuctionState::Settled)?;

        let receipt =
            SettlementReceipt::new(auction_id, auction.seller_id, winner_id, amount);
        tracing::info!(
            auction = %auction_id,
            settlement = %receipt.id,
            winner = ?winner_id,
            ?amount,
            hash = %receipt.hash_hex(),
            "auction settled"
        );
        self.receipts
            .lock()
            .expect("receipts lock poisoned")
            .insert(auction_id, receipt);

        let _ = self.events.send(AuctionEvent::Settled {
            auction_id,
            winner: winner_id,
            amount,
        });
        Ok(())
    }

    /// Capture the winning hold to the seller, tolerating a retry after
    /// a previous attempt that captured but failed before SETTLED.
    fn capture_winner(&self, auction: &Auction, lead: &Bid) -> Result<()> {
        let reservation_id = lead.reservation_id.ok_or_else(|| {
            GavelError::Internal(format!("accepted bid {} has no reservation", lead.id))
        })?;
        let reservation = match self.ledger.reservation(reservation_id) {
            Some(r) => r,
            None => {
                return Err(self.flag(
                    auction.id,
                    format!("winning reservation {reservation_id} not found"),
                ));
            }
        };
        match reservation.state {
            // Already captured by an earlier partial attempt.
            ReservationState::Captured => Ok(()),
            ReservationState::Held => {
                match self.ledger.capture(reservation_id, auction.seller_id) {
                    Ok(()) => Ok(()),
                    Err(err @ GavelError::LedgerUnavailable { .. }) => {
                        tracing::warn!(
                            auction = %auction.id,
                            error = %err,
                            "ledger unavailable during capture, will retry"
                        );
                        Err(err)
                    }
                    Err(err) => Err(self.flag(
                        auction.id,
                        format!("capture of {reservation_id} failed: {err}"),
                    )),
                }
            }
            ReservationState::Released => Err(self.flag(
                auction.id,
                format!("winning reservation {reservation_id} was released"),
            )),
        }
    }

    /// Administratively cancel an auction that has not ended. Releases
    /// the current leader's hold before the state moves.
    ///
    /// # Errors
    /// - `AuctionNotFound` if the id is unknown
    /// - `InvalidTransition` unless the auction is SCHEDULED or ACTIVE
    pub fn cancel(&self, auction_id: AuctionId, reason: &str) -> Result<()> {
        let entry = self.locks.entry(auction_id);
        let _guard = entry.lock().expect("auction lock poisoned");

        let auction = self.store.get(auction_id)?;
        if !auction.state.can_transition_to(AuctionState::Cancelled) {
            return Err(GavelError::InvalidTransition {
                from: auction.state,
                to: AuctionState::Cancelled,
            });
        }

        for (bid_id, reservation_id) in self.bids.open_reservations(auction_id) {
            self.ledger.release(reservation_id)?;
            self.bids.note_outbid(auction_id, bid_id)?;
        }
        self.store
            .transition(auction_id, auction.state, AuctionState::Cancelled)?;

        tracing::info!(auction = %auction_id, reason, "auction cancelled");
        let _ = self.events.send(AuctionEvent::Cancelled {
            auction_id,
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// The settlement receipt, once the auction has settled.
    #[must_use]
    pub fn receipt(&self, auction_id: AuctionId) -> Option<SettlementReceipt> {
        self.receipts
            .lock()
            .expect("receipts lock poisoned")
            .get(&auction_id)
            .cloned()
    }

    /// Whether the auction is flagged for manual reconciliation.
    #[must_use]
    pub fn needs_reconciliation(&self, auction_id: AuctionId) -> bool {
        self.flagged
            .lock()
            .expect("reconciliation flags lock poisoned")
            .contains_key(&auction_id)
    }

    /// Clear a reconciliation flag after an operator intervened.
    pub fn clear_reconciliation(&self, auction_id: AuctionId) {
        self.flagged
            .lock()
            .expect("reconciliation flags lock poisoned")
            .remove(&auction_id);
    }

    fn flag(&self, auction_id: AuctionId, reason: String) -> GavelError {
        tracing::error!(auction = %auction_id, %reason, "settlement requires reconciliation");
        self.flagged
            .lock()
            .expect("reconciliation flags lock poisoned")
            .insert(auction_id, reason.clone());
        GavelError::ReconciliationRequired { reason }
    }
}
