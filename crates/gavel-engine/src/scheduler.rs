//! Lifecycle scheduler: polls auction time boundaries and drives
//! transitions.
//!
//! One `tick` scans a snapshot of the store and, per auction, applies
//! every transition that is due: a scheduled auction whose whole window
//! elapsed while the process was down is opened, ended, and settled in
//! the same pass. All writes go through the store's compare-and-set
//! under the per-auction lock, so a tick racing a bid (or another tick)
//! loses cleanly with a `StateConflict` instead of corrupting state.
//!
//! Timing precision is bounded by the poll interval: an auction ends at
//! most one interval after its `end_time`, never before.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gavel_store::AuctionStore;
use gavel_types::{
    Auction, AuctionEvent, AuctionState, GavelError,
};
use tokio::sync::broadcast;

use crate::auction_locks::KeyedLocks;
use crate::settlement::SettlementEngine;

/// Polls the store and moves auctions along
/// `scheduled → active → ended → settled`.
pub struct LifecycleScheduler {
    store: Arc<AuctionStore>,
    settlement: Arc<SettlementEngine>,
    locks: Arc<KeyedLocks>,
    events: broadcast::Sender<AuctionEvent>,
    poll_interval: Duration,
}

impl LifecycleScheduler {
    #[must_use]
    pub fn new(
        store: Arc<AuctionStore>,
        settlement: Arc<SettlementEngine>,
        locks: Arc<KeyedLocks>,
        events: broadcast::Sender<AuctionEvent>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            settlement,
            locks,
            events,
            poll_interval,
        }
    }

    /// Run the poll loop forever. Spawn on the runtime; dropping the
    /// task stops the scheduler.
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(poll_interval = ?self.poll_interval, "lifecycle scheduler started");
        loop {
            interval.tick().await;
            self.tick(Utc::now());
        }
    }

    /// One scheduler pass at an explicit instant. Processes every due
    /// transition for every auction; late ticks catch up in one pass.
    pub fn tick(&self, now: DateTime<Utc>) {
        for auction in self.store.snapshot() {
            self.advance(&auction, now);
        }
    }

    /// Apply every transition due for one auction.
    fn advance(&self, auction: &Auction, now: DateTime<Utc>) {
        let mut state = auction.state;

        if state == AuctionState::Scheduled && now >= auction.start_time {
            match self.transition(auction, AuctionState::Scheduled, AuctionState::Active) {
                Ok(()) => {
                    state = AuctionState::Active;
                    tracing::info!(auction = %auction.id, "auction opened");
                    let _ = self.events.send(AuctionEvent::Opened {
                        auction_id: auction.id,
                        at: now,
                    });
                }
                Err(()) => return,
            }
        }

        if state == AuctionState::Active && now >= auction.end_time {
            match self.transition(auction, AuctionState::Active, AuctionState::Ended) {
                Ok(()) => {
                    state = AuctionState::Ended;
                    tracing::info!(auction = %auction.id, "auction ended");
                    let _ = self.events.send(AuctionEvent::Ended {
                        auction_id: auction.id,
                        at: now,
                    });
                }
                Err(()) => return,
            }
        }

        if state == AuctionState::Ended {
            if self.settlement.needs_reconciliation(auction.id) {
                tracing::debug!(
                    auction = %auction.id,
                    "skipping settlement, reconciliation pending"
                );
                return;
            }
            match self.settlement.settle(auction.id) {
                Ok(()) => {}
                Err(err @ GavelError::LedgerUnavailable { .. }) => {
                    tracing::warn!(
                        auction = %auction.id,
                        error = %err,
                        "settlement deferred, retrying next poll"
                    );
                }
                Err(GavelError::ReconciliationRequired { .. }) => {
                    // Already flagged and logged by the settlement engine.
                }
                Err(err) => {
                    tracing::warn!(auction = %auction.id, error = %err, "settlement failed");
                }
            }
        }
    }

    /// CAS transition under the per-auction lock. A conflict means a
    /// concurrent writer got there first; the auction is picked up
    /// again next poll if anything is still due.
    fn transition(
        &self,
        auction: &Auction,
        from: AuctionState,
        to: AuctionState,
    ) -> std::result::Result<(), ()> {
        let entry = self.locks.entry(auction.id);
        let _guard = entry.lock().expect("auction lock poisoned");
        match self.store.transition(auction.id, from, to) {
            Ok(_) => Ok(()),
            Err(GavelError::StateConflict { .. }) => {
                tracing::debug!(auction = %auction.id, %from, %to, "transition lost race");
                Err(())
            }
            Err(err) => {
                tracing::warn!(auction = %auction.id, %from, %to, error = %err, "transition failed");
                Err(())
            }
        }
    }
}
