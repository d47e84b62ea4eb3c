//! The `AuctionEngine` facade: one object wiring the coordinator,
//! scheduler, settlement, stores, and wallet ledger together. This is
//! the surface a presentation layer (HTTP handlers, a CLI, a bot)
//! calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gavel_store::{
    AuctionStore, BidLedger, Countdown, Journal, JournalEvent, countdown_at,
};
use gavel_types::{
    Auction, AuctionEvent, AuctionId, AuctionKind, Bid, BidId, EngineConfig, Money, Result,
    SettlementReceipt, UserId,
};
use gavel_wallet::WalletLedger;
use tokio::sync::broadcast;

use crate::auction_locks::KeyedLocks;
use crate::coordinator::BidCoordinator;
use crate::scheduler::LifecycleScheduler;
use crate::settlement::SettlementEngine;

/// The assembled engine.
///
/// Construct with [`AuctionEngine::new`] for a fresh state, or
/// [`AuctionEngine::restore`] to rebuild from the configured journal
/// after a restart. Spawn [`AuctionEngine::run`] to start the lifecycle
/// scheduler; all other methods are synchronous calls safe from any
/// thread.
pub struct AuctionEngine {
    store: Arc<AuctionStore>,
    bids: Arc<BidLedger>,
    ledger: Arc<dyn WalletLedger>,
    coordinator: BidCoordinator,
    settlement: Arc<SettlementEngine>,
    scheduler: Arc<LifecycleScheduler>,
    events: broadcast::Sender<AuctionEvent>,
}

impl AuctionEngine {
    /// Assemble an engine with empty stores.
    ///
    /// # Errors
    /// `Io` if the configured journal file cannot be opened.
    pub fn new(config: &EngineConfig, ledger: Arc<dyn WalletLedger>) -> Result<Self> {
        Self::assemble(config, ledger, &[])
    }

    /// Assemble an engine, replaying the configured journal first.
    /// With no `journal_path` this is identical to [`Self::new`].
    ///
    /// # Errors
    /// `Io` / `Serialization` if the journal cannot be read back.
    pub fn restore(config: &EngineConfig, ledger: Arc<dyn WalletLedger>) -> Result<Self> {
        let events = match &config.journal_path {
            Some(path) => Journal::replay(path)?,
            None => Vec::new(),
        };
        Self::assemble(config, ledger, &events)
    }

    fn assemble(
        config: &EngineConfig,
        ledger: Arc<dyn WalletLedger>,
        replayed: &[JournalEvent],
    ) -> Result<Self> {
        let journal = match &config.journal_path {
            Some(path) => Some(Arc::new(Journal::open(path)?)),
            None => None,
        };
        let store = Arc::new(match &journal {
            Some(j) => AuctionStore::with_journal(Arc::clone(j)),
            None => AuctionStore::new(),
        });
        let bids = Arc::new(match &journal {
            Some(j) => BidLedger::with_journal(Arc::clone(j)),
            None => BidLedger::new(),
        });

        if !replayed.is_empty() {
            tracing::info!(events = replayed.len(), "replaying journal");
        }
        for event in replayed {
            match event {
                JournalEvent::AuctionUpserted(auction) => store.restore(auction.clone()),
                JournalEvent::BidRecorded(bid) => bids.restore(bid.clone()),
                JournalEvent::BidOutbid {
                    auction_id,
                    bid_id,
                    at,
                } => bids.restore_outbid(*auction_id, *bid_id, *at),
            }
        }

        let locks = Arc::new(KeyedLocks::new());
        let (tx, _) = broadcast::channel(config.event_buffer);
        let coordinator = BidCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&bids),
            Arc::clone(&ledger),
            Arc::clone(&locks),
            tx.clone(),
            config.bid_conflict_retries,
        );
        let settlement = Arc::new(SettlementEngine::new(
            Arc::clone(&store),
            Arc::clone(&bids),
            Arc::clone(&ledger),
            Arc::clone(&locks),
            tx.clone(),
        ));
        let scheduler = Arc::new(LifecycleScheduler::new(
            Arc::clone(&store),
            Arc::clone(&settlement),
            locks,
            tx.clone(),
            config.scheduler.poll_interval,
        ));
        Ok(Self {
            store,
            bids,
            ledger,
            coordinator,
            settlement,
            scheduler,
            events: tx,
        })
    }

    /// Run the lifecycle scheduler until the task is dropped.
    pub async fn run(&self) {
        Arc::clone(&self.scheduler).run().await;
    }

    /// One manual scheduler pass. Exposed for deterministic tests and
    /// operator tooling.
    pub fn tick(&self, now: DateTime<Utc>) {
        self.scheduler.tick(now);
    }

    // ---------------------------------------------------------------
    // Auction management
    // ---------------------------------------------------------------

    /// Register a new auction.
    ///
    /// # Errors
    /// `InvalidAuction` / `DuplicateAuction` per store validation.
    pub fn create_auction(&self, auction: Auction) -> Result<()> {
        tracing::info!(
            auction = %auction.id,
            kind = %auction.kind,
            title = %auction.title,
            "auction created"
        );
        self.store.insert(auction)
    }

    /// Fetch one auction record.
    pub fn get_auction(&self, id: AuctionId) -> Result<Auction> {
        self.store.get(id)
    }

    /// Active auctions of one kind, soonest-ending first.
    #[must_use]
    pub fn list_active(&self, kind: AuctionKind) -> Vec<Auction> {
        self.store.list_active(kind)
    }

    /// Ended or settled auctions of one kind, most recent first.
    #[must_use]
    pub fn list_ended(&self, kind: AuctionKind) -> Vec<Auction> {
        self.store.list_ended(kind)
    }

    /// Countdown projection for one auction at the current instant.
    pub fn countdown(&self, id: AuctionId) -> Result<Countdown> {
        Ok(gavel_store::countdown(&self.store.get(id)?))
    }

    /// Countdown projection at an explicit instant.
    pub fn countdown_at(&self, id: AuctionId, now: DateTime<Utc>) -> Result<Countdown> {
        Ok(countdown_at(&self.store.get(id)?, now))
    }

    /// Administratively cancel a scheduled or active auction.
    pub fn cancel_auction(&self, id: AuctionId, reason: &str) -> Result<()> {
        self.settlement.cancel(id, reason)
    }

    // ---------------------------------------------------------------
    // Bidding and settlement
    // ---------------------------------------------------------------

    /// Place a bid. See [`BidCoordinator::place_bid`].
    pub fn place_bid(&self, auction_id: AuctionId, bidder_id: UserId, amount: Money) -> Result<BidId> {
        self.coordinator.place_bid(auction_id, bidder_id, amount)
    }

    /// Full bid history of one auction, ordered by sequence.
    #[must_use]
    pub fn bids_for(&self, auction_id: AuctionId) -> Vec<Bid> {
        self.bids.bids_for(auction_id)
    }

    /// Settle an ended auction now instead of waiting for the scheduler.
    pub fn settle(&self, auction_id: AuctionId) -> Result<()> {
        self.settlement.settle(auction_id)
    }

    /// Settlement receipt, once the auction has settled.
    #[must_use]
    pub fn receipt(&self, auction_id: AuctionId) -> Option<SettlementReceipt> {
        self.settlement.receipt(auction_id)
    }

    /// Whether an auction is parked awaiting operator reconciliation.
    #[must_use]
    pub fn needs_reconciliation(&self, auction_id: AuctionId) -> bool {
        self.settlement.needs_reconciliation(auction_id)
    }

    /// Clear a reconciliation flag after manual intervention, letting the
    /// scheduler retry settlement.
    pub fn clear_reconciliation(&self, auction_id: AuctionId) {
        self.settlement.clear_reconciliation(auction_id);
    }

    // ---------------------------------------------------------------
    // Observation
    // ---------------------------------------------------------------

    /// Subscribe to engine events. Slow subscribers may observe
    /// [`broadcast::error::RecvError::Lagged`] and should resync from
    /// the store.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuctionEvent> {
        self.events.subscribe()
    }

    /// The wallet ledger this engine settles against.
    #[must_use]
    pub fn wallet(&self) -> &Arc<dyn WalletLedger> {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use gavel_store::CountdownStatus;
    use gavel_types::AuctionState;
    use gavel_wallet::LocalWalletLedger;

    use super::*;

    fn engine() -> AuctionEngine {
        AuctionEngine::new(
            &EngineConfig::default(),
            Arc::new(LocalWalletLedger::new()),
        )
        .unwrap()
    }

    #[test]
    fn create_and_query() {
        let engine = engine();
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        engine.create_auction(auction.clone()).unwrap();

        assert_eq!(engine.get_auction(auction.id).unwrap().id, auction.id);
        assert_eq!(engine.list_active(AuctionKind::Live).len(), 1);
        assert!(engine.list_ended(AuctionKind::Live).is_empty());

        let cd = engine.countdown(auction.id).unwrap();
        assert_eq!(cd.status, CountdownStatus::Ongoing);
        assert!(cd.seconds_remaining > 0);
    }

    #[test]
    fn bid_through_facade() {
        let engine = engine();
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        engine.create_auction(auction.clone()).unwrap();

        let bidder = UserId::new();
        engine.wallet().deposit(bidder, Money::new(1000)).unwrap();
        let bid_id = engine
            .place_bid(auction.id, bidder, Money::new(100))
            .unwrap();

        let history = engine.bids_for(auction.id);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, bid_id);
    }

    #[test]
    fn manual_settle_and_receipt() {
        let engine = engine();
        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        engine.create_auction(auction.clone()).unwrap();
        let bidder = UserId::new();
        engine.wallet().deposit(bidder, Money::new(1000)).unwrap();
        engine.place_bid(auction.id, bidder, Money::new(120)).unwrap();

        engine.tick(auction.end_time + chrono::Duration::seconds(1));

        assert_eq!(
            engine.get_auction(auction.id).unwrap().state,
            AuctionState::Settled
        );
        let receipt = engine.receipt(auction.id).unwrap();
        assert_eq!(receipt.winner, Some(bidder));
        assert_eq!(receipt.amount, Some(Money::new(120)));
    }

    #[test]
    fn events_flow_to_subscribers() {
        let engine = engine();
        let mut rx = engine.subscribe();

        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        engine.create_auction(auction.clone()).unwrap();
        let bidder = UserId::new();
        engine.wallet().deposit(bidder, Money::new(1000)).unwrap();
        engine.place_bid(auction.id, bidder, Money::new(100)).unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            AuctionEvent::LeadershipChanged { .. }
        ));
    }
}
