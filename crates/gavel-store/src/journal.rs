//! JSON-lines journal (write-ahead log) for auctions and bids.
//!
//! Each mutation of the auction store or bid ledger appends one line to
//! the journal before it is acknowledged. Replaying the journal after a
//! restart rebuilds the exact leadership history — a crash mid-auction
//! loses nothing.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use gavel_types::{Auction, AuctionId, Bid, BidId, GavelError, Result};
use serde::{Deserialize, Serialize};

/// One journaled mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JournalEvent {
    /// An auction record was created or its canonical copy changed
    /// (state transition or leader update). Carries the full record;
    /// replay keeps the last copy per auction.
    AuctionUpserted(Auction),
    /// A bid attempt was appended to the ledger.
    BidRecorded(Bid),
    /// A previously accepted bid lost leadership.
    BidOutbid {
        auction_id: AuctionId,
        bid_id: BidId,
        at: DateTime<Utc>,
    },
}

/// Append-only JSON-lines journal.
pub struct Journal {
    path: PathBuf,
    file: Mutex<File>,
}

impl Journal {
    /// Open (or create) a journal file for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append one event and flush it to disk.
    pub fn append(&self, event: &JournalEvent) -> Result<()> {
        let line = serde_json::to_string(event)
            .map_err(|e| GavelError::Serialization(e.to_string()))?;
        let mut file = self.file.lock().expect("journal lock poisoned");
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    /// The journal's path on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every event in append order. A missing file replays as
    /// empty (first boot).
    pub fn replay(path: impl AsRef<Path>) -> Result<Vec<JournalEvent>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: JournalEvent = serde_json::from_str(&line)
                .map_err(|e| GavelError::Serialization(e.to_string()))?;
            events.push(event);
        }
        tracing::debug!(path = %path.display(), events = events.len(), "journal read back");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use gavel_types::{AuctionKind, Money};
    use uuid::Uuid;

    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("gavel-journal-{}.jsonl", Uuid::now_v7()))
    }

    #[test]
    fn append_and_replay() {
        let path = temp_path();
        let journal = Journal::open(&path).unwrap();

        let auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        journal
            .append(&JournalEvent::AuctionUpserted(auction.clone()))
            .unwrap();
        journal
            .append(&JournalEvent::BidOutbid {
                auction_id: auction.id,
                bid_id: BidId::new(),
                at: Utc::now(),
            })
            .unwrap();

        let events = Journal::replay(&path).unwrap();
        assert_eq!(events.len(), 2);
        match &events[0] {
            JournalEvent::AuctionUpserted(a) => assert_eq!(a.id, auction.id),
            other => panic!("unexpected first event: {other:?}"),
        }

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn replay_missing_file_is_empty() {
        let events = Journal::replay(temp_path()).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn replay_preserves_order() {
        let path = temp_path();
        let journal = Journal::open(&path).unwrap();

        let mut auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        journal
            .append(&JournalEvent::AuctionUpserted(auction.clone()))
            .unwrap();
        auction.current_bid = Some(Money::new(150));
        journal
            .append(&JournalEvent::AuctionUpserted(auction.clone()))
            .unwrap();

        let events = Journal::replay(&path).unwrap();
        assert_eq!(events.len(), 2);
        // Last copy wins on replay.
        match &events[1] {
            JournalEvent::AuctionUpserted(a) => {
                assert_eq!(a.current_bid, Some(Money::new(150)));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        std::fs::remove_file(&path).unwrap();
    }
}
