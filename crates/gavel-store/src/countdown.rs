//! Countdown query service — a pure projection of auction timestamps.
//!
//! `countdown` derives a point-in-time status and remaining seconds
//! from `now`, `start_time`, and `end_time` alone. No side effects, no
//! shared state beyond a consistent read of the auction record; safe to
//! call at arbitrarily high frequency by polling dashboards.

use chrono::{DateTime, Utc};
use gavel_types::Auction;
use serde::{Deserialize, Serialize};

/// Where the auction sits relative to its time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountdownStatus {
    /// Before the start boundary.
    Pre,
    /// Between start and end.
    Ongoing,
    /// Past the end boundary.
    Ended,
}

impl std::fmt::Display for CountdownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pre => write!(f, "pre"),
            Self::Ongoing => write!(f, "ongoing"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// A point-in-time countdown projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub status: CountdownStatus,
    /// Seconds until the next boundary. Never negative; zero once ended.
    pub seconds_remaining: i64,
}

/// Countdown at an explicit instant. Pure function of its inputs.
#[must_use]
pub fn countdown_at(auction: &Auction, now: DateTime<Utc>) -> Countdown {
    if now < auction.start_time {
        Countdown {
            status: CountdownStatus::Pre,
            seconds_remaining: (auction.start_time - now).num_seconds(),
        }
    } else if now < auction.end_time {
        Countdown {
            status: CountdownStatus::Ongoing,
            seconds_remaining: (auction.end_time - now).num_seconds(),
        }
    } else {
        Countdown {
            status: CountdownStatus::Ended,
            seconds_remaining: 0,
        }
    }
}

/// Countdown at the current wall-clock instant.
#[must_use]
pub fn countdown(auction: &Auction) -> Countdown {
    countdown_at(auction, Utc::now())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use gavel_types::{AuctionKind, Money};

    use super::*;

    fn make_auction() -> Auction {
        let mut auction = Auction::dummy(AuctionKind::Live, Money::new(100), Money::new(10));
        auction.start_time = Utc::now();
        auction.end_time = auction.start_time + Duration::seconds(600);
        auction
    }

    #[test]
    fn before_start_is_pre() {
        let auction = make_auction();
        let now = auction.start_time - Duration::seconds(90);
        let cd = countdown_at(&auction, now);
        assert_eq!(cd.status, CountdownStatus::Pre);
        assert_eq!(cd.seconds_remaining, 90);
    }

    #[test]
    fn within_window_is_ongoing() {
        let auction = make_auction();
        let now = auction.start_time + Duration::seconds(100);
        let cd = countdown_at(&auction, now);
        assert_eq!(cd.status, CountdownStatus::Ongoing);
        assert_eq!(cd.seconds_remaining, 500);
    }

    #[test]
    fn exactly_at_start_is_ongoing() {
        let auction = make_auction();
        let cd = countdown_at(&auction, auction.start_time);
        assert_eq!(cd.status, CountdownStatus::Ongoing);
        assert_eq!(cd.seconds_remaining, 600);
    }

    #[test]
    fn exactly_at_end_is_ended() {
        let auction = make_auction();
        let cd = countdown_at(&auction, auction.end_time);
        assert_eq!(cd.status, CountdownStatus::Ended);
        assert_eq!(cd.seconds_remaining, 0);
    }

    #[test]
    fn long_past_end_never_negative() {
        let auction = make_auction();
        let cd = countdown_at(&auction, auction.end_time + Duration::days(30));
        assert_eq!(cd.status, CountdownStatus::Ended);
        assert_eq!(cd.seconds_remaining, 0);
    }

    #[test]
    fn status_display_lowercase() {
        assert_eq!(format!("{}", CountdownStatus::Pre), "pre");
        assert_eq!(format!("{}", CountdownStatus::Ongoing), "ongoing");
        assert_eq!(format!("{}", CountdownStatus::Ended), "ended");
    }
}
