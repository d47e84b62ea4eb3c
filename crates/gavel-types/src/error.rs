//! Error types for the Gavel engine.
//!
//! All errors use the `GV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Auction / bid validation errors
//! - 2xx: Wallet balance errors
//! - 3xx: Reservation errors
//! - 4xx: Lifecycle / concurrency errors
//! - 5xx: Settlement errors
//! - 9xx: General / internal errors
//!
//! [`GavelError::reason_code`] yields the stable machine-readable reason
//! the presentation layer renders; it never fabricates its own.

use thiserror::Error;

use crate::{AuctionId, AuctionState, Money, ReservationId};

/// Central error enum for all Gavel operations.
#[derive(Debug, Error)]
pub enum GavelError {
    // =================================================================
    // Auction / Bid Validation Errors (1xx)
    // =================================================================
    /// The requested auction was not found in the store.
    #[error("GV_ERR_100: Auction not found: {0}")]
    AuctionNotFound(AuctionId),

    /// The auction is not accepting bids in its current state.
    #[error("GV_ERR_101: Auction not active: currently {state}")]
    AuctionNotActive { state: AuctionState },

    /// The auction record failed validation (bad times, bad prices, etc.).
    #[error("GV_ERR_102: Invalid auction: {reason}")]
    InvalidAuction { reason: String },

    /// An auction with this ID already exists.
    #[error("GV_ERR_103: Auction already exists: {0}")]
    DuplicateAuction(AuctionId),

    /// The bid does not reach the minimum acceptable amount.
    #[error("GV_ERR_104: Bid below minimum: need at least {required}, offered {offered}")]
    BidBelowMinimum { required: Money, offered: Money },

    /// The current leader attempted to outbid themselves.
    #[error("GV_ERR_105: Self-outbid rejected: bidder already leads this auction")]
    SelfOutbid,

    // =================================================================
    // Wallet Balance Errors (2xx)
    // =================================================================
    /// Not enough available balance to hold the requested amount.
    #[error("GV_ERR_200: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Money, available: Money },

    /// Not enough held balance to release or capture.
    #[error("GV_ERR_201: Insufficient held balance")]
    InsufficientHeld,

    /// A balance operation would produce a negative or overflowed value.
    #[error("GV_ERR_202: Balance overflow or underflow")]
    BalanceOverflow,

    // =================================================================
    // Reservation Errors (3xx)
    // =================================================================
    /// The reservation was not found in the ledger.
    #[error("GV_ERR_300: Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// The reservation is not in a state that permits the operation.
    #[error("GV_ERR_301: Invalid reservation: {reason}")]
    ReservationInvalid { reason: String },

    // =================================================================
    // Lifecycle / Concurrency Errors (4xx)
    // =================================================================
    /// The requested state transition is not allowed by the state machine.
    #[error("GV_ERR_400: Invalid transition: {from} -> {to}")]
    InvalidTransition { from: AuctionState, to: AuctionState },

    /// A compare-and-set update found different state than expected.
    /// Retryable: the caller lost a race with a concurrent writer.
    #[error("GV_ERR_401: State conflict: expected {expected}, found {actual}")]
    StateConflict { expected: String, actual: String },

    /// The auction has already been settled (idempotency guard).
    #[error("GV_ERR_402: Auction already settled: {0}")]
    AlreadySettled(AuctionId),

    // =================================================================
    // Settlement Errors (5xx)
    // =================================================================
    /// Settlement of an auction failed.
    #[error("GV_ERR_500: Settlement failed: {reason}")]
    SettlementFailed { reason: String },

    /// The wallet ledger was unavailable. Transient; retried by the
    /// lifecycle scheduler on its next poll.
    #[error("GV_ERR_501: Wallet ledger unavailable: {reason}")]
    LedgerUnavailable { reason: String },

    /// Fatal-for-automation: the auction requires manual operator
    /// reconciliation and is excluded from automatic retry.
    #[error("GV_ERR_502: Reconciliation required: {reason}")]
    ReconciliationRequired { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("GV_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("GV_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config, missing fields, etc.).
    #[error("GV_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (journal disk access).
    #[error("GV_ERR_903: I/O error: {0}")]
    Io(String),
}

impl GavelError {
    /// Stable machine-readable reason code for the presentation layer
    /// and for rejected entries in the bid ledger.
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::AuctionNotFound(_) => "auction_not_found",
            Self::AuctionNotActive { .. } => "auction_not_active",
            Self::InvalidAuction { .. } => "invalid_auction",
            Self::DuplicateAuction(_) => "duplicate_auction",
            Self::BidBelowMinimum { .. } => "bid_below_minimum",
            Self::SelfOutbid => "self_outbid",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::InsufficientHeld => "insufficient_held",
            Self::BalanceOverflow => "balance_overflow",
            Self::ReservationNotFound(_) => "reservation_not_found",
            Self::ReservationInvalid { .. } => "reservation_invalid",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::StateConflict { .. } => "concurrency_conflict",
            Self::AlreadySettled(_) => "already_settled",
            Self::SettlementFailed { .. } => "settlement_failed",
            Self::LedgerUnavailable { .. } => "ledger_unavailable",
            Self::ReconciliationRequired { .. } => "reconciliation_required",
            Self::Internal(_) => "internal",
            Self::Serialization(_) => "serialization",
            Self::Configuration(_) => "configuration",
            Self::Io(_) => "io",
        }
    }

    /// Whether the caller may safely retry the operation as-is.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::StateConflict { .. } | Self::LedgerUnavailable { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GavelError>;

// Conversion from std::io::Error (journal writes).
impl From<std::io::Error> for GavelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
