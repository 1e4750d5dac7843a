use serde::Serialize;
use std::fmt;

/// Stable rejection codes returned to callers on every refused operation.
///
/// Validation rejections (`InvalidAmount` through `Forbidden`) are terminal
/// for the request: the caller has to change its input. `Contention` and
/// `StorageUnavailable` are transient; because bid amounts are absolute
/// values rather than deltas, the whole operation can be retried as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reject {
    InvalidAmount,
    BidTooLow,
    AuctionClosed,
    OwnerCannotBid,
    AlreadyEnded,
    Forbidden,
    NotFound,
    Contention,
    StorageUnavailable,
    Unauthenticated,
}

impl Reject {
    pub fn code(&self) -> &'static str {
        match self {
            Reject::InvalidAmount => "InvalidAmount",
            Reject::BidTooLow => "BidTooLow",
            Reject::AuctionClosed => "AuctionClosed",
            Reject::OwnerCannotBid => "OwnerCannotBid",
            Reject::AlreadyEnded => "AlreadyEnded",
            Reject::Forbidden => "Forbidden",
            Reject::NotFound => "NotFound",
            Reject::Contention => "Contention",
            Reject::StorageUnavailable => "StorageUnavailable",
            Reject::Unauthenticated => "Unauthenticated",
        }
    }

    /// True only for the transient codes a caller may safely resubmit.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Reject::Contention | Reject::StorageUnavailable)
    }
}

impl fmt::Display for Reject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Reject::InvalidAmount => "Bid amount must be greater than 0",
            Reject::BidTooLow => "Bid must be higher than the current highest bid",
            Reject::AuctionClosed => "Auction is not active",
            Reject::OwnerCannotBid => "Auctioneers cannot bid on their own auction",
            Reject::AlreadyEnded => "Auction has already ended",
            Reject::Forbidden => "You are not authorized to end this auction",
            Reject::NotFound => "Auction not found",
            Reject::Contention => "Auction is busy, retry the request",
            Reject::StorageUnavailable => "Auction storage is unavailable, retry the request",
            Reject::Unauthenticated => "Access denied, invalid credential",
        };
        write!(f, "{}", message)
    }
}

impl std::error::Error for Reject {}
