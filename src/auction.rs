use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    Active,
    Ended,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Active => "Active",
            AuctionStatus::Ended => "Ended",
        }
    }
}

/// The identity that holds the current high bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bidder {
    pub user_id: String,
    pub username: String,
}

/// One item up for auction. `version` bumps on every accepted mutation and
/// is the handle the store's compare-and-swap keys off.
#[derive(Debug, Clone, PartialEq)]
pub struct Auction {
    pub id: String,
    pub owner_id: String,
    pub owner_name: String,
    pub name: String,
    pub description: String,
    pub photo: Option<String>,
    pub start_price: Decimal,
    pub current_bid: Decimal,
    pub highest_bidder: Option<Bidder>,
    pub status: AuctionStatus,
    /// Informational only; nothing in the engine auto-closes on it.
    pub scheduled_close_time: DateTime<Utc>,
    pub version: u64,
}

impl Auction {
    pub fn snapshot(&self) -> AuctionSnapshot {
        AuctionSnapshot {
            auction_id: self.id.clone(),
            current_bid: self.current_bid,
            highest_bidder: self.highest_bidder.clone(),
            status: self.status,
            version: self.version,
        }
    }
}

/// Fields the auctioneer supplies when posting an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuction {
    pub name: String,
    pub description: String,
    pub start_price: Decimal,
    pub scheduled_close_time: DateTime<Utc>,
    pub photo: Option<String>,
}

/// Immutable view of an auction's observable fields, used for read
/// responses and fan-out messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    pub auction_id: String,
    pub current_bid: Decimal,
    pub highest_bidder: Option<Bidder>,
    pub status: AuctionStatus,
    pub version: u64,
}

/// Listing filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuctionFilter {
    pub owner_id: Option<String>,
    pub status: Option<AuctionStatus>,
}

impl AuctionFilter {
    pub fn by_owner(owner_id: &str) -> Self {
        AuctionFilter {
            owner_id: Some(owner_id.to_string()),
            status: None,
        }
    }

    pub fn matches(&self, auction: &Auction) -> bool {
        if let Some(owner_id) = &self.owner_id {
            if auction.owner_id != *owner_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if auction.status != status {
                return false;
            }
        }
        true
    }
}
