//! Canned records for tests and the demo binary.

use crate::auction::{Auction, AuctionStatus, Bidder, NewAuction};
use crate::identity::{Identity, Role};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

pub enum AuctionOption {
    /// Active, start_price 100, no bid yet.
    Fresh,
    /// Active, current_bid 150 held by `bidder(1)`, version 1.
    WithBid,
    /// Ended with the same bid frozen in.
    Ended,
}

pub fn owner() -> Identity {
    Identity {
        user_id: "u-owner".to_string(),
        username: "auctioneer_amy".to_string(),
        role: Role::Auctioneer,
    }
}

pub fn bidder(n: u32) -> Identity {
    Identity {
        user_id: format!("u-bidder-{}", n),
        username: format!("bidder_{}", n),
        role: Role::Bidder,
    }
}

pub fn new_auction(option: AuctionOption) -> Auction {
    let owner = owner();
    let mut auction = Auction {
        id: "a-000001".to_string(),
        owner_id: owner.user_id,
        owner_name: owner.username,
        name: "Antique pocket watch".to_string(),
        description: "Brass case, still ticking".to_string(),
        photo: Some("/uploads/1700000000000-watch.jpg".to_string()),
        start_price: Decimal::from(100),
        current_bid: Decimal::ZERO,
        highest_bidder: None,
        status: AuctionStatus::Active,
        scheduled_close_time: Utc.with_ymd_and_hms(2026, 9, 15, 18, 0, 0).unwrap(),
        version: 0,
    };
    match option {
        AuctionOption::Fresh => {}
        AuctionOption::WithBid => {
            let high = bidder(1);
            auction.current_bid = Decimal::from(150);
            auction.highest_bidder = Some(Bidder {
                user_id: high.user_id,
                username: high.username,
            });
            auction.version = 1;
        }
        AuctionOption::Ended => {
            let high = bidder(1);
            auction.current_bid = Decimal::from(150);
            auction.highest_bidder = Some(Bidder {
                user_id: high.user_id,
                username: high.username,
            });
            auction.status = AuctionStatus::Ended;
            auction.version = 2;
        }
    }
    auction
}

pub fn new_auction_request() -> NewAuction {
    NewAuction {
        name: "Antique pocket watch".to_string(),
        description: "Brass case, still ticking".to_string(),
        start_price: Decimal::from(100),
        scheduled_close_time: Utc.with_ymd_and_hms(2026, 9, 15, 18, 0, 0).unwrap(),
        photo: None,
    }
}
