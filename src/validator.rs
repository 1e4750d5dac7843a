use crate::auction::{Auction, AuctionStatus, Bidder};
use crate::error::Reject;
use crate::identity::Identity;
use crate::store::AuctionMutation;
use rust_decimal::Decimal;

/// Decide whether a proposed bid is admissible against the auction state the
/// coordinator read inside the critical section. Pure; checks run in a fixed
/// order and the first failure wins.
///
/// A first bid must strictly exceed the start price; later bids must
/// strictly exceed the current high bid. Equal-to is never enough.
pub fn validate_bid(
    auction: &Auction,
    amount: Decimal,
    bidder: &Identity,
) -> Result<AuctionMutation, Reject> {
    if amount <= Decimal::ZERO {
        return Err(Reject::InvalidAmount);
    }
    if auction.status != AuctionStatus::Active {
        return Err(Reject::AuctionClosed);
    }
    let floor = if auction.highest_bidder.is_some() {
        auction.current_bid
    } else {
        auction.start_price
    };
    if amount <= floor {
        return Err(Reject::BidTooLow);
    }
    if bidder.user_id == auction.owner_id {
        return Err(Reject::OwnerCannotBid);
    }
    Ok(AuctionMutation::Bid {
        amount,
        bidder: Bidder {
            user_id: bidder.user_id.clone(),
            username: bidder.username.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy_data::{self, AuctionOption};

    #[test]
    fn rejects_non_positive_amounts() {
        let auction = dummy_data::new_auction(AuctionOption::Fresh);
        let bidder = dummy_data::bidder(1);
        assert_eq!(
            validate_bid(&auction, Decimal::ZERO, &bidder),
            Err(Reject::InvalidAmount)
        );
        assert_eq!(
            validate_bid(&auction, Decimal::from(-5), &bidder),
            Err(Reject::InvalidAmount)
        );
    }

    #[test]
    fn rejects_bids_on_ended_auctions() {
        let auction = dummy_data::new_auction(AuctionOption::Ended);
        let bidder = dummy_data::bidder(1);
        assert_eq!(
            validate_bid(&auction, Decimal::from(500), &bidder),
            Err(Reject::AuctionClosed)
        );
    }

    #[test]
    fn first_bid_must_exceed_start_price() {
        // start_price = 100, no bid yet: 100 is not enough, 150 is.
        let auction = dummy_data::new_auction(AuctionOption::Fresh);
        let bidder = dummy_data::bidder(1);
        assert_eq!(
            validate_bid(&auction, Decimal::from(100), &bidder),
            Err(Reject::BidTooLow)
        );
        let accepted = validate_bid(&auction, Decimal::from(150), &bidder);
        match accepted {
            Ok(AuctionMutation::Bid { amount, bidder }) => {
                assert_eq!(amount, Decimal::from(150));
                assert_eq!(bidder.user_id, dummy_data::bidder(1).user_id);
            }
            other => panic!("expected accepted bid, got {:?}", other),
        }
    }

    #[test]
    fn later_bids_must_exceed_current_bid() {
        // current_bid = 150 held by bidder 1.
        let auction = dummy_data::new_auction(AuctionOption::WithBid);
        let bidder = dummy_data::bidder(2);
        assert_eq!(
            validate_bid(&auction, Decimal::from(150), &bidder),
            Err(Reject::BidTooLow)
        );
        assert!(validate_bid(&auction, Decimal::from(200), &bidder).is_ok());
    }

    #[test]
    fn owner_cannot_bid_on_own_auction() {
        let auction = dummy_data::new_auction(AuctionOption::WithBid);
        let owner = dummy_data::owner();
        assert_eq!(
            validate_bid(&auction, Decimal::from(250), &owner),
            Err(Reject::OwnerCannotBid)
        );
    }

    #[test]
    fn amount_check_runs_before_status_check() {
        let auction = dummy_data::new_auction(AuctionOption::Ended);
        let bidder = dummy_data::bidder(1);
        assert_eq!(
            validate_bid(&auction, Decimal::ZERO, &bidder),
            Err(Reject::InvalidAmount)
        );
    }
}
