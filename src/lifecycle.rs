use crate::auction::{Auction, AuctionStatus};
use crate::error::Reject;
use crate::identity::Identity;
use crate::store::AuctionMutation;

/// Authorize the single lifecycle transition, Active -> Ended. Pure; the
/// coordinator surfaces `NotFound` before this runs. Ending freezes
/// `current_bid` and `highest_bidder` permanently; there is no pause,
/// cancel or reopen.
pub fn authorize_end(auction: &Auction, requester: &Identity) -> Result<AuctionMutation, Reject> {
    if auction.status == AuctionStatus::Ended {
        return Err(Reject::AlreadyEnded);
    }
    if requester.user_id != auction.owner_id {
        return Err(Reject::Forbidden);
    }
    Ok(AuctionMutation::End)
}
