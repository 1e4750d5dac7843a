use crate::auction::{AuctionFilter, AuctionSnapshot, NewAuction};
use crate::engine::AuctionEngine;
use crate::error::Reject;
use crate::identity::{Authenticator, Identity};
use crate::media::MediaStore;
use crate::notify::Topic;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Credential-checking front door over the engine. Every mutating call
/// resolves the caller's credential through the authentication collaborator
/// first; listing and single-auction reads are public and pass straight
/// through.
pub struct AuctionService {
    engine: Arc<AuctionEngine>,
    authenticator: Arc<dyn Authenticator>,
    media: Arc<dyn MediaStore>,
}

impl AuctionService {
    pub fn new(
        engine: Arc<AuctionEngine>,
        authenticator: Arc<dyn Authenticator>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        AuctionService {
            engine,
            authenticator,
            media,
        }
    }

    async fn caller(&self, credential: &str) -> Result<Identity, Reject> {
        self.authenticator
            .authenticate(credential)
            .await
            .map_err(|_| Reject::Unauthenticated)
    }

    pub async fn post_auction(
        &self,
        credential: &str,
        new: NewAuction,
    ) -> Result<AuctionSnapshot, Reject> {
        let caller = self.caller(credential).await?;
        self.engine.create_auction(&caller, new).await
    }

    /// Post an auction with an item photo. The bytes go to the media
    /// collaborator; only the opaque path it returns is stored.
    pub async fn post_auction_with_photo(
        &self,
        credential: &str,
        mut new: NewAuction,
        filename: &str,
        bytes: &[u8],
    ) -> Result<AuctionSnapshot, Reject> {
        let caller = self.caller(credential).await?;
        let photo = self.media.save(filename, bytes).await.map_err(|err| {
            warn!(filename, error = %err, "photo upload failed");
            Reject::StorageUnavailable
        })?;
        new.photo = Some(photo);
        self.engine.create_auction(&caller, new).await
    }

    pub async fn place_bid(
        &self,
        credential: &str,
        auction_id: &str,
        amount: Decimal,
    ) -> Result<AuctionSnapshot, Reject> {
        let caller = self.caller(credential).await?;
        self.engine.place_bid(auction_id, &caller, amount).await
    }

    pub async fn end_auction(
        &self,
        credential: &str,
        auction_id: &str,
    ) -> Result<AuctionSnapshot, Reject> {
        let caller = self.caller(credential).await?;
        self.engine.end_auction(auction_id, &caller).await
    }

    pub async fn get_auction(&self, auction_id: &str) -> Result<AuctionSnapshot, Reject> {
        self.engine.get_auction(auction_id).await
    }

    pub async fn list_auctions(
        &self,
        filter: AuctionFilter,
    ) -> Result<Vec<AuctionSnapshot>, Reject> {
        self.engine.list_auctions(filter).await
    }

    /// The caller's own listings.
    pub async fn my_auctions(&self, credential: &str) -> Result<Vec<AuctionSnapshot>, Reject> {
        let caller = self.caller(credential).await?;
        self.engine
            .list_auctions(AuctionFilter::by_owner(&caller.user_id))
            .await
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<AuctionSnapshot> {
        self.engine.subscribe(topic)
    }
}
