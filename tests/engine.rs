//! End-to-end engine behavior against the in-memory store.

use gavel_engine::dummy_data;
use gavel_engine::{
    AuctionEngine, AuctionFilter, AuctionService, AuctionStatus, DiskMedia, EngineConfig,
    MemoryStore, NewAuction, Reject, TokenRegistry,
};
use rust_decimal::Decimal;
use std::sync::Arc;

fn new_engine() -> Arc<AuctionEngine> {
    Arc::new(AuctionEngine::new(
        Arc::new(MemoryStore::new()),
        EngineConfig::default(),
    ))
}

async fn post(engine: &AuctionEngine, request: NewAuction) -> String {
    engine
        .create_auction(&dummy_data::owner(), request)
        .await
        .unwrap()
        .auction_id
}

#[tokio::test]
async fn full_bidding_session() {
    let engine = new_engine();
    let id = post(&engine, dummy_data::new_auction_request()).await;
    let owner = dummy_data::owner();
    let x = dummy_data::bidder(1);
    let y = dummy_data::bidder(2);

    // Equal to start price is not enough.
    assert_eq!(
        engine.place_bid(&id, &x, Decimal::from(100)).await,
        Err(Reject::BidTooLow)
    );

    let first = engine.place_bid(&id, &x, Decimal::from(150)).await.unwrap();
    assert_eq!(first.current_bid, Decimal::from(150));
    assert_eq!(first.highest_bidder.as_ref().unwrap().user_id, x.user_id);
    assert_eq!(first.version, 1);

    // Equal to the current bid is not enough either.
    assert_eq!(
        engine.place_bid(&id, &y, Decimal::from(150)).await,
        Err(Reject::BidTooLow)
    );

    let second = engine.place_bid(&id, &y, Decimal::from(200)).await.unwrap();
    assert_eq!(second.current_bid, Decimal::from(200));
    assert_eq!(second.version, 2);

    assert_eq!(
        engine.place_bid(&id, &owner, Decimal::from(250)).await,
        Err(Reject::OwnerCannotBid)
    );

    let ended = engine.end_auction(&id, &owner).await.unwrap();
    assert_eq!(ended.status, AuctionStatus::Ended);
    assert_eq!(ended.current_bid, Decimal::from(200));
    assert_eq!(ended.highest_bidder.as_ref().unwrap().user_id, y.user_id);

    assert_eq!(
        engine.place_bid(&id, &y, Decimal::from(500)).await,
        Err(Reject::AuctionClosed)
    );
}

#[tokio::test]
async fn get_after_accept_reflects_the_response() {
    let engine = new_engine();
    let id = post(&engine, dummy_data::new_auction_request()).await;

    let accepted = engine
        .place_bid(&id, &dummy_data::bidder(1), Decimal::from(150))
        .await
        .unwrap();
    assert_eq!(engine.get_auction(&id).await.unwrap(), accepted);

    let ended = engine.end_auction(&id, &dummy_data::owner()).await.unwrap();
    assert_eq!(engine.get_auction(&id).await.unwrap(), ended);
}

#[tokio::test]
async fn ending_twice_and_by_strangers() {
    let engine = new_engine();
    let id = post(&engine, dummy_data::new_auction_request()).await;
    let owner = dummy_data::owner();

    let ended = engine.end_auction(&id, &owner).await.unwrap();
    assert_eq!(ended.status, AuctionStatus::Ended);

    assert_eq!(
        engine.end_auction(&id, &owner).await,
        Err(Reject::AlreadyEnded)
    );

    // A non-owner attempt neither succeeds nor bumps the version.
    assert_eq!(
        engine.end_auction(&id, &dummy_data::bidder(3)).await,
        Err(Reject::AlreadyEnded)
    );
    assert_eq!(engine.get_auction(&id).await.unwrap().version, ended.version);
}

#[tokio::test]
async fn non_owner_cannot_end_an_active_auction() {
    let engine = new_engine();
    let id = post(&engine, dummy_data::new_auction_request()).await;

    assert_eq!(
        engine.end_auction(&id, &dummy_data::bidder(1)).await,
        Err(Reject::Forbidden)
    );
    let unchanged = engine.get_auction(&id).await.unwrap();
    assert_eq!(unchanged.status, AuctionStatus::Active);
    assert_eq!(unchanged.version, 0);
}

#[tokio::test]
async fn unknown_auction_is_not_found() {
    let engine = new_engine();
    assert_eq!(engine.get_auction("a-missing").await, Err(Reject::NotFound));
    assert_eq!(
        engine.end_auction("a-missing", &dummy_data::owner()).await,
        Err(Reject::NotFound)
    );
}

#[tokio::test]
async fn listing_filters_by_owner_and_status() {
    let engine = new_engine();
    let owner = dummy_data::owner();
    let other = dummy_data::bidder(9);

    let mine = post(&engine, dummy_data::new_auction_request()).await;
    let theirs = engine
        .create_auction(&other, dummy_data::new_auction_request())
        .await
        .unwrap()
        .auction_id;
    engine.end_auction(&theirs, &other).await.unwrap();

    let all = engine.list_auctions(AuctionFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let owned = engine
        .list_auctions(AuctionFilter::by_owner(&owner.user_id))
        .await
        .unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].auction_id, mine);

    let ended = engine
        .list_auctions(AuctionFilter {
            owner_id: None,
            status: Some(AuctionStatus::Ended),
        })
        .await
        .unwrap();
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].auction_id, theirs);
}

#[tokio::test]
async fn service_checks_credentials_and_scopes_my_auctions() {
    let registry = Arc::new(TokenRegistry::new());
    let owner_token = registry.issue(dummy_data::owner());
    let bidder_token = registry.issue(dummy_data::bidder(1));

    let service = AuctionService::new(
        new_engine(),
        registry,
        Arc::new(DiskMedia::new("uploads")),
    );

    let posted = service
        .post_auction(&owner_token, dummy_data::new_auction_request())
        .await
        .unwrap();

    assert_eq!(
        service
            .place_bid("tok-forged", &posted.auction_id, Decimal::from(150))
            .await,
        Err(Reject::Unauthenticated)
    );

    let accepted = service
        .place_bid(&bidder_token, &posted.auction_id, Decimal::from(150))
        .await
        .unwrap();
    assert_eq!(accepted.current_bid, Decimal::from(150));

    let mine = service.my_auctions(&owner_token).await.unwrap();
    assert_eq!(mine.len(), 1);
    let none = service.my_auctions(&bidder_token).await.unwrap();
    assert!(none.is_empty());
}
