use gavel_engine::{
    dummy_data, AuctionEngine, AuctionService, DiskMedia, EngineConfig, MemoryStore, Reject,
    TokenRegistry, Topic,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Scripted run of the engine against the in-memory store: one auctioneer,
/// two bidders racing, a live subscriber, and an explicit close.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disable printing the name of the module in every log line.
        .with_target(false)
        .init();

    let registry = Arc::new(TokenRegistry::new());
    let owner_token = registry.issue(dummy_data::owner());
    let alice_token = registry.issue(dummy_data::bidder(1));
    let bob_token = registry.issue(dummy_data::bidder(2));

    let engine = Arc::new(AuctionEngine::new(
        Arc::new(MemoryStore::new()),
        EngineConfig::from_env(),
    ));
    let service = Arc::new(AuctionService::new(
        engine,
        registry,
        Arc::new(DiskMedia::new("uploads")),
    ));

    let posted = service
        .post_auction(&owner_token, dummy_data::new_auction_request())
        .await?;
    let auction_id = posted.auction_id.clone();

    let mut updates = service.subscribe(Topic::Auction(auction_id.clone()));
    let watcher = tokio::spawn(async move {
        while let Ok(snapshot) = updates.recv().await {
            info!(
                auction_id = %snapshot.auction_id,
                current_bid = %snapshot.current_bid,
                status = ?snapshot.status,
                version = snapshot.version,
                "update"
            );
        }
    });

    let mut bidders = Vec::new();
    for (token, base) in [(alice_token, 110u32), (bob_token, 115u32)] {
        let service = Arc::clone(&service);
        let auction_id = auction_id.clone();
        bidders.push(tokio::spawn(async move {
            for round in 0..5u32 {
                let amount = Decimal::from(base + round * 20);
                match service.place_bid(&token, &auction_id, amount).await {
                    Ok(snapshot) => info!(%amount, version = snapshot.version, "bid accepted"),
                    Err(Reject::BidTooLow) => info!(%amount, "outbid"),
                    Err(err) => info!(%amount, %err, "rejected"),
                }
            }
        }));
    }
    for bidder in bidders {
        bidder.await?;
    }

    let ended = service.end_auction(&owner_token, &auction_id).await?;
    info!(
        current_bid = %ended.current_bid,
        winner = ?ended.highest_bidder,
        "auction closed"
    );
    println!("{}", serde_json::to_string_pretty(&ended)?);

    drop(service);
    watcher.abort();
    Ok(())
}
