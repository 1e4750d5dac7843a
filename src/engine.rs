use crate::auction::{Auction, AuctionFilter, AuctionSnapshot, AuctionStatus, NewAuction};
use crate::config::EngineConfig;
use crate::error::Reject;
use crate::identity::Identity;
use crate::lifecycle;
use crate::notify::{Notifier, Topic};
use crate::store::{AuctionMutation, AuctionStore, StoreError};
use crate::validator;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{info, warn};

/// The concurrency coordinator. Every mutation of an auction runs inside
/// that auction's exclusive critical section, so the read/decide/commit
/// cycle is atomic per auction id while unrelated auctions proceed fully in
/// parallel. Accepted bids for one auction are therefore linearizable: the
/// sequence of `current_bid` values any reader observes is exactly the
/// admission order.
pub struct AuctionEngine {
    store: Arc<dyn AuctionStore>,
    notifier: Notifier,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    config: EngineConfig,
}

fn reject_for(err: &StoreError) -> Reject {
    match err {
        StoreError::NotFound => Reject::NotFound,
        StoreError::Conflict => Reject::Contention,
        StoreError::Unavailable(_) => Reject::StorageUnavailable,
    }
}

fn transient(err: &StoreError) -> bool {
    matches!(err, StoreError::Conflict | StoreError::Unavailable(_))
}

impl AuctionEngine {
    pub fn new(store: Arc<dyn AuctionStore>, config: EngineConfig) -> Self {
        AuctionEngine {
            store,
            notifier: Notifier::new(config.notify_capacity),
            locks: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn lock_for(&self, auction_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock table poisoned");
        locks
            .entry(auction_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Read/decide/commit under the auction's critical section. One
    /// transient failure (version conflict or storage hiccup) restarts the
    /// whole cycle; a second surfaces to the caller as retryable.
    async fn mutate(
        &self,
        auction_id: &str,
        decide: impl Fn(&Auction) -> Result<AuctionMutation, Reject>,
    ) -> Result<AuctionSnapshot, Reject> {
        let lock = self.lock_for(auction_id);
        let _guard = match timeout(self.config.lock_timeout, lock.lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                warn!(auction_id, "timed out waiting for auction lock");
                return Err(Reject::Contention);
            }
        };

        let mut retried = false;
        loop {
            let auction = match self.store.get(auction_id).await {
                Ok(auction) => auction,
                Err(err) if transient(&err) && !retried => {
                    warn!(auction_id, error = %err, "load failed, retrying once");
                    retried = true;
                    continue;
                }
                Err(err) => return Err(reject_for(&err)),
            };

            let mutation = decide(&auction)?;

            match self
                .store
                .compare_and_swap(auction_id, auction.version, mutation)
                .await
            {
                Ok(updated) => {
                    let snapshot = updated.snapshot();
                    // Published before the guard drops so each subscriber's
                    // stream matches commit order. The send only buffers;
                    // slow subscribers cannot delay admission.
                    self.notifier.publish(&snapshot);
                    if snapshot.status == AuctionStatus::Ended {
                        // Ended is terminal, so the lock table only has to
                        // track live auctions. Waiters already hold their
                        // own Arc of this mutex and still serialize.
                        self.locks
                            .lock()
                            .expect("lock table poisoned")
                            .remove(auction_id);
                    }
                    return Ok(snapshot);
                }
                // The coordinator is the sole writer, so a conflict here
                // means a writer bypassed it. Guarded anyway.
                Err(err) if transient(&err) && !retried => {
                    warn!(auction_id, error = %err, "commit failed, retrying once");
                    retried = true;
                }
                Err(err) => return Err(reject_for(&err)),
            }
        }
    }

    pub async fn create_auction(
        &self,
        owner: &Identity,
        new: NewAuction,
    ) -> Result<AuctionSnapshot, Reject> {
        if new.start_price <= Decimal::ZERO {
            return Err(Reject::InvalidAmount);
        }
        match self.store.create(owner, new).await {
            Ok(auction) => {
                info!(auction_id = %auction.id, owner = %owner.username, "auction posted");
                Ok(auction.snapshot())
            }
            Err(err) => Err(reject_for(&err)),
        }
    }

    pub async fn place_bid(
        &self,
        auction_id: &str,
        bidder: &Identity,
        amount: Decimal,
    ) -> Result<AuctionSnapshot, Reject> {
        let accepted = self
            .mutate(auction_id, |auction| {
                validator::validate_bid(auction, amount, bidder)
            })
            .await?;
        info!(auction_id, bidder = %bidder.username, %amount, version = accepted.version, "bid accepted");
        Ok(accepted)
    }

    pub async fn end_auction(
        &self,
        auction_id: &str,
        requester: &Identity,
    ) -> Result<AuctionSnapshot, Reject> {
        let ended = self
            .mutate(auction_id, |auction| {
                lifecycle::authorize_end(auction, requester)
            })
            .await?;
        info!(auction_id, requester = %requester.username, "auction ended");
        Ok(ended)
    }

    pub async fn get_auction(&self, auction_id: &str) -> Result<AuctionSnapshot, Reject> {
        match self.store.get(auction_id).await {
            Ok(auction) => Ok(auction.snapshot()),
            Err(err) => Err(reject_for(&err)),
        }
    }

    pub async fn list_auctions(
        &self,
        filter: AuctionFilter,
    ) -> Result<Vec<AuctionSnapshot>, Reject> {
        match self.store.list(filter).await {
            Ok(auctions) => Ok(auctions.iter().map(Auction::snapshot).collect()),
            Err(err) => Err(reject_for(&err)),
        }
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<AuctionSnapshot> {
        self.notifier.subscribe(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy_data;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn ended_auctions_leave_the_lock_table() {
        let engine = AuctionEngine::new(Arc::new(MemoryStore::new()), EngineConfig::default());
        let id = engine
            .create_auction(&dummy_data::owner(), dummy_data::new_auction_request())
            .await
            .unwrap()
            .auction_id;

        engine
            .place_bid(&id, &dummy_data::bidder(1), Decimal::from(150))
            .await
            .unwrap();
        assert!(engine.locks.lock().unwrap().contains_key(&id));

        engine.end_auction(&id, &dummy_data::owner()).await.unwrap();
        assert!(!engine.locks.lock().unwrap().contains_key(&id));

        // A bid after the prune takes a fresh entry and is still rejected.
        assert_eq!(
            engine
                .place_bid(&id, &dummy_data::bidder(2), Decimal::from(500))
                .await,
            Err(Reject::AuctionClosed)
        );
    }
}
