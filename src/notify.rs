use crate::auction::AuctionSnapshot;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// What a subscriber wants to hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    Auction(String),
    All,
}

/// Fan-out of committed snapshots to live subscribers.
///
/// Streams are a convenience, not the system of record: delivery is
/// best-effort, lagging subscribers lose the oldest buffered snapshots, and
/// late joiners fetch current state from the store instead of a replay.
/// The registry has its own lock, independent of the per-auction bid locks,
/// so subscriber churn never contends with bid admission.
pub struct Notifier {
    capacity: usize,
    per_auction: Mutex<HashMap<String, broadcast::Sender<AuctionSnapshot>>>,
    all: broadcast::Sender<AuctionSnapshot>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (all, _) = broadcast::channel(capacity);
        Notifier {
            capacity,
            per_auction: Mutex::new(HashMap::new()),
            all,
        }
    }

    /// Open a lazy, infinite stream of snapshots. Ends when the receiver is
    /// dropped; missed events are not replayed.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<AuctionSnapshot> {
        match topic {
            Topic::All => self.all.subscribe(),
            Topic::Auction(auction_id) => {
                let mut registry = self.per_auction.lock().expect("subscriber registry poisoned");
                registry
                    .entry(auction_id)
                    .or_insert_with(|| broadcast::channel(self.capacity).0)
                    .subscribe()
            }
        }
    }

    /// Push a committed snapshot to every interested subscriber. Never
    /// blocks: `broadcast::Sender::send` only buffers, so a slow or gone
    /// subscriber cannot hold up the commit path.
    pub fn publish(&self, snapshot: &AuctionSnapshot) {
        // No receivers on the firehose is fine.
        let _ = self.all.send(snapshot.clone());

        let mut registry = self.per_auction.lock().expect("subscriber registry poisoned");
        let dead = match registry.get(&snapshot.auction_id) {
            Some(sender) => sender.send(snapshot.clone()).is_err(),
            None => false,
        };
        // A send error means every receiver for this auction is gone.
        if dead {
            registry.remove(&snapshot.auction_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy_data::{self, AuctionOption};

    #[tokio::test]
    async fn per_auction_subscribers_only_see_their_auction() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe(Topic::Auction("a-000001".to_string()));

        let mut other = dummy_data::new_auction(AuctionOption::WithBid).snapshot();
        other.auction_id = "a-000999".to_string();
        notifier.publish(&other);

        let mine = dummy_data::new_auction(AuctionOption::WithBid).snapshot();
        notifier.publish(&mine);

        assert_eq!(rx.recv().await.unwrap(), mine);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn firehose_sees_everything() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe(Topic::All);

        let snapshot = dummy_data::new_auction(AuctionOption::WithBid).snapshot();
        notifier.publish(&snapshot);
        assert_eq!(rx.recv().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn publishing_with_no_subscribers_is_a_no_op() {
        let notifier = Notifier::new(8);
        let snapshot = dummy_data::new_auction(AuctionOption::WithBid).snapshot();
        notifier.publish(&snapshot);
    }
}
