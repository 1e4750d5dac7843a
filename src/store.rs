use crate::auction::{Auction, AuctionFilter, AuctionStatus, Bidder, NewAuction};
use crate::config::get_env_var;
use crate::identity::Identity;
use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound,
    /// The stored version no longer matches the version the caller read.
    Conflict,
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "auction not found"),
            StoreError::Conflict => write!(f, "version conflict"),
            StoreError::Unavailable(reason) => write!(f, "storage unavailable: {}", reason),
        }
    }
}

impl std::error::Error for StoreError {}

/// A whole-record mutation applied atomically by `compare_and_swap`. No
/// partial-field update path exists outside these two.
#[derive(Debug, Clone, PartialEq)]
pub enum AuctionMutation {
    Bid { amount: Decimal, bidder: Bidder },
    End,
}

/// Durable record of auction entities; the single source of truth for the
/// current bid and status. `compare_and_swap` is the only mutating entry
/// point and increments `version` on success.
#[automock]
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Persist a new Active auction with `current_bid = 0`, `version = 0`
    /// and a store-assigned id.
    async fn create(&self, owner: &Identity, new: NewAuction) -> Result<Auction, StoreError>;

    async fn get(&self, auction_id: &str) -> Result<Auction, StoreError>;

    async fn list(&self, filter: AuctionFilter) -> Result<Vec<Auction>, StoreError>;

    /// Apply `mutation` only if the stored version equals `expected_version`,
    /// returning the updated record.
    async fn compare_and_swap(
        &self,
        auction_id: &str,
        expected_version: u64,
        mutation: AuctionMutation,
    ) -> Result<Auction, StoreError>;
}

fn apply(auction: &mut Auction, mutation: &AuctionMutation) {
    match mutation {
        AuctionMutation::Bid { amount, bidder } => {
            auction.current_bid = *amount;
            auction.highest_bidder = Some(bidder.clone());
        }
        AuctionMutation::End => {
            auction.status = AuctionStatus::Ended;
        }
    }
    auction.version += 1;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Reference implementation backed by a process-local map. Used by the demo
/// binary and the integration tests; semantics match `PostgresStore`.
pub struct MemoryStore {
    auctions: RwLock<HashMap<String, Auction>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            auctions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn create(&self, owner: &Identity, new: NewAuction) -> Result<Auction, StoreError> {
        let id = format!("a-{:06}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let auction = Auction {
            id: id.clone(),
            owner_id: owner.user_id.clone(),
            owner_name: owner.username.clone(),
            name: new.name,
            description: new.description,
            photo: new.photo,
            start_price: new.start_price,
            current_bid: Decimal::ZERO,
            highest_bidder: None,
            status: AuctionStatus::Active,
            scheduled_close_time: new.scheduled_close_time,
            version: 0,
        };
        self.auctions.write().await.insert(id, auction.clone());
        Ok(auction)
    }

    async fn get(&self, auction_id: &str) -> Result<Auction, StoreError> {
        self.auctions
            .read()
            .await
            .get(auction_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let auctions = self.auctions.read().await;
        let mut matched: Vec<Auction> = auctions
            .values()
            .filter(|auction| filter.matches(auction))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matched)
    }

    async fn compare_and_swap(
        &self,
        auction_id: &str,
        expected_version: u64,
        mutation: AuctionMutation,
    ) -> Result<Auction, StoreError> {
        let mut auctions = self.auctions.write().await;
        let auction = auctions.get_mut(auction_id).ok_or(StoreError::NotFound)?;
        if auction.version != expected_version {
            return Err(StoreError::Conflict);
        }
        apply(auction, &mutation);
        Ok(auction.clone())
    }
}

// ============================================================================
// Postgres store
// ============================================================================

#[automock]
#[async_trait]
pub trait Connectable {
    async fn is_connected(&self) -> bool;
    async fn connect(&mut self) -> Result<(), StoreError>;
    async fn ping(&mut self) -> Result<(), StoreError>;
}

const AUCTION_COLUMNS: &str = "id, owner_id, owner_name, name, description, photo, \
     start_price, current_bid, highest_bidder_id, highest_bidder_name, \
     status, scheduled_close_time, version";

/// Durable store on Postgres. Compare-and-swap is a single conditional
/// `UPDATE ... WHERE version = $expected`, so concurrent writers that slip
/// past the coordinator still cannot produce a lost update.
///
/// Needs a reachable database configured through the `PG_*` env vars
/// (`connect`, then `ensure_schema` on first run). The demo binary and the
/// test suite run on `MemoryStore` instead, so nothing here executes
/// without a database.
pub struct PostgresStore {
    pub client: Option<tokio_postgres::Client>,
    next_id: AtomicU64,
}

impl PostgresStore {
    pub fn new() -> Self {
        PostgresStore {
            client: None,
            next_id: AtomicU64::new(1),
        }
    }

    fn client(&self) -> Result<&tokio_postgres::Client, StoreError> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("postgres client not connected".to_string()))
    }

    /// Create the auctions table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let client = self.client()?;
        client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS auctions (
                    id TEXT PRIMARY KEY,
                    owner_id TEXT NOT NULL,
                    owner_name TEXT NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    photo TEXT,
                    start_price NUMERIC NOT NULL,
                    current_bid NUMERIC NOT NULL,
                    highest_bidder_id TEXT,
                    highest_bidder_name TEXT,
                    status TEXT NOT NULL,
                    scheduled_close_time TIMESTAMPTZ NOT NULL,
                    version BIGINT NOT NULL
                )",
            )
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl Default for PostgresStore {
    fn default() -> Self {
        Self::new()
    }
}

fn row_to_auction(row: &tokio_postgres::Row) -> Result<Auction, StoreError> {
    let status = match row.get::<_, &str>("status") {
        "Active" => AuctionStatus::Active,
        "Ended" => AuctionStatus::Ended,
        other => {
            return Err(StoreError::Unavailable(format!(
                "unknown auction status {:?}",
                other
            )))
        }
    };
    let highest_bidder = match (
        row.get::<_, Option<String>>("highest_bidder_id"),
        row.get::<_, Option<String>>("highest_bidder_name"),
    ) {
        (Some(user_id), Some(username)) => Some(Bidder { user_id, username }),
        _ => None,
    };
    Ok(Auction {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        owner_name: row.get("owner_name"),
        name: row.get("name"),
        description: row.get("description"),
        photo: row.get("photo"),
        start_price: row.get("start_price"),
        current_bid: row.get("current_bid"),
        highest_bidder,
        status,
        scheduled_close_time: row.get("scheduled_close_time"),
        version: row.get::<_, i64>("version") as u64,
    })
}

#[async_trait]
impl AuctionStore for PostgresStore {
    async fn create(&self, owner: &Identity, new: NewAuction) -> Result<Auction, StoreError> {
        let client = self.client()?;
        let id = format!(
            "{:x}-{:04x}",
            Utc::now().timestamp_millis(),
            self.next_id.fetch_add(1, Ordering::Relaxed)
        );
        let auction = Auction {
            id: id.clone(),
            owner_id: owner.user_id.clone(),
            owner_name: owner.username.clone(),
            name: new.name,
            description: new.description,
            photo: new.photo,
            start_price: new.start_price,
            current_bid: Decimal::ZERO,
            highest_bidder: None,
            status: AuctionStatus::Active,
            scheduled_close_time: new.scheduled_close_time,
            version: 0,
        };
        client
            .execute(
                "INSERT INTO auctions (id, owner_id, owner_name, name, description, photo, \
                 start_price, current_bid, status, scheduled_close_time, version) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0)",
                &[
                    &auction.id,
                    &auction.owner_id,
                    &auction.owner_name,
                    &auction.name,
                    &auction.description,
                    &auction.photo,
                    &auction.start_price,
                    &auction.current_bid,
                    &auction.status.as_str(),
                    &auction.scheduled_close_time,
                ],
            )
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(auction)
    }

    async fn get(&self, auction_id: &str) -> Result<Auction, StoreError> {
        let client = self.client()?;
        let query = format!("SELECT {} FROM auctions WHERE id = $1", AUCTION_COLUMNS);
        let row = client
            .query_opt(&query, &[&auction_id])
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .ok_or(StoreError::NotFound)?;
        row_to_auction(&row)
    }

    async fn list(&self, filter: AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let client = self.client()?;
        let status_text = filter.status.map(|s| s.as_str().to_string());
        let mut query = format!("SELECT {} FROM auctions", AUCTION_COLUMNS);
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let mut clauses: Vec<String> = Vec::new();
        if let Some(owner_id) = filter.owner_id.as_ref() {
            params.push(owner_id);
            clauses.push(format!("owner_id = ${}", params.len()));
        }
        if let Some(status) = status_text.as_ref() {
            params.push(status);
            clauses.push(format!("status = ${}", params.len()));
        }
        if !clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&clauses.join(" AND "));
        }
        query.push_str(" ORDER BY id");
        let rows = client
            .query(&query, &params)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        rows.iter().map(row_to_auction).collect()
    }

    async fn compare_and_swap(
        &self,
        auction_id: &str,
        expected_version: u64,
        mutation: AuctionMutation,
    ) -> Result<Auction, StoreError> {
        let client = self.client()?;
        let expected = expected_version as i64;
        let row = match &mutation {
            AuctionMutation::Bid { amount, bidder } => {
                let query = format!(
                    "UPDATE auctions SET current_bid = $3, highest_bidder_id = $4, \
                     highest_bidder_name = $5, version = version + 1 \
                     WHERE id = $1 AND version = $2 RETURNING {}",
                    AUCTION_COLUMNS
                );
                client
                    .query_opt(
                        &query,
                        &[&auction_id, &expected, amount, &bidder.user_id, &bidder.username],
                    )
                    .await
            }
            AuctionMutation::End => {
                let query = format!(
                    "UPDATE auctions SET status = 'Ended', version = version + 1 \
                     WHERE id = $1 AND version = $2 RETURNING {}",
                    AUCTION_COLUMNS
                );
                client.query_opt(&query, &[&auction_id, &expected]).await
            }
        }
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match row {
            Some(row) => row_to_auction(&row),
            // No row matched: either the record is gone or someone else
            // advanced the version first.
            None => {
                let exists = client
                    .query_opt("SELECT 1 FROM auctions WHERE id = $1", &[&auction_id])
                    .await
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                match exists {
                    Some(_) => Err(StoreError::Conflict),
                    None => Err(StoreError::NotFound),
                }
            }
        }
    }
}

#[async_trait]
impl Connectable for PostgresStore {
    async fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn ping(&mut self) -> Result<(), StoreError> {
        let client = self.client()?;
        client
            .query("SELECT 1", &[])
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn connect(&mut self) -> Result<(), StoreError> {
        let host = get_env_var("PG_HOST").map_err(StoreError::Unavailable)?;
        let port = get_env_var("PG_PORT").map_err(StoreError::Unavailable)?;
        let user = get_env_var("PG_USER").map_err(StoreError::Unavailable)?;
        let password = get_env_var("PG_PASSWORD").map_err(StoreError::Unavailable)?;
        let dbname = get_env_var("PG_DBNAME").map_err(StoreError::Unavailable)?;
        let connect_string = format!(
            "host={} port={} user={} password={} dbname={}",
            host, port, user, password, dbname
        );

        let (client, connection) = tokio_postgres::connect(&connect_string, NoTls)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // The connection object performs the actual communication with the
        // database, so spawn it off to run on its own.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("postgres connection error: {}", e);
            }
        });

        self.client = Some(client);
        Ok(())
    }
}
