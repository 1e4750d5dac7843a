//! # Gavel Engine
//!
//! Auction bidding engine: auctioneers list items, bidders compete with
//! strictly increasing bids, everyone observes the current high bid in near
//! real time.
//!
//! ## Architecture
//!
//! ```text
//! [caller] -> [service: authenticate] -> [engine: per-auction lock]
//!                                              |  load -> decide -> CAS
//!                                        [store]           [validator/lifecycle]
//!                                              |
//!                                        [notify: broadcast fan-out]
//! ```
//!
//! The engine serializes mutations per auction id, commits through the
//! store's compare-and-swap, and fans committed snapshots out over lossy
//! broadcast channels. Collaborators (persistence, authentication, media)
//! sit behind traits with generated mocks.

pub mod auction;
pub mod config;
pub mod dummy_data;
pub mod engine;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod media;
pub mod notify;
pub mod service;
pub mod store;
pub mod validator;

// Re-exports for convenience
pub use auction::{Auction, AuctionFilter, AuctionSnapshot, AuctionStatus, Bidder, NewAuction};
pub use config::EngineConfig;
pub use engine::AuctionEngine;
pub use error::Reject;
pub use identity::{Authenticator, Identity, Role, TokenRegistry};
pub use media::{DiskMedia, MediaStore};
pub use notify::Topic;
pub use service::AuctionService;
pub use store::{AuctionMutation, AuctionStore, MemoryStore, PostgresStore, StoreError};
