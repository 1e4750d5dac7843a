use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Auctioneer,
    Bidder,
}

/// Caller assertion produced by the authentication collaborator. The engine
/// never sees credentials, only identities the collaborator vouches for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCredential;

impl fmt::Display for InvalidCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid credential")
    }
}

impl std::error::Error for InvalidCredential {}

#[automock]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve a bearer credential to the identity it was issued for.
    async fn authenticate(&self, credential: &str) -> Result<Identity, InvalidCredential>;
}

/// In-process token table. Stands in for the external token verifier in the
/// demo binary and integration tests; real deployments plug their own
/// `Authenticator` in.
pub struct TokenRegistry {
    tokens: Mutex<HashMap<String, Identity>>,
    seq: AtomicU64,
}

impl TokenRegistry {
    pub fn new() -> Self {
        TokenRegistry {
            tokens: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
        }
    }

    /// Register an identity and hand back the credential that resolves to it.
    pub fn issue(&self, identity: Identity) -> String {
        let token = format!("tok-{:08x}", self.seq.fetch_add(1, Ordering::Relaxed));
        self.tokens
            .lock()
            .expect("token table poisoned")
            .insert(token.clone(), identity);
        token
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for TokenRegistry {
    async fn authenticate(&self, credential: &str) -> Result<Identity, InvalidCredential> {
        self.tokens
            .lock()
            .expect("token table poisoned")
            .get(credential)
            .cloned()
            .ok_or(InvalidCredential)
    }
}
