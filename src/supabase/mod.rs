//! Clients for the managed backend: the record store (PostgREST) and the
//! credential provider (GoTrue). Handlers only see the two traits below.

use async_trait::async_trait;
use serde_json::Value;

mod filter;
mod gotrue;
mod rest;

#[cfg(test)]
pub mod fake;

pub use filter::Filter;
pub use gotrue::GoTrueClient;
pub use rest::PostgrestClient;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("data service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("data service rejected the write as a conflict: {0}")]
    Conflict(String),
    #[error("data service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid data service payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Row-level access to the managed record store.
///
/// Every write returns the affected rows, so an empty vector means no row
/// matched the filters.
#[async_trait]
pub trait DataService: Send + Sync {
    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[Filter],
    ) -> Result<Vec<Value>, DataError>;

    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, DataError>;

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, DataError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, DataError>;
}

/// Identity the credential provider vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub provider_id: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Wrong password or unknown account; the provider does not say which.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Credentials may be right but the account may not sign in (unconfirmed, banned).
    #[error("sign-in refused: {0}")]
    Refused(String),
    #[error("auth provider failure: {0}")]
    Provider(String),
    #[error("auth provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, AuthServiceError>;
}
