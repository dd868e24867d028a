use async_trait::async_trait;
use thiserror::Error;

use super::document::{DeleteResult, Document, Filter, InsertOneResult, Projection, UpdateResult};

/// Errors from a document store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Malformed id: {0}")]
    MalformedId(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => StoreError::Connection(err.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Single-document operations against named collections.
///
/// Each call is one round trip; atomicity is whatever the backend gives a
/// single-document write. Implementations are shared across requests behind
/// an `Arc` and must not hold per-request state.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// Store `doc` under a fresh id. Any `_id` in the body is ignored.
    async fn insert_one(&self, collection: &str, doc: Document) -> Result<InsertOneResult, StoreError>;

    /// Merge `set` into the first document matching `filter`
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError>;

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteResult, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Release backend resources. Called once at shutdown.
    async fn close(&self);
}
