pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::Document;
use thiserror::Error;

use crate::{id::RecordId, record::WriteOutcome};

pub use memory::MemoryStore;
pub use mongo::{MongoSettings, MongoStore};

/// Store-level failures. These are not recovered by the repository.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out: {0}")]
    Timeout(String),
    #[error("store connection is closed")]
    Closed,
    #[error("malformed document: {0}")]
    Decode(String),
    #[error("store error: {0}")]
    Other(String),
}

/// Access to one collection of documents keyed by native id.
///
/// Write methods return `Ok(WriteOutcome::unacknowledged())` when the store
/// declined to acknowledge the write; `Err` is reserved for availability and
/// protocol failures.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Document>, StoreError>;
    async fn find_by_id(&self, id: RecordId) -> Result<Option<Document>, StoreError>;
    async fn insert_one(&self, document: Document) -> Result<WriteOutcome, StoreError>;
    /// Merges `set` into the matching document, leaving other fields untouched.
    async fn update_by_id(&self, id: RecordId, set: Document)
        -> Result<WriteOutcome, StoreError>;
    async fn delete_by_id(&self, id: RecordId) -> Result<WriteOutcome, StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
    /// Releases the underlying handle. Calling it again is a no-op.
    async fn close(&self);
}
