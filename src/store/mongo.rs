use std::{
    sync::{PoisonError, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::ClientOptions,
    Client, Collection,
};

use super::{DocumentStore, StoreError};
use crate::{id::RecordId, record::WriteOutcome};

pub const DEFAULT_HOST: &str = "mongodb://127.0.0.1:27017/";
pub const DEFAULT_DATABASE: &str = "data";
pub const DEFAULT_COLLECTION: &str = "identity";

#[derive(Clone, Debug)]
pub struct MongoSettings {
    pub host: String,
    pub database: String,
    pub collection: String,
    pub server_selection_timeout: Duration,
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            server_selection_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
struct MongoHandle {
    client: Client,
    collection: Collection<Document>,
}

enum HandleState {
    Open(MongoHandle),
    Failed(String),
    Closed,
}

/// MongoDB-backed store for a single collection.
pub struct MongoStore {
    state: RwLock<HandleState>,
}

impl MongoStore {
    /// Builds the client without touching the network. A host string the
    /// driver cannot parse leaves the store in a failed state, reported by
    /// `ping` and every other operation.
    pub async fn connect(settings: &MongoSettings) -> Self {
        let state = match open_handle(settings).await {
            Ok(handle) => HandleState::Open(handle),
            Err(e) => {
                log::error!("Failed to configure MongoDB client: {}", e);
                HandleState::Failed(e.to_string())
            }
        };
        Self {
            state: RwLock::new(state),
        }
    }

    fn handle(&self) -> Result<MongoHandle, StoreError> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match &*guard {
            HandleState::Open(handle) => Ok(handle.clone()),
            HandleState::Failed(reason) => Err(StoreError::Unavailable(reason.clone())),
            HandleState::Closed => Err(StoreError::Closed),
        }
    }

    fn collection(&self) -> Result<Collection<Document>, StoreError> {
        self.handle().map(|h| h.collection)
    }
}

async fn open_handle(settings: &MongoSettings) -> Result<MongoHandle, MongoError> {
    let mut options = ClientOptions::parse(settings.host.as_str()).await?;
    options.server_selection_timeout = Some(settings.server_selection_timeout);
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

    let client = Client::with_options(options)?;
    let collection = client
        .database(&settings.database)
        .collection::<Document>(&settings.collection);
    Ok(MongoHandle { client, collection })
}

fn id_filter(id: RecordId) -> Document {
    doc! { "_id": id.oid() }
}

fn is_write_concern_failure(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteConcernError(_))
    )
}

/// Writes the store refused to acknowledge come back as unacknowledged
/// outcomes; everything else is a store error.
fn write_result(result: Result<u64, MongoError>) -> Result<WriteOutcome, StoreError> {
    match result {
        Ok(matched) => Ok(WriteOutcome::acknowledged(matched)),
        Err(err) if is_write_concern_failure(&err) => {
            log::warn!("Write not acknowledged: {}", err);
            Ok(WriteOutcome::unacknowledged())
        }
        Err(err) => Err(err.into()),
    }
}

impl From<MongoError> for StoreError {
    fn from(err: MongoError) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } => StoreError::Unavailable(err.to_string()),
            ErrorKind::ConnectionPoolCleared { .. } => StoreError::Unavailable(err.to_string()),
            ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                StoreError::Timeout(err.to_string())
            }
            ErrorKind::Io(_) => StoreError::Unavailable(err.to_string()),
            ErrorKind::BsonDeserialization(_) => StoreError::Decode(err.to_string()),
            _ => StoreError::Other(err.to_string()),
        }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_all(&self) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection()?.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Document>, StoreError> {
        Ok(self.collection()?.find_one(id_filter(id)).await?)
    }

    async fn insert_one(&self, document: Document) -> Result<WriteOutcome, StoreError> {
        let result = self
            .collection()?
            .insert_one(document)
            .await
            .map(|_| 1);
        write_result(result)
    }

    async fn update_by_id(
        &self,
        id: RecordId,
        set: Document,
    ) -> Result<WriteOutcome, StoreError> {
        let result = self
            .collection()?
            .update_one(id_filter(id), doc! { "$set": set })
            .await
            .map(|r| r.matched_count);
        write_result(result)
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<WriteOutcome, StoreError> {
        let result = self
            .collection()?
            .delete_one(id_filter(id))
            .await
            .map(|r| r.deleted_count);
        write_result(result)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let handle = self.handle()?;
        handle
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn close(&self) {
        let previous = {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, HandleState::Closed)
        };
        if let HandleState::Open(MongoHandle { client, .. }) = previous {
            client.shutdown().await;
            log::info!("🔌 MongoDB connection closed");
        }
    }
}
