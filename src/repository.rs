//! Identity document repository.
//!
//! The repository is the only path to the collection. It normalizes identifier
//! problems into its ordinary return values (`None` / `false`) and lets
//! store-level failures propagate as [`StoreError`] for the caller to turn
//! into a server error.

use crate::{
    id::{self, RecordId},
    record::{NewRecord, Record, RecordPatch, WriteOutcome},
    store::{DocumentStore, MongoSettings, MongoStore, StoreError},
};

/// Connectivity observed when the repository was constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
}

/// How callers judge store connectivity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Liveness {
    /// Use the state recorded at construction.
    #[default]
    Cached,
    /// Ping the store on every check.
    Probe,
}

pub struct IdentityRepository<S: DocumentStore = MongoStore> {
    store: S,
    state: ConnectionState,
}

impl IdentityRepository<MongoStore> {
    /// Opens the MongoDB collection described by `settings` and probes it once.
    /// Never fails: an unreachable or misconfigured host shows up as
    /// `is_connected() == false`.
    pub async fn connect(settings: &MongoSettings) -> Self {
        let store = MongoStore::connect(settings).await;
        Self::with_store(store).await
    }
}

impl<S: DocumentStore> IdentityRepository<S> {
    /// Wraps `store` and records the result of a single liveness probe.
    pub async fn with_store(store: S) -> Self {
        let connected = match store.ping().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Store liveness probe failed: {}", e);
                false
            }
        };
        Self {
            store,
            state: ConnectionState { connected },
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Connectivity as recorded at construction. Not re-checked.
    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// Re-runs the liveness probe against the store. Costs a round trip and
    /// leaves the cached state untouched.
    pub async fn probe(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    /// Connectivity as judged by `mode`.
    pub async fn connectivity(&self, mode: Liveness) -> bool {
        match mode {
            Liveness::Cached => self.is_connected(),
            Liveness::Probe => self.probe().await,
        }
    }

    /// Every record in store order.
    pub async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        let documents = self.store.find_all().await?;
        Ok(documents.iter().map(Record::from_document).collect())
    }

    /// Looks up one record. A malformed id is reported the same way as a
    /// missing record.
    pub async fn get_one(&self, external: &str) -> Result<Option<Record>, StoreError> {
        let Some(id) = decode_or_log(external) else {
            return Ok(None);
        };
        let document = self.store.find_by_id(id).await?;
        Ok(document.as_ref().map(Record::from_document))
    }

    /// Creates one record. The new id is not returned; the result only says
    /// whether the store acknowledged the write.
    pub async fn insert(&self, fields: NewRecord) -> Result<bool, StoreError> {
        let outcome = self.store.insert_one(fields.to_document()).await?;
        Ok(outcome.acknowledged)
    }

    /// Sets the supplied fields on the record with the given id.
    ///
    /// Returns `false` without contacting the store when the id is malformed.
    /// Otherwise returns the store's acknowledgement, which is `true` even if
    /// no record matched; use [`update_counted`](Self::update_counted) to
    /// tell the two apart.
    pub async fn update(&self, external: &str, patch: RecordPatch) -> Result<bool, StoreError> {
        Ok(self.update_counted(external, patch).await?.acknowledged)
    }

    /// Like [`update`](Self::update) but reports how many records matched.
    pub async fn update_counted(
        &self,
        external: &str,
        patch: RecordPatch,
    ) -> Result<WriteOutcome, StoreError> {
        let Some(id) = decode_or_log(external) else {
            return Ok(WriteOutcome::unacknowledged());
        };
        self.store.update_by_id(id, patch.to_set_document()).await
    }

    /// Deletes the record with the given id. Same acknowledgement caveat as
    /// [`update`](Self::update).
    pub async fn delete(&self, external: &str) -> Result<bool, StoreError> {
        Ok(self.delete_counted(external).await?.acknowledged)
    }

    pub async fn delete_counted(&self, external: &str) -> Result<WriteOutcome, StoreError> {
        let Some(id) = decode_or_log(external) else {
            return Ok(WriteOutcome::unacknowledged());
        };
        self.store.delete_by_id(id).await
    }

    /// Releases the store handle. Safe to call more than once.
    pub async fn close(&self) {
        self.store.close().await;
    }
}

fn decode_or_log(external: &str) -> Option<RecordId> {
    match id::decode(external) {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    }
}
