use std::sync::{
    atomic::{AtomicBool, Ordering},
    PoisonError, RwLock,
};

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};

use super::{DocumentStore, StoreError};
use crate::{id::RecordId, record::WriteOutcome};

/// In-process store keeping documents in insertion order.
///
/// Useful for tests and for running the API without a database. It can be
/// switched offline to simulate an unreachable server.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<(ObjectId, Document)>>,
    offline: AtomicBool,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails as unavailable.
    pub fn offline() -> Self {
        let store = Self::default();
        store.set_offline(true);
        store
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Document>, StoreError> {
        self.check()?;
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.iter().map(|(_, d)| d.clone()).collect())
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Document>, StoreError> {
        self.check()?;
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents
            .iter()
            .find(|(oid, _)| *oid == id.oid())
            .map(|(_, d)| d.clone()))
    }

    async fn insert_one(&self, mut document: Document) -> Result<WriteOutcome, StoreError> {
        self.check()?;
        let oid = ObjectId::new();
        document.insert("_id", oid);
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((oid, document));
        Ok(WriteOutcome::acknowledged(1))
    }

    async fn update_by_id(
        &self,
        id: RecordId,
        set: Document,
    ) -> Result<WriteOutcome, StoreError> {
        self.check()?;
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        let Some((_, document)) = documents.iter_mut().find(|(oid, _)| *oid == id.oid()) else {
            return Ok(WriteOutcome::acknowledged(0));
        };
        for (key, value) in set {
            document.insert(key, value);
        }
        Ok(WriteOutcome::acknowledged(1))
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<WriteOutcome, StoreError> {
        self.check()?;
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        let before = documents.len();
        documents.retain(|(oid, _)| *oid != id.oid());
        Ok(WriteOutcome::acknowledged((before - documents.len()) as u64))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
