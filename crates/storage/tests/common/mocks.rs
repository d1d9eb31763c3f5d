use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use folio_storage::error::{StorageError, StorageResult};
use folio_storage::source::DocumentSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory document source that counts `load` calls.
///
/// Lets tests assert that cached derivatives never touch the source.
pub struct InstrumentedSource {
    documents: DashMap<String, Bytes>,
    loads: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl InstrumentedSource {
    pub fn new() -> (Arc<Self>, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(Self {
            documents: DashMap::new(),
            loads: loads.clone(),
        });
        (source, loads)
    }

    pub fn insert(&self, filename: &str, data: impl Into<Bytes>) {
        self.documents.insert(filename.to_string(), data.into());
    }

    pub fn remove(&self, filename: &str) {
        self.documents.remove(filename);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for InstrumentedSource {
    async fn load(&self, filename: &str) -> StorageResult<Bytes> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(filename)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(filename.to_string()))
    }

    async fn exists(&self, filename: &str) -> StorageResult<bool> {
        Ok(self.documents.contains_key(filename))
    }
}
