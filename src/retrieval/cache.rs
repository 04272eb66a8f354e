//! Process-wide document cache for the retrieval pipeline.
//!
//! One entry per (conversation, document) pair, so repeated queries against
//! the same document in a conversation skip extraction and embedding while
//! one conversation's vectors never serve another's. Entries live for the
//! process lifetime; racing misses for the same key both compute and the
//! second write wins (the computations are equivalent).

use super::index::FlatL2Index;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A built index and the chunks it was built from. Row `i` of the index
/// embeds chunk `i`.
#[derive(Debug)]
pub struct DocumentEntry {
    pub index: FlatL2Index,
    pub chunks: Vec<String>,
}

/// Shared key→entry store. Cloning is cheap and all clones observe the same
/// entries.
#[derive(Clone, Default)]
pub struct DocumentCache {
    entries: Arc<RwLock<HashMap<String, Arc<DocumentEntry>>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache instance.
    pub fn global() -> Self {
        static GLOBAL: Lazy<DocumentCache> = Lazy::new(DocumentCache::new);
        GLOBAL.clone()
    }

    /// Cache key for a (conversation, document) pair.
    pub fn document_key(conversation_id: &str, document_url: &str) -> String {
        format!("{conversation_id}:{document_url}")
    }

    pub fn get(&self, key: &str) -> Option<Arc<DocumentEntry>> {
        let entry = self.entries.read().unwrap().get(key).cloned();
        match &entry {
            Some(_) => debug!(key, "document cache hit"),
            None => debug!(key, "document cache miss"),
        }
        entry
    }

    /// Store an entry, returning the shared handle. Last writer wins.
    pub fn insert(&self, key: String, entry: DocumentEntry) -> Arc<DocumentEntry> {
        let entry = Arc::new(entry);
        self.entries.write().unwrap().insert(key, entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}
