//! Application state management

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::anchoring::AnchoringEngine;
use crate::config::Config;
use crate::memory::ExtractedDocument;

/// Anchoring engine bound to one registered document
pub type DocumentEngine = AnchoringEngine<ExtractedDocument>;

/// Registered documents by id
#[derive(Default)]
pub struct DocumentRegistry {
    entries: RwLock<HashMap<String, Arc<DocumentEngine>>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.contains_key(id)
    }

    /// Register a document, replacing any previous one with the same id
    pub async fn insert(&self, id: String, engine: Arc<DocumentEngine>) {
        self.entries.write().await.insert(id, engine);
    }

    pub async fn get(&self, id: &str) -> Option<Arc<DocumentEngine>> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.entries.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    documents: DocumentRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                documents: DocumentRegistry::new(),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document registry
    pub fn documents(&self) -> &DocumentRegistry {
        &self.inner.documents
    }
}
