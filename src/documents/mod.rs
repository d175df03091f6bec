//! Plan documents: list/content endpoints and a per-session cache.
//!
//! Successful content is cached per document id for the life of the
//! process. Failures are never cached, so selecting the document again
//! retries the fetch.

mod http;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DocumentError;

pub use http::HttpDocumentSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub label: String,
}

/// Where plan documents come from.
/// Real implementation: `HttpDocumentSource`. Tests use an in-memory fake.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn list(&self) -> Result<Vec<DocumentRef>, DocumentError>;

    async fn fetch(&self, id: &str) -> Result<String, DocumentError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "content", rename_all = "snake_case")]
pub enum DocumentState {
    Loading,
    Loaded(String),
    /// Shown inline with a retry action.
    Failed(String),
}

pub struct DocumentStore {
    source: Arc<dyn DocumentSource>,
    documents: Vec<DocumentRef>,
    cache: HashMap<String, String>,
    current: Option<String>,
    state: Option<DocumentState>,
}

impl DocumentStore {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            documents: Vec::new(),
            cache: HashMap::new(),
            current: None,
            state: None,
        }
    }

    /// Shared handle for fetching off the event loop.
    pub fn source(&self) -> Arc<dyn DocumentSource> {
        Arc::clone(&self.source)
    }

    pub async fn refresh_list(&mut self) -> Result<&[DocumentRef], DocumentError> {
        let documents = self.source.list().await?;
        self.set_documents(documents);
        Ok(&self.documents)
    }

    pub fn set_documents(&mut self, documents: Vec<DocumentRef>) {
        tracing::debug!(count = documents.len(), "document list loaded");
        self.documents = documents;
    }

    pub fn documents(&self) -> &[DocumentRef] {
        &self.documents
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn state(&self) -> Option<&DocumentState> {
        self.state.as_ref()
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }

    /// First document in the list when nothing is selected yet.
    pub fn default_document(&self) -> Option<&str> {
        match self.current {
            Some(_) => None,
            None => self.documents.first().map(|d| d.id.as_str()),
        }
    }

    /// Make `id` the current document. Returns `true` when its content still
    /// has to be fetched; the caller then reports back through
    /// [`DocumentStore::complete`].
    pub fn select(&mut self, id: &str) -> bool {
        self.current = Some(id.to_string());
        match self.cache.get(id) {
            Some(content) => {
                self.state = Some(DocumentState::Loaded(content.clone()));
                false
            }
            None => {
                self.state = Some(DocumentState::Loading);
                true
            }
        }
    }

    /// Re-select the current document. Returns its id when a fetch is needed.
    pub fn retry(&mut self) -> Option<String> {
        let id = self.current.clone()?;
        self.select(&id).then_some(id)
    }

    /// Record a fetch result. Results for a document that is no longer
    /// current are cached but do not change the displayed state.
    pub fn complete(&mut self, id: &str, result: Result<String, DocumentError>) {
        let is_current = self.current.as_deref() == Some(id);
        match result {
            Ok(content) => {
                self.cache.insert(id.to_string(), content.clone());
                if is_current {
                    self.state = Some(DocumentState::Loaded(content));
                }
            }
            Err(e) => {
                tracing::warn!(document = id, error = %e, "failed to load document");
                if is_current {
                    self.state = Some(DocumentState::Failed(e.to_string()));
                }
            }
        }
    }

    /// Select and, if needed, fetch inline.
    pub async fn load(&mut self, id: &str) -> DocumentState {
        if self.select(id) {
            let result = self.source.fetch(id).await;
            self.complete(id, result);
        }
        self.state.clone().unwrap_or(DocumentState::Loading)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory source that counts fetches.
    #[derive(Default)]
    pub struct FakeSource {
        pub documents: Vec<DocumentRef>,
        pub contents: HashMap<String, Result<String, String>>,
        pub fetches: AtomicUsize,
    }

    impl FakeSource {
        pub fn with_doc(mut self, id: &str, label: &str, content: Result<&str, &str>) -> Self {
            self.documents.push(DocumentRef {
                id: id.to_string(),
                label: label.to_string(),
            });
            self.contents.insert(
                id.to_string(),
                content.map(String::from).map_err(String::from),
            );
            self
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentSource for FakeSource {
        async fn list(&self) -> Result<Vec<DocumentRef>, DocumentError> {
            Ok(self.documents.clone())
        }

        async fn fetch(&self, id: &str) -> Result<String, DocumentError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.contents.get(id) {
                Some(Ok(content)) => Ok(content.clone()),
                Some(Err(e)) => Err(DocumentError::Backend(e.clone())),
                None => Err(DocumentError::Backend("Document not found".to_string())),
            }
        }
    }
}
