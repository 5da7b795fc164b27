//! Asynchronous writes of tasks to a document collection.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Error, anyhow};
use taskpad_core::{DocumentId, Task, TaskDocument};
use taskpad_store_git::{GitCollection, GitCollectionError};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Remote document store seen by the gateway.
pub trait DocumentCollection: Send + Sync + 'static {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error> + Send + 'static;

    /// Add a document to the named collection.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn add_document(
        &self,
        collection: &str,
        document: TaskDocument,
    ) -> impl Future<Output = Result<DocumentId, Self::Error>> + Send;

    /// Read back every document of the named collection in write order.
    ///
    /// # Errors
    /// Returns a store-specific error when the read fails.
    fn documents(&self, collection: &str) -> impl Future<Output = Result<Vec<TaskDocument>, Self::Error>> + Send;
}

impl DocumentCollection for Arc<GitCollection> {
    type Error = GitCollectionError;

    async fn add_document(&self, collection: &str, document: TaskDocument) -> Result<DocumentId, Self::Error> {
        let store = Arc::clone(self);
        let collection = collection.to_owned();
        tokio::task::spawn_blocking(move || store.append_document(&collection, &document))
            .await
            .map_err(|e| GitCollectionError::Other(format!("Task join error: {e}")))?
            .map(|oid| DocumentId(oid.to_string()))
    }

    async fn documents(&self, collection: &str) -> Result<Vec<TaskDocument>, Self::Error> {
        let store = Arc::clone(self);
        let collection = collection.to_owned();
        let stored = tokio::task::spawn_blocking(move || store.load_documents(&collection))
            .await
            .map_err(|e| GitCollectionError::Other(format!("Task join error: {e}")))??;
        Ok(stored.into_iter().map(|doc| doc.document).collect())
    }
}

/// In-process collection, optionally failing every write.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: Mutex<HashMap<String, Vec<(DocumentId, TaskDocument)>>>,
    next_id: AtomicU64,
    failure: Option<String>,
}

impl MemoryCollection {
    /// Empty collection accepting every write.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection rejecting every write with `reason`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }
}

impl DocumentCollection for MemoryCollection {
    type Error = Error;

    async fn add_document(&self, collection: &str, document: TaskDocument) -> Result<DocumentId, Self::Error> {
        if let Some(reason) = &self.failure {
            return Err(anyhow!("{reason}"));
        }
        let id = DocumentId(format!("doc-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1));
        self.documents
            .lock()
            .await
            .entry(collection.to_owned())
            .or_default()
            .push((id.clone(), document));
        Ok(id)
    }

    async fn documents(&self, collection: &str) -> Result<Vec<TaskDocument>, Self::Error> {
        Ok(self
            .documents
            .lock()
            .await
            .get(collection)
            .map(|docs| docs.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default())
    }
}

/// A remote write failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The collection rejected or failed the write.
    #[error("failed to save task to collection '{collection}': {source}")]
    Collection {
        /// Target collection.
        collection: String,
        /// Underlying store error.
        source: Error,
    },
}

/// A detached save that failed after the user moved on.
#[derive(Debug)]
pub struct PersistenceFailure {
    /// Task whose write failed; it stays in the local list.
    pub task: Task,
    /// Why the write failed.
    pub error: PersistenceError,
    /// When the failure was observed.
    pub occurred_at: OffsetDateTime,
}

/// Receiving end for failures of detached saves.
#[derive(Debug)]
pub struct FailureFeed {
    rx: mpsc::UnboundedReceiver<PersistenceFailure>,
}

impl FailureFeed {
    /// Every failure delivered so far, without waiting.
    pub fn drain(&mut self) -> Vec<PersistenceFailure> {
        let mut out = Vec::new();
        while let Ok(failure) = self.rx.try_recv() {
            out.push(failure);
        }
        out
    }

    /// Wait for the next failure. Returns `None` once the gateway is gone.
    pub async fn next(&mut self) -> Option<PersistenceFailure> {
        self.rx.recv().await
    }
}

/// Writes tasks to a named document collection.
pub struct PersistenceGateway<C> {
    collection: Arc<C>,
    name: String,
    runtime: Handle,
    failures: mpsc::UnboundedSender<PersistenceFailure>,
}

impl<C: DocumentCollection> PersistenceGateway<C> {
    /// Create a gateway writing to `name`, spawning detached saves on `runtime`.
    pub fn new(collection: C, name: impl Into<String>, runtime: Handle) -> (Self, FailureFeed) {
        let (failures, rx) = mpsc::unbounded_channel();
        let gateway = Self {
            collection: Arc::new(collection),
            name: name.into(),
            runtime,
            failures,
        };
        (gateway, FailureFeed { rx })
    }

    /// Name of the target collection.
    #[must_use]
    pub fn collection_name(&self) -> &str {
        &self.name
    }

    /// Borrow the backing collection.
    #[must_use]
    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// Write `{title, date}` of the task and wait for the result. No retry.
    ///
    /// # Errors
    /// Returns [`PersistenceError::Collection`] when the write fails.
    pub async fn save(&self, task: &Task) -> Result<DocumentId, PersistenceError> {
        write_document(self.collection.as_ref(), &self.name, task).await
    }

    /// Start a save without waiting for it.
    ///
    /// A failure is logged and delivered to the [`FailureFeed`]. Concurrent
    /// detached saves are independent and unordered.
    pub fn save_detached(&self, task: Task) -> JoinHandle<()> {
        let collection = Arc::clone(&self.collection);
        let name = self.name.clone();
        let failures = self.failures.clone();
        self.runtime.spawn(async move {
            match write_document(collection.as_ref(), &name, &task).await {
                Ok(id) => debug!(task = %task.id, document = %id, "saved task"),
                Err(error) => {
                    warn!(task = %task.id, %error, "detached save failed");
                    let failure = PersistenceFailure {
                        task,
                        error,
                        occurred_at: OffsetDateTime::now_utc(),
                    };
                    if failures.send(failure).is_err() {
                        debug!("failure feed closed");
                    }
                }
            }
        })
    }
}

async fn write_document<C: DocumentCollection>(
    collection: &C,
    name: &str,
    task: &Task,
) -> Result<DocumentId, PersistenceError> {
    collection
        .add_document(name, task.to_document())
        .await
        .map_err(|err| PersistenceError::Collection {
            collection: name.to_owned(),
            source: err.into(),
        })
}
