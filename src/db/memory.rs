use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{
    db::documents::{CancelHandle, CollectionPath, DocumentPath, DocumentStore, Snapshot, Subscription},
    error::{AppError, AppResult},
};

const CHANGE_CHANNEL_CAPACITY: usize = 64;
const SNAPSHOT_BUFFER: usize = 16;

/// In-process document store with live snapshots
///
/// Documents keep insertion order within a collection; overwriting a document keeps its
/// position. Used by tests and by local runs without Redis. Failures can be injected to
/// exercise error paths.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

struct Inner {
    collections: Mutex<HashMap<CollectionPath, Vec<(String, serde_json::Value)>>>,
    changes: broadcast::Sender<CollectionPath>,
    fail_writes: AtomicBool,
    fail_subscribe: AtomicBool,
    operations: AtomicUsize,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(HashMap::new()),
                changes,
                fail_writes: AtomicBool::new(false),
                fail_subscribe: AtomicBool::new(false),
                operations: AtomicUsize::new(0),
            }),
        }
    }

    /// Makes every subsequent `set`/`delete` fail
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `subscribe` fail
    pub fn fail_subscribe(&self, fail: bool) {
        self.inner.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Number of `set`/`delete`/`subscribe` calls that reached the store
    pub fn operation_count(&self) -> usize {
        self.inner.operations.load(Ordering::SeqCst)
    }

    /// Current contents of `collection`
    pub fn snapshot(&self, collection: &CollectionPath) -> Snapshot {
        self.inner.read(collection)
    }

    /// Number of live subscribers across all collections
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }

    fn write_guard(&self, op: &str, path: &DocumentPath) -> AppResult<()> {
        self.inner.operations.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(format!(
                "injected {} failure for {}",
                op, path
            )));
        }
        Ok(())
    }
}

impl Inner {
    fn read(&self, collection: &CollectionPath) -> Snapshot {
        self.collections
            .lock()
            .map(|collections| collections.get(collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn lock(
        &self,
    ) -> AppResult<std::sync::MutexGuard<'_, HashMap<CollectionPath, Vec<(String, serde_json::Value)>>>>
    {
        self.collections
            .lock()
            .map_err(|e| AppError::Internal(format!("memory store poisoned: {}", e)))
    }

    fn announce(&self, collection: &CollectionPath) {
        // No subscribers is fine
        let _ = self.changes.send(collection.clone());
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set(&self, path: &DocumentPath, document: serde_json::Value) -> AppResult<()> {
        self.write_guard("set", path)?;
        {
            let mut collections = self.inner.lock()?;
            let documents = collections.entry(path.collection().clone()).or_default();
            match documents.iter_mut().find(|(id, _)| id == path.id()) {
                Some((_, existing)) => *existing = document,
                None => documents.push((path.id().to_string(), document)),
            }
        }
        self.inner.announce(path.collection());
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> AppResult<()> {
        self.write_guard("delete", path)?;
        {
            let mut collections = self.inner.lock()?;
            if let Some(documents) = collections.get_mut(path.collection()) {
                documents.retain(|(id, _)| id != path.id());
            }
        }
        self.inner.announce(path.collection());
        Ok(())
    }

    async fn subscribe(&self, collection: &CollectionPath) -> AppResult<Subscription> {
        self.inner.operations.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_subscribe.load(Ordering::SeqCst) {
            return Err(AppError::Internal(format!(
                "injected subscribe failure for {}",
                collection
            )));
        }

        // Subscribe to changes before reading so no write slips between the two
        let mut changes = self.inner.changes.subscribe();
        let initial = self.inner.read(collection);

        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let inner = self.inner.clone();
        let watched = collection.clone();
        tokio::spawn(async move {
            if tx.send(Ok(initial)).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    change = changes.recv() => match change {
                        Ok(changed) if changed != watched => continue,
                        Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            if tx.send(Ok(inner.read(&watched))).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }

            tracing::debug!(collection = %watched, "Memory subscription closed");
        });

        let cancel = CancelHandle::new(move || {
            let _ = cancel_tx.send(());
        });

        Ok(Subscription::new(rx, cancel))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
