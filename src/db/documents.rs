/// Remote document store abstraction
///
/// Models a real-time document database: documents live in collections addressed by
/// slash-separated paths, and a subscriber receives the *full* contents of a collection
/// every time it changes. Consumers never merge incrementally; each snapshot replaces
/// the previous one.
use std::fmt::Display;

use tokio::sync::mpsc;

use crate::error::AppResult;

/// Full contents of a collection: `(document id, document body)` in delivery order
pub type Snapshot = Vec<(String, serde_json::Value)>;

/// Path of a collection, e.g. `wishlists/{uid}/movies`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// A user's saved-movie collection
    pub fn wishlist(uid: &str) -> Self {
        Self(format!("wishlists/{}/movies", uid))
    }

    pub fn document(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a single document, e.g. `wishlists/{uid}/movies/{movie_id}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    pub fn wishlist_movie(uid: &str, movie_id: u64) -> Self {
        CollectionPath::wishlist(uid).document(movie_id.to_string())
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// One-shot teardown callback for a live subscription
pub struct CancelHandle(Option<Box<dyn FnOnce() + Send + Sync>>);

impl CancelHandle {
    pub fn new(on_cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self(Some(Box::new(on_cancel)))
    }

    /// Runs the teardown callback. Consuming `self` makes a second call impossible.
    pub fn cancel(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(on_cancel) = self.0.take() {
            on_cancel();
        }
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.fire();
    }
}

/// Live subscription to a collection
///
/// Yields a full snapshot immediately and then on every change. An `Err` item reports
/// a failure on the live channel; the stream may continue afterwards.
pub struct Subscription {
    snapshots: mpsc::Receiver<AppResult<Snapshot>>,
    cancel: CancelHandle,
}

impl Subscription {
    pub fn new(snapshots: mpsc::Receiver<AppResult<Snapshot>>, cancel: CancelHandle) -> Self {
        Self { snapshots, cancel }
    }

    /// Next snapshot, or `None` once the store side has shut down
    pub async fn next(&mut self) -> Option<AppResult<Snapshot>> {
        self.snapshots.recv().await
    }

    /// Tears the subscription down
    pub fn cancel(self) {
        self.cancel.cancel();
    }

    /// Splits into the snapshot stream and its teardown handle so they can be owned
    /// by different tasks
    pub fn into_parts(self) -> (mpsc::Receiver<AppResult<Snapshot>>, CancelHandle) {
        (self.snapshots, self.cancel)
    }
}

/// Trait for real-time document stores
///
/// Writes are last-write-wins. Implementations announce every successful write to
/// live subscribers of the affected collection.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates or overwrites the document at `path`
    async fn set(&self, path: &DocumentPath, document: serde_json::Value) -> AppResult<()>;

    /// Deletes the document at `path`; deleting a missing document is not an error
    async fn delete(&self, path: &DocumentPath) -> AppResult<()>;

    /// Subscribes to full snapshots of `collection`
    async fn subscribe(&self, collection: &CollectionPath) -> AppResult<Subscription>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_handle() -> (CancelHandle, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handle = CancelHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (handle, count)
    }

    #[test]
    fn test_wishlist_paths() {
        let collection = CollectionPath::wishlist("user-1");
        assert_eq!(collection.to_string(), "wishlists/user-1/movies");

        let document = DocumentPath::wishlist_movie("user-1", 42);
        assert_eq!(document.to_string(), "wishlists/user-1/movies/42");
        assert_eq!(document.id(), "42");
        assert_eq!(document.collection(), &collection);
    }

    #[test]
    fn test_cancel_fires_exactly_once() {
        let (handle, count) = counting_handle();
        handle.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_fires_when_not_cancelled() {
        let (handle, count) = counting_handle();
        drop(handle);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscription_cancel_fires_once() {
        let (handle, count) = counting_handle();
        let (_tx, rx) = mpsc::channel(1);
        let subscription = Subscription::new(rx, handle);

        subscription.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscription_next_yields_sent_snapshots() {
        let (handle, _count) = counting_handle();
        let (tx, rx) = mpsc::channel(2);
        let mut subscription = Subscription::new(rx, handle);

        tx.send(Ok(vec![("1".to_string(), serde_json::json!({"id": 1}))]))
            .await
            .unwrap();
        drop(tx);

        let first = subscription.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert!(subscription.next().await.is_none());
    }
}
