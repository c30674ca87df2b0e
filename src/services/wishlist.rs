/// Wishlist store
///
/// Keeps a live, read-only view of one user's saved movies. The remote document store is
/// the only source of truth: `save` and `remove` write remotely and return, and the local
/// view changes only when the next snapshot arrives on the live subscription. Each
/// snapshot replaces the local entries wholesale.
///
/// Lifecycle: `Unbound` (no user) → `Bound` (subscribed, waiting) → `Live` (snapshots
/// flowing). Unbinding cancels the subscription and returns to `Unbound` with an empty
/// list and `loading` set.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::{
    db::{CancelHandle, CollectionPath, DocumentPath, DocumentStore, Snapshot},
    error::{AppError, AppResult},
    models::{Movie, SessionState, WishlistEntry, WishlistPhase, WishlistSnapshot},
    services::identity::IdentitySession,
};

/// Live subscription owned by the store for the bound user
struct Binding {
    uid: String,
    cancel: Option<CancelHandle>,
    forwarder: Option<JoinHandle<()>>,
}

impl Binding {
    fn teardown(self) {
        if let Some(cancel) = self.cancel {
            cancel.cancel();
        }
        if let Some(forwarder) = self.forwarder {
            forwarder.abort();
        }
    }
}

pub struct WishlistStore {
    store: Arc<dyn DocumentStore>,
    state: Arc<watch::Sender<WishlistSnapshot>>,
    binding: Mutex<Option<Binding>>,
    /// Bumped on every bind/unbind; snapshots from an older binding are dropped
    generation: Arc<AtomicU64>,
    /// Session followed by `attach`; writes are authorised against it
    session: OnceLock<watch::Receiver<SessionState>>,
}

impl WishlistStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(WishlistSnapshot::unbound());
        Self {
            store,
            state: Arc::new(state),
            binding: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
            session: OnceLock::new(),
        }
    }

    /// Entries in the order the last snapshot delivered them
    pub fn current_wishlist(&self) -> Vec<WishlistEntry> {
        self.state.borrow().entries.clone()
    }

    /// Checks the local snapshot only; may lag remote writes made elsewhere
    pub fn is_saved(&self, movie_id: u64) -> bool {
        self.state.borrow().contains(movie_id)
    }

    pub fn snapshot(&self) -> WishlistSnapshot {
        self.state.borrow().clone()
    }

    pub fn changes(&self) -> watch::Receiver<WishlistSnapshot> {
        self.state.subscribe()
    }

    /// User the store is currently bound to
    pub async fn bound_uid(&self) -> Option<String> {
        self.binding.lock().await.as_ref().map(|b| b.uid.clone())
    }

    /// Signed-in user for a write: the attached identity session's user, or the bound
    /// user when no session is attached
    async fn require_uid(&self, operation: &'static str) -> AppResult<String> {
        let session_uid = self
            .session
            .get()
            .map(|session| session.borrow().uid().map(str::to_string));
        let uid = match session_uid {
            Some(uid) => uid,
            None => self.bound_uid().await,
        };

        match uid {
            Some(uid) => Ok(uid),
            None => {
                tracing::warn!(operation, "User not authenticated");
                Err(AppError::Unauthenticated)
            }
        }
    }

    /// Writes `movie` with the current time to the user's collection.
    ///
    /// Local state is untouched; the change shows up with the next live snapshot.
    pub async fn save(&self, movie: &Movie) -> AppResult<()> {
        let uid = self.require_uid("save").await?;
        let entry = WishlistEntry::new(movie.clone());
        let path = DocumentPath::wishlist_movie(&uid, movie.id);
        let document = serde_json::to_value(&entry)?;

        self.store.set(&path, document).await.map_err(|e| {
            tracing::error!(error = %e, path = %path, "Error adding to wishlist");
            e
        })?;

        tracing::info!(uid = %uid, movie_id = movie.id, "Saved movie to wishlist");
        Ok(())
    }

    /// Deletes the movie's document from the user's collection
    pub async fn remove(&self, movie_id: u64) -> AppResult<()> {
        let uid = self.require_uid("remove").await?;
        let path = DocumentPath::wishlist_movie(&uid, movie_id);

        self.store.delete(&path).await.map_err(|e| {
            tracing::error!(error = %e, path = %path, "Error removing from wishlist");
            e
        })?;

        tracing::info!(uid = %uid, movie_id, "Removed movie from wishlist");
        Ok(())
    }

    /// Subscribes to `uid`'s collection, replacing any existing binding
    pub async fn bind(&self, uid: &str) {
        let mut binding = self.binding.lock().await;
        if binding.as_ref().map(|b| b.uid.as_str()) == Some(uid) {
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = binding.take() {
            previous.teardown();
            self.state.send_replace(WishlistSnapshot::unbound());
        }

        self.state.send_modify(|state| {
            state.phase = WishlistPhase::Bound;
            state.loading = true;
        });

        let collection = CollectionPath::wishlist(uid);
        let next = match self.store.subscribe(&collection).await {
            Ok(subscription) => {
                let (snapshots, cancel) = subscription.into_parts();
                let forwarder = tokio::spawn(forward_snapshots(
                    snapshots,
                    self.state.clone(),
                    self.generation.clone(),
                    generation,
                    uid.to_string(),
                ));
                tracing::info!(uid = %uid, store = self.store.name(), "Wishlist bound");
                Binding {
                    uid: uid.to_string(),
                    cancel: Some(cancel),
                    forwarder: Some(forwarder),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, uid = %uid, "Error fetching wishlist");
                self.state.send_modify(|state| state.loading = false);
                Binding {
                    uid: uid.to_string(),
                    cancel: None,
                    forwarder: None,
                }
            }
        };

        *binding = Some(next);
    }

    /// Tears down the subscription and resets to an empty, loading wishlist
    pub async fn unbind(&self) {
        let mut binding = self.binding.lock().await;
        let previous = binding.take();
        self.generation.fetch_add(1, Ordering::SeqCst);

        if let Some(previous) = previous {
            tracing::info!(uid = %previous.uid, "Wishlist unbound");
            previous.teardown();
        }

        self.state.send_replace(WishlistSnapshot::unbound());
    }

    /// Follows `identity`: binds when a user signs in, unbinds when the session ends
    pub fn attach(self: &Arc<Self>, identity: &IdentitySession) -> JoinHandle<()> {
        if self.session.set(identity.state_receiver()).is_err() {
            tracing::warn!("Wishlist already attached to a session");
        }

        let mut watch = identity.subscribe();
        let store = Arc::clone(self);

        tokio::spawn(async move {
            while let Some(session) = watch.next().await {
                match session.uid() {
                    Some(uid) => store.bind(uid).await,
                    None => store.unbind().await,
                }
            }
            tracing::debug!("Identity session closed, wishlist detached");
        })
    }
}

/// Decodes a snapshot; documents that are not wishlist entries are skipped
fn decode_entries(uid: &str, snapshot: Snapshot) -> Vec<WishlistEntry> {
    snapshot
        .into_iter()
        .filter_map(
            |(id, document)| match serde_json::from_value::<WishlistEntry>(document) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        uid = %uid,
                        document_id = %id,
                        "Skipping malformed wishlist document"
                    );
                    None
                }
            },
        )
        .collect()
}

async fn forward_snapshots(
    mut snapshots: mpsc::Receiver<AppResult<Snapshot>>,
    state: Arc<watch::Sender<WishlistSnapshot>>,
    generation: Arc<AtomicU64>,
    bound_generation: u64,
    uid: String,
) {
    while let Some(item) = snapshots.recv().await {
        match item {
            Ok(snapshot) => {
                let entries = decode_entries(&uid, snapshot);
                let count = entries.len();
                let applied = state.send_if_modified(|current| {
                    if generation.load(Ordering::SeqCst) != bound_generation {
                        return false;
                    }
                    current.entries = entries;
                    current.phase = WishlistPhase::Live;
                    current.loading = false;
                    true
                });
                if applied {
                    tracing::debug!(uid = %uid, entries = count, "Wishlist snapshot applied");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, uid = %uid, "Error fetching wishlist");
                state.send_if_modified(|current| {
                    if generation.load(Ordering::SeqCst) != bound_generation {
                        return false;
                    }
                    current.loading = false;
                    true
                });
            }
        }
    }

    tracing::debug!(uid = %uid, "Wishlist snapshot stream ended");
}
