use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::{mpsc, oneshot};

use crate::db::documents::{
    CancelHandle, CollectionPath, DocumentPath, DocumentStore, Snapshot, Subscription,
};
use crate::error::AppError;
use crate::error::AppResult;

const SNAPSHOT_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Hash holding every document of a collection (field = document id)
    Collection(CollectionPath),
    /// Pub/sub channel announcing writes to a collection
    Changes(CollectionPath),
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::Collection(path) => write!(f, "{}", path),
            StoreKey::Changes(path) => write!(f, "{}:changed", path),
        }
    }
}

/// Creates a Redis client for the document store
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Document store backed by Redis hashes, with pub/sub for live snapshots
///
/// A collection is one hash; each document is a JSON string under its id. Every write
/// publishes the document id on the collection's change channel, and subscribers answer
/// each announcement by re-reading the whole hash.
#[derive(Clone)]
pub struct RedisDocumentStore {
    redis_client: Client,
    connection: ConnectionManager,
}

/// Write plus change announcement, applied as one MULTI/EXEC
///
/// `document` is the JSON to store, or `None` to delete.
fn write_pipeline(path: &DocumentPath, document: Option<String>) -> redis::Pipeline {
    let collection = StoreKey::Collection(path.collection().clone()).to_string();
    let mut pipe = redis::pipe();
    pipe.atomic();
    match document {
        Some(json) => pipe.hset(collection, path.id(), json).ignore(),
        None => pipe.hdel(collection, path.id()).ignore(),
    };
    pipe.publish(
        StoreKey::Changes(path.collection().clone()).to_string(),
        path.id(),
    )
    .ignore();
    pipe
}

impl RedisDocumentStore {
    /// Connects the shared command connection; pub/sub connections are opened per
    /// subscription
    pub async fn connect(redis_client: Client) -> AppResult<Self> {
        let connection = redis_client.get_connection_manager().await?;
        Ok(Self {
            redis_client,
            connection,
        })
    }

    /// Reads every document of a collection
    ///
    /// Values that are not valid JSON are skipped and logged.
    async fn read_collection(
        mut conn: ConnectionManager,
        collection: &CollectionPath,
    ) -> AppResult<Snapshot> {
        let fields: Vec<(String, String)> = conn
            .hgetall(StoreKey::Collection(collection.clone()).to_string())
            .await?;

        let snapshot = fields
            .into_iter()
            .filter_map(|(id, raw)| match serde_json::from_str(&raw) {
                Ok(document) => Some((id, document)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        collection = %collection,
                        document_id = %id,
                        "Skipping undecodable document"
                    );
                    None
                }
            })
            .collect();

        Ok(snapshot)
    }
}

#[async_trait::async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn set(&self, path: &DocumentPath, document: serde_json::Value) -> AppResult<()> {
        let json = serde_json::to_string(&document)?;
        let mut conn = self.connection.clone();
        write_pipeline(path, Some(json))
            .query_async::<()>(&mut conn)
            .await?;

        tracing::debug!(path = %path, "Document written");
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> AppResult<()> {
        let mut conn = self.connection.clone();
        write_pipeline(path, None)
            .query_async::<()>(&mut conn)
            .await?;

        tracing::debug!(path = %path, "Document deleted");
        Ok(())
    }

    async fn subscribe(&self, collection: &CollectionPath) -> AppResult<Subscription> {
        // Listen before the first read so a write between the two is not missed
        let mut pubsub = self.redis_client.get_async_pubsub().await?;
        pubsub
            .subscribe(StoreKey::Changes(collection.clone()).to_string())
            .await?;

        let initial = Self::read_collection(self.connection.clone(), collection).await?;

        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        tx.send(Ok(initial))
            .await
            .map_err(|e| AppError::Internal(format!("snapshot channel closed: {}", e)))?;

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let conn = self.connection.clone();
        let watched = collection.clone();

        tokio::spawn(async move {
            tracing::info!(collection = %watched, "Live subscription started");
            let mut messages = Box::pin(pubsub.into_on_message());

            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    message = messages.next() => {
                        let item = match message {
                            Some(_) => Self::read_collection(conn.clone(), &watched).await,
                            None => {
                                let _ = tx
                                    .send(Err(AppError::ExternalApi(
                                        "Redis pub/sub connection closed".to_string(),
                                    )))
                                    .await;
                                break;
                            }
                        };

                        if tx.send(item).await.is_err() {
                            break;
                        }
                    }
                }
            }

            tracing::info!(collection = %watched, "Live subscription stopped");
        });

        let cancel = CancelHandle::new(move || {
            let _ = cancel_tx.send(());
        });

        Ok(Subscription::new(rx, cancel))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
