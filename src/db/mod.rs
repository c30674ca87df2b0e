pub mod documents;
pub mod memory;
pub mod redis;

pub use documents::{CancelHandle, CollectionPath, DocumentPath, DocumentStore, Snapshot, Subscription};
pub use memory::MemoryDocumentStore;
pub use self::redis::{create_redis_client, RedisDocumentStore};
