use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::PersistedInbox;

/// SnapshotStore trait - abstraction for persisting the durable inbox subset
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot, `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<PersistedInbox>, StorageError>;

    async fn save(&self, snapshot: &PersistedInbox) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}
