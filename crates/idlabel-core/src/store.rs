//! Identifier-label store contract
//!
//! The engine only consumes [`LabelStore`]; persistence lives elsewhere.
//! [`MemoryLabelStore`] is the in-process implementation used by the CLI,
//! the demo and tests.

use crate::error::{StoreError, StoreResult};
use crate::export::{parse_import, ExportDocument};
use crate::identifier::Identifier;
use crate::mapping::{Label, LabelMap};
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;

/// Default capacity of the change notification channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Store of identifier → label pairs
///
/// Every mutating call must make the new mapping visible to
/// [`get_all`](LabelStore::get_all) and to subscribers before it returns.
#[async_trait]
pub trait LabelStore: Send + Sync {
    /// Current mapping (empty when nothing is set)
    async fn get_all(&self) -> StoreResult<LabelMap>;

    /// Set or replace one label
    async fn set(&self, id: Identifier, label: Label) -> StoreResult<()>;

    /// Remove one label
    async fn remove(&self, id: &Identifier) -> StoreResult<()>;

    /// Remove every label
    async fn clear(&self) -> StoreResult<()>;

    /// Receive the full new mapping on every change
    fn subscribe(&self) -> StoreResult<broadcast::Receiver<LabelMap>>;

    /// Serialize the mapping as an export envelope
    async fn export_all(&self) -> StoreResult<String>;

    /// Validate and atomically replace the mapping
    async fn import_all(&self, serialized: &str) -> StoreResult<()>;
}

/// In-memory [`LabelStore`]
#[derive(Debug)]
pub struct MemoryLabelStore {
    mapping: RwLock<LabelMap>,
    changes: broadcast::Sender<LabelMap>,
}

impl MemoryLabelStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_mapping(LabelMap::new())
    }

    /// Store seeded with `mapping`
    #[must_use]
    pub fn with_mapping(mapping: LabelMap) -> Self {
        let (changes, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            mapping: RwLock::new(mapping),
            changes,
        }
    }

    /// Snapshot without going through the async trait
    #[must_use]
    pub fn snapshot(&self) -> LabelMap {
        self.mapping.read().clone()
    }

    fn update(&self, f: impl FnOnce(&mut LabelMap)) {
        let mut guard = self.mapping.write();
        f(&mut guard);
        let snapshot = guard.clone();
        tracing::debug!(entries = snapshot.len(), "label mapping changed");
        // Sent under the write guard so notifications follow write order.
        // No receivers is fine: nobody is watching yet.
        let _ = self.changes.send(snapshot);
    }
}

impl Default for MemoryLabelStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LabelStore for MemoryLabelStore {
    async fn get_all(&self) -> StoreResult<LabelMap> {
        Ok(self.snapshot())
    }

    async fn set(&self, id: Identifier, label: Label) -> StoreResult<()> {
        self.update(|map| {
            map.insert(id, label);
        });
        Ok(())
    }

    async fn remove(&self, id: &Identifier) -> StoreResult<()> {
        self.update(|map| {
            map.remove(id);
        });
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.update(|map| *map = LabelMap::new());
        Ok(())
    }

    fn subscribe(&self) -> StoreResult<broadcast::Receiver<LabelMap>> {
        Ok(self.changes.subscribe())
    }

    async fn export_all(&self) -> StoreResult<String> {
        ExportDocument::new(self.snapshot())
            .to_json()
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn import_all(&self, serialized: &str) -> StoreResult<()> {
        let imported = parse_import(serialized)?;
        tracing::info!(entries = imported.len(), "imported label mapping");
        self.update(|map| *map = imported);
        Ok(())
    }
}
