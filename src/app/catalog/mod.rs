// Clip catalog store - process-wide ordered list of saved clips

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::domain::errors::CatalogError;
use crate::domain::model::{CatalogState, ClipRecord, NewClip};
use crate::domain::rules::{MetadataRules, CATALOG_STORAGE_KEY};
use crate::ports::StoragePort;
use crate::utils::token::MonotonicClock;

/// Snapshot envelope written under [`CATALOG_STORAGE_KEY`]
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSnapshot {
    state: CatalogState,
    #[serde(default)]
    version: u32,
}

const SNAPSHOT_VERSION: u32 = 0;

/// The clip catalog.
///
/// Mutations are serialized by a single writer lock and written through: the
/// full snapshot is persisted first and the in-memory view only changes once
/// that write succeeded. Readers get the latest view through [`list`] or a
/// [`subscribe`] receiver.
///
/// [`list`]: ClipCatalogStore::list
/// [`subscribe`]: ClipCatalogStore::subscribe
pub struct ClipCatalogStore {
    storage: Arc<dyn StoragePort>,
    write_lock: Mutex<()>,
    current: watch::Sender<CatalogState>,
    ids: MonotonicClock,
}

impl ClipCatalogStore {
    /// Load the stored snapshot. A missing or unreadable snapshot starts an
    /// empty catalog.
    pub async fn open(storage: Arc<dyn StoragePort>) -> Self {
        let state = match storage.get_item(CATALOG_STORAGE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedSnapshot>(&raw) {
                Ok(snapshot) => {
                    if snapshot.version != SNAPSHOT_VERSION {
                        warn!(
                            "Catalog snapshot version {} is newer than supported {}, reading anyway",
                            snapshot.version, SNAPSHOT_VERSION
                        );
                    }
                    snapshot.state
                }
                Err(e) => {
                    warn!("Ignoring unreadable catalog snapshot: {}", e);
                    CatalogState::default()
                }
            },
            Ok(None) => CatalogState::default(),
            Err(e) => {
                warn!("Could not read catalog snapshot: {}", e);
                CatalogState::default()
            }
        };

        let floor = state
            .videos
            .iter()
            .filter_map(|record| record.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        info!("Loaded clip catalog with {} clips", state.videos.len());

        let (current, _) = watch::channel(state);
        Self {
            storage,
            write_lock: Mutex::new(()),
            current,
            ids: MonotonicClock::starting_after(floor),
        }
    }

    /// Append a clip under a fresh id and persist the catalog
    pub async fn add_video(&self, clip: NewClip) -> Result<ClipRecord, CatalogError> {
        MetadataRules::validate(&clip)?;

        let _writer = self.write_lock.lock().await;
        let mut next = self.current.borrow().clone();
        let record = loop {
            let id = self.ids.next().to_string();
            if !next.videos.iter().any(|existing| existing.id == id) {
                break clip.with_id(id);
            }
        };
        next.videos.push(record.clone());

        self.persist(&next).await?;
        self.current.send_replace(next);
        info!("Added clip {} ({})", record.id, record.name);
        Ok(record)
    }

    /// Remove the clip with `id`. An unknown id changes nothing and writes nothing.
    pub async fn remove_video(&self, id: &str) -> Result<(), CatalogError> {
        let _writer = self.write_lock.lock().await;
        let mut next = self.current.borrow().clone();
        let Some(index) = next.videos.iter().position(|record| record.id == id) else {
            debug!("Remove of unknown clip {} ignored", id);
            return Ok(());
        };
        next.videos.remove(index);

        self.persist(&next).await?;
        self.current.send_replace(next);
        info!("Removed clip {}", id);
        Ok(())
    }

    /// Clips in insertion order
    pub fn list(&self) -> Vec<ClipRecord> {
        self.current.borrow().videos.clone()
    }

    pub fn get(&self, id: &str) -> Option<ClipRecord> {
        self.current
            .borrow()
            .videos
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.current.borrow().videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive the catalog after every successful mutation
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.current.subscribe()
    }

    async fn persist(&self, state: &CatalogState) -> Result<(), CatalogError> {
        let snapshot = PersistedSnapshot {
            state: state.clone(),
            version: SNAPSHOT_VERSION,
        };
        let raw = serde_json::to_string(&snapshot).map_err(|e| CatalogError::PersistFailed {
            reason: e.to_string(),
        })?;
        self.storage
            .set_item(CATALOG_STORAGE_KEY, &raw)
            .await
            .map_err(|e| {
                warn!("Catalog snapshot not written: {}", e);
                CatalogError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{JsonFileStorage, MemoryStorage};

    fn clip(name: &str, start: f64, end: f64) -> NewClip {
        NewClip {
            uri: format!("/docs/{}.mp4", name),
            name: name.to_string(),
            description: String::new(),
            start,
            end,
        }
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let catalog = ClipCatalogStore::open(Arc::new(MemoryStorage::new())).await;
        let input = clip("Test", 3.0, 8.0);
        let record = catalog.add_video(input.clone()).await.unwrap();

        let listed = catalog.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], input.with_id(record.id.clone()));
        assert!(!record.id.is_empty());
    }

    #[tokio::test]
    async fn test_sequential_adds_get_distinct_ids() {
        let catalog = ClipCatalogStore::open(Arc::new(MemoryStorage::new())).await;
        let a = catalog.add_video(clip("a", 0.0, 5.0)).await.unwrap();
        let b = catalog.add_video(clip("b", 0.0, 5.0)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(
            catalog.list().iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[tokio::test]
    async fn test_remove_unknown_id_changes_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let catalog = ClipCatalogStore::open(storage.clone()).await;
        catalog.add_video(clip("a", 0.0, 5.0)).await.unwrap();
        let before = catalog.list();
        let writes = storage.write_count();

        catalog.remove_video("does-not-exist").await.unwrap();
        assert_eq!(catalog.list(), before);
        assert_eq!(storage.write_count(), writes);
    }

    #[tokio::test]
    async fn test_remove_existing() {
        let catalog = ClipCatalogStore::open(Arc::new(MemoryStorage::new())).await;
        let a = catalog.add_video(clip("a", 0.0, 5.0)).await.unwrap();
        let b = catalog.add_video(clip("b", 1.0, 6.0)).await.unwrap();
        catalog.remove_video(&a.id).await.unwrap();
        assert_eq!(catalog.list(), vec![b.clone()]);
        assert_eq!(catalog.get(&b.id), Some(b));
        assert_eq!(catalog.get(&a.id), None);
    }

    #[tokio::test]
    async fn test_persist_failure_leaves_catalog_unchanged() {
        let storage = Arc::new(MemoryStorage::new());
        let catalog = ClipCatalogStore::open(storage.clone()).await;
        let kept = catalog.add_video(clip("kept", 0.0, 5.0)).await.unwrap();

        storage.set_fail_writes(true);
        let result = catalog.add_video(clip("lost", 0.0, 5.0)).await;
        assert!(matches!(result, Err(CatalogError::PersistFailed { .. })));
        assert!(catalog.remove_video(&kept.id).await.is_err());
        assert_eq!(catalog.list(), vec![kept]);
    }

    #[tokio::test]
    async fn test_invalid_record_is_rejected() {
        let catalog = ClipCatalogStore::open(Arc::new(MemoryStorage::new())).await;
        let result = catalog.add_video(clip("backwards", 8.0, 3.0)).await;
        assert!(matches!(result, Err(CatalogError::InvalidRecord { .. })));
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let catalog = ClipCatalogStore::open(Arc::new(JsonFileStorage::new(&path))).await;
        for i in 0..5 {
            catalog
                .add_video(clip(&format!("clip {}", i), i as f64, i as f64 + 5.0))
                .await
                .unwrap();
        }
        let saved = catalog.list();

        let reloaded = ClipCatalogStore::open(Arc::new(JsonFileStorage::new(&path))).await;
        assert_eq!(reloaded.list(), saved);

        let next = reloaded.add_video(clip("after", 0.0, 1.0)).await.unwrap();
        assert!(saved.iter().all(|record| record.id != next.id));
    }

    #[tokio::test]
    async fn test_snapshot_layout() {
        let storage = Arc::new(MemoryStorage::new());
        let catalog = ClipCatalogStore::open(storage.clone()).await;
        catalog.add_video(clip("a", 0.0, 5.0)).await.unwrap();

        let raw = storage.get_item(CATALOG_STORAGE_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["videos"][0]["name"], "a");
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let storage = Arc::new(MemoryStorage::with_item(CATALOG_STORAGE_KEY, "{not json"));
        let catalog = ClipCatalogStore::open(storage).await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_maximal_stored_id_does_not_block_adds() {
        let snapshot = serde_json::json!({
            "state": { "videos": [{
                "id": u64::MAX.to_string(),
                "uri": "/docs/old.mp4",
                "name": "old",
                "description": "",
                "start": 0.0,
                "end": 5.0
            }]},
            "version": 0
        });
        let storage = Arc::new(MemoryStorage::with_item(
            CATALOG_STORAGE_KEY,
            &snapshot.to_string(),
        ));
        let catalog = ClipCatalogStore::open(storage).await;

        let a = catalog.add_video(clip("a", 0.0, 5.0)).await.unwrap();
        let b = catalog.add_video(clip("b", 0.0, 5.0)).await.unwrap();
        assert_ne!(a.id, u64::MAX.to_string());
        assert_ne!(a.id, b.id);
        assert_eq!(catalog.len(), 3);
    }

    #[tokio::test]
    async fn test_subscribers_see_mutations() {
        let catalog = ClipCatalogStore::open(Arc::new(MemoryStorage::new())).await;
        let mut rx = catalog.subscribe();
        catalog.add_video(clip("a", 0.0, 5.0)).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().videos.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let catalog = Arc::new(ClipCatalogStore::open(Arc::new(MemoryStorage::new())).await);
        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let catalog = Arc::clone(&catalog);
                tokio::spawn(async move {
                    catalog
                        .add_video(clip(&format!("c{}", i), 0.0, 1.0))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(catalog.len(), 20);
    }
}
