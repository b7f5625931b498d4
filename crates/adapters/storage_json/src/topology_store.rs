//! JSON implementation of [`TopologyStore`].

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use roombridge_app::ports::TopologyStore;
use roombridge_domain::error::BridgeError;
use roombridge_domain::id::DeviceId;
use roombridge_domain::topology::{Map, TopologyRegistry};

use crate::error::StorageError;

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    device_id: &'a DeviceId,
    maps: &'a [Map],
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    device_id: DeviceId,
    maps: Vec<Map>,
}

/// Stores each device's topology in `<data_dir>/<device id>.json`.
#[derive(Debug, Clone)]
pub struct JsonTopologyStore {
    data_dir: PathBuf,
}

impl JsonTopologyStore {
    /// Create a store rooted at `data_dir`. The directory is created on the
    /// first save.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the snapshot of `device_id`.
    #[must_use]
    pub fn snapshot_path(&self, device_id: &DeviceId) -> PathBuf {
        self.data_dir.join(format!("{device_id}.json"))
    }

    async fn read(&self, device_id: &DeviceId) -> Result<Option<TopologyRegistry>, StorageError> {
        let path = self.snapshot_path(device_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        let document: serde_json::Value = serde_json::from_slice(&bytes)?;
        let version = document.get("version").and_then(serde_json::Value::as_u64);
        if version != Some(u64::from(SNAPSHOT_VERSION)) {
            tracing::warn!(
                path = %path.display(),
                found = ?version,
                expected = SNAPSHOT_VERSION,
                "discarding snapshot of another version"
            );
            return Ok(None);
        }
        let snapshot: Snapshot = serde_json::from_value(document)?;
        if &snapshot.device_id != device_id {
            tracing::warn!(
                path = %path.display(),
                found = %snapshot.device_id,
                "discarding snapshot of another device"
            );
            return Ok(None);
        }
        Ok(Some(TopologyRegistry::from_maps(snapshot.maps)))
    }

    async fn write(
        &self,
        device_id: &DeviceId,
        topology: &TopologyRegistry,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(&SnapshotRef {
            version: SNAPSHOT_VERSION,
            device_id,
            maps: topology.maps(),
        })?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|source| io_error(&self.data_dir, source))?;
        let path = self.snapshot_path(device_id);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|source| io_error(&staging, source))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|source| io_error(&path, source))?;
        tracing::debug!(path = %path.display(), "topology saved");
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl TopologyStore for JsonTopologyStore {
    fn load(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<TopologyRegistry>, BridgeError>> + Send {
        async move { Ok(self.read(device_id).await?) }
    }

    fn save(
        &self,
        device_id: &DeviceId,
        topology: &TopologyRegistry,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        async move { Ok(self.write(device_id, topology).await?) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roombridge_domain::id::{MapId, RegionId};
    use roombridge_domain::topology::{Region, RegionKind};

    fn topology() -> TopologyRegistry {
        let mut topology = TopologyRegistry::new();
        topology.upsert_map(MapId::new("m1"), "Home");
        topology
            .upsert_regions(
                &MapId::new("m1"),
                vec![
                    Region {
                        id: RegionId::new("4"),
                        kind: RegionKind::Room,
                    },
                    Region {
                        id: RegionId::new("7"),
                        kind: RegionKind::Zone,
                    },
                ],
            )
            .unwrap();
        topology
    }

    fn device_id() -> DeviceId {
        DeviceId::new("BLID1")
    }

    #[tokio::test]
    async fn should_return_none_when_no_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTopologyStore::new(dir.path());
        assert!(store.load(&device_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_reload_saved_topology() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTopologyStore::new(dir.path().join("nested"));

        store.save(&device_id(), &topology()).await.unwrap();
        let loaded = store.load(&device_id()).await.unwrap().unwrap();

        assert_eq!(loaded, topology());
    }

    #[tokio::test]
    async fn should_write_versioned_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTopologyStore::new(dir.path());
        store.save(&device_id(), &topology()).await.unwrap();

        let raw = std::fs::read(dir.path().join("BLID1.json")).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "version": 1,
                "device_id": "BLID1",
                "maps": [{
                    "id": "m1",
                    "name": "Home",
                    "regions": [{"id": "4", "type": "rid"}, {"id": "7", "type": "zid"}]
                }]
            })
        );
        assert!(!dir.path().join("BLID1.json.tmp").exists());
    }

    #[tokio::test]
    async fn should_discard_snapshot_of_other_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("BLID1.json"),
            br#"{"version": 0, "device_id": "BLID1", "maps": []}"#,
        )
        .unwrap();
        let store = JsonTopologyStore::new(dir.path());
        assert!(store.load(&device_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_discard_newer_snapshot_with_another_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("BLID1.json"),
            br#"{"version": 2, "device": {"id": "BLID1"}, "maps": {"m1": "Home"}}"#,
        )
        .unwrap();
        let store = JsonTopologyStore::new(dir.path());
        assert!(store.load(&device_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_discard_unversioned_map_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("BLID1.json"),
            br#"[{"Id": "m1", "Name": "Home", "Regions": {}}]"#,
        )
        .unwrap();
        let store = JsonTopologyStore::new(dir.path());
        assert!(store.load(&device_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_fail_on_current_version_with_broken_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("BLID1.json"),
            br#"{"version": 1, "device_id": "BLID1", "maps": "nope"}"#,
        )
        .unwrap();
        let store = JsonTopologyStore::new(dir.path());
        let result = store.load(&device_id()).await;
        assert!(matches!(result, Err(BridgeError::Storage(_))));
    }

    #[tokio::test]
    async fn should_discard_snapshot_of_other_device() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("BLID1.json"),
            br#"{"version": 1, "device_id": "BLID2", "maps": []}"#,
        )
        .unwrap();
        let store = JsonTopologyStore::new(dir.path());
        assert!(store.load(&device_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_fail_on_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BLID1.json"), b"not json").unwrap();
        let store = JsonTopologyStore::new(dir.path());
        let result = store.load(&device_id()).await;
        assert!(matches!(result, Err(BridgeError::Storage(_))));
    }

    #[tokio::test]
    async fn should_overwrite_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTopologyStore::new(dir.path());
        store.save(&device_id(), &TopologyRegistry::new()).await.unwrap();
        store.save(&device_id(), &topology()).await.unwrap();
        let loaded = store.load(&device_id()).await.unwrap().unwrap();
        assert_eq!(loaded.map_count(), 1);
    }
}
