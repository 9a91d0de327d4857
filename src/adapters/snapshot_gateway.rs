use crate::core::{PersistenceGateway, Snapshot, Storage};
use crate::utils::error::{LibraryError, Result};

pub const DEFAULT_SNAPSHOT_FILE: &str = "library.json";

/// 以 JSON 文件保存快照
#[derive(Debug, Clone)]
pub struct SnapshotGateway<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> SnapshotGateway<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(snapshot)?)
    }

    pub fn decode(data: &[u8]) -> Result<Snapshot> {
        serde_json::from_slice(data).map_err(|e| {
            LibraryError::corrupt(format!("snapshot is not valid JSON for this schema: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage> PersistenceGateway for SnapshotGateway<S> {
    async fn load(&self) -> Result<Option<Snapshot>> {
        tracing::debug!("Loading snapshot from {}", self.file_name);
        match self.storage.read_file(&self.file_name).await? {
            Some(data) => {
                let snapshot = Self::decode(&data)?;
                tracing::info!(
                    "📂 Loaded snapshot: {} book(s), {} patron(s)",
                    snapshot.books.len(),
                    snapshot.patrons.len()
                );
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let data = Self::encode(snapshot)?;
        self.storage.write_file(&self.file_name, &data).await?;
        tracing::info!("💾 Saved snapshot to {} ({} bytes)", self.file_name, data.len());
        Ok(())
    }
}
