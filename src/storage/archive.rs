use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore, PutPayload};
use tracing::{debug, info};

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::AppError;

const KEY_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M";

/// Storage key for one snapshot: `{symbol}/{YYYY-MM-DDTHH-MM}.json`.
///
/// Minute precision: two captures of the same symbol in one minute share a key.
pub fn snapshot_key(symbol: &str, captured_at: DateTime<Utc>) -> String {
    format!("{}/{}.json", symbol, captured_at.format(KEY_TIME_FORMAT))
}

/// Keeps whichever object was modified later; on a tie the current one stays.
fn newer_of(current: Option<ObjectMeta>, candidate: ObjectMeta) -> Option<ObjectMeta> {
    match current {
        Some(best) if candidate.last_modified <= best.last_modified => Some(best),
        _ => Some(candidate),
    }
}

/// Write-once archive of raw snapshots on top of an object store.
#[derive(Clone)]
pub struct SnapshotArchive {
    store: Arc<dyn ObjectStore>,
    location: String,
}

impl SnapshotArchive {
    pub fn new(store: Arc<dyn ObjectStore>, location: impl Into<String>) -> Self {
        Self {
            store,
            location: location.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, AppError> {
        match &config.backend {
            StorageBackend::S3 { bucket } => {
                let s3 = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()?;
                Ok(Self::new(Arc::new(s3), format!("s3://{}", bucket)))
            }
            StorageBackend::Local { root } => {
                let fs = LocalFileSystem::new_with_prefix(root)?;
                Ok(Self::new(Arc::new(fs), format!("file://{}", root.display())))
            }
            StorageBackend::Memory => Ok(Self::new(Arc::new(InMemory::new()), "memory://")),
        }
    }

    /// Human-readable root of the archive, e.g. `s3://stockdata08`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Stores `body` unmodified under [`snapshot_key`] and returns the key.
    pub async fn put_snapshot(
        &self,
        symbol: &str,
        captured_at: DateTime<Utc>,
        body: Vec<u8>,
    ) -> Result<String, AppError> {
        let key = snapshot_key(symbol, captured_at);
        let size = body.len();

        self.store
            .put(&Path::from(key.as_str()), PutPayload::from(body))
            .await?;

        info!(symbol, key = %key, bytes = size, "Saved to {}/{}", self.location, key);
        Ok(key)
    }

    /// Walks the (paginated) listing under `prefix`, keeping a running maximum
    /// of `last_modified`. Returns `None` when nothing is stored there.
    pub async fn latest_object(&self, prefix: Option<&str>) -> Result<Option<ObjectMeta>, AppError> {
        let prefix = prefix.map(Path::from);
        let mut listing = self.store.list(prefix.as_ref());

        let mut latest: Option<ObjectMeta> = None;
        let mut seen = 0usize;

        while let Some(meta) = listing.try_next().await? {
            seen += 1;
            latest = newer_of(latest, meta);
        }

        debug!(objects = seen, location = %self.location, "Listed archived snapshots");
        Ok(latest)
    }

    pub async fn read_object(&self, key: &Path) -> Result<Vec<u8>, AppError> {
        let bytes = self.store.get(key).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
