//! JSON-file-backed record sets.
//!
//! Each record set is a single JSON object mapping identity id to a record,
//! kept human-inspectable on disk. All mutations for a set are serialized
//! through the write half of one `RwLock`: the closure mutates a scratch copy,
//! the scratch copy is persisted via a temp-file rename, and only then is it
//! committed to memory. A failed persist leaves both the file and the
//! in-memory map at the previous committed state.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode record set: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to persist record set to {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Durable map from identity id to a record of type `T`.
pub struct RecordStore<T> {
    path: PathBuf,
    records: RwLock<HashMap<String, T>>,
}

impl<T> RecordStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Load a record set from disk.
    ///
    /// A missing or unreadable backing file degrades to an empty set so the
    /// service can always start cold; the problem is logged, not raised.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, T>>(&bytes) {
                Ok(records) => records,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "record set is corrupt, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "record set not found, starting empty");
                HashMap::new()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "record set is unreadable, starting empty"
                );
                HashMap::new()
            }
        };

        Self {
            path,
            records: RwLock::new(records),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Clone the latest committed state of the whole set.
    pub async fn snapshot(&self) -> HashMap<String, T> {
        self.records.read().await.clone()
    }

    /// Apply a mutation as one atomic read-modify-write.
    ///
    /// The write lock is held across mutate-and-persist, so concurrent
    /// `update` calls can never overwrite each other's result.
    ///
    /// # Errors
    /// Returns `StoreError` if the mutated set cannot be persisted; the
    /// in-memory state is left unchanged in that case.
    pub async fn update<F, R>(&self, mutate: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut HashMap<String, T>) -> R,
    {
        let mut guard = self.records.write().await;
        let mut scratch = guard.clone();
        let outcome = mutate(&mut scratch);
        self.persist(&scratch).await?;
        *guard = scratch;
        Ok(outcome)
    }

    /// Like [`update`](Self::update), but a closure error rejects the whole
    /// mutation: nothing is persisted and nothing is committed.
    pub async fn try_update<F, R, E>(&self, mutate: F) -> Result<Result<R, E>, StoreError>
    where
        F: FnOnce(&mut HashMap<String, T>) -> Result<R, E>,
    {
        let mut guard = self.records.write().await;
        let mut scratch = guard.clone();
        match mutate(&mut scratch) {
            Ok(outcome) => {
                self.persist(&scratch).await?;
                *guard = scratch;
                Ok(Ok(outcome))
            }
            Err(err) => Ok(Err(err)),
        }
    }

    /// Write the set to a sibling temp file, then rename it over the backing
    /// file so readers of the file never observe a partial write.
    async fn persist(&self, records: &HashMap<String, T>) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|source| StoreError::Persist {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Persist {
                path: self.path.clone(),
                source,
            })?;

        Ok(())
    }
}
