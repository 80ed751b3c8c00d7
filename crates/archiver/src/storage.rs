//! Object storage the chunks are written to
//!
//! Remote object stores are provided by the surrounding process; this module
//! ships a local filesystem backend and an in-memory one.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use pitr_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Destination of uploaded chunks
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `name`, replacing any previous object
    async fn save(&self, name: &str, data: Bytes) -> Result<()>;

    /// Remove `name`; removing a missing object succeeds
    async fn delete(&self, name: &str) -> Result<()>;

    /// Whether `name` exists
    async fn exists(&self, name: &str) -> Result<bool>;
}

/// Storage rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        if name.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(Error::configuration(format!("invalid object name '{name}'")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn save(&self, name: &str, data: Bytes) -> Result<()> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::storage(parent, "create directory", e))?;
        }

        // write aside, then rename so readers never see a partial object
        let tmp = path.with_file_name(format!(".{}.tmp", Uuid::new_v4()));
        if let Err(e) = write_synced(&tmp, &data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(Error::storage(&path, "rename", e));
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(&path, "delete", e)),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.resolve(name)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| Error::storage(&path, "stat", e))
    }
}

/// Write `data` to a new file at `path` and flush it to disk
async fn write_synced(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| Error::storage(path, "create temporary file", e))?;
    file.write_all(data)
        .await
        .map_err(|e| Error::storage(path, "write", e))?;
    file.sync_all()
        .await
        .map_err(|e| Error::storage(path, "sync", e))
}

/// Storage kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: DashMap<String, Bytes>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of `name`
    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.objects.get(name).map(|v| v.value().clone())
    }

    /// Sorted object names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save(&self, name: &str, data: Bytes) -> Result<()> {
        self.objects.insert(name.to_string(), data);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.objects.remove(name);
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.objects.contains_key(name))
    }
}
