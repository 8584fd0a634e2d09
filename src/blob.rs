//! Temporary object URLs for in-memory file contents.
//!
//! A `blob:` URL is only addressable while its [`ObjectUrl`] guard is alive;
//! dropping the guard revokes it, so every early return and error path
//! releases the resource.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Clone, Default)]
pub struct BlobRegistry {
    entries: Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_object_url(&self, bytes: Vec<u8>) -> ObjectUrl {
        let url = format!("blob:brightpath/{}", Uuid::new_v4());
        self.lock().insert(url.clone(), Arc::new(bytes));
        debug!("created object url {}", url);
        ObjectUrl {
            url,
            registry: self.clone(),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.lock().get(url).cloned()
    }

    /// Number of URLs that have been created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn revoke(&self, url: &str) {
        if self.lock().remove(url).is_some() {
            debug!("revoked object url {}", url);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Vec<u8>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns exactly one registered URL and revokes it on drop.
pub struct ObjectUrl {
    url: String,
    registry: BlobRegistry,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url).finish()
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

/// The save-as interaction: hands the contents behind an object URL to the user.
#[async_trait]
pub trait FileSaver: Send + Sync {
    async fn save_as(&self, blobs: &BlobRegistry, url: &ObjectUrl, file_name: &str)
        -> Result<PathBuf, AppError>;
}

/// Saves into a fixed directory, the terminal equivalent of a browser's download folder.
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileSaver for DirectorySaver {
    async fn save_as(
        &self,
        blobs: &BlobRegistry,
        url: &ObjectUrl,
        file_name: &str,
    ) -> Result<PathBuf, AppError> {
        let bytes = blobs.resolve(url.as_str()).ok_or_else(|| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} has been revoked", url.as_str()),
            ))
        })?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(sanitize_file_name(file_name));
        tokio::fs::write(&path, bytes.as_slice()).await?;
        Ok(path)
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "resource.pdf".to_string()
    } else {
        cleaned
    }
}
