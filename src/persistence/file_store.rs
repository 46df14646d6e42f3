//! JSON file store: one file per namespace in a storage directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::errors::ChatResult;
use crate::persistence::kv_store::{KeyValueStore, StoreFuture};

/// Blob store backed by `<dir>/<key>.json` files.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreFuture<'_, ChatResult<Option<String>>> {
        let path = self.path_for(key);
        Box::pin(async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err.into()),
            }
        })
    }

    fn set(&self, key: &str, value: String) -> StoreFuture<'_, ChatResult<()>> {
        let path = self.path_for(key);
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir).await?;

            // Write then rename so a crash never leaves a half-written blob.
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, value).await?;
            tokio::fs::rename(&tmp, &path).await?;
            debug!(path = %path.display(), "Blob written");
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> StoreFuture<'_, ChatResult<()>> {
        let path = self.path_for(key);
        Box::pin(async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            }
        })
    }
}
