//! A device filesystem that has been mounted into the local tree.
//!
//! Useful when the device's file-access service is exposed through a FUSE
//! mount. Remote absolute paths are resolved beneath the mount root.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Primitive, RemoteError, RemoteService, RemoteStream};

/// [`RemoteService`] backed by a mounted directory.
#[derive(Debug, Clone)]
pub struct MountedService {
    root: PathBuf,
}

impl MountedService {
    /// Creates a service rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the mount root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a remote path to a local one, refusing anything that would leave
    /// the mount root.
    fn resolve(&self, path: &str) -> Result<PathBuf, RemoteError> {
        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(RemoteError::PermissionDenied(path.to_string()));
                }
            }
        }
        Ok(resolved)
    }
}

fn map_io(path: &str, e: std::io::Error) -> RemoteError {
    match e.kind() {
        ErrorKind::NotFound => RemoteError::NotFound(path.to_string()),
        ErrorKind::PermissionDenied => RemoteError::PermissionDenied(path.to_string()),
        _ => RemoteError::Io(e),
    }
}

fn epoch_secs(time: std::io::Result<SystemTime>) -> Value {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(Value::Null, |d| json!(d.as_secs_f64()))
}

#[async_trait]
impl RemoteService for MountedService {
    fn advertised(&self) -> Vec<Primitive> {
        vec![
            Primitive::ListDir,
            Primitive::Open,
            Primitive::GetFileContents,
            Primitive::PullFile,
        ]
    }

    async fn exists(&self, path: &str) -> Result<bool, RemoteError> {
        let local = self.resolve(path)?;
        tokio::fs::try_exists(&local).await.map_err(|e| map_io(path, e))
    }

    async fn is_dir(&self, path: &str) -> Result<bool, RemoteError> {
        let local = self.resolve(path)?;
        match tokio::fs::metadata(&local).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io(path, e)),
        }
    }

    async fn stat(&self, path: &str) -> Result<Value, RemoteError> {
        let local = self.resolve(path)?;
        let meta = tokio::fs::metadata(&local)
            .await
            .map_err(|e| map_io(path, e))?;
        let ifmt = if meta.is_dir() { "S_IFDIR" } else { "S_IFREG" };
        Ok(json!({
            "st_size": meta.len(),
            "st_mtime": epoch_secs(meta.modified()),
            "st_birthtime": epoch_secs(meta.created()),
            "st_ifmt": ifmt,
        }))
    }

    async fn enumerate(&self, primitive: Primitive, path: &str) -> Result<Option<Value>, RemoteError> {
        if primitive != Primitive::ListDir {
            return Err(RemoteError::Unsupported(primitive));
        }
        let local = self.resolve(path)?;
        let mut dir = tokio::fs::read_dir(&local)
            .await
            .map_err(|e| map_io(path, e))?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| map_io(path, e))? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        // read_dir order is platform-dependent
        names.sort();
        Ok(Some(Value::from(names)))
    }

    async fn open(&self, primitive: Primitive, path: &str) -> Result<RemoteStream, RemoteError> {
        if primitive != Primitive::Open {
            return Err(RemoteError::Unsupported(primitive));
        }
        let local = self.resolve(path)?;
        let file = tokio::fs::File::open(&local)
            .await
            .map_err(|e| map_io(path, e))?;
        Ok(Box::new(file))
    }

    async fn read_all(&self, primitive: Primitive, path: &str) -> Result<Vec<u8>, RemoteError> {
        if primitive != Primitive::GetFileContents {
            return Err(RemoteError::Unsupported(primitive));
        }
        let local = self.resolve(path)?;
        tokio::fs::read(&local).await.map_err(|e| map_io(path, e))
    }

    async fn copy_out(
        &self,
        primitive: Primitive,
        path: &str,
        local: &Path,
    ) -> Result<(), RemoteError> {
        if primitive != Primitive::PullFile {
            return Err(RemoteError::Unsupported(primitive));
        }
        let source = self.resolve(path)?;
        tokio::fs::copy(&source, local)
            .await
            .map(|_| ())
            .map_err(|e| map_io(path, e))
    }
}
