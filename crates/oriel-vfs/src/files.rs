//! Confined file operations over the documents root.
//!
//! Structured read/write/create/delete/list used by the `file` message
//! family. Every operation confines its path first; a rejected path never
//! reaches the filesystem.

use oriel_error::ServiceError;

use crate::confine::ConfinedRoot;

/// One entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry name (no path components).
    pub name: String,
    /// File/directory discriminator.
    pub kind: EntryKind,
}

/// Whether a listing entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file (or anything that is not a directory).
    File,
    /// A directory.
    Directory,
}

/// Read/write/create/delete/list, scoped to a single confined root.
#[derive(Debug, Clone)]
pub struct FileService {
    root: ConfinedRoot,
}

impl FileService {
    /// Create a file service over the given root.
    pub fn new(root: ConfinedRoot) -> Self {
        Self { root }
    }

    /// The confined root this service operates on.
    pub fn root(&self) -> &ConfinedRoot {
        &self.root
    }

    /// Enumerate the immediate entries of a directory, sorted by name.
    ///
    /// An empty or `.` path lists the root. An empty directory yields an
    /// empty list, not an error.
    pub async fn list(&self, path: Option<&str>) -> Result<Vec<Entry>, ServiceError> {
        let relative = normalize_list_path(path);
        let abs = self.root.resolve(relative)?;

        let mut reader = tokio::fs::read_dir(&abs)
            .await
            .map_err(|e| map_io(relative, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| map_io(relative, e))?
        {
            let kind = match entry.file_type().await {
                Ok(ft) if ft.is_dir() => EntryKind::Directory,
                _ => EntryKind::File,
            };
            entries.push(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Read the full textual content of a file.
    pub async fn read(&self, path: &str) -> Result<String, ServiceError> {
        let abs = self.root.resolve(path)?;

        let meta = tokio::fs::metadata(&abs)
            .await
            .map_err(|e| map_io(path, e))?;
        if meta.is_dir() {
            return Err(ServiceError::IsADirectory { path: path.into() });
        }

        tokio::fs::read_to_string(&abs)
            .await
            .map_err(|e| map_io(path, e))
    }

    /// Replace a file's content, creating parent directories as needed.
    ///
    /// The replacement is atomic-enough that a concurrent reader never
    /// observes a partial write: content goes to a temp file in the target
    /// directory which is then renamed over the destination.
    pub async fn write(&self, path: &str, content: &str) -> Result<(), ServiceError> {
        let abs = self.root.resolve(path)?;

        if tokio::fs::metadata(&abs).await.is_ok_and(|m| m.is_dir()) {
            return Err(ServiceError::IsADirectory { path: path.into() });
        }

        let parent = abs
            .parent()
            .ok_or_else(|| anyhow::anyhow!("path '{path}' has no parent directory"))?
            .to_path_buf();
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| map_io(path, e))?;

        let content = content.to_owned();
        let target = abs.clone();
        let result = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            use std::io::Write;
            let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
            tmp.write_all(content.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| anyhow::anyhow!("write task failed: {e}"))?;

        result.map_err(|e| map_io(path, e))?;
        tracing::debug!(root = self.root.label(), path, "file written");
        Ok(())
    }

    /// Create a file with the given content.
    ///
    /// Same upsert semantics as [`FileService::write`]; kept as a distinct
    /// operation because the wire protocol keeps `create` and `write` as
    /// separate actions.
    pub async fn create(&self, path: &str, content: &str) -> Result<(), ServiceError> {
        self.write(path, content).await
    }

    /// Remove a file or, if the path is a directory, the directory and all
    /// its descendants. An absent path is reported as not found.
    pub async fn delete(&self, path: &str) -> Result<(), ServiceError> {
        let abs = self.root.resolve(path)?;

        let meta = tokio::fs::symlink_metadata(&abs)
            .await
            .map_err(|e| map_io(path, e))?;

        if meta.is_dir() {
            tokio::fs::remove_dir_all(&abs)
                .await
                .map_err(|e| map_io(path, e))?;
        } else {
            tokio::fs::remove_file(&abs)
                .await
                .map_err(|e| map_io(path, e))?;
        }
        tracing::debug!(root = self.root.label(), path, "file deleted");
        Ok(())
    }
}

fn normalize_list_path(path: Option<&str>) -> &str {
    match path {
        None | Some("") | Some(".") => "",
        Some(p) => p,
    }
}

/// Normalize OS error text into the service taxonomy, keeping the relative
/// path for diagnosis instead of leaking raw `ENOENT`-style messages.
pub(crate) fn map_io(path: &str, err: std::io::Error) -> ServiceError {
    use std::io::ErrorKind;
    match err.kind() {
        ErrorKind::NotFound => ServiceError::NotFound { path: path.into() },
        ErrorKind::NotADirectory => ServiceError::NotADirectory { path: path.into() },
        _ => ServiceError::Internal(anyhow::anyhow!("'{path}': {err}")),
    }
}

// Keep the helper reachable from shell.rs, which shares the taxonomy mapping.
pub(crate) use map_io as map_io_error;
