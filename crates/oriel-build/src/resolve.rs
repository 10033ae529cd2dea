//! Source resolution and reconciliation across the two confined roots.
//!
//! The documents root is where the editor apps save, so a copy there is
//! considered the most recently edited and takes precedence. Compilation
//! is always anchored to the workspace root so the run step can find the
//! produced artifact deterministically — when the documents copy wins, its
//! bytes are copied onto the same-named workspace file first.

use std::path::PathBuf;

use oriel_error::ServiceError;
use oriel_vfs::ConfinedRoot;

/// Which root held the authoritative copy of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    /// The documents root (user-saved copy, takes precedence).
    Documents,
    /// The workspace root (directly-placed copy).
    Workspace,
}

impl SourceOrigin {
    /// Label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::Workspace => "workspace",
        }
    }
}

/// The outcome of resolution: where the file was found and the absolute
/// path compilation should target.
#[derive(Debug, Clone)]
pub struct SourceLocation {
    /// Which root held the authoritative copy.
    pub origin: SourceOrigin,
    /// Absolute path to hand to the compiler. Normally the workspace copy;
    /// falls back to the documents copy if reconciliation failed.
    pub path: PathBuf,
}

/// Resolve a bare file name against both roots and reconcile the workspace
/// copy from the documents copy when the latter wins.
///
/// The name is confined against each root before any probe — a name that
/// escapes (e.g. `../x.c`) is a permission error, never a lookup.
///
/// A failed reconciliation copy is logged and compilation proceeds against
/// the original documents path as a degraded fallback: the original content
/// is still compilable in place, so a copy failure must not abort the build.
pub async fn resolve_source(
    documents: &ConfinedRoot,
    workspace: &ConfinedRoot,
    file: &str,
) -> Result<SourceLocation, ServiceError> {
    let documents_path = documents.resolve(file)?;
    let workspace_path = workspace.resolve(file)?;

    if path_exists(&documents_path).await {
        tracing::debug!(file, "source found in documents root");
        let path = reconcile(&documents_path, &workspace_path, file).await;
        return Ok(SourceLocation {
            origin: SourceOrigin::Documents,
            path,
        });
    }

    if path_exists(&workspace_path).await {
        tracing::debug!(file, "source found in workspace root");
        return Ok(SourceLocation {
            origin: SourceOrigin::Workspace,
            path: workspace_path,
        });
    }

    Err(ServiceError::NotFound { path: file.into() })
}

/// Copy the documents bytes onto the same-named workspace file (upsert).
///
/// Returns the path compilation should use: the workspace copy on success,
/// the original documents path when the copy failed.
async fn reconcile(
    documents_path: &std::path::Path,
    workspace_path: &std::path::Path,
    file: &str,
) -> PathBuf {
    let copy = async {
        if let Some(parent) = workspace_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = tokio::fs::read(documents_path).await?;
        tokio::fs::write(workspace_path, &bytes).await?;
        Ok::<_, std::io::Error>(())
    };

    match copy.await {
        Ok(()) => {
            tracing::debug!(file, "reconciled workspace copy from documents");
            workspace_path.to_path_buf()
        }
        Err(e) => {
            tracing::warn!(
                file,
                error = %e,
                "failed to reconcile workspace copy, compiling documents copy in place"
            );
            documents_path.to_path_buf()
        }
    }
}

async fn path_exists(path: &std::path::Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}
