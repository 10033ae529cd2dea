//! Path confinement — the sandbox boundary every other service builds on.
//!
//! A [`ConfinedRoot`] is an absolute directory designated as the sole
//! boundary within which a class of operations may resolve paths. Resolution
//! is lexical first (`.`/`..` collapsed, then a strict prefix check) and
//! then re-verified against the real filesystem: the deepest existing
//! ancestor of the candidate is canonicalized so a symlink inside the root
//! cannot smuggle an access outside it.

use std::path::{Component, Path, PathBuf};

use oriel_error::ServiceError;

/// An absolute directory path designated as a sandbox boundary.
#[derive(Debug, Clone)]
pub struct ConfinedRoot {
    root: PathBuf,
    label: &'static str,
}

impl ConfinedRoot {
    /// Open (creating if necessary) and canonicalize a root directory.
    ///
    /// The `label` names the root in error messages ("workspace",
    /// "documents") without leaking the host path to clients.
    pub fn open(label: &'static str, path: impl AsRef<Path>) -> std::io::Result<Self> {
        std::fs::create_dir_all(path.as_ref())?;
        let root = std::fs::canonicalize(path.as_ref())?;
        Ok(Self { root, label })
    }

    /// The canonical absolute path of the root itself.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// The root's label as used in error messages.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Resolve a client-supplied path against this root.
    ///
    /// Accepts only if the normalized absolute result has the root as a
    /// path prefix (the root itself is allowed, e.g. for listing). Rejects
    /// with [`ServiceError::PermissionDenied`] otherwise — this is checked
    /// on every access, not only at request entry. No side effects; this
    /// cannot fail for any other reason.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ServiceError> {
        let candidate = lexical_resolve(&self.root, Path::new(relative));

        if !candidate.starts_with(&self.root) {
            tracing::warn!(
                target: "oriel::audit",
                root = self.label,
                path = relative,
                "confinement rejection"
            );
            return Err(self.denied(relative));
        }

        // Lexical containment is not enough: a symlink inside the root can
        // point anywhere. Canonicalize the deepest existing ancestor of the
        // candidate and require it to still be under the root.
        if let Some(existing) = deepest_existing_ancestor(&candidate) {
            let real = std::fs::canonicalize(&existing)
                .map_err(|e| anyhow::anyhow!("cannot canonicalize '{relative}': {e}"))?;
            if !real.starts_with(&self.root) {
                tracing::warn!(
                    target: "oriel::audit",
                    root = self.label,
                    path = relative,
                    "confinement rejection (symlink)"
                );
                return Err(self.denied(relative));
            }
        }

        Ok(candidate)
    }

    fn denied(&self, relative: &str) -> ServiceError {
        ServiceError::PermissionDenied {
            path: relative.to_string(),
            root: self.label,
        }
    }
}

/// Join `relative` onto `root` and collapse `.`/`..` segments lexically.
///
/// An absolute client path re-anchors the result — the subsequent prefix
/// check decides whether it is still inside the root, mirroring ordinary
/// `resolve` semantics.
fn lexical_resolve(root: &Path, relative: &Path) -> PathBuf {
    let mut out = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                out = PathBuf::from(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

/// Walk up from `path` to the nearest component that exists on disk.
///
/// Returns `None` when nothing up to the filesystem root exists (the
/// candidate is then judged on lexical containment alone).
fn deepest_existing_ancestor(path: &Path) -> Option<PathBuf> {
    let mut probe = path.to_path_buf();
    loop {
        if probe.symlink_metadata().is_ok() {
            return Some(probe);
        }
        if !probe.pop() {
            return None;
        }
    }
}
