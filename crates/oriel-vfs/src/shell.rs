//! Shell-flavoured operations over the workspace root.
//!
//! The contract is "terminal output", not a data API: every verb answers
//! with a single text blob, and an unknown verb is a normal, displayable
//! outcome (`frobnicate: command not found`) rather than a protocol error.
//! The server holds no current directory — the client prefixes each
//! operand itself, so `cd` never mutates server-side state.

use oriel_error::ServiceError;

use crate::confine::ConfinedRoot;
use crate::files::map_io_error;

/// Restricted directory-manipulation verbs, scoped to a single confined root.
#[derive(Debug, Clone)]
pub struct ShellService {
    root: ConfinedRoot,
}

impl ShellService {
    /// Create a shell service over the given root.
    pub fn new(root: ConfinedRoot) -> Self {
        Self { root }
    }

    /// The confined root this service operates on.
    pub fn root(&self) -> &ConfinedRoot {
        &self.root
    }

    /// Execute one shell verb and render its terminal output.
    ///
    /// This never fails: failures are part of the output text, exactly as a
    /// terminal would display them.
    pub async fn handle(&self, action: &str, path: Option<&str>) -> String {
        let path = path.unwrap_or(".");
        match action {
            "ls" => self.ls(path).await,
            "cd" => "cd: Directory change handled by client\n".to_string(),
            "mkdir" => self.mkdir(path).await,
            "touch" => self.touch(path).await,
            "rm" => self.rm(path).await,
            "cat" => self.cat(path).await,
            other => format!("{other}: command not found\n"),
        }
    }

    async fn ls(&self, path: &str) -> String {
        let abs = match self.root.resolve(path) {
            Ok(abs) => abs,
            Err(_) => return "Permission denied\n".to_string(),
        };

        let mut reader = match tokio::fs::read_dir(&abs).await {
            Ok(reader) => reader,
            Err(e) => return verb_error("ls", path, e),
        };

        let mut names = Vec::new();
        loop {
            match reader.next_entry().await {
                Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
                Ok(None) => break,
                Err(e) => return verb_error("ls", path, e),
            }
        }
        names.sort();
        format!("{}\n", names.join("\n"))
    }

    async fn mkdir(&self, path: &str) -> String {
        let abs = match self.root.resolve(path) {
            Ok(abs) => abs,
            Err(_) => return "Permission denied\n".to_string(),
        };
        match tokio::fs::create_dir_all(&abs).await {
            Ok(()) => String::new(),
            Err(e) => verb_error("mkdir", path, e),
        }
    }

    /// Upserts an empty file (replaces existing content, like the rest of
    /// the protocol's write verbs).
    async fn touch(&self, path: &str) -> String {
        let abs = match self.root.resolve(path) {
            Ok(abs) => abs,
            Err(_) => return "Permission denied\n".to_string(),
        };
        match tokio::fs::write(&abs, b"").await {
            Ok(()) => String::new(),
            Err(e) => verb_error("touch", path, e),
        }
    }

    /// Forced removal: an absent target is silent success, a directory is
    /// removed with all its descendants.
    async fn rm(&self, path: &str) -> String {
        let abs = match self.root.resolve(path) {
            Ok(abs) => abs,
            Err(_) => return "Permission denied\n".to_string(),
        };

        let meta = match tokio::fs::symlink_metadata(&abs).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return String::new(),
            Err(e) => return verb_error("rm", path, e),
        };

        let result = if meta.is_dir() {
            tokio::fs::remove_dir_all(&abs).await
        } else {
            tokio::fs::remove_file(&abs).await
        };
        match result {
            Ok(()) => String::new(),
            Err(e) => verb_error("rm", path, e),
        }
    }

    async fn cat(&self, path: &str) -> String {
        let abs = match self.root.resolve(path) {
            Ok(abs) => abs,
            Err(_) => return "Permission denied\n".to_string(),
        };

        match tokio::fs::metadata(&abs).await {
            Ok(meta) if meta.is_dir() => {
                return format!(
                    "cat: {}\n",
                    ServiceError::IsADirectory { path: path.into() }
                );
            }
            Ok(_) => {}
            Err(e) => return verb_error("cat", path, e),
        }

        match tokio::fs::read_to_string(&abs).await {
            Ok(content) => content,
            Err(e) => verb_error("cat", path, e),
        }
    }
}

/// Shell-style error line: the verb, then the normalized failure text.
fn verb_error(verb: &str, path: &str, err: std::io::Error) -> String {
    format!("{verb}: {}\n", map_io_error(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (tempfile::TempDir, ShellService) {
        let dir = tempfile::tempdir().unwrap();
        let root = ConfinedRoot::open("workspace", dir.path()).unwrap();
        (dir, ShellService::new(root))
    }

    #[tokio::test]
    async fn unknown_verb_is_command_not_found_output() {
        let (_dir, sh) = service();
        let out = sh.handle("frobnicate", None).await;
        assert_eq!(out, "frobnicate: command not found\n");
    }

    #[tokio::test]
    async fn cd_is_a_server_side_noop() {
        let (_dir, sh) = service();
        let out = sh.handle("cd", Some("somewhere/else")).await;
        assert_eq!(out, "cd: Directory change handled by client\n");
        // Nothing was created — the server tracks no working directory.
        assert!(!sh.root().path().join("somewhere").exists());
    }

    #[tokio::test]
    async fn ls_lists_names_newline_joined() {
        let (_dir, sh) = service();
        sh.handle("mkdir", Some("src")).await;
        sh.handle("touch", Some("main.c")).await;

        let out = sh.handle("ls", None).await;
        assert_eq!(out, "main.c\nsrc\n");
    }

    #[tokio::test]
    async fn ls_on_missing_directory_reports_shell_style_error() {
        let (_dir, sh) = service();
        let out = sh.handle("ls", Some("nope")).await;
        assert_eq!(out, "ls: not found: nope\n");
    }

    #[tokio::test]
    async fn mkdir_creates_nested_directories_silently() {
        let (_dir, sh) = service();
        let out = sh.handle("mkdir", Some("a/b/c")).await;
        assert_eq!(out, "");
        assert!(sh.root().path().join("a/b/c").is_dir());
    }

    #[tokio::test]
    async fn touch_creates_and_truncates() {
        let (_dir, sh) = service();
        assert_eq!(sh.handle("touch", Some("f.txt")).await, "");
        std::fs::write(sh.root().path().join("f.txt"), "content").unwrap();
        assert_eq!(sh.handle("touch", Some("f.txt")).await, "");
        assert_eq!(sh.handle("cat", Some("f.txt")).await, "");
    }

    #[tokio::test]
    async fn rm_is_forced_and_recursive() {
        let (_dir, sh) = service();
        // Absent target: silent success
        assert_eq!(sh.handle("rm", Some("ghost")).await, "");

        sh.handle("mkdir", Some("tree/leaf")).await;
        sh.handle("touch", Some("tree/leaf/f.txt")).await;
        assert_eq!(sh.handle("rm", Some("tree")).await, "");
        assert!(!sh.root().path().join("tree").exists());
    }

    #[tokio::test]
    async fn cat_prints_file_content_verbatim() {
        let (_dir, sh) = service();
        std::fs::write(sh.root().path().join("hello.c"), "int main(){return 0;}\n").unwrap();
        let out = sh.handle("cat", Some("hello.c")).await;
        assert_eq!(out, "int main(){return 0;}\n");
    }

    #[tokio::test]
    async fn cat_on_directory_is_an_error_line() {
        let (_dir, sh) = service();
        sh.handle("mkdir", Some("d")).await;
        let out = sh.handle("cat", Some("d")).await;
        assert_eq!(out, "cat: is a directory: d\n");
    }

    #[tokio::test]
    async fn every_verb_renders_permission_denied_for_escapes() {
        let (_dir, sh) = service();
        for verb in ["ls", "mkdir", "touch", "rm", "cat"] {
            let out = sh.handle(verb, Some("../escape")).await;
            assert_eq!(out, "Permission denied\n", "verb: {verb}");
        }
        assert!(!sh.root().path().parent().unwrap().join("escape").exists());
    }
}
