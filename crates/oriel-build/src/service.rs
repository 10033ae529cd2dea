//! The build service: compile and run, anchored to the workspace root.

use std::path::{Path, PathBuf};
use std::time::Instant;

use oriel_error::ServiceError;
use oriel_vfs::ConfinedRoot;
use tokio::process::Command;

use crate::resolve::resolve_source;
use crate::supervise::{piped, run_supervised};
use crate::BuildConfig;

/// Outcome of one compile invocation.
///
/// Produced once per request and not retained — the only persisted artifact
/// is the compiled executable on disk.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// Whether the compiler exited with status 0.
    pub success: bool,
    /// Captured stdout on success, captured stderr (diagnostics) on failure.
    pub output: String,
    /// Artifact path relative to the workspace root, on success.
    pub artifact: Option<String>,
}

/// Outcome of one run invocation.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Whether the program exited with status 0.
    pub success: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error, or the launch failure text.
    pub stderr: String,
    /// Numeric exit code; `None` when the process never produced one
    /// (artifact missing, spawn failure, or killed by a signal).
    pub exit_code: Option<i32>,
}

/// Compile and run pipelines over the two confined roots.
#[derive(Debug, Clone)]
pub struct BuildService {
    workspace: ConfinedRoot,
    documents: ConfinedRoot,
    config: BuildConfig,
}

impl BuildService {
    /// Create a build service over the given roots.
    pub fn new(workspace: ConfinedRoot, documents: ConfinedRoot, config: BuildConfig) -> Self {
        Self {
            workspace,
            documents,
            config,
        }
    }

    /// Compile a source file located in one of the confined roots.
    ///
    /// A nonzero compiler exit is a normal `success:false` result carrying
    /// the diagnostics; a compiler that cannot be started at all is
    /// [`ServiceError::ToolchainUnavailable`], so callers can tell
    /// "toolchain not installed" apart from "code invalid".
    pub async fn compile(&self, file: &str) -> Result<CompileResult, ServiceError> {
        let started = Instant::now();
        let source = resolve_source(&self.documents, &self.workspace, file).await?;

        let artifact_name = artifact_name(file)?;
        let artifact_dir = self.workspace.path().join(&self.config.artifact_dir);
        tokio::fs::create_dir_all(&artifact_dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create artifact directory: {e}"))?;
        let artifact_path = artifact_dir.join(&artifact_name);

        let compiler = self.compiler_for(file);
        let mut command = Command::new(compiler);
        command
            .arg(&source.path)
            .arg("-o")
            .arg(&artifact_path)
            .arg("-Wall")
            .arg("-Wextra");

        let child = piped(&mut command).spawn().map_err(|e| {
            ServiceError::ToolchainUnavailable {
                compiler: compiler.to_string(),
                message: e.to_string(),
            }
        })?;

        let captured = run_supervised(
            child,
            self.config.compile_timeout,
            self.config.max_output_size,
        )
        .await?;

        let success = captured.success();
        tracing::info!(
            target: "oriel::audit",
            operation = "compile",
            file,
            origin = source.origin.as_str(),
            compiler,
            duration_ms = started.elapsed().as_millis() as u64,
            exit_code = captured.exit_code,
            outcome = if success { "success" } else { "failure" },
            "audit"
        );

        if success {
            Ok(CompileResult {
                success: true,
                output: captured.stdout,
                artifact: Some(format!("{}/{}", self.config.artifact_dir, artifact_name)),
            })
        } else {
            Ok(CompileResult {
                success: false,
                output: captured.stderr,
                artifact: None,
            })
        }
    }

    /// Run the most recently built artifact for a source file.
    ///
    /// The artifact is expected in the artifact directory under the source's
    /// base name, probed both bare and with the platform executable suffix.
    /// A missing artifact and a spawn failure are normal results with a null
    /// exit code — distinct from a program that ran and exited nonzero.
    pub async fn run(&self, file: &str) -> Result<RunResult, ServiceError> {
        let started = Instant::now();
        // Same resolution as compile: the source must still exist in a
        // confined root, and a newer documents copy is reconciled so a
        // follow-up compile sees it.
        let source = resolve_source(&self.documents, &self.workspace, file).await?;

        let artifact_dir = self.workspace.path().join(&self.config.artifact_dir);
        let stem = source_stem(file)?;

        let artifact = match find_artifact(&artifact_dir, &stem).await {
            Some(path) => path,
            None => {
                return Ok(RunResult {
                    success: false,
                    stdout: String::new(),
                    stderr: "Executable not found. Please compile first.".to_string(),
                    exit_code: None,
                });
            }
        };

        let mut command = Command::new(&artifact);
        command.current_dir(&artifact_dir);

        let child = match piped(&mut command).spawn() {
            Ok(child) => child,
            Err(e) => {
                let failure = ServiceError::LaunchFailure {
                    program: stem.clone(),
                    message: e.to_string(),
                };
                tracing::warn!(
                    target: "oriel::audit",
                    operation = "run",
                    file,
                    error = %failure,
                    "audit"
                );
                return Ok(RunResult {
                    success: false,
                    stdout: String::new(),
                    stderr: failure.to_string(),
                    exit_code: None,
                });
            }
        };

        let captured =
            run_supervised(child, self.config.run_timeout, self.config.max_output_size).await?;

        let success = captured.success();
        tracing::info!(
            target: "oriel::audit",
            operation = "run",
            file,
            origin = source.origin.as_str(),
            duration_ms = started.elapsed().as_millis() as u64,
            exit_code = captured.exit_code,
            outcome = if success { "success" } else { "failure" },
            "audit"
        );

        Ok(RunResult {
            success,
            stdout: captured.stdout,
            stderr: captured.stderr,
            exit_code: captured.exit_code,
        })
    }

    fn compiler_for(&self, file: &str) -> &str {
        match Path::new(file).extension().and_then(|e| e.to_str()) {
            Some("cpp") | Some("cxx") | Some("cc") => &self.config.cxx,
            _ => &self.config.cc,
        }
    }
}

/// Artifact file name for a source: base name without extension, plus the
/// platform executable suffix.
fn artifact_name(file: &str) -> Result<String, ServiceError> {
    let stem = source_stem(file)?;
    Ok(format!("{stem}{}", std::env::consts::EXE_SUFFIX))
}

fn source_stem(file: &str) -> Result<String, ServiceError> {
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ServiceError::Protocol {
            message: format!("'{file}' is not a valid source file name"),
        })
}

/// Probe the artifact directory for the bare name and the suffixed variant.
async fn find_artifact(artifact_dir: &Path, stem: &str) -> Option<PathBuf> {
    let bare = artifact_dir.join(stem);
    if tokio::fs::metadata(&bare).await.is_ok() {
        return Some(bare);
    }
    let suffixed = artifact_dir.join(format!("{stem}{}", std::env::consts::EXE_SUFFIX));
    if suffixed != bare && tokio::fs::metadata(&suffixed).await.is_ok() {
        return Some(suffixed);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_name_strips_extension() {
        assert_eq!(
            artifact_name("main.c").unwrap(),
            format!("main{}", std::env::consts::EXE_SUFFIX)
        );
    }

    #[test]
    fn artifact_name_uses_base_name_of_nested_sources() {
        assert_eq!(
            source_stem("proj/app.cpp").unwrap(),
            "app".to_string()
        );
    }

    #[test]
    fn empty_file_name_is_a_protocol_error() {
        let err = source_stem("").unwrap_err();
        assert!(matches!(err, ServiceError::Protocol { .. }));
    }
}
