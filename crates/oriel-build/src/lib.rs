#![warn(missing_docs)]

//! # oriel-build
//!
//! Native compile/run pipelines for the Oriel workbench backend.
//!
//! Given a bare source file name, the pipeline locates the authoritative
//! copy across the two confined roots (the documents copy wins — it is the
//! most recently edited), reconciles the workspace copy, invokes the native
//! compiler as a supervised subprocess, and on success can execute the
//! produced artifact as a second supervised subprocess.
//!
//! ## Supervision model
//!
//! - **Confined inputs**: only files resolving inside the confined roots
//!   can ever be compiled or executed
//! - **Bounded execution**: every subprocess has a deadline; past it the
//!   child is killed and a timeout is reported
//! - **Bounded capture**: stdout/stderr accumulate up to a per-stream cap,
//!   then truncate with a marker — output never grows unbounded
//! - **Kill on drop**: abandoned children do not outlive their request
//!
//! ## Deployment constraint
//!
//! Artifacts execute with the service's own privileges. The pipeline bounds
//! their run time and captured output but does not confine their syscalls,
//! network, or filesystem view — run the service itself inside a restricted
//! user or container when exposed to untrusted sources.

pub mod resolve;
pub mod service;
pub mod supervise;

pub use resolve::{SourceLocation, SourceOrigin};
pub use service::{BuildService, CompileResult, RunResult};

use std::time::Duration;

/// Configuration for the build and run pipelines.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// C compiler program.
    pub cc: String,
    /// C++ compiler program (used for `.cpp`/`.cxx`/`.cc` sources).
    pub cxx: String,
    /// Artifact subdirectory inside the workspace root (single bare name).
    pub artifact_dir: String,
    /// Deadline for a compiler invocation.
    pub compile_timeout: Duration,
    /// Deadline for running an artifact.
    pub run_timeout: Duration,
    /// Per-stream capture cap in bytes.
    pub max_output_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cc: "gcc".to_string(),
            cxx: "g++".to_string(),
            artifact_dir: "artifacts".to_string(),
            compile_timeout: Duration::from_secs(30),
            run_timeout: Duration::from_secs(10),
            max_output_size: 1024 * 1024, // 1 MB
        }
    }
}
