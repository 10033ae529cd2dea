#![warn(missing_docs)]

//! # oriel-error
//!
//! Typed error types for the Oriel workbench backend.
//!
//! Provides [`ServiceError`] — the canonical error type shared by the
//! confined filesystem services, the build/run pipelines, and the session
//! dispatcher. Every handler converts its failures into this taxonomy
//! before they reach the wire, so clients see normalized messages instead
//! of raw OS error text.

use thiserror::Error;

/// Canonical error type for Oriel service operations.
///
/// All variants are `#[non_exhaustive]` to allow future additions without
/// breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// A client-supplied path resolves outside its confined root.
    ///
    /// Raised before any filesystem or process side effect occurs.
    #[error("permission denied: '{path}' escapes the {root} root")]
    PermissionDenied {
        /// The offending path as the client supplied it.
        path: String,
        /// Human-readable label of the confined root ("workspace" or "documents").
        root: &'static str,
    },

    /// The requested file or artifact does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was probed, relative to its root.
        path: String,
    },

    /// The action expected a file but the path names a directory.
    #[error("is a directory: {path}")]
    IsADirectory {
        /// The offending relative path.
        path: String,
    },

    /// The action expected a directory but the path names a file.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The offending relative path.
        path: String,
    },

    /// The compiler itself could not be started.
    ///
    /// Distinct from a compile diagnostic: the spawn step failed before the
    /// user's code was ever looked at (toolchain not installed, not
    /// executable, ...).
    #[error("toolchain unavailable: '{compiler}' could not be started: {message}")]
    ToolchainUnavailable {
        /// The compiler program that was invoked.
        compiler: String,
        /// The underlying spawn error text.
        message: String,
    },

    /// A subprocess (other than the compiler) could not be started.
    #[error("failed to launch '{program}': {message}")]
    LaunchFailure {
        /// The program that was invoked.
        program: String,
        /// The underlying spawn error text.
        message: String,
    },

    /// A supervised subprocess exceeded its execution deadline and was killed.
    #[error("execution timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// A malformed message, unknown message type, or unknown action.
    #[error("protocol error: {message}")]
    Protocol {
        /// What was wrong with the message.
        message: String,
    },

    /// An internal error (catch-all for unexpected failures).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Returns a static error code string for programmatic matching.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::IsADirectory { .. } => "IS_A_DIRECTORY",
            Self::NotADirectory { .. } => "NOT_A_DIRECTORY",
            Self::ToolchainUnavailable { .. } => "TOOLCHAIN_UNAVAILABLE",
            Self::LaunchFailure { .. } => "LAUNCH_FAILURE",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Protocol { .. } => "PROTOCOL_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Returns whether the operation that produced this error may succeed if retried.
    ///
    /// Filesystem and subprocess errors are never retried automatically by
    /// the service; this classification is advice for clients.
    pub fn retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::PermissionDenied { .. } => false,
            Self::NotFound { .. } => false,
            Self::IsADirectory { .. } => false,
            Self::NotADirectory { .. } => false,
            Self::ToolchainUnavailable { .. } => false,
            Self::LaunchFailure { .. } => false,
            Self::Protocol { .. } => false,
            Self::Internal(_) => false,
        }
    }
}

// Compile-time assertion: ServiceError must be Send + Sync + 'static
const _: fn() = || {
    fn assert_bounds<T: Send + Sync + 'static>() {}
    assert_bounds::<ServiceError>();
};
