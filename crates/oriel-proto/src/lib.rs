#![warn(missing_docs)]

//! # oriel-proto
//!
//! Session wire protocol for the Oriel workbench backend.
//!
//! Every message on a session connection is a self-contained JSON object:
//! requests are tagged by `type` (`file`, `command`, `build`) and further by
//! `action`, and the dispatcher sends back exactly one response envelope per
//! request. The envelopes here are proper tagged unions — a message with a
//! field that does not belong to its declared action fails to parse at the
//! boundary instead of reaching a handler.
//!
//! Frames are length-delimited: 4-byte big-endian length prefix + JSON
//! payload. EOF between frames is a clean close.

pub mod frame;

pub use frame::{
    read_frame, read_frame_with_limit, write_frame, FrameError, DEFAULT_MAX_FRAME_SIZE,
};

use serde::{Deserialize, Serialize};

/// A request envelope, tagged by message `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Request {
    /// Confined filesystem operation on the documents root.
    File(FileRequest),
    /// Shell verb against the workspace root.
    Command(CommandRequest),
    /// Compile or run a source file.
    Build(BuildRequest),
}

/// A `file` request, tagged by `action`.
///
/// `write` and `create` are semantically identical upserts; both are kept
/// as distinct wire actions for client-protocol compatibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum FileRequest {
    /// Read the full textual content of a file.
    Read {
        /// Path relative to the documents root.
        path: String,
    },
    /// Replace a file's content, creating parent directories as needed.
    Write {
        /// Path relative to the documents root.
        path: String,
        /// New file content. Missing content means an empty file.
        #[serde(default)]
        content: String,
    },
    /// Create a file with the given content (same semantics as `write`).
    Create {
        /// Path relative to the documents root.
        path: String,
        /// Initial file content. Missing content means an empty file.
        #[serde(default)]
        content: String,
    },
    /// Remove a file, or a directory and all its descendants.
    Delete {
        /// Path relative to the documents root.
        path: String,
    },
    /// Enumerate the immediate entries of a directory.
    List {
        /// Path relative to the documents root; empty or `.` lists the root.
        #[serde(default)]
        path: Option<String>,
    },
}

/// A `command` request.
///
/// The action is deliberately an open string: an unknown verb is a normal,
/// displayable shell outcome ("command not found"), not a protocol failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandRequest {
    /// Shell verb (`ls`, `cd`, `mkdir`, `touch`, `rm`, `cat`, ...).
    pub action: String,
    /// Operand path relative to the workspace root; defaults to `.`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A `build` request, tagged by `action`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum BuildRequest {
    /// Compile a source file located in one of the confined roots.
    Compile {
        /// Bare file name (e.g. `main.c`) — never a path.
        file: String,
    },
    /// Run the most recently built artifact for a source file.
    Run {
        /// Bare file name the artifact was compiled from.
        file: String,
    },
}

/// A response envelope, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Response {
    /// Result of a `file` request.
    File(FileResponse),
    /// Terminal-style text produced by a `command` request.
    Output {
        /// Newline-joined text blob, exactly as a terminal would show it.
        output: String,
    },
    /// Result of a `build` request.
    Build(BuildResponse),
    /// A request-scoped failure. The session stays open.
    Error {
        /// Normalized, human-readable failure description.
        message: String,
    },
}

/// A `file` response, tagged by `action`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum FileResponse {
    /// Content of a read file.
    Read {
        /// The path that was read, as the client supplied it.
        path: String,
        /// Full textual content.
        content: String,
    },
    /// Acknowledgement of a completed write.
    Write {
        /// The path that was written.
        path: String,
        /// Always `true`; failures arrive as [`Response::Error`].
        success: bool,
    },
    /// Acknowledgement of a completed create.
    Create {
        /// The path that was created.
        path: String,
        /// Always `true`; failures arrive as [`Response::Error`].
        success: bool,
    },
    /// Acknowledgement of a completed delete.
    Delete {
        /// The path that was deleted.
        path: String,
        /// Always `true`; failures arrive as [`Response::Error`].
        success: bool,
    },
    /// Directory listing.
    List {
        /// The path that was listed (`.` for the root).
        path: String,
        /// Immediate entries, sorted by name.
        items: Vec<DirEntry>,
    },
}

/// One entry in a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (no path components).
    pub name: String,
    /// Whether the entry is a file or a directory.
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// File/directory discriminator for listing entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A regular file (or anything that is not a directory).
    File,
    /// A directory.
    Directory,
}

/// A `build` response, tagged by `action`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum BuildResponse {
    /// Outcome of a compile invocation.
    Compile {
        /// Whether the compiler exited with status 0.
        success: bool,
        /// Captured stdout on success, captured stderr (diagnostics) on failure.
        output: String,
        /// Path of the produced artifact, relative to the workspace root.
        /// Present only on success.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        executable: Option<String>,
    },
    /// Outcome of running a built artifact.
    Run {
        /// Whether the program exited with status 0.
        success: bool,
        /// Captured standard output.
        output: String,
        /// Captured standard error, or the launch failure text.
        error: String,
        /// Numeric exit code. `null` when the process never produced one
        /// (artifact missing or spawn failure), distinct from a nonzero exit.
        #[serde(rename = "exitCode")]
        exit_code: Option<i32>,
    },
}
