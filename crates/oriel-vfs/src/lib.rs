#![warn(missing_docs)]

//! # oriel-vfs
//!
//! Confined virtual filesystem roots for the Oriel workbench backend.
//!
//! Two independent sandboxes are built on one primitive, [`ConfinedRoot`]:
//! every client-supplied path is resolved against a declared root and must
//! remain inside it after normalization — escape attempts fail with a
//! permission error before any filesystem access happens.
//!
//! - [`FileService`] exposes structured read/write/create/delete/list
//!   operations over the documents root.
//! - [`ShellService`] exposes a restricted set of directory-manipulation
//!   verbs over the workspace root, always answering with terminal-style
//!   text rather than structured data.

pub mod confine;
pub mod files;
pub mod shell;

pub use confine::ConfinedRoot;
pub use files::{Entry, EntryKind, FileService};
pub use shell::ShellService;
