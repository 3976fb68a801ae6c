//! # Lumen Static Export
//!
//! Compiles a generated component project — a tree of React/TSX-style source
//! files plus an optional dependency manifest — into fully self-contained
//! HTML documents. Each document renders its page in a plain browser with no
//! build step, no package installation and no server runtime: the page's
//! dependency closure is sanitized into one executable script, embedded
//! opaquely, transpiled in-browser and mounted behind a self-healing shim
//! runtime.
//!
//! ## Pipeline Invariants
//!
//! 1. **Pure normalization**: a normalized path is a function of the raw
//!    path alone; two files with equal normalized paths are the same file.
//! 2. **Terminating traversal**: dependency collection is guarded by a
//!    visited set and survives import cycles; closure order is sorted so
//!    bundles are byte-identical across runs for identical input.
//! 3. **Behavior-preserving sanitization**: only syntax with no runtime
//!    meaning in a shared scope is removed, and sanitizing twice equals
//!    sanitizing once.
//! 4. **No parser**: every structural edit is a conservative ordered regex;
//!    balanced-bracket extraction is the single place lexical state is
//!    tracked.
//! 5. **Invocation-local state**: compilation is synchronous, CPU-bound and
//!    shares nothing between calls — pages compile in parallel.
//! 6. **Independent artifacts**: every produced document carries its own
//!    shim registry and runtime; nothing is shared across documents.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod assemble;
pub mod cache;
pub mod collect;
pub mod compile;
pub mod config;
pub mod document;
pub mod extract;
pub mod paths;
pub mod sanitize;
pub mod shim;


pub use compile::{
    compile_project, route_to_output_path, write_documents, ExportRequest, ExportResult,
};
pub use shim::DEFAULT_SHIM_RETRY_LIMIT;

// ---------------------------------------------------------------------------
// Core data model
// ---------------------------------------------------------------------------

/// One source unit as provided by the upstream generator. Immutable once
/// read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
}

/// One produced page document, handed off to the deployment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDocument {
    pub route_path: String,
    pub html: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort an export. Unresolved imports and failed literal
/// extraction are not errors — they degrade to skip/fallback behavior.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no home page found: expected app/page.{{tsx,ts,jsx,js}} (or the src/ variant)")]
    MissingEntryPage,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
