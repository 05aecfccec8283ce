//! Dependency discovery for a Go source tree.
//!
//! The walker visits every directory below a target import path, the
//! classifier drops imports that are not external dependencies, and the
//! aggregator resolves the rest against the reverse index.

mod aggregate;
mod classify;
mod walker;

pub use aggregate::{Dependency, DependencySet};
pub use classify::{EdgeClassifier, Verdict};
pub use walker::DependencyWalker;

/// Whether an import comes from the package itself or only from its tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Runtime,
    Test,
}

/// One import found while walking: `source` imports `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}
