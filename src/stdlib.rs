//! The set of Go standard-library import paths.

use anyhow::{Context, Result};
use log::debug;
use std::collections::HashSet;

use crate::runtime::Runtime;

/// Import paths belonging to the Go standard distribution.
#[derive(Debug, Default, Clone)]
pub struct StdlibSet {
    packages: HashSet<String>,
}

impl StdlibSet {
    /// Ask the toolchain for the standard library; `go list std` expands
    /// the `std` pattern, which cannot be done without it.
    #[tracing::instrument(skip(runtime))]
    pub fn discover<R: Runtime>(runtime: &R, go: &str) -> Result<Self> {
        let output = runtime
            .run_command(go, &["list".to_string(), "std".to_string()])
            .context("Failed to list the Go standard library")?;
        let set = Self::from_listing(&output);
        debug!("Standard library has {} packages", set.len());
        Ok(set)
    }

    /// Parse newline-delimited import paths.
    pub fn from_listing(listing: &str) -> Self {
        listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn contains(&self, import_path: &str) -> bool {
        self.packages.contains(import_path)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StdlibSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().map(Into::into).collect(),
        }
    }
}
