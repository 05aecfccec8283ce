//! Reverse index of Go import-path prefixes to pkgsrc packages.
//!
//! The index is built once from a scan of the pkgsrc tree (see [`full_scan`])
//! and is read-only afterwards. Lookups resolve an import path to the package
//! registering the most specific prefix of it.

mod makefile;
mod scan;

use anyhow::Result;
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

pub use makefile::{AssignOp, Directive, Variables, parse_makefile};
pub use scan::{full_scan, package_prefixes};

/// Mapping from import-path prefix to pkgsrc package path (`category/name`).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReverseIndex {
    prefixes: BTreeMap<String, String>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `prefix` as provided by `package`.
    ///
    /// Returns `false` if the prefix is empty after normalization or was
    /// already registered. The first registration of a prefix wins.
    pub fn insert(&mut self, prefix: &str, package: &str) -> bool {
        let prefix = prefix.trim().trim_end_matches('/');
        if prefix.is_empty() {
            return false;
        }

        if let Some(existing) = self.prefixes.get(prefix) {
            if existing != package {
                warn!(
                    "Prefix {} is registered by both {} and {}, keeping {}",
                    prefix, existing, package, existing
                );
            }
            return false;
        }

        self.prefixes.insert(prefix.to_string(), package.to_string());
        true
    }

    /// Find the package whose registered prefix `p` is equal to `import_path`
    /// or is a `/`-delimited ancestor of it, preferring the longest `p`.
    pub fn prefix_match(&self, import_path: &str) -> Option<&str> {
        let mut candidate = import_path.trim_end_matches('/');
        loop {
            if let Some(package) = self.prefixes.get(candidate) {
                return Some(package.as_str());
            }
            match candidate.rfind('/') {
                Some(i) => candidate = &candidate[..i],
                None => return None,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Iterate over `(prefix, package)` pairs sorted by prefix.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(prefix, package)| (prefix.as_str(), package.as_str()))
    }

    /// Dump the index, one `prefix<TAB>package` pair per line, sorted by prefix.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        for (prefix, package) in self.iter() {
            writeln!(out, "{}\t{}", prefix, package)?;
        }
        Ok(())
    }

    /// Dump the index as a JSON object keyed by prefix.
    pub fn write_json<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
        Ok(())
    }
}

impl<P: AsRef<str>, K: AsRef<str>> FromIterator<(P, K)> for ReverseIndex {
    fn from_iter<I: IntoIterator<Item = (P, K)>>(iter: I) -> Self {
        let mut index = ReverseIndex::new();
        for (prefix, package) in iter {
            index.insert(prefix.as_ref(), package.as_ref());
        }
        index
    }
}
