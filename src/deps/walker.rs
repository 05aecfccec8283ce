use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use super::{DependencySet, EdgeClassifier, EdgeKind, ImportEdge, Verdict};
use crate::golang::ImportParser;
use crate::index::ReverseIndex;
use crate::runtime::Runtime;
use crate::stdlib::StdlibSet;

/// Walks a `GOPATH`-style source tree and collects the external
/// dependencies of a target import path.
pub struct DependencyWalker<'a, R: Runtime, P: ImportParser> {
    runtime: &'a R,
    parser: &'a P,
    index: &'a ReverseIndex,
    stdlib: &'a StdlibSet,
    base: PathBuf,
}

struct WalkState<'a, 'w, R: Runtime, W: Write + ?Sized> {
    classifier: EdgeClassifier<'a, R>,
    dependencies: DependencySet,
    reported: HashSet<String>,
    out: &'w mut W,
}

impl<'a, R: Runtime, P: ImportParser> DependencyWalker<'a, R, P> {
    /// `base` is the source root; a directory `<base>/a/b` is import path `a/b`.
    pub fn new(
        runtime: &'a R,
        parser: &'a P,
        index: &'a ReverseIndex,
        stdlib: &'a StdlibSet,
        base: PathBuf,
    ) -> Self {
        Self {
            runtime,
            parser,
            index,
            stdlib,
            base,
        }
    }

    /// Visit every directory under `target` and return its dependencies.
    ///
    /// Imports that cannot be classified because `target` itself is not
    /// registered are written to `out` as `<path> (UNRESOLVED)`, once each.
    #[tracing::instrument(skip(self, out))]
    pub fn walk<W: Write + ?Sized>(&self, target: &str, out: &mut W) -> Result<DependencySet> {
        let target = target.trim_matches('/');
        if target.is_empty() {
            bail!("Empty import path");
        }

        let root = self.base.join(target);
        if !self.runtime.is_dir(&root) {
            bail!("Source directory {:?} for {} does not exist", root, target);
        }

        let classifier =
            EdgeClassifier::new(self.runtime, &self.base, target, self.stdlib, self.index);
        if !classifier.owner_registered() {
            warn!(
                "{} is not provided by any package; its imports are reported as unresolved",
                target
            );
        }

        let mut state = WalkState {
            classifier,
            dependencies: DependencySet::new(),
            reported: HashSet::new(),
            out,
        };
        self.visit(&mut state, &root)?;

        state.dependencies.finalize();
        Ok(state.dependencies)
    }

    fn visit<W: Write + ?Sized>(
        &self,
        state: &mut WalkState<'_, '_, R, W>,
        dir: &Path,
    ) -> Result<()> {
        if is_skipped_dir(dir) {
            debug!("Skipping directory {:?}", dir);
            return Ok(());
        }

        let entries = self
            .runtime
            .read_dir(dir)
            .with_context(|| format!("Failed to enumerate {:?}", dir))?;

        let mut subdirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            if self.runtime.is_dir(&entry) {
                if !self.runtime.is_symlink(&entry) {
                    subdirs.push(entry);
                }
            } else {
                files.push(entry);
            }
        }

        let source = self.import_path_of(dir);
        match self.parser.import_dir(dir, &files) {
            Ok(unit) => {
                debug!("Found package {} in {}", unit.name, source);
                let runtime_edges = unit.imports.into_iter().map(|target| (target, EdgeKind::Runtime));
                let test_edges = unit.test_imports.into_iter().map(|target| (target, EdgeKind::Test));
                for (target, kind) in runtime_edges.chain(test_edges) {
                    let edge = ImportEdge {
                        source: source.clone(),
                        target,
                        kind,
                    };
                    self.record(state, &edge)?;
                }
            }
            Err(e) => debug!("Not a buildable package, skipping {}: {}", source, e),
        }

        for subdir in subdirs {
            self.visit(state, &subdir)?;
        }
        Ok(())
    }

    fn record<W: Write + ?Sized>(
        &self,
        state: &mut WalkState<'_, '_, R, W>,
        edge: &ImportEdge,
    ) -> Result<()> {
        match state.classifier.classify(&edge.target) {
            Verdict::Accept => {
                if state.dependencies.add(self.index, &edge.target, edge.kind) {
                    debug!("{} -> {} ({:?})", edge.source, edge.target, edge.kind);
                }
            }
            Verdict::UnregisteredOwner => {
                if state.reported.insert(edge.target.clone()) {
                    writeln!(state.out, "{} (UNRESOLVED)", edge.target)?;
                }
            }
            verdict => {
                tracing::trace!(
                    "{} -> {} dropped: {:?}",
                    edge.source,
                    edge.target,
                    verdict
                );
            }
        }
        Ok(())
    }

    /// Import path of a directory under the source root.
    fn import_path_of(&self, dir: &Path) -> String {
        match pathdiff::diff_paths(dir, &self.base) {
            Some(relative) => relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/"),
            None => dir.display().to_string(),
        }
    }
}

/// Hidden directories and test fixtures are never part of the package.
fn is_skipped_dir(dir: &Path) -> bool {
    dir.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.starts_with('.') || name == "testdata"
        })
        .unwrap_or(false)
}
