use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;

use super::EdgeKind;
use crate::index::ReverseIndex;

/// A dependency resolved against the reverse index.
///
/// Packages order before unresolved markers so the report lists what is
/// already available first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dependency {
    /// A pkgsrc package path such as `www/go-net`.
    Package(String),
    /// No registered prefix covers this import path.
    Unresolved(String),
}

impl Dependency {
    pub fn resolve(index: &ReverseIndex, import_path: &str) -> Self {
        match index.prefix_match(import_path) {
            Some(package) => Dependency::Package(package.to_string()),
            None => Dependency::Unresolved(import_path.to_string()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Dependency::Package(_))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Package(package) => write!(f, "{}", package),
            Dependency::Unresolved(path) => write!(f, "{} (UNRESOLVED)", path),
        }
    }
}

/// Runtime and test-only dependencies of one target.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencySet {
    runtime: BTreeSet<Dependency>,
    test_extra: BTreeSet<Dependency>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `import_path` and record it. Returns `true` if it added a
    /// new entry.
    pub fn add(&mut self, index: &ReverseIndex, import_path: &str, kind: EdgeKind) -> bool {
        let dependency = Dependency::resolve(index, import_path);
        match kind {
            EdgeKind::Runtime => {
                self.test_extra.remove(&dependency);
                self.runtime.insert(dependency)
            }
            EdgeKind::Test => {
                if self.runtime.contains(&dependency) {
                    return false;
                }
                self.test_extra.insert(dependency)
            }
        }
    }

    /// Drop test-only entries that are also runtime dependencies.
    pub fn finalize(&mut self) {
        let runtime = &self.runtime;
        self.test_extra.retain(|d| !runtime.contains(d));
    }

    pub fn runtime(&self) -> &BTreeSet<Dependency> {
        &self.runtime
    }

    pub fn test_extra(&self) -> &BTreeSet<Dependency> {
        &self.test_extra
    }

    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty() && self.test_extra.is_empty()
    }

    /// Write the two-section report for `target`.
    pub fn write_report<W: Write + ?Sized>(&self, target: &str, out: &mut W) -> Result<()> {
        writeln!(out, "Depends of {}:", target)?;
        for dependency in &self.runtime {
            writeln!(out, "{}", dependency)?;
        }
        writeln!(out, "Extra Test Depends:")?;
        for dependency in &self.test_extra {
            writeln!(out, "{}", dependency)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ReverseIndex {
        [
            ("golang.org/x/net", "www/go-net"),
            ("github.com/stretchr/testify", "devel/go-testify"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_runtime_entries_deduplicate_by_package() {
        let index = index();
        let mut deps = DependencySet::new();

        assert!(deps.add(&index, "golang.org/x/net/html", EdgeKind::Runtime));
        assert!(!deps.add(&index, "golang.org/x/net/html/atom", EdgeKind::Runtime));

        assert_eq!(
            deps.runtime().iter().collect::<Vec<_>>(),
            vec![&Dependency::Package("www/go-net".into())]
        );
    }

    #[test]
    fn test_test_dependency_already_in_runtime_is_skipped() {
        let index = index();
        let mut deps = DependencySet::new();

        deps.add(&index, "golang.org/x/net/html", EdgeKind::Runtime);
        assert!(!deps.add(&index, "golang.org/x/net/html/atom", EdgeKind::Test));
        assert!(deps.add(&index, "github.com/stretchr/testify/assert", EdgeKind::Test));

        assert_eq!(
            deps.test_extra().iter().collect::<Vec<_>>(),
            vec![&Dependency::Package("devel/go-testify".into())]
        );
    }

    #[test]
    fn test_sets_do_not_depend_on_edge_order() {
        let index = index();

        let mut test_first = DependencySet::new();
        test_first.add(&index, "golang.org/x/net/context", EdgeKind::Test);
        test_first.add(&index, "golang.org/x/net/html", EdgeKind::Runtime);
        test_first.finalize();

        let mut runtime_first = DependencySet::new();
        runtime_first.add(&index, "golang.org/x/net/html", EdgeKind::Runtime);
        runtime_first.add(&index, "golang.org/x/net/context", EdgeKind::Test);
        runtime_first.finalize();

        assert_eq!(test_first, runtime_first);
        assert!(test_first.test_extra().is_empty());
    }

    #[test]
    fn test_unresolved_markers_stay_distinct() {
        let index = index();
        let mut deps = DependencySet::new();

        deps.add(&index, "github.com/unknown/a", EdgeKind::Runtime);
        deps.add(&index, "github.com/unknown/a/sub", EdgeKind::Runtime);
        deps.add(&index, "golang.org/x/net", EdgeKind::Runtime);
        deps.add(&index, "github.com/unknown/a", EdgeKind::Test);

        let runtime: Vec<_> = deps.runtime().iter().cloned().collect();
        assert_eq!(
            runtime,
            vec![
                Dependency::Package("www/go-net".into()),
                Dependency::Unresolved("github.com/unknown/a".into()),
                Dependency::Unresolved("github.com/unknown/a/sub".into()),
            ]
        );
        assert!(deps.test_extra().is_empty());
        assert!(!runtime[1].is_resolved());
    }

    #[test]
    fn test_write_report() {
        let index = index();
        let mut deps = DependencySet::new();
        deps.add(&index, "golang.org/x/net/html", EdgeKind::Runtime);
        deps.add(&index, "github.com/unknown/a", EdgeKind::Runtime);
        deps.add(&index, "github.com/stretchr/testify/require", EdgeKind::Test);
        deps.finalize();

        let mut out = Vec::new();
        deps.write_report("github.com/example/app", &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Depends of github.com/example/app:\n\
             www/go-net\n\
             github.com/unknown/a (UNRESOLVED)\n\
             Extra Test Depends:\n\
             devel/go-testify\n"
        );
    }

    #[test]
    fn test_write_report_empty() {
        let deps = DependencySet::new();
        assert!(deps.is_empty());

        let mut out = Vec::new();
        deps.write_report("x/y", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Depends of x/y:\nExtra Test Depends:\n"
        );
    }
}
