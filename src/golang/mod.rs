//! Go source knowledge: which files of a directory are built for the
//! configured platform and which packages they import.
//!
//! # Structure
//!
//! - `context` - Target platform and satisfied build tags
//! - `constraint` - `//go:build` and `// +build` evaluation
//! - `scanner` - Package clause and import declaration lexer

mod constraint;
mod context;
mod scanner;

use log::debug;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::runtime::Runtime;

pub use constraint::{ConstraintError, Expr, HeaderConstraints, parse_go_build, parse_plus_build};
pub use context::{BuildContext, toolchain_release};
pub use scanner::{FileHeader, scan_header};

/// The pseudo-import that enables cgo.
pub const CGO_IMPORT: &str = "C";

/// Imports of one buildable directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnitImports {
    /// Package name declared by the non-test files.
    pub name: String,
    /// Imports of the files that make up the package, sorted.
    pub imports: Vec<String>,
    /// Imports of `_test.go` files (in-package and external tests), sorted.
    pub test_imports: Vec<String>,
}

/// Reasons a directory is not a buildable Go package.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no buildable Go source files in {dir:?}")]
    NoGoFiles { dir: PathBuf },
    #[error("found packages {first} and {second} in {dir:?}")]
    MultiplePackages {
        dir: PathBuf,
        first: String,
        second: String,
    },
    #[error("{file:?}: {message}")]
    Syntax { file: PathBuf, message: String },
    #[error("{file:?}: invalid build constraint: {source}")]
    Constraint {
        file: PathBuf,
        source: ConstraintError,
    },
    #[error("failed to read {file:?}: {message}")]
    Read { file: PathBuf, message: String },
}

/// Produces the runtime and test import lists of a directory.
#[cfg_attr(test, mockall::automock)]
pub trait ImportParser {
    /// `files` are the non-directory entries of `dir`.
    fn import_dir(&self, dir: &Path, files: &[PathBuf]) -> Result<UnitImports, ParseError>;
}

/// [`ImportParser`] reading Go files the way `go build` selects them.
pub struct GoImportParser<'a, R: Runtime> {
    runtime: &'a R,
    context: BuildContext,
}

impl<'a, R: Runtime> GoImportParser<'a, R> {
    pub fn new(runtime: &'a R, context: BuildContext) -> Self {
        Self { runtime, context }
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Read and filter one candidate file. `Ok(None)` means the file is
    /// excluded for this build context.
    fn read_file(&self, file: &Path) -> Result<Option<FileHeader>, ParseError> {
        let text = self
            .runtime
            .read_to_string(file)
            .map_err(|e| ParseError::Read {
                file: file.to_path_buf(),
                message: format!("{:#}", e),
            })?;

        let constraints = HeaderConstraints::scan(&text);
        let included = constraints
            .satisfied(&|tag| self.context.matches_tag(tag))
            .map_err(|source| ParseError::Constraint {
                file: file.to_path_buf(),
                source,
            })?;
        if !included {
            debug!("Excluding {:?} by build constraints", file);
            return Ok(None);
        }

        let header = scan_header(&text).map_err(|message| ParseError::Syntax {
            file: file.to_path_buf(),
            message,
        })?;

        if !self.context.cgo_enabled && header.imports.iter().any(|i| i == CGO_IMPORT) {
            debug!("Excluding cgo file {:?}", file);
            return Ok(None);
        }
        Ok(Some(header))
    }
}

impl<R: Runtime> ImportParser for GoImportParser<'_, R> {
    #[tracing::instrument(skip(self, files))]
    fn import_dir(&self, dir: &Path, files: &[PathBuf]) -> Result<UnitImports, ParseError> {
        let mut name: Option<String> = None;
        let mut imports = BTreeSet::new();
        let mut test_imports = BTreeSet::new();
        let mut found = false;

        for file in files {
            let Some(file_name) = file.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            if !file_name.ends_with(".go")
                || file_name.starts_with('_')
                || file_name.starts_with('.')
            {
                continue;
            }
            if !self.context.good_os_arch_file(&file_name) {
                debug!("Excluding {:?} by file name", file);
                continue;
            }

            let Some(header) = self.read_file(file)? else {
                continue;
            };
            if header.package == "documentation" {
                continue;
            }

            let is_test = file_name.ends_with("_test.go");
            let mut package = header.package.as_str();
            if is_test && name.as_deref() != Some(package) {
                if let Some(stripped) = package.strip_suffix("_test") {
                    package = stripped;
                }
            }

            match &name {
                None => name = Some(package.to_string()),
                Some(existing) if existing != package => {
                    return Err(ParseError::MultiplePackages {
                        dir: dir.to_path_buf(),
                        first: existing.clone(),
                        second: package.to_string(),
                    });
                }
                Some(_) => {}
            }

            found = true;
            let target = if is_test {
                &mut test_imports
            } else {
                &mut imports
            };
            target.extend(header.imports);
        }

        if !found {
            return Err(ParseError::NoGoFiles {
                dir: dir.to_path_buf(),
            });
        }

        Ok(UnitImports {
            name: name.unwrap_or_default(),
            imports: imports.into_iter().collect(),
            test_imports: test_imports.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::fs;
    use tempfile::tempdir;

    fn linux_amd64() -> BuildContext {
        BuildContext::new("linux", "amd64", true, Vec::new())
    }

    fn files_of(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_import_dir_splits_runtime_and_test_imports() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("lib.go"),
            "package lib\n\nimport (\n\t\"fmt\"\n\t\"golang.org/x/net/html\"\n)\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("util.go"),
            "package lib\n\nimport \"fmt\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("lib_test.go"),
            "package lib\n\nimport \"testing\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("example_test.go"),
            "package lib_test\n\nimport \"github.com/stretchr/testify/assert\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "# lib\n").unwrap();

        let runtime = RealRuntime;
        let parser = GoImportParser::new(&runtime, linux_amd64());
        let unit = parser
            .import_dir(dir.path(), &files_of(dir.path()))
            .unwrap();

        assert_eq!(unit.name, "lib");
        assert_eq!(unit.imports, vec!["fmt", "golang.org/x/net/html"]);
        assert_eq!(
            unit.test_imports,
            vec!["github.com/stretchr/testify/assert", "testing"]
        );
    }

    #[test]
    fn test_import_dir_applies_build_constraints() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package a\nimport \"os\"\n").unwrap();
        fs::write(
            dir.path().join("a_windows.go"),
            "package a\nimport \"golang.org/x/sys/windows\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("gen.go"),
            "//go:build ignore\n\npackage main\n\nimport \"github.com/tool/gen\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("cgo.go"),
            "// +build cgo\n\npackage a\n\nimport \"C\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("_skip.go"), "package other\n").unwrap();

        let runtime = RealRuntime;
        let parser = GoImportParser::new(&runtime, linux_amd64());
        let unit = parser
            .import_dir(dir.path(), &files_of(dir.path()))
            .unwrap();
        assert_eq!(unit.imports, vec!["C", "os"]);

        let no_cgo = GoImportParser::new(
            &runtime,
            BuildContext::new("windows", "amd64", false, Vec::new()),
        );
        let unit = no_cgo
            .import_dir(dir.path(), &files_of(dir.path()))
            .unwrap();
        assert_eq!(unit.imports, vec!["golang.org/x/sys/windows", "os"]);
    }

    #[test]
    fn test_import_dir_without_go_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("data.json"), "{}").unwrap();
        fs::write(
            dir.path().join("only_windows.go"),
            "package a\nimport \"syscall\"\n",
        )
        .unwrap();

        let runtime = RealRuntime;
        let parser = GoImportParser::new(&runtime, linux_amd64());
        let err = parser
            .import_dir(dir.path(), &files_of(dir.path()))
            .unwrap_err();
        assert!(matches!(err, ParseError::NoGoFiles { .. }));
    }

    #[test]
    fn test_import_dir_multiple_packages() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package a\n").unwrap();
        fs::write(dir.path().join("b.go"), "package b\n").unwrap();

        let runtime = RealRuntime;
        let parser = GoImportParser::new(&runtime, linux_amd64());
        let err = parser
            .import_dir(dir.path(), &files_of(dir.path()))
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::MultiplePackages { ref first, ref second, .. } if first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_import_dir_syntax_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.go"), "packag a\n").unwrap();

        let runtime = RealRuntime;
        let parser = GoImportParser::new(&runtime, linux_amd64());
        let err = parser
            .import_dir(dir.path(), &files_of(dir.path()))
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_import_dir_ignores_documentation_package() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.go"), "package documentation\n").unwrap();
        fs::write(dir.path().join("x.go"), "package x\nimport \"io\"\n").unwrap();

        let runtime = RealRuntime;
        let parser = GoImportParser::new(&runtime, linux_amd64());
        let unit = parser
            .import_dir(dir.path(), &files_of(dir.path()))
            .unwrap();
        assert_eq!(unit.name, "x");
        assert_eq!(unit.imports, vec!["io"]);
    }

    #[test]
    fn test_import_dir_constraint_after_license_block() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package a\n\nimport \"os\"\n").unwrap();
        fs::write(
            dir.path().join("win.go"),
            "/*\n * Copyright 2020 Example\n */\n\n//go:build windows\n\npackage a\n\nimport \"golang.org/x/sys/windows\"\n",
        )
        .unwrap();

        let runtime = RealRuntime;
        let parser = GoImportParser::new(&runtime, linux_amd64());
        let unit = parser
            .import_dir(dir.path(), &files_of(dir.path()))
            .unwrap();
        assert_eq!(unit.imports, vec!["os"]);

        let parser = GoImportParser::new(&runtime, BuildContext::new("windows", "amd64", true, Vec::new()));
        let unit = parser
            .import_dir(dir.path(), &files_of(dir.path()))
            .unwrap();
        assert_eq!(unit.imports, vec!["golang.org/x/sys/windows", "os"]);
    }
}
