use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

use super::ReverseIndex;
use super::makefile::{Directive, Variables, parse_makefile};
use crate::runtime::Runtime;

const SRCPATH_VARIABLE: &str = "GO_SRCPATH";
const MAX_INCLUDE_DEPTH: usize = 8;

/// Build the reverse index by scanning every package Makefile of a pkgsrc tree.
///
/// Directory structure: `<root>/<category>/<package>/Makefile`
#[tracing::instrument(skip(runtime, root))]
pub fn full_scan<R: Runtime>(runtime: &R, root: &Path) -> Result<ReverseIndex> {
    let mut index = ReverseIndex::new();
    let mut packages = 0usize;

    for category_path in runtime
        .read_dir(root)
        .with_context(|| format!("Failed to scan pkgsrc tree {:?}", root))?
    {
        if is_hidden(&category_path) || !runtime.is_dir(&category_path) {
            continue;
        }
        let category = file_name(&category_path);

        for package_path in runtime
            .read_dir(&category_path)
            .with_context(|| format!("Failed to scan category {:?}", category_path))?
        {
            if is_hidden(&package_path) || !runtime.is_dir(&package_path) {
                continue;
            }
            if !runtime.exists(&package_path.join("Makefile")) {
                continue;
            }

            let prefixes = package_prefixes(runtime, &package_path)?;
            if prefixes.is_empty() {
                continue;
            }

            let pkgpath = format!("{}/{}", category, file_name(&package_path));
            for prefix in &prefixes {
                index.insert(prefix, &pkgpath);
            }
            packages += 1;
        }
    }

    info!(
        "Indexed {} prefix(es) from {} Go package(s) in {:?}",
        index.len(),
        packages,
        root
    );
    Ok(index)
}

/// Import-path prefixes declared by the package in `package_dir`.
#[tracing::instrument(skip(runtime))]
pub fn package_prefixes<R: Runtime>(runtime: &R, package_dir: &Path) -> Result<Vec<String>> {
    let mut vars = Variables::new();
    evaluate_file(runtime, package_dir, &package_dir.join("Makefile"), &mut vars, 0)?;

    let Some(value) = vars.expanded(SRCPATH_VARIABLE) else {
        return Ok(Vec::new());
    };

    Ok(value
        .split_whitespace()
        .filter(|word| {
            if word.contains('$') {
                debug!(
                    "Dropping unexpanded {} word {:?} in {:?}",
                    SRCPATH_VARIABLE, word, package_dir
                );
                return false;
            }
            true
        })
        .map(str::to_string)
        .collect())
}

fn evaluate_file<R: Runtime>(
    runtime: &R,
    package_dir: &Path,
    makefile: &Path,
    vars: &mut Variables,
    depth: usize,
) -> Result<()> {
    let text = runtime
        .read_to_string(makefile)
        .with_context(|| format!("Failed to read {:?}", makefile))?;

    for directive in parse_makefile(&text) {
        match directive {
            Directive::Assign { name, op, value } => vars.assign(&name, op, &value),
            Directive::Include(target) => {
                let target = vars.expand(&target);
                let included = package_dir.join(&target);
                let follow = included
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with("Makefile"));
                if !follow || depth >= MAX_INCLUDE_DEPTH {
                    continue;
                }
                if !runtime.exists(&included) {
                    debug!("Skipping missing include {:?} from {:?}", included, makefile);
                    continue;
                }
                evaluate_file(runtime, package_dir, &included, vars, depth + 1)?;
            }
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    file_name(path).starts_with('.')
}
