use anyhow::Result;
use log::{info, warn};
use std::io::Write;

use super::config::Config;
use crate::deps::DependencyWalker;
use crate::golang::{BuildContext, GoImportParser, toolchain_release};
use crate::index::full_scan;
use crate::runtime::Runtime;
use crate::stdlib::StdlibSet;

#[derive(Debug, Clone, Default)]
pub struct DependsOptions {
    /// Report paths even when a package already provides them.
    pub force: bool,
    /// Extra build tags for selecting Go files.
    pub tags: Vec<String>,
}

/// Print the dependency report of each import path in `paths`.
#[tracing::instrument(skip(config, out))]
pub fn depends<R: Runtime, W: Write>(
    config: &Config<R>,
    paths: &[String],
    options: &DependsOptions,
    out: &mut W,
) -> Result<()> {
    let runtime = &config.runtime;
    let stdlib = StdlibSet::discover(runtime, &config.go)?;
    let index = full_scan(runtime, &config.pkgsrc_dir)?;

    let mut context = BuildContext::from_env(runtime, options.tags.clone());
    if let Some(minor) = toolchain_release(runtime, &config.go) {
        context = context.with_release(minor);
    }
    let parser = GoImportParser::new(runtime, context);
    let context = parser.context();
    info!(
        "Selecting Go files for {}/{} (cgo: {}, go1.{})",
        context.goos, context.goarch, context.cgo_enabled, context.release_minor
    );
    let walker = DependencyWalker::new(runtime, &parser, &index, &stdlib, config.source_root());

    for path in paths {
        let path = path.trim_matches('/');
        if let Some(package) = index.prefix_match(path) {
            if !options.force {
                warn!(
                    "{} is already part of a pkgsrc package ({}), skipping",
                    path, package
                );
                continue;
            }
            info!("{} is already part of {}, reporting anyway", path, package);
        }

        let dependencies = walker.walk(path, out)?;
        dependencies.write_report(path, out)?;
    }
    Ok(())
}
