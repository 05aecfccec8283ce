use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use crate::runtime::Runtime;

const DEFAULT_PKGSRC_DIR: &str = "/usr/pkgsrc";

/// Resolve the pkgsrc tree: explicit value, then `PKGSRC`, then `/usr/pkgsrc`.
#[tracing::instrument(skip(runtime))]
pub fn resolve_pkgsrc_dir<R: Runtime>(runtime: &R, explicit: Option<PathBuf>) -> PathBuf {
    let dir = explicit
        .or_else(|| {
            runtime
                .env_var("PKGSRC")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PKGSRC_DIR));

    info!("Using pkgsrc tree: {}", dir.display());
    dir
}

/// Resolve the `GOPATH` entry to use: the first element of an explicit path
/// list, otherwise `$HOME/go`.
#[tracing::instrument(skip(runtime))]
pub fn resolve_gopath<R: Runtime>(runtime: &R, explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(list) = explicit {
        if let Some(first) = std::env::split_paths(&list).find(|p| !p.as_os_str().is_empty()) {
            info!("Using GOPATH: {}", first.display());
            return Ok(first);
        }
    }

    let home_dir = runtime
        .home_dir()
        .context("Could not find home directory for the default GOPATH")?;
    Ok(home_dir.join("go"))
}
