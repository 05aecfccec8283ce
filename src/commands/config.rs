use anyhow::{Result, bail};
use log::debug;
use std::path::PathBuf;

use super::paths::{resolve_gopath, resolve_pkgsrc_dir};
use crate::runtime::Runtime;

const DEFAULT_GO: &str = "go";

/// Settings shared by every command, resolved from flags and environment.
pub struct Config<R: Runtime> {
    pub runtime: R,
    pub pkgsrc_dir: PathBuf,
    pub gopath: PathBuf,
    /// Go toolchain binary used to list the standard library.
    pub go: String,
}

impl<R: Runtime> Config<R> {
    pub fn new(
        runtime: R,
        pkgsrc_dir: Option<PathBuf>,
        gopath: Option<PathBuf>,
        go: Option<String>,
    ) -> Result<Self> {
        let pkgsrc_dir = resolve_pkgsrc_dir(&runtime, pkgsrc_dir);
        if !runtime.is_dir(&pkgsrc_dir) {
            bail!(
                "There is a problem with the pkgsrc directory {:?} (not a directory).\n\
                 Please set the '--pkgsrc' option.",
                pkgsrc_dir
            );
        }

        let gopath = resolve_gopath(&runtime, gopath)?;
        let go = go
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| DEFAULT_GO.to_string());
        debug!("Using Go toolchain: {}", go);

        Ok(Self {
            runtime,
            pkgsrc_dir,
            gopath,
            go,
        })
    }

    /// Root of the source tree: `<GOPATH>/src`.
    pub fn source_root(&self) -> PathBuf {
        self.gopath.join("src")
    }
}
