use anyhow::Result;
use log::debug;
use std::io::Write;

use super::config::Config;
use crate::index::full_scan;
use crate::runtime::Runtime;

/// Print the reverse index of Go import-path prefixes to pkgsrc packages.
#[tracing::instrument(skip(config, out))]
pub fn index<R: Runtime, W: Write>(config: &Config<R>, json: bool, out: &mut W) -> Result<()> {
    let index = full_scan(&config.runtime, &config.pkgsrc_dir)?;
    debug!("Writing {} index entries", index.len());

    if json {
        index.write_json(out)
    } else {
        index.write_to(out)
    }
}
