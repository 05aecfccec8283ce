//! Command implementations behind the CLI.

pub mod config;
mod depends;
mod index;
mod paths;

pub use depends::{DependsOptions, depends};
pub use index::index;
