//! CLI command implementations.

pub mod install;
pub mod package;
pub mod regions;

use std::path::Path;

use awayto_install::{InstallResult, InstallerConfig};

/// Load configuration from an explicit file or the default `awayto.toml`.
pub fn load_config(path: Option<&Path>) -> InstallResult<InstallerConfig> {
    match path {
        Some(path) => InstallerConfig::from_file(path),
        None => InstallerConfig::load(),
    }
}

