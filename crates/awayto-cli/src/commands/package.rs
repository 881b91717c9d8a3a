//! Implementation of the `awayto package` command.

use std::path::Path;

use awayto_install::{packager, InstallResult};

pub async fn run(source: &Path, output: &Path) -> InstallResult<()> {
    println!("Packaging {}...", source.display());
    let archive = packager::package_directory(source, output).await?;
    println!("Archive written to {}", archive.display());
    Ok(())
}
