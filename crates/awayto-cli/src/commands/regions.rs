//! Implementation of the `awayto regions` command.

use std::path::PathBuf;

use awayto_install::InstallResult;

pub fn run(config_path: Option<PathBuf>) -> InstallResult<()> {
    let config = super::load_config(config_path.as_deref())?;

    for (index, region) in config.regions.iter().enumerate() {
        println!("{index:>3}  {region}");
    }
    Ok(())
}
