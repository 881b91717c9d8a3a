//! Zip packaging of the API directory.
//!
//! Entries are stored relative to the source directory, so the archive has
//! no top-level wrapper folder. The returned future resolves only after the
//! archive is finalised and flushed to disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{InstallError, InstallResult};

/// Archive every file below `src` into a zip at `dest`.
///
/// Returns the archive path once the file is closed.
pub async fn package_directory(src: &Path, dest: &Path) -> InstallResult<PathBuf> {
    let src = src.to_owned();
    let dest = dest.to_owned();

    let (path, entries) = spawn_blocking(move || package_directory_sync(&src, &dest))
        .await
        .map_err(|e| InstallError::archive(format!("packaging task failed: {e}")))??;

    info!(archive = %path.display(), entries, "api package written");
    Ok(path)
}

fn package_directory_sync(src: &Path, dest: &Path) -> InstallResult<(PathBuf, usize)> {
    if !src.is_dir() {
        return Err(InstallError::archive(format!(
            "{} is not a directory",
            src.display()
        )));
    }

    let file = File::create(dest)?;
    let partial = PartialArchive::new(dest);
    let own_path = dest.canonicalize()?;

    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut entries = 0;
    for path in walkdir(src)? {
        let path = path?;
        if !path.is_file() || path.canonicalize()? == own_path {
            continue;
        }

        let name = entry_name(src, &path)?;
        debug!(entry = %name, "adding archive entry");

        zip.start_file(name, options)?;
        let mut input = File::open(&path)?;
        std::io::copy(&mut input, &mut zip)?;
        entries += 1;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| InstallError::Io(e.into_error()))?
        .sync_all()?;

    Ok((partial.keep(), entries))
}

/// Archive file that is deleted on drop unless kept.
///
/// Any error between creating the file and finishing the archive leaves no
/// truncated archive behind.
struct PartialArchive {
    path: Option<PathBuf>,
}

impl PartialArchive {
    fn new(path: &Path) -> Self {
        Self {
            path: Some(path.to_owned()),
        }
    }

    /// Keep the file and return its path.
    fn keep(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for PartialArchive {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(archive = %path.display(), error = %e, "failed to remove partial archive");
            }
        }
    }
}

/// Forward-slash path of `path` relative to `root`.
fn entry_name(root: &Path, path: &Path) -> InstallResult<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| InstallError::archive(e.to_string()))?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    Ok(parts.join("/"))
}

fn walkdir(path: &Path) -> std::io::Result<impl Iterator<Item = std::io::Result<PathBuf>>> {
    let mut entries: Vec<_> = std::fs::read_dir(path)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.path();
        paths.push(Ok(path.clone()));

        if path.is_dir() {
            paths.extend(walkdir(&path)?);
        }
    }

    Ok(paths.into_iter())
}
