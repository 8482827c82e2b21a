use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::debug;

use crate::bundle::{ArtifactBundle, BundleFile};
use crate::error::FetchError;

/// A file written into the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Writes every bundle file into `destination`, creating it if needed.
///
/// Files are staged next to their target and renamed into place, so an
/// existing file is either fully replaced or left as it was. Files in
/// `destination` that are not part of the bundle are not touched. New files
/// get the same mode a plain `std::fs::write` would give them; replaced files
/// keep the mode they had.
pub fn write_bundle(bundle: &ArtifactBundle, destination: &Path) -> Result<Vec<SavedFile>, FetchError> {
    std::fs::create_dir_all(destination).map_err(|e| FetchError::io(destination, e))?;

    bundle
        .files()
        .map(|file| write_file(file, destination))
        .collect()
}

fn write_file(file: &BundleFile, destination: &Path) -> Result<SavedFile, FetchError> {
    let target = destination.join(file.name());

    let mut staged = staging_file(destination, &target).map_err(|e| FetchError::io(&target, e))?;
    staged
        .write_all(file.content())
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| FetchError::io(&target, e))?;
    staged
        .persist(&target)
        .map_err(|e| FetchError::io(&target, e.error))?;

    debug!("Wrote {} ({} bytes)", target.display(), file.len());

    Ok(SavedFile {
        name: file.name().to_string(),
        path: target,
        size: file.len(),
    })
}

fn staging_file(destination: &Path, target: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    // Staged files are created 0600; ask for 0666 and let the umask narrow it.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let staged = builder.tempfile_in(destination)?;

    if let Ok(existing) = std::fs::metadata(target) {
        if existing.is_file() {
            staged.as_file().set_permissions(existing.permissions())?;
        }
    }
    Ok(staged)
}
