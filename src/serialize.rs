//! Writes a table image to disk.

use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, TableError};

/// Mode of a newly created table on unix.
#[cfg(unix)]
const NEW_TABLE_MODE: u32 = 0o644;

/// Writes `image` verbatim to `path`.
///
/// The bytes go to a temporary file beside `path`, are synced, and the file
/// is then renamed over `path`. A reader never observes a half-written
/// table, and an existing file at `path` is replaced but keeps its
/// permissions. On unix the parent directory is synced after the rename, so
/// the new table survives a crash once this returns.
///
/// The parent directory must already exist.
pub fn serialize(image: &[u8], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if image.is_empty() {
        return Err(TableError::InvalidArgument("cannot serialize an empty image".to_string()));
    }

    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent_dir)?;
    temp_file.write_all(image)?;
    if let Some(perms) = target_permissions(path)? {
        temp_file.as_file().set_permissions(perms)?;
    }
    temp_file.as_file().sync_all()?;

    let written = temp_file.as_file().metadata()?.len();
    if written != image.len() as u64 {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("short write: {} of {} bytes", written, image.len()),
        )
        .into());
    }

    temp_file.persist(path).map_err(|e| e.error)?;
    sync_dir(parent_dir)?;
    tracing::debug!(path = %path.display(), bytes = image.len(), "serialized probing table");
    Ok(())
}

/// Permissions the table at `path` should end up with: those of the file
/// being replaced, or the default for a new table.
fn target_permissions(path: &Path) -> io::Result<Option<Permissions>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(new_table_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_table_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(NEW_TABLE_MODE))
}

#[cfg(not(unix))]
fn new_table_permissions() -> Option<Permissions> {
    None
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
