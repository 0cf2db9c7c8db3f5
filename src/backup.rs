//! Timestamped backup snapshots taken before a rewrite.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

/// Snapshot the file to a timestamped sibling, e.g. `app.20260830_141500.bak.env`.
///
/// Returns the backup path, or `None` when the target does not exist yet
/// (nothing to back up). The snapshot is written before any rewrite
/// starts, so a failed apply never leaves the backup as the only copy.
pub fn create_backup(path: impl AsRef<Path>) -> io::Result<Option<PathBuf>> {
    let path = path.as_ref();

    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let backup_path = backup_path_for(path);
    fs::write(&backup_path, content)?;

    info!(backup_path = %backup_path.display(), "created backup");
    Ok(Some(backup_path))
}

fn backup_path_for(path: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let base = path.to_string_lossy();
    let base = base.strip_suffix(&ext).unwrap_or(&base);
    PathBuf::from(format!("{base}.{timestamp}.bak{ext}"))
}
