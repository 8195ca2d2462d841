//! Pre-run backup of a collection directory.

use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    #[error("backup I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a collection directory: {0}")]
    NotADirectory(PathBuf),
}

/// Archive the whole `collection_dir` into `<out_dir>/<dir name>-<timestamp>.tar`.
///
/// Returns the path of the written archive. Entries are stored under the
/// directory's own name.
pub fn backup_collection(collection_dir: &Path, out_dir: &Path) -> Result<PathBuf, BackupError> {
    if !collection_dir.is_dir() {
        return Err(BackupError::NotADirectory(collection_dir.to_path_buf()));
    }
    let base = collection_dir
        .canonicalize()?
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "collection".to_string());

    let stamp = chrono::Local::now().format("%Y-%m-%dT%H-%M-%S");
    let target = out_dir.join(format!("{base}-{stamp}.tar"));

    let file = File::create(&target)?;
    let mut builder = tar::Builder::new(file);
    builder.follow_symlinks(false);
    builder.append_dir_all(&base, collection_dir)?;
    builder.into_inner()?.sync_all()?;

    log::info!("Backup: {}", target.display());
    Ok(target)
}
