//! File system helpers shared by artifact writers and the deployment agent.
//!
//! Every helper is idempotent: removing a missing path or creating an
//! existing directory succeeds.

use std::{io, path::Path};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> io::Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path).await
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Removes the file if it exists.
pub async fn remove_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Writes `contents` to `path`, creating parent directories first.
pub async fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, contents).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_helpers_tolerate_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        remove_dir_all(&missing).await.unwrap();
        remove_file(&missing).await.unwrap();
    }

    #[tokio::test]
    async fn create_dir_all_with_erase_clears_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        write_file(&target.join("stale.txt"), b"old").await.unwrap();

        create_dir_all(&target, true).await.unwrap();

        assert!(target.is_dir());
        assert!(!target.join("stale.txt").exists());
    }
}
