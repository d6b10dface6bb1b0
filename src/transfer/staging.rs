//! Ephemeral per-transfer staging directories.
//!
//! Every transfer gets its own uniquely named directory under the sandbox root,
//! holding one file per column named by its zero-based position (`0.bin`, `1.bin`,
//! ...). Column names never reach the filesystem.
//!
//! The directory is removed by [`Staging::close`] or, on any path that skips it
//! (early return, panic unwinding), by `Drop`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::CopybinError;

/// Extension of the staged column files. The database ignores it.
pub const FILE_EXTENSION: &str = "bin";

#[derive(Debug)]
pub struct Staging {
    root: PathBuf,
    name: String,
    dir: PathBuf,
    removed: bool,
}

impl Staging {
    /// Creates a fresh staging directory under `root`, creating `root` if needed.
    pub fn open(root: &Path) -> Result<Self, CopybinError> {
        fs::create_dir_all(root).map_err(|e| CopybinError::staging_io(root, e))?;

        let name = Uuid::new_v4().simple().to_string();
        let dir = root.join(&name);
        fs::create_dir(&dir).map_err(|e| CopybinError::staging_io(&dir, e))?;
        log::debug!("Opened staging directory {}", dir.display());

        Ok(Self {
            root: root.to_path_buf(),
            name,
            dir,
            removed: false,
        })
    }

    /// The sandbox root this directory lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The directory name, i.e. its path relative to the sandbox root.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(column_index: usize) -> String {
        format!("{}.{}", column_index, FILE_EXTENSION)
    }

    /// The local path of a column's file. The file is not created.
    pub fn file_for(&self, column_index: usize) -> PathBuf {
        self.dir.join(Self::file_name(column_index))
    }

    /// The local paths of `count` column files, in column order.
    pub fn files(&self, count: usize) -> Vec<PathBuf> {
        (0..count).map(|idx| self.file_for(idx)).collect()
    }

    /// Removes the directory and everything in it.
    pub fn close(mut self) -> Result<(), CopybinError> {
        self.remove()
    }

    fn remove(&mut self) -> Result<(), CopybinError> {
        if self.removed {
            return Ok(());
        }
        self.removed = true;
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                log::debug!("Removed staging directory {}", self.dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CopybinError::staging_io(&self.dir, e)),
        }
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            log::warn!("Failed to clean up staging directory: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_unique_dirs_under_root() {
        let root = tempfile::tempdir().unwrap();
        let a = Staging::open(root.path()).unwrap();
        let b = Staging::open(root.path()).unwrap();
        assert!(a.dir().is_dir());
        assert_ne!(a.dir(), b.dir());
        assert_eq!(a.dir().parent(), Some(root.path()));
        assert_eq!(a.dir(), root.path().join(a.name()));
    }

    #[test]
    fn test_files_are_named_by_position() {
        let root = tempfile::tempdir().unwrap();
        let staging = Staging::open(root.path()).unwrap();
        let files = staging.files(3);
        assert_eq!(files[0], staging.dir().join("0.bin"));
        assert_eq!(files[2], staging.dir().join("2.bin"));
        assert!(!files[0].exists());
    }

    #[test]
    fn test_close_removes_directory_with_contents() {
        let root = tempfile::tempdir().unwrap();
        let staging = Staging::open(root.path()).unwrap();
        fs::write(staging.file_for(0), b"data").unwrap();
        let dir = staging.dir().to_path_buf();
        staging.close().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = {
            let staging = Staging::open(root.path()).unwrap();
            fs::write(staging.file_for(1), b"x").unwrap();
            staging.dir().to_path_buf()
        };
        assert!(!dir.exists());
    }

    #[test]
    fn test_close_tolerates_already_removed_directory() {
        let root = tempfile::tempdir().unwrap();
        let staging = Staging::open(root.path()).unwrap();
        fs::remove_dir_all(staging.dir()).unwrap();
        assert!(staging.close().is_ok());
    }

    #[test]
    fn test_open_creates_missing_root() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("nested").join("root");
        let staging = Staging::open(&root).unwrap();
        assert!(staging.dir().starts_with(&root));
    }
}
