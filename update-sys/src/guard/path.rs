// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use tracing::error;

use super::{Guard, Release};

/// Deletes a file.
#[derive(Debug)]
pub struct Unlink {
    path: PathBuf,
}

/// Removes an (expected empty) directory.
#[derive(Debug)]
pub struct RemoveDir {
    path: PathBuf,
}

pub type PathUnlinker = Guard<Unlink>;
pub type DirRemover = Guard<RemoveDir>;

impl Unlink {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RemoveDir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Release for Unlink {
    fn release(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            error!("Unable to unlink path {:?}: {}", self.path, e);
        }
    }
}

impl Release for RemoveDir {
    fn release(&mut self) {
        remove_dir_logged(&self.path);
    }
}

pub(super) fn remove_dir_logged(path: &Path) {
    if let Err(e) = fs::remove_dir(path) {
        error!("Unable to remove dir {:?}: {}", path, e);
    }
}

impl Guard<Unlink> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::armed(Unlink { path: path.into() })
    }
}

impl Guard<RemoveDir> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::armed(RemoveDir { path: path.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TempDir;

    #[test]
    fn unlinks_file_on_scope_exit() {
        let temp = TempDir::new("unlinker");
        let file = temp.path().join("payload.bin");
        fs::write(&file, b"delta").expect("write file");

        {
            let unlinker = PathUnlinker::new(&file);
            assert_eq!(unlinker.resource().path(), file.as_path());
        }
        assert!(!file.exists());
    }

    #[test]
    fn disarmed_unlinker_keeps_file() {
        let temp = TempDir::new("unlinker-keep");
        let file = temp.path().join("payload.bin");
        fs::write(&file, b"delta").expect("write file");

        {
            let mut unlinker = PathUnlinker::new(&file);
            unlinker.disarm();
        }
        assert!(file.exists());
    }

    #[test]
    fn missing_file_is_logged_not_raised() {
        let temp = TempDir::new("unlinker-missing");
        let _unlinker = PathUnlinker::new(temp.path().join("never-created"));
    }

    #[test]
    fn removes_empty_directory() {
        let temp = TempDir::new("dir-remover");
        let dir = temp.path().join("au_destination");
        fs::create_dir(&dir).expect("create dir");

        drop(DirRemover::new(&dir));
        assert!(!dir.exists());
    }

    #[test]
    fn non_empty_directory_survives() {
        let temp = TempDir::new("dir-remover-full");
        let dir = temp.path().join("busy");
        fs::create_dir(&dir).expect("create dir");
        fs::write(dir.join("file"), b"x").expect("write file");

        drop(DirRemover::new(&dir));
        assert!(dir.exists());
    }
}
