// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use tracing::warn;

use super::path::remove_dir_logged;
use super::{Guard, Release};
use crate::mount::unmount_filesystem;

/// Unmounts a mountpoint.
#[derive(Debug)]
pub struct Unmount {
    mountpoint: PathBuf,
}

/// Unmounts a temporary mountpoint, then removes the directory.
#[derive(Debug)]
pub struct TempUnmount {
    dir: PathBuf,
}

pub type FilesystemUnmounter = Guard<Unmount>;
pub type TempUnmounter = Guard<TempUnmount>;

impl Unmount {
    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }
}

impl TempUnmount {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Release for Unmount {
    fn release(&mut self) {
        // unmount_filesystem logs the reason
        if unmount_filesystem(&self.mountpoint).is_err() {
            warn!("Leaving {:?} mounted", self.mountpoint);
        }
    }
}

impl Release for TempUnmount {
    fn release(&mut self) {
        // The directory goes even if the unmount failed; rmdir refuses a
        // live mountpoint on its own.
        if unmount_filesystem(&self.dir).is_err() {
            warn!("Unmount of {:?} failed, removing directory anyway", self.dir);
        }
        remove_dir_logged(&self.dir);
    }
}

impl Guard<Unmount> {
    pub fn new(mountpoint: impl Into<PathBuf>) -> Self {
        Self::armed(Unmount {
            mountpoint: mountpoint.into(),
        })
    }
}

impl Guard<TempUnmount> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::armed(TempUnmount { dir: dir.into() })
    }
}
