// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open {path:?}: {source}")]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not an ext2/3/4 filesystem (superblock magic {magic:#06x})")]
    NotExtFilesystem { magic: u16 },

    #[error("Corrupt superblock: {0}")]
    CorruptSuperblock(String),

    #[error("Unable to mount {device:?} on {mountpoint:?}: {source}")]
    Mount {
        device: PathBuf,
        mountpoint: PathBuf,
        #[source]
        source: Errno,
    },

    #[error("Unable to unmount {mountpoint:?}: {source}")]
    Unmount {
        mountpoint: PathBuf,
        #[source]
        source: Errno,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
