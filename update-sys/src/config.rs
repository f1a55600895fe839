// SPDX-License-Identifier: GPL-3.0-only

//! Runtime configuration
//!
//! Every field has a default matching a stock system, so an empty (or
//! missing) TOML file yields the standard layout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

pub const DEFAULT_DEVICE_DIR: &str = "/dev";
pub const DEFAULT_SYSFS_BLOCK_DIR: &str = "/sys/block";
pub const DEFAULT_SYSFS_DEV_BLOCK_DIR: &str = "/sys/dev/block";
pub const DEFAULT_FS_TYPE: &str = "ext3";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UtilsConfig {
    pub device_dir: PathBuf,
    pub sysfs_block_dir: PathBuf,
    pub sysfs_dev_block_dir: PathBuf,
    pub mount: MountConfig,
}

impl Default for UtilsConfig {
    fn default() -> Self {
        Self {
            device_dir: PathBuf::from(DEFAULT_DEVICE_DIR),
            sysfs_block_dir: PathBuf::from(DEFAULT_SYSFS_BLOCK_DIR),
            sysfs_dev_block_dir: PathBuf::from(DEFAULT_SYSFS_DEV_BLOCK_DIR),
            mount: MountConfig::default(),
        }
    }
}

/// Filesystem type and data string handed to `mount(2)`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    pub fs_type: String,
    pub options: Option<String>,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fs_type: DEFAULT_FS_TYPE.to_string(),
            options: None,
        }
    }
}

impl UtilsConfig {
    pub fn from_toml(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}
