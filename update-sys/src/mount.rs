// SPDX-License-Identifier: GPL-3.0-only

//! Synchronous mount/unmount
//!
//! Failures are returned to the caller, who owns any retry policy.

use std::path::Path;

use nix::mount::{MsFlags, mount, umount};
use tracing::{debug, error};

use crate::config::{MountConfig, UtilsConfig};
use crate::error::{Result, SysError};

/// Mounts `device` on `mountpoint` as ext3 with no extra options.
pub fn mount_filesystem(device: &Path, mountpoint: &Path, flags: MsFlags) -> Result<()> {
    MountManager::default().mount(device, mountpoint, flags)
}

pub fn unmount_filesystem(mountpoint: &Path) -> Result<()> {
    MountManager::default().unmount(mountpoint)
}

/// Mount operations using a fixed filesystem type and baseline data string.
#[derive(Debug, Clone, Default)]
pub struct MountManager {
    config: MountConfig,
}

impl MountManager {
    pub fn new(config: MountConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &UtilsConfig) -> Self {
        Self::new(config.mount.clone())
    }

    pub fn fs_type(&self) -> &str {
        &self.config.fs_type
    }

    pub fn mount(&self, device: &Path, mountpoint: &Path, flags: MsFlags) -> Result<()> {
        mount(
            Some(device),
            mountpoint,
            Some(self.config.fs_type.as_str()),
            flags,
            self.config.options.as_deref(),
        )
        .map_err(|source| {
            error!(
                "Unable to mount {:?} on {:?} as {}: {}",
                device, mountpoint, self.config.fs_type, source
            );
            SysError::Mount {
                device: device.to_path_buf(),
                mountpoint: mountpoint.to_path_buf(),
                source,
            }
        })?;

        debug!("Mounted {:?} on {:?} ({:?})", device, mountpoint, flags);
        Ok(())
    }

    pub fn unmount(&self, mountpoint: &Path) -> Result<()> {
        umount(mountpoint).map_err(|source| {
            error!("Unable to unmount {:?}: {}", mountpoint, source);
            SysError::Unmount {
                mountpoint: mountpoint.to_path_buf(),
                source,
            }
        })?;

        debug!("Unmounted {:?}", mountpoint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TempDir;

    #[test]
    fn unmounting_a_plain_directory_fails() {
        let temp = TempDir::new("unmount");
        let err = unmount_filesystem(temp.path()).expect_err("not a mountpoint");
        assert!(matches!(err, SysError::Unmount { .. }));
    }

    #[test]
    fn mounting_a_missing_device_fails() {
        let temp = TempDir::new("mount");
        let err = mount_filesystem(
            &temp.path().join("no-such-device"),
            temp.path(),
            MsFlags::MS_RDONLY,
        )
        .expect_err("device does not exist");
        assert!(matches!(err, SysError::Mount { .. }));
    }

    #[test]
    fn manager_uses_configured_type() {
        let manager = MountManager::from_config(&UtilsConfig::default());
        assert_eq!(manager.fs_type(), "ext3");
    }
}
