// SPDX-License-Identifier: GPL-3.0-only

//! Boot device discovery

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use nix::sys::stat::{major, minor};
use tracing::{debug, error, warn};

use crate::config::UtilsConfig;
use crate::device::{PartitionDevice, make_partition_name};
use crate::error::{Result, SysError};

/// Returns the device the running system booted from, e.g. `/dev/sda3`.
///
/// Device-mapper roots (dm-verity) are followed to their backing partition.
/// `LABEL=` and `UUID=` syntax is not interpreted. Empty on failure.
pub fn boot_device() -> String {
    boot_device_in(&UtilsConfig::default())
}

pub fn boot_device_in(config: &UtilsConfig) -> String {
    let dev = match fs::metadata("/") {
        Ok(metadata) => metadata.dev(),
        Err(e) => {
            error!("Cannot stat root filesystem: {}", e);
            return String::new();
        }
    };

    let name = match block_name_for_dev(&config.sysfs_dev_block_dir, major(dev), minor(dev)) {
        Ok(name) => name,
        Err(e) => {
            error!("Failed to find the root device: {}", e);
            return String::new();
        }
    };
    let name = resolve_dm_slave(&config.sysfs_block_dir, &name);

    let node = config.device_dir.join(&name);
    if !node.exists() {
        warn!("Root device {} has no device node", name);
    }
    node.to_string_lossy().into_owned()
}

/// Kernel name of the block device numbered `major:minor`.
fn block_name_for_dev(sysfs_dev_block_dir: &Path, major: u64, minor: u64) -> Result<String> {
    let link = sysfs_dev_block_dir.join(format!("{major}:{minor}"));
    let target = fs::read_link(&link)?;
    target
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| SysError::InvalidPath(format!("{link:?} -> {target:?}")))
}

fn resolve_dm_slave(sysfs_block_dir: &Path, name: &str) -> String {
    if !name.starts_with("dm-") {
        return name.to_string();
    }

    let slaves_dir = sysfs_block_dir.join(name).join("slaves");
    let slaves: Vec<String> = match fs::read_dir(&slaves_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect(),
        Err(e) => {
            debug!("Cannot list {:?}: {}", slaves_dir, e);
            return name.to_string();
        }
    };

    match slaves.as_slice() {
        [slave] => slave.clone(),
        _ => name.to_string(),
    }
}

/// Returns the kernel partition paired with root partition `boot_device`.
///
/// Kernel and root partitions come in adjacent pairs (2/3, 4/5, 6/7, ...),
/// so the kernel lives one slot below an odd root partition. Empty when
/// `boot_device` is not such a partition.
pub fn boot_kernel_device(boot_device: &str) -> String {
    let Some(part) = PartitionDevice::parse(boot_device) else {
        return String::new();
    };

    match part.number_value() {
        Some(number) if number >= 3 && number % 2 == 1 => {
            make_partition_name(part.disk, number - 1)
        }
        _ => String::new(),
    }
}
