// SPDX-License-Identifier: GPL-3.0-only

//! Device path algebra
//!
//! String transforms between whole-disk and partition device nodes. Two
//! naming conventions exist:
//!
//! - direct: partition digits follow a letters-only disk name (`/dev/sda3`)
//! - separated: the disk name ends in a digit, so a `p` precedes the
//!   partition digits (`/dev/mmcblk0p3`, `/dev/nvme0n1p2`, `/dev/loop0p1`)
//!
//! Inputs that fit neither produce an empty string; nothing here guesses.

use std::fs;
use std::path::Path;

use tracing::debug;

pub const DEVICE_DIR: &str = "/dev";
pub const SYSFS_BLOCK_DIR: &str = "/sys/block";

/// Families whose whole-disk names end in a digit.
const SEPARATED_FAMILIES: &[&str] = &["mmcblk", "nvme", "loop", "nbd", "md", "sr", "ram", "zram"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    Direct,
    Separated,
}

/// A partition device split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionDevice<'a> {
    /// Whole-disk device path, e.g. `/dev/mmcblk0`
    pub disk: &'a str,
    /// Partition digits, e.g. `3`
    pub number: &'a str,
    pub convention: NamingConvention,
}

impl<'a> PartitionDevice<'a> {
    /// Rules are tried in order; the first match wins.
    pub fn parse(path: &'a str) -> Option<Self> {
        let name = device_name(path)?;
        let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
        let number = &name[stem.len()..];
        if number.is_empty() || number.starts_with('0') {
            return None;
        }

        if let Some(disk_name) = stem.strip_suffix('p')
            && disk_name.ends_with(|c: char| c.is_ascii_digit())
            && is_disk_name(disk_name)
        {
            return Some(Self {
                disk: &path[..DEVICE_DIR.len() + 1 + disk_name.len()],
                number,
                convention: NamingConvention::Separated,
            });
        }

        // mmcblk0, nvme0n1, loop7: whole disks, not partition 0/1/7
        if SEPARATED_FAMILIES.iter().any(|family| name.starts_with(family)) {
            return None;
        }

        if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_lowercase()) {
            return Some(Self {
                disk: &path[..path.len() - number.len()],
                number,
                convention: NamingConvention::Direct,
            });
        }

        None
    }

    pub fn number_value(&self) -> Option<u32> {
        self.number.parse().ok()
    }
}

/// Returns the base name of a node directly under `/dev`.
fn device_name(path: &str) -> Option<&str> {
    let name = path.strip_prefix(DEVICE_DIR)?.strip_prefix('/')?;
    if name.is_empty() || name.contains('/') || name.starts_with('.') {
        return None;
    }
    Some(name)
}

fn is_disk_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase())
        && name.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Returns the root device for a partition, e.g. `/dev/sda3` -> `/dev/sda`.
pub fn root_device(partition_device: &str) -> String {
    PartitionDevice::parse(partition_device)
        .map(|part| part.disk.to_string())
        .unwrap_or_default()
}

/// Returns the partition number as text, e.g. `/dev/sda3` -> `3`.
pub fn partition_number(partition_device: &str) -> String {
    PartitionDevice::parse(partition_device)
        .map(|part| part.number.to_string())
        .unwrap_or_default()
}

/// Inverse of [`root_device`] + [`partition_number`].
pub fn make_partition_name(disk: &str, number: u32) -> String {
    let Some(name) = device_name(disk) else {
        return String::new();
    };
    if number == 0 || !is_disk_name(name) {
        return String::new();
    }

    if name.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{disk}p{number}")
    } else {
        format!("{disk}{number}")
    }
}

/// Returns the sysfs entry for a block device, e.g. `/dev/sda` ->
/// `/sys/block/sda`.
pub fn sysfs_block_device(device: &str) -> String {
    device_name(device)
        .map(|name| format!("{SYSFS_BLOCK_DIR}/{name}"))
        .unwrap_or_default()
}

/// Whether the whole-disk `device` reports itself as removable. Unreadable
/// attributes count as not removable.
pub fn is_removable_device(device: &str) -> bool {
    is_removable_device_in(Path::new(SYSFS_BLOCK_DIR), device)
}

pub fn is_removable_device_in(sysfs_block_dir: &Path, device: &str) -> bool {
    let Some(name) = device_name(device) else {
        return false;
    };

    let attribute = sysfs_block_dir.join(name).join("removable");
    match fs::read_to_string(&attribute) {
        Ok(value) => value.trim() == "1",
        Err(e) => {
            debug!("Cannot read {:?}: {}", attribute, e);
            false
        }
    }
}
