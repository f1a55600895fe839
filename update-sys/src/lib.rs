// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for the update agent
//!
//! This crate provides the pieces an update attempt leans on while it
//! touches disks:
//! - Device and partition path algebra
//! - Boot device discovery
//! - Filesystem size probing from the ext superblock
//! - Synchronous mount/unmount
//! - Exit code reporting to UMA
//! - Scoped guards that release descriptors, files, directories, mounts and
//!   pending action completions exactly once
//!
//! Mounting requires elevated privileges.

pub mod boot;
pub mod config;
pub mod device;
pub mod error;
pub mod guard;
pub mod mount;
pub mod superblock;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testutil;

pub use boot::{boot_device, boot_kernel_device};
pub use config::UtilsConfig;
pub use device::{
    is_removable_device, make_partition_name, partition_number, root_device, sysfs_block_device,
};
pub use error::{Result, SysError};
pub use mount::{MountManager, mount_filesystem, unmount_filesystem};
pub use superblock::{filesystem_size, filesystem_size_from_fd};
pub use telemetry::send_error_code_to_uma;
