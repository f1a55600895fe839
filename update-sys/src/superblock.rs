// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem size from the ext2/3/4 superblock
//!
//! Reads the primary superblock in place; nothing is mounted and the
//! target is never written.

use std::fs::File;
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::path::Path;

use nix::errno::Errno;
use nix::sys::uio::pread;
use tracing::debug;
use update_types::FilesystemSize;

use crate::error::{Result, SysError};

const SUPERBLOCK_OFFSET: u64 = 1024;
const SUPERBLOCK_SIZE: usize = 1024;

const EXT2_SUPER_MAGIC: u16 = 0xEF53;
const EXT4_FEATURE_INCOMPAT_64BIT: u32 = 0x0080;
// 64 KiB blocks
const MAX_LOG_BLOCK_SIZE: u32 = 6;

// Field offsets within the superblock
const S_BLOCKS_COUNT: usize = 0x04;
const S_LOG_BLOCK_SIZE: usize = 0x18;
const S_MAGIC: usize = 0x38;
const S_FEATURE_INCOMPAT: usize = 0x60;
const S_BLOCKS_COUNT_HI: usize = 0x150;

// Bytes needed for the fields above, with and without the 64-bit feature
const SIZING_FIELDS_END: usize = S_FEATURE_INCOMPAT + 4;
const SIZING_FIELDS_END_64BIT: usize = S_BLOCKS_COUNT_HI + 4;

/// Block count and block size of the filesystem on `device` (a block device
/// or an image file).
pub fn filesystem_size(device: &Path) -> Result<FilesystemSize> {
    let file = File::open(device).map_err(|source| SysError::DeviceOpen {
        path: device.to_path_buf(),
        source,
    })?;

    let size = filesystem_size_from_fd(file.as_fd())?;
    debug!(
        "{:?}: {} blocks of {} bytes",
        device, size.block_count, size.block_size
    );
    Ok(size)
}

/// Same as [`filesystem_size`] on a descriptor the caller already holds.
///
/// Uses positional reads, so the descriptor's offset is untouched and it
/// stays open. Only the sizing fields have to be present; a superblock cut
/// short after them is accepted.
pub fn filesystem_size_from_fd(fd: BorrowedFd<'_>) -> Result<FilesystemSize> {
    let mut superblock = [0u8; SUPERBLOCK_SIZE];
    let read = pread_all(fd, &mut superblock, SUPERBLOCK_OFFSET)?;
    parse_superblock(&superblock[..read])
}

/// `pread` until `buf` is full or EOF. Returns the number of bytes read.
fn pread_all(fd: BorrowedFd<'_>, buf: &mut [u8], offset: u64) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let position = offset
            .checked_add(total as u64)
            .and_then(|position| libc::off_t::try_from(position).ok())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("offset {offset} out of range"),
                )
            })?;
        match pread(fd, &mut buf[total..], position) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(SysError::Io(e.into())),
        }
    }
    Ok(total)
}

fn parse_superblock(superblock: &[u8]) -> Result<FilesystemSize> {
    require_len(superblock, SIZING_FIELDS_END)?;

    let magic = le_u16(superblock, S_MAGIC);
    if magic != EXT2_SUPER_MAGIC {
        return Err(SysError::NotExtFilesystem { magic });
    }

    let log_block_size = le_u32(superblock, S_LOG_BLOCK_SIZE);
    if log_block_size > MAX_LOG_BLOCK_SIZE {
        return Err(SysError::CorruptSuperblock(format!(
            "log block size {log_block_size} out of range"
        )));
    }

    let mut block_count = u64::from(le_u32(superblock, S_BLOCKS_COUNT));
    if le_u32(superblock, S_FEATURE_INCOMPAT) & EXT4_FEATURE_INCOMPAT_64BIT != 0 {
        require_len(superblock, SIZING_FIELDS_END_64BIT)?;
        block_count |= u64::from(le_u32(superblock, S_BLOCKS_COUNT_HI)) << 32;
    }
    if block_count == 0 {
        return Err(SysError::CorruptSuperblock("zero blocks".to_string()));
    }

    Ok(FilesystemSize {
        block_count,
        block_size: 1024 << log_block_size,
    })
}

fn require_len(superblock: &[u8], needed: usize) -> Result<()> {
    if superblock.len() < needed {
        return Err(SysError::CorruptSuperblock(format!(
            "short read: {} of {needed} bytes",
            superblock.len()
        )));
    }
    Ok(())
}

fn le_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn le_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
