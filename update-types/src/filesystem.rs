// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Geometry read from an ext2-family superblock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemSize {
    /// Total number of blocks
    pub block_count: u64,

    /// Block size in bytes
    pub block_size: u32,
}

impl FilesystemSize {
    /// Addressable size of the filesystem in bytes
    pub fn total_bytes(&self) -> u64 {
        self.block_count.saturating_mul(u64::from(self.block_size))
    }
}
