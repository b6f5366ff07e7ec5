//! our flat, one-block-per-file filesystem
pub mod allocator;
pub mod check;
pub mod directory;
pub mod error;
pub mod filekind;
pub mod fs_layout;
pub mod inode;
pub mod superblock;
mod fs_api_impl;
pub use allocator::*;
pub use check::*;
pub use directory::*;
pub use error::*;
pub use filekind::*;
pub(crate) use fs_api_impl::*;
pub use fs_layout::*;
pub use inode::*;
pub use superblock::*;

use crate::utils::fs_size_calculator::records_per_block;

/// magic number stored at the start of block 0
pub const FS_MAGIC: u32 = 77;
/// every block on the device has this size
pub const BLOCK_SIZE: usize = 4096;
/// number of entries in the superblock occupancy map
pub const DATA_BLOCK_COUNT: usize = 1023;
/// first block of the data region
pub const DATA_BLOCK_BASE: u32 = 1;
/// first block of the inode table
pub const INODE_BLOCK_BASE: u32 = 1024;
/// one inode per block
pub const INODE_BLOCK_COUNT: u32 = 32;
/// superblock + data region + inode table
pub const FS_SIZE_BLOCKS: u32 = INODE_BLOCK_BASE + INODE_BLOCK_COUNT;
pub const ROOT_INODE: u32 = 0;
/// largest inode number that still has a slot in the inode table
pub const MAX_INODE_NUMBER: u32 = INODE_BLOCK_COUNT - 1;
pub const FILENAME_MAX: usize = 255;
/// `filename[255]`, one byte of padding, `inode_no`
pub const DIR_RECORD_SIZE: usize = 260;
pub const DIR_RECORDS_PER_BLOCK: usize = records_per_block(DIR_RECORD_SIZE);
/// on-disk `type` values
pub const FILE_TYPE_DIR: u32 = 1;
pub const FILE_TYPE_FILE: u32 = 2;
