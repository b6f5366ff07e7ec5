//! This module contains functions to calculate the size of different fs components

use crate::fs::{BLOCK_SIZE, FS_SIZE_BLOCKS};

/// calculate the size of a region of `block_count` blocks
/// # Arguments
/// - `block_count`: the number of blocks
/// # Return
/// the size in bytes
/// # Example
/// ```
/// use flatfs::utils::fs_size_calculator::region_size;
/// assert_eq!(region_size(3), 3 * 4096);
/// ```
pub const fn region_size(block_count: u32) -> u64 {
    block_count as u64 * BLOCK_SIZE as u64
}

/// calculate the size of an image holding a whole volume
/// # Example
/// ```
/// use flatfs::utils::fs_size_calculator::image_size;
/// assert_eq!(image_size(), 1056 * 4096);
/// ```
pub const fn image_size() -> u64 {
    region_size(FS_SIZE_BLOCKS)
}

/// calculate how many whole blocks fit into `bytes`
/// # Example
/// ```
/// use flatfs::utils::fs_size_calculator::whole_blocks;
/// assert_eq!(whole_blocks(4096 * 2 + 100), 2);
/// assert_eq!(whole_blocks(4095), 0);
/// ```
pub const fn whole_blocks(bytes: u64) -> u64 {
    bytes / BLOCK_SIZE as u64
}

/// calculate how many records of `record_size` bytes one block holds
/// # Example
/// ```
/// use flatfs::utils::fs_size_calculator::records_per_block;
/// use flatfs::{DIR_RECORD_SIZE, DIR_RECORDS_PER_BLOCK};
/// assert_eq!(records_per_block(DIR_RECORD_SIZE), 15);
/// assert_eq!(records_per_block(DIR_RECORD_SIZE), DIR_RECORDS_PER_BLOCK);
/// ```
pub const fn records_per_block(record_size: usize) -> usize {
    BLOCK_SIZE / record_size
}
