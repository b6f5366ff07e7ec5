use bitvec::prelude::*;
use log::debug;

use super::{FsError, Result, DATA_BLOCK_BASE, DATA_BLOCK_COUNT};

/// Hands out data blocks.
///
/// Blocks are never given back: there is no delete, so no `release` either.
pub trait BlockAllocator {
    /// allocate a free data block
    /// # Return
    /// the absolute block address, or [FsError::Exhausted] when nothing is free
    fn allocate_block(&mut self) -> Result<u32>;

    /// check if the data block at absolute address `block` is in use
    fn is_allocated(&self, block: u32) -> bool;

    /// number of data blocks still free
    fn free_blocks(&self) -> usize;
}

/// occupancy of the data region, one entry per data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBitmap {
    occupancy: BitVec,
}

impl Default for BlockBitmap {
    fn default() -> Self {
        BlockBitmap {
            occupancy: bitvec![0; DATA_BLOCK_COUNT],
        }
    }
}

/// conversion from and to the on-disk `block_map`
impl BlockBitmap {
    /// any non-zero entry counts as in use
    pub fn from_block_map(map: &[u16; DATA_BLOCK_COUNT]) -> Self {
        BlockBitmap {
            occupancy: map.iter().map(|entry| *entry != 0).collect(),
        }
    }

    pub fn to_block_map(&self) -> [u16; DATA_BLOCK_COUNT] {
        let mut map = [0u16; DATA_BLOCK_COUNT];
        for index in self.occupancy.iter_ones() {
            map[index] = 1;
        }
        map
    }
}

impl BlockBitmap {
    /// mark the data block at region index `index` as used
    pub fn occupy(&mut self, index: usize) {
        self.occupancy.set(index, true);
    }

    /// absolute addresses of every used block
    pub fn allocated_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.occupancy
            .iter_ones()
            .map(|index| index as u32 + DATA_BLOCK_BASE)
    }

    // region index of an absolute block address
    fn region_index(block: u32) -> Option<usize> {
        let index = block.checked_sub(DATA_BLOCK_BASE)? as usize;
        (index < DATA_BLOCK_COUNT).then_some(index)
    }
}

impl BlockAllocator for BlockBitmap {
    fn allocate_block(&mut self) -> Result<u32> {
        // first fit
        let index = self.occupancy.first_zero().ok_or(FsError::Exhausted)?;
        self.occupy(index);
        let block = index as u32 + DATA_BLOCK_BASE;
        debug!("allocated data block {block} (map index {index})");
        Ok(block)
    }

    fn is_allocated(&self, block: u32) -> bool {
        Self::region_index(block)
            .and_then(|index| self.occupancy.get(index).map(|bit| *bit))
            .unwrap_or(false)
    }

    fn free_blocks(&self) -> usize {
        self.occupancy.count_zeros()
    }
}
