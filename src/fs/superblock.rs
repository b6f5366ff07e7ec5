use bincode::{Decode, Encode};

use crate::utils::traits::OnDisk;

use super::{
    BlockBitmap, FsError, Result, BLOCK_SIZE, DATA_BLOCK_COUNT, FS_MAGIC, FS_SIZE_BLOCKS,
    MAX_INODE_NUMBER,
};

/// block 0 exactly as it is laid out on the device
#[derive(Debug, Clone, Encode, Decode)]
struct RawSuperBlock {
    magic_num: u32,
    fs_size: u32,
    inode_count: u32,
    block_map: [u16; DATA_BLOCK_COUNT],
}

impl OnDisk for RawSuperBlock {}

/// The superblock of this filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    /// magic number
    pub magic: u32,
    /// declared size of the volume in blocks
    pub fs_size: u32,
    /// inodes handed out so far, root included
    inode_count: u32,
    /// which data blocks are in use
    block_map: BlockBitmap,
}

impl Default for SuperBlock {
    /// the superblock of an empty volume: root holds inode 0 and the first data block
    fn default() -> Self {
        let mut block_map = BlockBitmap::default();
        block_map.occupy(0);
        SuperBlock {
            magic: FS_MAGIC,
            fs_size: FS_SIZE_BLOCKS,
            inode_count: 1,
            block_map,
        }
    }
}

/// for serialize and deserialize
impl SuperBlock {
    /// encode into a full, zero padded block
    pub fn to_block(&self) -> Result<Vec<u8>> {
        let raw = RawSuperBlock {
            magic_num: self.magic,
            fs_size: self.fs_size,
            inode_count: self.inode_count,
            block_map: self.block_map.to_block_map(),
        };
        let mut block = vec![0u8; BLOCK_SIZE];
        raw.encode_into(&mut block)
            .map_err(|e| FsError::corrupt(0, e))?;
        Ok(block)
    }

    /// decode block 0, rejecting anything that is not one of our volumes
    pub fn from_block(block: &[u8]) -> Result<Self> {
        let raw = RawSuperBlock::decode_from(block)
            .map_err(|e| FsError::Format(format!("unreadable superblock: {e}")))?;
        if raw.magic_num != FS_MAGIC {
            return Err(FsError::Format(format!(
                "magic number is {}, expected {FS_MAGIC}",
                raw.magic_num
            )));
        }
        if raw.inode_count > MAX_INODE_NUMBER {
            return Err(FsError::corrupt(
                0,
                format!("inode count {} exceeds the inode table", raw.inode_count),
            ));
        }
        Ok(SuperBlock {
            magic: raw.magic_num,
            fs_size: raw.fs_size,
            inode_count: raw.inode_count,
            block_map: BlockBitmap::from_block_map(&raw.block_map),
        })
    }
}

impl SuperBlock {
    #[inline]
    pub fn inode_count(&self) -> u32 {
        self.inode_count
    }

    /// bump the inode counter and return the new value as the next inode number
    pub fn bump_inode_count(&mut self) -> Result<u32> {
        if self.inode_count >= MAX_INODE_NUMBER {
            return Err(FsError::NoFreeInodes);
        }
        self.inode_count += 1;
        Ok(self.inode_count)
    }

    #[inline]
    pub fn block_map(&self) -> &BlockBitmap {
        &self.block_map
    }

    #[inline]
    pub fn block_map_mut(&mut self) -> &mut BlockBitmap {
        &mut self.block_map
    }
}
