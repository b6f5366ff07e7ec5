use bincode::{Decode, Encode};

use crate::utils::traits::OnDisk;

use super::{filekind::FileKind, FsError, Result, BLOCK_SIZE};

/// one inode-table block exactly as it is laid out on the device
#[derive(Debug, Clone, Encode, Decode)]
struct RawInode {
    inode_num: u32,
    data_block_num: u32,
    file_size: u32,
    dir_child_count: u32,
    file_type: u32,
}

impl OnDisk for RawInode {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub inode_number: u32,
    /// absolute address of the only data block of this inode
    pub data_block: u32,
    pub file_size: u32,
    /// valid directory records in the data block, always 0 for files
    pub child_count: u32,
    pub file_kind: FileKind,
}

impl Inode {
    /// a fresh, empty inode owning `data_block`
    pub fn new(inode_number: u32, file_kind: FileKind, data_block: u32) -> Self {
        Inode {
            inode_number,
            data_block,
            file_size: 0,
            child_count: 0,
            file_kind,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_kind == FileKind::Directory
    }

    #[inline]
    pub fn is_regular_file(&self) -> bool {
        self.file_kind == FileKind::RegularFile
    }
}

/// This block is about serialization and deserialization
impl Inode {
    /// encode into a full, zero padded inode-table block
    pub fn to_block(&self, slot: u32) -> Result<Vec<u8>> {
        let raw = RawInode {
            inode_num: self.inode_number,
            data_block_num: self.data_block,
            file_size: self.file_size,
            dir_child_count: self.child_count,
            file_type: self.file_kind.code(),
        };
        let mut block = vec![0u8; BLOCK_SIZE];
        raw.encode_into(&mut block)
            .map_err(|e| FsError::corrupt(slot, e))?;
        Ok(block)
    }

    /// decode the inode stored in inode-table block `slot`
    pub fn from_block(block: &[u8], slot: u32) -> Result<Self> {
        let raw = RawInode::decode_from(block).map_err(|e| FsError::corrupt(slot, e))?;
        let file_kind = FileKind::from_code(raw.file_type).ok_or_else(|| {
            FsError::corrupt(slot, format!("unknown inode type {}", raw.file_type))
        })?;
        Ok(Inode {
            inode_number: raw.inode_num,
            data_block: raw.data_block_num,
            file_size: raw.file_size,
            child_count: raw.dir_child_count,
            file_kind,
        })
    }
}
