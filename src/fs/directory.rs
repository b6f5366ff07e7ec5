use bincode::{Decode, Encode};

use std::ffi::{OsStr, OsString};
use std::os::unix::prelude::{OsStrExt, OsStringExt};

use crate::utils::traits::OnDisk;

use super::{
    FsError, Inode, Result, BLOCK_SIZE, DIR_RECORDS_PER_BLOCK, DIR_RECORD_SIZE, FILENAME_MAX,
};

/// one directory record exactly as it is laid out on the device
#[derive(Debug, Clone, Encode, Decode)]
struct RawDirRecord {
    /// NUL padded, not terminated when all 255 bytes are used
    filename: [u8; FILENAME_MAX],
    padding: u8,
    inode_no: u32,
}

impl OnDisk for RawDirRecord {}

/// a (name, inode number) pair read from or written to a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub inode_number: u32,
}

impl DirEntry {
    pub fn new(name: impl Into<OsString>, inode_number: u32) -> Self {
        DirEntry {
            name: name.into(),
            inode_number,
        }
    }
}

/// check that `name` fits in a record and can be told apart from the padding
pub fn validate_name(name: &OsStr) -> Result<()> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.contains(&0) || bytes.contains(&b'/') {
        return Err(FsError::InvalidName(name.to_string_lossy().into_owned()));
    }
    if bytes.len() > FILENAME_MAX {
        return Err(FsError::NameTooLong(bytes.len()));
    }
    Ok(())
}

/// The record array stored in a directory's only data block.
///
/// Holds a private copy of the block; nothing reaches the device until the
/// caller writes [Directory::as_block] back.
#[derive(Debug)]
pub struct Directory {
    inode_number: u32,
    address: u32,
    child_count: u32,
    block: Vec<u8>,
}

impl Directory {
    /// wrap the data block `block` that was read from `inode.data_block`
    pub fn new(inode: &Inode, block: Vec<u8>) -> Result<Self> {
        if !inode.is_dir() {
            return Err(FsError::NotADirectory(inode.inode_number));
        }
        if inode.child_count as usize > DIR_RECORDS_PER_BLOCK {
            return Err(FsError::corrupt(
                inode.data_block,
                format!(
                    "directory {} claims {} records",
                    inode.inode_number, inode.child_count
                ),
            ));
        }
        debug_assert_eq!(block.len(), BLOCK_SIZE);
        Ok(Directory {
            inode_number: inode.inode_number,
            address: inode.data_block,
            child_count: inode.child_count,
            block,
        })
    }

    #[inline]
    pub fn child_count(&self) -> u32 {
        self.child_count
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.child_count as usize >= DIR_RECORDS_PER_BLOCK
    }

    /// the (possibly modified) data block
    pub fn as_block(&self) -> &[u8] {
        &self.block
    }

    /// all valid records, in the order they were appended
    pub fn entries(&self) -> Result<Vec<DirEntry>> {
        (0..self.child_count as usize)
            .map(|index| self.record(index))
            .collect()
    }

    /// inode number of the child called `name`
    pub fn entry(&self, name: &OsStr) -> Result<Option<u32>> {
        for index in 0..self.child_count as usize {
            let entry = self.record(index)?;
            if entry.name.as_os_str() == name {
                return Ok(Some(entry.inode_number));
            }
        }
        Ok(None)
    }

    /// write a record right after the last valid one
    /// # Return
    /// the new child count; the inode carrying it is the caller's to persist
    pub fn append(&mut self, entry: &DirEntry) -> Result<u32> {
        validate_name(&entry.name)?;
        if self.is_full() {
            return Err(FsError::DirectoryFull {
                inode: self.inode_number,
            });
        }
        let mut filename = [0u8; FILENAME_MAX];
        let bytes = entry.name.as_bytes();
        filename[..bytes.len()].copy_from_slice(bytes);
        let record = RawDirRecord {
            filename,
            padding: 0,
            inode_no: entry.inode_number,
        };
        let offset = self.child_count as usize * DIR_RECORD_SIZE;
        record
            .encode_into(&mut self.block[offset..offset + DIR_RECORD_SIZE])
            .map_err(|e| FsError::corrupt(self.address, e))?;
        self.child_count += 1;
        Ok(self.child_count)
    }

    fn record(&self, index: usize) -> Result<DirEntry> {
        let offset = index * DIR_RECORD_SIZE;
        let record = RawDirRecord::decode_from(&self.block[offset..offset + DIR_RECORD_SIZE])
            .map_err(|e| FsError::corrupt(self.address, e))?;
        let len = record
            .filename
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(FILENAME_MAX);
        Ok(DirEntry {
            name: OsString::from_vec(record.filename[..len].to_vec()),
            inode_number: record.inode_no,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileKind, DATA_BLOCK_BASE};

    fn empty_dir() -> Directory {
        let inode = Inode::new(0, FileKind::Directory, DATA_BLOCK_BASE);
        Directory::new(&inode, vec![0u8; BLOCK_SIZE]).unwrap()
    }

    #[test]
    fn test_record_layout() {
        let mut dir = empty_dir();
        dir.append(&DirEntry::new("a.txt", 2)).unwrap();
        dir.append(&DirEntry::new("b.txt", 3)).unwrap();
        let block = dir.as_block();
        assert_eq!(&block[0..5], b"a.txt");
        assert!(block[5..256].iter().all(|byte| *byte == 0));
        assert_eq!(&block[256..260], &2u32.to_le_bytes());
        assert_eq!(&block[260..265], b"b.txt");
        assert_eq!(&block[516..520], &3u32.to_le_bytes());
    }

    #[test]
    fn test_entries_in_append_order() {
        let mut dir = empty_dir();
        for (i, name) in ["zeta", "alpha", "mid"].iter().enumerate() {
            assert_eq!(dir.append(&DirEntry::new(name, i as u32 + 2)).unwrap(), i as u32 + 1);
        }
        assert_eq!(
            dir.entries().unwrap(),
            vec![
                DirEntry::new("zeta", 2),
                DirEntry::new("alpha", 3),
                DirEntry::new("mid", 4),
            ]
        );
        assert_eq!(dir.entry(OsStr::new("alpha")).unwrap(), Some(3));
        assert_eq!(dir.entry(OsStr::new("alp")).unwrap(), None);
    }

    #[test]
    fn test_only_child_count_records_are_valid() {
        // bytes past the last valid record are not entries
        let mut block = vec![0u8; BLOCK_SIZE];
        block[..3].copy_from_slice(b"old");
        block[256..260].copy_from_slice(&9u32.to_le_bytes());
        let inode = Inode::new(0, FileKind::Directory, DATA_BLOCK_BASE);
        let dir = Directory::new(&inode, block).unwrap();
        assert!(dir.entries().unwrap().is_empty());
        assert_eq!(dir.entry(OsStr::new("old")).unwrap(), None);
    }

    #[test]
    fn test_full_length_name() {
        let name = "n".repeat(FILENAME_MAX);
        let mut dir = empty_dir();
        dir.append(&DirEntry::new(name.as_str(), 2)).unwrap();
        assert_eq!(dir.entries().unwrap(), vec![DirEntry::new(name.as_str(), 2)]);
        assert!(matches!(
            dir.append(&DirEntry::new("n".repeat(FILENAME_MAX + 1), 3)),
            Err(FsError::NameTooLong(256))
        ));
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "a/b", "nul\0byte"] {
            assert!(matches!(
                validate_name(OsStr::new(name)),
                Err(FsError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_directory_full() {
        let mut dir = empty_dir();
        for i in 0..DIR_RECORDS_PER_BLOCK {
            dir.append(&DirEntry::new(format!("f{i}"), i as u32 + 2)).unwrap();
        }
        assert!(dir.is_full());
        let before = dir.as_block().to_vec();
        assert!(matches!(
            dir.append(&DirEntry::new("one-too-many", 99)),
            Err(FsError::DirectoryFull { inode: 0 })
        ));
        assert_eq!(dir.as_block(), before.as_slice());
        assert_eq!(dir.entries().unwrap().len(), DIR_RECORDS_PER_BLOCK);
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let inode = Inode::new(4, FileKind::RegularFile, DATA_BLOCK_BASE + 3);
        assert!(matches!(
            Directory::new(&inode, vec![0u8; BLOCK_SIZE]),
            Err(FsError::NotADirectory(4))
        ));
    }
}
