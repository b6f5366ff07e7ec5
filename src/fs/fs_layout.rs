//! what does our filesystem look like in the memory
//!
//! A mounted volume is the device plus two pieces of cached metadata: the
//! superblock and the inodes handed out so far. All of it sits behind one
//! mutex, so operations on a volume never interleave.

use log::{debug, info, warn};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    ffi::{OsStr, OsString},
};

use crate::device::BlockDevice;

use super::{
    validate_name, BlockAllocator, DirEntry, Directory, FileKind, FsError, Inode, Result,
    SuperBlock, BLOCK_SIZE, DATA_BLOCK_BASE, DATA_BLOCK_COUNT, FS_SIZE_BLOCKS, INODE_BLOCK_BASE,
    INODE_BLOCK_COUNT, MAX_INODE_NUMBER, ROOT_INODE,
};

/// a reference to an inode of a mounted volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeHandle {
    number: u32,
    kind: FileKind,
}

impl InodeHandle {
    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[inline]
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

impl From<&Inode> for InodeHandle {
    fn from(inode: &Inode) -> Self {
        InodeHandle {
            number: inode.inode_number,
            kind: inode.file_kind,
        }
    }
}

/// usage figures of a mounted volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    pub total_blocks: u32,
    pub data_blocks: u32,
    pub free_blocks: u32,
    pub inode_count: u32,
    pub free_inodes: u32,
}

/// write the layout of an empty volume: superblock, root data block and root inode
pub fn format<D: BlockDevice>(device: &mut D) -> Result<()> {
    if device.block_count() < FS_SIZE_BLOCKS as u64 {
        return Err(FsError::Format(format!(
            "device has {} blocks, at least {FS_SIZE_BLOCKS} are needed",
            device.block_count()
        )));
    }
    let superblock = SuperBlock::default();
    device.write_block(0, &superblock.to_block()?)?;
    device.sync_block(0)?;

    // zero records, whatever the block held before
    device.write_block(DATA_BLOCK_BASE, &[0u8; BLOCK_SIZE])?;
    device.sync_block(DATA_BLOCK_BASE)?;

    let root = Inode::new(ROOT_INODE, FileKind::Directory, DATA_BLOCK_BASE);
    let slot = INODE_BLOCK_BASE + ROOT_INODE;
    device.write_block(slot, &root.to_block(slot)?)?;
    device.sync_block(slot)?;
    info!("formatted an empty volume of {FS_SIZE_BLOCKS} blocks");
    Ok(())
}

/// A mounted volume.
///
/// it has the following layout:
/// - superblock (block 0)
/// - data blocks (blocks 1..1024)
/// - inode table (blocks 1024..1056, one inode per block)
#[derive(Debug)]
pub struct FlatFS<D> {
    volume: Mutex<Volume<D>>,
}

#[derive(Debug)]
struct Volume<D> {
    /// the "device" the volume lives on
    device: D,
    /// in-memory copy of block 0, only replaced after block 0 was written
    superblock: SuperBlock,
    /// inodes we already know about, always equal to their on-disk slot
    inodes: HashMap<u32, Inode>,
}

impl<D: BlockDevice> FlatFS<D> {
    /// validate the superblock on `device` and load the root directory
    pub fn mount(device: D) -> Result<Self> {
        if device.block_count() < FS_SIZE_BLOCKS as u64 {
            warn!(
                "refusing to mount a device of {} blocks",
                device.block_count()
            );
            return Err(FsError::Format(format!(
                "device has {} blocks, a volume needs {FS_SIZE_BLOCKS}",
                device.block_count()
            )));
        }
        let mut block = vec![0u8; BLOCK_SIZE];
        device.read_block(0, &mut block)?;
        let superblock = SuperBlock::from_block(&block).map_err(|e| {
            warn!("refusing to mount: {e}");
            e
        })?;
        if superblock.fs_size != FS_SIZE_BLOCKS {
            return Err(FsError::Format(format!(
                "volume declares {} blocks, expected {FS_SIZE_BLOCKS}",
                superblock.fs_size
            )));
        }

        let mut volume = Volume {
            device,
            superblock,
            inodes: HashMap::new(),
        };
        let root = volume.read_inode(ROOT_INODE)?;
        if !root.is_dir() {
            return Err(FsError::Format("root inode is not a directory".into()));
        }
        volume.inodes.insert(ROOT_INODE, root);
        info!(
            "mounted volume: {} inodes in use, {} free data blocks",
            volume.superblock.inode_count(),
            volume.superblock.block_map().free_blocks()
        );
        Ok(FlatFS {
            volume: Mutex::new(volume),
        })
    }

    /// handle of the root directory
    pub fn root(&self) -> InodeHandle {
        InodeHandle {
            number: ROOT_INODE,
            kind: FileKind::Directory,
        }
    }

    /// handle of an inode given its number
    pub fn handle(&self, number: u32) -> Result<InodeHandle> {
        let inode = self.volume.lock().cached_inode(number)?;
        Ok(InodeHandle::from(&inode))
    }

    /// the current metadata of an inode
    pub fn inode(&self, number: u32) -> Result<Inode> {
        self.volume.lock().cached_inode(number)
    }

    /// every (name, inode number) record of `dir`, in the order they were added
    pub fn list(&self, dir: &InodeHandle) -> Result<Vec<DirEntry>> {
        let mut volume = self.volume.lock();
        let (_, directory) = volume.load_dir(dir.number)?;
        directory.entries()
    }

    /// find the child of `parent` called `name`
    pub fn lookup(&self, parent: &InodeHandle, name: impl AsRef<OsStr>) -> Result<InodeHandle> {
        let name = name.as_ref();
        let mut volume = self.volume.lock();
        let (_, directory) = volume.load_dir(parent.number)?;
        let number = directory
            .entry(name)?
            .ok_or_else(|| FsError::NotFound(name.to_string_lossy().into_owned()))?;
        let inode = volume.cached_inode(number)?;
        Ok(InodeHandle::from(&inode))
    }

    /// create an empty regular file in `parent`
    pub fn create(&self, parent: &InodeHandle, name: impl AsRef<OsStr>) -> Result<InodeHandle> {
        self.volume
            .lock()
            .create(parent.number, name.as_ref(), FileKind::RegularFile)
    }

    /// create an empty directory in `parent`
    pub fn mkdir(&self, parent: &InodeHandle, name: impl AsRef<OsStr>) -> Result<InodeHandle> {
        self.volume
            .lock()
            .create(parent.number, name.as_ref(), FileKind::Directory)
    }

    pub fn statfs(&self) -> FsStats {
        let volume = self.volume.lock();
        let superblock = &volume.superblock;
        FsStats {
            total_blocks: superblock.fs_size,
            data_blocks: DATA_BLOCK_COUNT as u32,
            free_blocks: superblock.block_map().free_blocks() as u32,
            inode_count: superblock.inode_count(),
            free_inodes: MAX_INODE_NUMBER - superblock.inode_count(),
        }
    }

    /// a copy of the cached superblock
    pub fn superblock(&self) -> SuperBlock {
        self.volume.lock().superblock.clone()
    }

    /// flush the device, for unmount
    pub fn flush(&self) -> Result<()> {
        Ok(self.volume.lock().device.flush()?)
    }

    /// unmount, giving the device back
    pub fn into_device(self) -> D {
        self.volume.into_inner().device
    }

    /// run `f` with the volume locked, for read-only walks like [FlatFS::check]
    pub(crate) fn with_volume<T>(&self, f: impl FnOnce(&mut VolumeView<'_, D>) -> T) -> T {
        let mut volume = self.volume.lock();
        let mut view = VolumeView {
            volume: &mut *volume,
        };
        f(&mut view)
    }
}

/// read access to a locked volume for the consistency check
pub(crate) struct VolumeView<'a, D> {
    volume: &'a mut Volume<D>,
}

impl<D: BlockDevice> VolumeView<'_, D> {
    pub(crate) fn superblock(&self) -> &SuperBlock {
        &self.volume.superblock
    }

    pub(crate) fn inode(&mut self, number: u32) -> Result<Inode> {
        self.volume.cached_inode(number)
    }

    pub(crate) fn directory(&mut self, number: u32) -> Result<Directory> {
        self.volume.load_dir(number).map(|(_, directory)| directory)
    }
}

/// device access, every write is synced before it counts
impl<D: BlockDevice> Volume<D> {
    fn read_block(&self, index: u32) -> Result<Vec<u8>> {
        let mut block = vec![0u8; BLOCK_SIZE];
        self.device.read_block(index, &mut block)?;
        Ok(block)
    }

    fn write_block(&mut self, index: u32, block: &[u8]) -> Result<()> {
        self.device.write_block(index, block)?;
        self.device.sync_block(index)?;
        Ok(())
    }

    fn write_superblock(&mut self, superblock: &SuperBlock) -> Result<()> {
        self.write_block(0, &superblock.to_block()?)
    }

    // inode-table block of inode `number`
    fn inode_slot(number: u32) -> Result<u32> {
        if number >= INODE_BLOCK_COUNT {
            return Err(FsError::corrupt(
                INODE_BLOCK_BASE,
                format!("inode number {number} is outside the inode table"),
            ));
        }
        Ok(INODE_BLOCK_BASE + number)
    }

    // reject data block pointers that leave the data region
    fn check_data_block(inode: &Inode) -> Result<u32> {
        let block = inode.data_block;
        if !(DATA_BLOCK_BASE..DATA_BLOCK_BASE + DATA_BLOCK_COUNT as u32).contains(&block) {
            return Err(FsError::corrupt(
                INODE_BLOCK_BASE + inode.inode_number,
                format!("data block {block} is outside the data region"),
            ));
        }
        Ok(block)
    }
}

/// [Inode] operations
impl<D: BlockDevice> Volume<D> {
    /// bump the inode counter on disk and return the new inode number
    fn next_inode_number(&mut self) -> Result<u32> {
        let mut superblock = self.superblock.clone();
        let number = superblock.bump_inode_count()?;
        self.write_superblock(&superblock)?;
        self.superblock = superblock;
        Ok(number)
    }

    fn write_inode(&mut self, inode: &Inode) -> Result<()> {
        let slot = Self::inode_slot(inode.inode_number)?;
        self.write_block(slot, &inode.to_block(slot)?)
    }

    fn read_inode(&self, number: u32) -> Result<Inode> {
        let slot = Self::inode_slot(number)?;
        let inode = Inode::from_block(&self.read_block(slot)?, slot)?;
        if inode.inode_number != number {
            return Err(FsError::corrupt(
                slot,
                format!("slot of inode {number} holds inode {}", inode.inode_number),
            ));
        }
        Self::check_data_block(&inode)?;
        Ok(inode)
    }

    /// the cached inode, read from disk on first use
    fn cached_inode(&mut self, number: u32) -> Result<Inode> {
        if let Some(inode) = self.inodes.get(&number) {
            return Ok(*inode);
        }
        // numbers are handed out from 2 upwards, root is 0
        let handed_out = number == ROOT_INODE
            || (ROOT_INODE + 2..=self.superblock.inode_count()).contains(&number);
        if !handed_out {
            return Err(FsError::NotFound(format!("inode {number}")));
        }
        let inode = self.read_inode(number)?;
        self.inodes.insert(number, inode);
        Ok(inode)
    }
}

/// directory and data block operations
impl<D: BlockDevice> Volume<D> {
    fn allocate_block(&mut self) -> Result<u32> {
        let mut superblock = self.superblock.clone();
        let block = superblock.block_map_mut().allocate_block()?;
        self.write_superblock(&superblock)?;
        self.superblock = superblock;
        Ok(block)
    }

    fn load_dir(&mut self, number: u32) -> Result<(Inode, Directory)> {
        let inode = self.cached_inode(number)?;
        if !inode.is_dir() {
            return Err(FsError::NotADirectory(number));
        }
        let block = self.read_block(Self::check_data_block(&inode)?)?;
        let directory = Directory::new(&inode, block)?;
        Ok((inode, directory))
    }

    /// add a record to `directory` and persist the block, then the parent inode
    fn append(&mut self, mut parent: Inode, directory: &mut Directory, entry: &DirEntry) -> Result<()> {
        parent.child_count = directory.append(entry)?;
        debug!(
            "directory {} record {} -> {:?} (inode {})",
            parent.inode_number,
            parent.child_count - 1,
            entry.name,
            entry.inode_number
        );
        self.write_block(parent.data_block, directory.as_block())?;
        self.write_inode(&parent)?;
        // both copies on disk, now memory may follow
        self.inodes.insert(parent.inode_number, parent);
        Ok(())
    }

    /// create a file or directory called `name` in directory `parent`
    fn create(&mut self, parent: u32, name: &OsStr, kind: FileKind) -> Result<InodeHandle> {
        let (parent_inode, mut directory) = self.load_dir(parent)?;
        validate_name(name)?;
        if directory.entry(name)?.is_some() {
            return Err(FsError::AlreadyExists(name.to_string_lossy().into_owned()));
        }
        if directory.is_full() {
            return Err(FsError::DirectoryFull { inode: parent });
        }

        let count = self.superblock.inode_count();
        let number = self.next_inode_number()?;
        info!("there are {count} inodes, creating {kind:?} {name:?} as inode {number}");

        // an exhausted volume keeps the inode number burnt
        let data_block = self.allocate_block()?;
        self.write_block(data_block, &[0u8; BLOCK_SIZE])?;

        let inode = Inode::new(number, kind, data_block);
        self.write_inode(&inode)?;

        self.append(
            parent_inode,
            &mut directory,
            &DirEntry::new(OsString::from(name), number),
        )?;
        self.inodes.insert(number, inode);
        Ok(InodeHandle::from(&inode))
    }
}
