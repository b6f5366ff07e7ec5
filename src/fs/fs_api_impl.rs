use std::{
    ffi::OsStr,
    time::{Duration, UNIX_EPOCH},
};

use fuser::{FileAttr, Filesystem};
use log::{info, warn};

use crate::device::BlockDevice;

use super::{FileKind, FlatFS, FsError, Inode, BLOCK_SIZE, FILENAME_MAX, ROOT_INODE};

/// the inode number the kernel uses for the root of every FUSE mount
const FUSE_ROOT_INO: u64 = 1;

/// map a volume inode number to the number the kernel sees
///
/// the root is inode 0 on disk and 1 for FUSE; inode 1 is never handed out,
/// so every other number can pass through
pub(crate) fn to_fuse_ino(number: u32) -> u64 {
    if number == ROOT_INODE {
        FUSE_ROOT_INO
    } else {
        number as u64
    }
}

pub(crate) fn from_fuse_ino(ino: u64) -> Option<u32> {
    match ino {
        FUSE_ROOT_INO => Some(ROOT_INODE),
        0 => None,
        ino => u32::try_from(ino).ok(),
    }
}

/// a mounted volume registered to `FUSE`
#[derive(Debug)]
pub struct FuseFS<D> {
    fs: FlatFS<D>,
    uid: u32,
    gid: u32,
}

impl<D: BlockDevice> FuseFS<D> {
    /// every inode is reported as owned by `uid`/`gid`
    pub fn new(fs: FlatFS<D>, uid: u32, gid: u32) -> Self {
        FuseFS { fs, uid, gid }
    }

    fn attr(&self, inode: &Inode) -> FileAttr {
        let (perm, nlink) = match inode.file_kind {
            FileKind::Directory => (0o777, 2),
            FileKind::RegularFile => (0o666, 1),
        };
        FileAttr {
            ino: to_fuse_ino(inode.inode_number),
            size: inode.file_size as u64,
            blocks: 1,
            // no timestamps on disk
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
            kind: inode.file_kind.into(),
            perm,
            nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE as u32,
            flags: 0,
        }
    }

    fn find_inode(&self, ino: u64) -> Result<Inode, FsError> {
        let number = from_fuse_ino(ino).ok_or_else(|| FsError::NotFound(format!("ino {ino}")))?;
        self.fs.inode(number)
    }

    fn new_entry(&self, parent: u64, name: &OsStr, kind: FileKind) -> Result<FileAttr, FsError> {
        let parent = from_fuse_ino(parent)
            .ok_or_else(|| FsError::NotFound(format!("ino {parent}")))?;
        let parent = self.fs.handle(parent)?;
        let handle = match kind {
            FileKind::RegularFile => self.fs.create(&parent, name)?,
            FileKind::Directory => self.fs.mkdir(&parent, name)?,
        };
        Ok(self.attr(&self.fs.inode(handle.number())?))
    }
}

impl<D: BlockDevice> Filesystem for FuseFS<D> {
    fn init(
        &mut self,
        _req: &fuser::Request<'_>,
        _config: &mut fuser::KernelConfig,
    ) -> Result<(), libc::c_int> {
        let stats = self.fs.statfs();
        info!(
            "init(): {} inodes in use, {} free data blocks",
            stats.inode_count, stats.free_blocks
        );
        Ok(())
    }

    // to umount the filesystem
    fn destroy(&mut self) {
        if let Err(e) = self.fs.flush() {
            warn!("flushing the image on unmount failed: {e}");
        }
    }

    // to show FS information
    fn statfs(&mut self, _req: &fuser::Request<'_>, _ino: u64, reply: fuser::ReplyStatfs) {
        let stats = self.fs.statfs();
        reply.statfs(
            stats.total_blocks as u64,
            stats.free_blocks as u64,
            stats.free_blocks as u64,
            stats.inode_count as u64,
            stats.free_inodes as u64,
            BLOCK_SIZE as u32,
            FILENAME_MAX as u32,
            BLOCK_SIZE as u32,
        )
    }

    fn getattr(&mut self, _req: &fuser::Request<'_>, ino: u64, reply: fuser::ReplyAttr) {
        info!("getattr() called with inode number: {:?}", ino);
        let ttl = Duration::new(0, 0);
        let inode = match self.find_inode(ino) {
            Ok(inode) => inode,
            Err(e) => {
                reply.error(e.to_errno());
                return;
            }
        };
        reply.attr(&ttl, &self.attr(&inode));
    }

    fn readdir(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: fuser::ReplyDirectory,
    ) {
        info!("readdir() called with inode number: {ino}");
        if offset < 0 {
            reply.error(libc::EINVAL);
            return;
        }
        let Some(number) = from_fuse_ino(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let entries = match self.fs.handle(number).and_then(|dir| self.fs.list(&dir)) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(e.to_errno());
                return;
            }
        };
        for (index, entry) in entries.iter().enumerate().skip(offset as usize) {
            let Ok(child) = self.fs.inode(entry.inode_number) else {
                reply.error(libc::EIO);
                return;
            };
            let buffer_full: bool = reply.add(
                to_fuse_ino(entry.inode_number),
                index as i64 + 1,
                child.file_kind.into(),
                &entry.name,
            );

            if buffer_full {
                break;
            }
        }
        reply.ok();
    }

    // to look up a file
    fn lookup(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        reply: fuser::ReplyEntry,
    ) {
        info!("lookup() called with parent inode number: {parent} and name: {name:?}");
        let ttl = Duration::new(0, 0);
        let found = from_fuse_ino(parent)
            .ok_or_else(|| FsError::NotFound(format!("ino {parent}")))
            .and_then(|parent| self.fs.handle(parent))
            .and_then(|parent| self.fs.lookup(&parent, name))
            .and_then(|child| self.fs.inode(child.number()));
        match found {
            Ok(inode) => reply.entry(&ttl, &self.attr(&inode), 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    // to create a dir
    fn mkdir(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: fuser::ReplyEntry,
    ) {
        info!("mkdir() called with parent inode number: {parent} and name: {name:?}");
        match self.new_entry(parent, name, FileKind::Directory) {
            Ok(attr) => reply.entry(&Duration::new(0, 0), &attr, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    // to create a new file
    fn create(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: fuser::ReplyCreate,
    ) {
        info!("create() called with parent inode number: {parent} and name: {name:?}");
        match self.new_entry(parent, name, FileKind::RegularFile) {
            Ok(attr) => reply.created(&Duration::new(0, 0), &attr, 0, 0, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::fs_layout::tests::formatted_device;

    #[test]
    fn test_ino_mapping() {
        assert_eq!(to_fuse_ino(ROOT_INODE), 1);
        assert_eq!(from_fuse_ino(1), Some(ROOT_INODE));
        for number in 2..32 {
            assert_eq!(from_fuse_ino(to_fuse_ino(number)), Some(number));
        }
        assert_eq!(from_fuse_ino(0), None);
        assert_eq!(from_fuse_ino(u64::MAX), None);
    }

    #[test]
    fn test_attributes() {
        let fs = FlatFS::mount(formatted_device()).unwrap();
        let file = fs.create(&fs.root(), "file").unwrap();
        let fuse = FuseFS::new(fs, 1000, 100);

        let root = fuse.find_inode(FUSE_ROOT_INO).unwrap();
        let attr = fuse.attr(&root);
        assert_eq!(attr.ino, 1);
        assert_eq!(attr.kind, fuser::FileType::Directory);
        assert_eq!((attr.perm, attr.nlink), (0o777, 2));

        let attr = fuse.attr(&fuse.find_inode(file.number() as u64).unwrap());
        assert_eq!(attr.ino, 2);
        assert_eq!(attr.kind, fuser::FileType::RegularFile);
        assert_eq!((attr.perm, attr.size), (0o666, 0));
        assert_eq!((attr.uid, attr.gid), (1000, 100));
        assert_eq!(attr.blksize, 4096);
    }

    #[test]
    fn test_new_entries_through_fuse_numbers() {
        let fs = FlatFS::mount(formatted_device()).unwrap();
        let fuse = FuseFS::new(fs, 0, 0);
        let dir = fuse
            .new_entry(FUSE_ROOT_INO, OsStr::new("dir"), FileKind::Directory)
            .unwrap();
        let file = fuse
            .new_entry(dir.ino, OsStr::new("inner"), FileKind::RegularFile)
            .unwrap();
        assert_eq!((dir.ino, file.ino), (2, 3));
        let err = fuse
            .new_entry(file.ino, OsStr::new("x"), FileKind::RegularFile)
            .unwrap_err();
        assert_eq!(err.to_errno(), libc::ENOTDIR);
        let err = fuse
            .new_entry(FUSE_ROOT_INO, OsStr::new("dir"), FileKind::Directory)
            .unwrap_err();
        assert_eq!(err.to_errno(), libc::EEXIST);
        assert!(fuse.find_inode(0).is_err());
    }
}
