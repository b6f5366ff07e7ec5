//! operations on an unmounted image, for scripting and inspection
//!
//! Directories are addressed by inode number and entries by a single name,
//! nothing walks paths.
use anyhow::Context;
use std::path::Path;

use crate::{
    device::{BlockDevice, ImageFile},
    fs::{CheckReport, DirEntry, FileKind, FlatFS, Inode, InodeHandle},
};

/// mount the image without registering it to `FUSE`
pub fn open<P>(image_file_path: P) -> anyhow::Result<FlatFS<ImageFile>>
where
    P: AsRef<Path>,
{
    let image_file_path = image_file_path.as_ref();
    let device = ImageFile::open(image_file_path)
        .with_context(|| format!("cannot open {}", image_file_path.display()))?;
    FlatFS::mount(device).with_context(|| format!("cannot mount {}", image_file_path.display()))
}

fn directory<D: BlockDevice>(fs: &FlatFS<D>, dir: u32) -> anyhow::Result<InodeHandle> {
    fs.handle(dir)
        .with_context(|| format!("no directory with inode number {dir}"))
}

/// records of directory `dir`, with the kind of every child
pub fn ls<D: BlockDevice>(fs: &FlatFS<D>, dir: u32) -> anyhow::Result<Vec<(DirEntry, FileKind)>> {
    let dir = directory(fs, dir)?;
    fs.list(&dir)?
        .into_iter()
        .map(|entry| -> anyhow::Result<_> {
            let kind = fs.inode(entry.inode_number)?.file_kind;
            Ok((entry, kind))
        })
        .collect()
}

pub fn create<D: BlockDevice>(fs: &FlatFS<D>, dir: u32, name: &str) -> anyhow::Result<InodeHandle> {
    let parent = directory(fs, dir)?;
    Ok(fs.create(&parent, name)?)
}

pub fn mkdir<D: BlockDevice>(fs: &FlatFS<D>, dir: u32, name: &str) -> anyhow::Result<InodeHandle> {
    let parent = directory(fs, dir)?;
    Ok(fs.mkdir(&parent, name)?)
}

/// the inode of entry `name` of directory `dir`
pub fn lookup<D: BlockDevice>(fs: &FlatFS<D>, dir: u32, name: &str) -> anyhow::Result<Inode> {
    let parent = directory(fs, dir)?;
    let handle = fs.lookup(&parent, name)?;
    Ok(fs.inode(handle.number())?)
}

pub fn check<D: BlockDevice>(fs: &FlatFS<D>) -> anyhow::Result<CheckReport> {
    Ok(fs.check()?)
}
