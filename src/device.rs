//! whole-block access to the storage a volume lives on
use memmap2::MmapMut;
use std::{
    fs::OpenOptions,
    io::{self, ErrorKind},
    path::Path,
};

use crate::{fs::BLOCK_SIZE, utils::fs_size_calculator::whole_blocks};

/// Abstraction over the raw device.
///
/// Every buffer is exactly one block long. A block is durable once
/// [BlockDevice::sync_block] returned for it.
pub trait BlockDevice: Send {
    /// number of blocks on the device
    fn block_count(&self) -> u64;

    fn read_block(&self, index: u32, buf: &mut [u8]) -> io::Result<()>;

    fn write_block(&mut self, index: u32, buf: &[u8]) -> io::Result<()>;

    /// make a previously written block durable
    fn sync_block(&mut self, index: u32) -> io::Result<()>;

    /// make everything written so far durable
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// byte range of block `index` inside a device of `len` bytes
fn block_range(index: u32, buf_len: usize, len: usize) -> io::Result<std::ops::Range<usize>> {
    if buf_len != BLOCK_SIZE {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("buffer is {buf_len} bytes, a block is {BLOCK_SIZE}"),
        ));
    }
    let start = index as usize * BLOCK_SIZE;
    let end = start + BLOCK_SIZE;
    if end > len {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("block {index} is past the end of the device"),
        ));
    }
    Ok(start..end)
}

/// An image file (or a raw device node) mapped into memory
#[derive(Debug)]
pub struct ImageFile {
    mmap: MmapMut,
}

impl ImageFile {
    /// open the "device" for read and write
    pub fn open<P>(image_path: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(image_path.as_ref())?;
        // Safety
        // the mapping stays valid while we own it; concurrent modification of
        // the image by other processes is not supported
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(ImageFile { mmap })
    }
}

impl BlockDevice for ImageFile {
    fn block_count(&self) -> u64 {
        whole_blocks(self.mmap.len() as u64)
    }

    fn read_block(&self, index: u32, buf: &mut [u8]) -> io::Result<()> {
        let range = block_range(index, buf.len(), self.mmap.len())?;
        buf.copy_from_slice(&self.mmap[range]);
        Ok(())
    }

    fn write_block(&mut self, index: u32, buf: &[u8]) -> io::Result<()> {
        let range = block_range(index, buf.len(), self.mmap.len())?;
        self.mmap[range].copy_from_slice(buf);
        Ok(())
    }

    fn sync_block(&mut self, index: u32) -> io::Result<()> {
        let range = block_range(index, BLOCK_SIZE, self.mmap.len())?;
        self.mmap.flush_range(range.start, BLOCK_SIZE)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.mmap.flush()
    }
}

/// A device held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    data: Vec<u8>,
}

impl MemoryDevice {
    /// a zero filled device of `blocks` blocks
    pub fn new(blocks: u32) -> Self {
        MemoryDevice {
            data: vec![0u8; blocks as usize * BLOCK_SIZE],
        }
    }

    /// get read only reference to underlying buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl BlockDevice for MemoryDevice {
    fn block_count(&self) -> u64 {
        whole_blocks(self.data.len() as u64)
    }

    fn read_block(&self, index: u32, buf: &mut [u8]) -> io::Result<()> {
        let range = block_range(index, buf.len(), self.data.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_block(&mut self, index: u32, buf: &[u8]) -> io::Result<()> {
        let range = block_range(index, buf.len(), self.data.len())?;
        self.data[range].copy_from_slice(buf);
        Ok(())
    }

    fn sync_block(&mut self, _index: u32) -> io::Result<()> {
        Ok(())
    }
}
