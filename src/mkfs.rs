//! create our filesystem
use crate::{device::ImageFile, device::BlockDevice, fs::format, utils};
use anyhow::Context;
use byte_unit::Byte;
use log::info;
use std::{fs::OpenOptions, path::Path};

/// create a new filesystem, given the path of the image file
/// # Params
/// - `image_file_path`: the path of the image file, created when missing
///
/// A regular file shorter than a volume is grown to the volume size, a
/// device node is used as it is.
///
/// # Return
/// an [anyhow::Result] type to indicate whether the operation is successful
pub fn mkfs<P>(image_file_path: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let image_file_path = image_file_path.as_ref();
    let image_size = utils::fs_size_calculator::image_size();

    // open image file and prepare to write fs components
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(image_file_path)
        .with_context(|| format!("cannot open {}", image_file_path.display()))?;
    let metadata = file.metadata()?;
    if metadata.is_file() && metadata.len() < image_size {
        // all other region are set to zero using `set_len` method
        file.set_len(image_size)?;
    }
    drop(file);

    let mut device = ImageFile::open(image_file_path)?;
    format(&mut device)
        .with_context(|| format!("cannot format {}", image_file_path.display()))?;
    device.flush()?;

    info!(
        "created a volume of {} in {}",
        Byte::from_bytes(image_size as _).get_appropriate_unit(true),
        image_file_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fs::FlatFS, BLOCK_SIZE};

    #[test]
    fn test_mkfs_creates_a_mountable_image() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("flatfs.img");
        mkfs(&image).unwrap();
        assert_eq!(
            std::fs::metadata(&image).unwrap().len(),
            utils::fs_size_calculator::image_size()
        );
        let fs = FlatFS::mount(ImageFile::open(&image).unwrap()).unwrap();
        assert!(fs.list(&fs.root()).unwrap().is_empty());
    }

    #[test]
    fn test_mkfs_reuses_and_wipes_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("flatfs.img");
        mkfs(&image).unwrap();
        {
            let fs = FlatFS::mount(ImageFile::open(&image).unwrap()).unwrap();
            fs.create(&fs.root(), "old").unwrap();
        }
        mkfs(&image).unwrap();
        let fs = FlatFS::mount(ImageFile::open(&image).unwrap()).unwrap();
        assert!(fs.list(&fs.root()).unwrap().is_empty());
        assert_eq!(fs.superblock().inode_count(), 1);
    }

    #[test]
    fn test_larger_images_keep_their_size() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("big.img");
        let size = utils::fs_size_calculator::image_size() + 4 * BLOCK_SIZE as u64;
        std::fs::File::create(&image).unwrap().set_len(size).unwrap();
        mkfs(&image).unwrap();
        assert_eq!(std::fs::metadata(&image).unwrap().len(), size);
    }
}
