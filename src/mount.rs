//! register our filesystem to `FUSE` and mount it
use anyhow::Context;
use fuser::MountOption;
use std::path::Path;

use crate::{
    device::ImageFile,
    fs::{FlatFS, FuseFS},
};

/// options every mount is made with
pub fn mount_options() -> Vec<MountOption> {
    vec![
        MountOption::FSName("flatfs".to_string()),
        MountOption::DefaultPermissions,
        // MountOption::AllowOther,
        // MountOption::AutoUnmount,
    ]
}

/// mount the image at `image_path` on `mountpoint`, blocking until it is unmounted
pub fn mount<P>(image_path: P, mountpoint: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let image_path = image_path.as_ref();
    let device = ImageFile::open(image_path)
        .with_context(|| format!("cannot open {}", image_path.display()))?;
    let fs = FlatFS::mount(device)
        .with_context(|| format!("cannot mount {}", image_path.display()))?;
    // everything on the volume belongs to whoever mounted it
    let fs = FuseFS::new(fs, users::get_effective_uid(), users::get_effective_gid());

    Ok(fuser::mount2(fs, mountpoint, &mount_options())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_options() {
        let options = mount_options();
        assert!(options.contains(&MountOption::FSName("flatfs".to_string())));
        assert!(options.contains(&MountOption::DefaultPermissions));
        assert!(!options.contains(&MountOption::AllowOther));
    }

    #[test]
    fn test_refuses_unformatted_images() {
        let image = tempfile::NamedTempFile::new().unwrap();
        image
            .as_file()
            .set_len(crate::utils::fs_size_calculator::image_size())
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = mount(image.path(), dir.path()).unwrap_err();
        assert!(err.to_string().contains("cannot mount"));
    }
}
