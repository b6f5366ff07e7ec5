use clap::Parser;

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub enum FlatFsCli {
    /// create a new file system
    Mkfs(MkfsArgs),
    /// register a filesystem to `FUSE` and mount it
    Mount(MountArgs),
    /// list a directory of an unmounted image
    Ls(LsArgs),
    /// create an empty file in an unmounted image
    Create(EntryArgs),
    /// create an empty directory in an unmounted image
    Mkdir(EntryArgs),
    /// show the inode of an entry
    Lookup(EntryArgs),
    /// compare the block map with what the inodes own
    Check(CheckArgs),
}
///make a new fs subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "make a new file system")]
pub struct MkfsArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
}

/// mount a fs subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "mount a file system")]
pub struct MountArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// the mount point of the file system
    #[clap(short, long)]
    pub mount_point: String,
}

#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "list a directory")]
pub struct LsArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// inode number of the directory, the root by default
    #[clap(short, long, default_value_t = 0)]
    pub dir: u32,
}

/// subcommands working on one entry of a directory
#[derive(clap::Args, Debug, PartialEq)]
pub struct EntryArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// inode number of the parent directory, the root by default
    #[clap(short, long, default_value_t = 0)]
    pub dir: u32,
    /// name of the entry inside that directory
    pub name: String,
}

#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "check a file system")]
pub struct CheckArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
}

/// test the `FlatFsCli` struct
/// test `mkfs` subcommand
#[cfg(test)]
mod mkfs_parse_args_tests {
    use super::*;
    /// test short parameter form
    #[test]
    fn test_short_parameter_form() {
        let args = FlatFsCli::parse_from(["flatfs", "mkfs", "-p", "test"]);
        assert_eq!(
            args,
            FlatFsCli::Mkfs(MkfsArgs {
                image_file_path: "test".to_string(),
            })
        );
    }
    /// test long parameter form
    #[test]
    fn test_long_parameter_form() {
        let image_file_path_name = concat!("--", "image-file-path");
        let args = FlatFsCli::parse_from(["flatfs", "mkfs", image_file_path_name, "test"]);
        assert_eq!(
            args,
            FlatFsCli::Mkfs(MkfsArgs {
                image_file_path: "test".to_string(),
            })
        );
    }
    #[test]
    fn test_image_is_required() {
        assert!(FlatFsCli::try_parse_from(["flatfs", "mkfs"]).is_err());
    }
}

/// test the `FlatFsCli` struct
/// test `mount` subcommand
#[cfg(test)]
mod mount_parse_args_tests {
    use super::*;
    /// test short parameter form
    #[test]
    fn test_short_parameter_form() {
        let args = FlatFsCli::parse_from(["flatfs", "mount", "-p", "test", "-m", "test"]);
        assert_eq!(
            args,
            FlatFsCli::Mount(MountArgs {
                image_file_path: "test".to_string(),
                mount_point: "test".to_string(),
            })
        );
    }
    /// test long parameter form
    #[test]
    fn test_long_parameter_form() {
        let image_file_path_name = concat!("--", "image-file-path");
        let args = FlatFsCli::parse_from([
            "flatfs",
            "mount",
            image_file_path_name,
            "test",
            "--mount-point",
            "test",
        ]);
        assert_eq!(
            args,
            FlatFsCli::Mount(MountArgs {
                image_file_path: "test".to_string(),
                mount_point: "test".to_string(),
            })
        );
    }
}
