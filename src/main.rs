use clap::Parser;
use flatfs::{cli_interface::FlatFsCli, ops, FileKind};
/// a CLI interface to users to create our filesystem, work on an unmounted
/// image, or register it to `FUSE` and mount it.
///
/// The latter will block the program until we umount our filesystem ourselves.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = FlatFsCli::parse();
    match args {
        FlatFsCli::Mkfs(args) => {
            //create a new file system
            flatfs::mkfs::mkfs(args.image_file_path)?;
        }
        FlatFsCli::Mount(args) => {
            //register a filesystem to `FUSE` and mount it
            flatfs::mount::mount(args.image_file_path, args.mount_point)?;
        }
        FlatFsCli::Ls(args) => {
            let fs = ops::open(&args.image_file_path)?;
            for (entry, kind) in ops::ls(&fs, args.dir)? {
                let marker = if kind == FileKind::Directory { "/" } else { "" };
                println!(
                    "{:>4}  {}{marker}",
                    entry.inode_number,
                    entry.name.to_string_lossy()
                );
            }
        }
        FlatFsCli::Create(args) => {
            let fs = ops::open(&args.image_file_path)?;
            let handle = ops::create(&fs, args.dir, &args.name)?;
            println!("{} -> inode {}", args.name, handle.number());
        }
        FlatFsCli::Mkdir(args) => {
            let fs = ops::open(&args.image_file_path)?;
            let handle = ops::mkdir(&fs, args.dir, &args.name)?;
            println!("{} -> inode {}", args.name, handle.number());
        }
        FlatFsCli::Lookup(args) => {
            let fs = ops::open(&args.image_file_path)?;
            let inode = ops::lookup(&fs, args.dir, &args.name)?;
            println!("{inode:#?}");
        }
        FlatFsCli::Check(args) => {
            let fs = ops::open(&args.image_file_path)?;
            let report = ops::check(&fs)?;
            println!("{report:#?}");
            if !report.is_consistent() {
                anyhow::bail!("{} is inconsistent", args.image_file_path);
            }
        }
    }
    Ok(())
}
