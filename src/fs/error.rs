//! Error type shared by every core operation.
//!
//! Each variant maps to exactly one errno through [`FsError::to_errno`] so the
//! FUSE layer can reply without inspecting messages.
use thiserror::Error;

use super::{DIR_RECORDS_PER_BLOCK, FILENAME_MAX};

#[derive(Debug, Error)]
pub enum FsError {
    /// block 0 does not describe a volume of this format
    #[error("not a flatfs volume: {0}")]
    Format(String),

    #[error("inode {0} is not a directory")]
    NotADirectory(u32),

    /// every entry of the occupancy map is in use
    #[error("no free data block left")]
    Exhausted,

    /// the inode table has no slot for another inode number
    #[error("no free inode left")]
    NoFreeInodes,

    #[error("directory {inode} already holds {} records", DIR_RECORDS_PER_BLOCK)]
    DirectoryFull { inode: u32 },

    #[error("name is {0} bytes long, at most {} are allowed", FILENAME_MAX)]
    NameTooLong(usize),

    #[error("invalid name {0:?}")]
    InvalidName(String),

    #[error("{0:?} already exists")]
    AlreadyExists(String),

    #[error("{0:?} not found")]
    NotFound(String),

    /// metadata read back from the device does not make sense
    #[error("corrupt metadata at block {block}: {detail}")]
    Corrupt { block: u32, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;

impl FsError {
    pub fn corrupt(block: u32, detail: impl ToString) -> Self {
        FsError::Corrupt {
            block,
            detail: detail.to_string(),
        }
    }

    /// errno reported to the kernel for this error
    pub fn to_errno(&self) -> libc::c_int {
        match self {
            FsError::Format(_) => libc::EINVAL,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::Exhausted => libc::ENOSPC,
            FsError::NoFreeInodes => libc::ENOSPC,
            FsError::DirectoryFull { .. } => libc::ENOSPC,
            FsError::NameTooLong(_) => libc::ENAMETOOLONG,
            FsError::InvalidName(_) => libc::EINVAL,
            FsError::AlreadyExists(_) => libc::EEXIST,
            FsError::NotFound(_) => libc::ENOENT,
            FsError::Corrupt { .. } => libc::EIO,
            FsError::Io(_) => libc::EIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(FsError::Exhausted.to_errno(), libc::ENOSPC);
        assert_eq!(FsError::NotADirectory(3).to_errno(), libc::ENOTDIR);
        assert_eq!(FsError::NameTooLong(300).to_errno(), libc::ENAMETOOLONG);
        assert_eq!(FsError::NotFound("a".into()).to_errno(), libc::ENOENT);
        assert_eq!(
            FsError::Io(std::io::Error::from(std::io::ErrorKind::Other)).to_errno(),
            libc::EIO
        );
    }

    #[test]
    fn test_messages_name_the_limit() {
        let message = FsError::DirectoryFull { inode: 0 }.to_string();
        assert!(message.contains(&DIR_RECORDS_PER_BLOCK.to_string()));
        let message = FsError::NameTooLong(256).to_string();
        assert!(message.contains("255"));
    }
}
