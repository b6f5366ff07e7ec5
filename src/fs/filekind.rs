use super::{FILE_TYPE_DIR, FILE_TYPE_FILE};

/// an enum to describe the type of a file
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// an regular file
    RegularFile,
    /// a directory
    Directory,
}

impl FileKind {
    /// the `type` value stored in the inode record
    pub const fn code(self) -> u32 {
        match self {
            FileKind::RegularFile => FILE_TYPE_FILE,
            FileKind::Directory => FILE_TYPE_DIR,
        }
    }

    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            FILE_TYPE_FILE => Some(FileKind::RegularFile),
            FILE_TYPE_DIR => Some(FileKind::Directory),
            _ => None,
        }
    }
}

/// implement a trait to convert [FileKind] to [fuser::FileType]
impl From<FileKind> for fuser::FileType {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::RegularFile => fuser::FileType::RegularFile,
            FileKind::Directory => fuser::FileType::Directory,
        }
    }
}
