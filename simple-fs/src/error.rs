use thiserror::Error;

use crate::Inumber;

pub type Result<T> = core::result::Result<T, FsError>;

/// 文件系统操作可能遇到的、调用者可以处理的错误。
///
/// 块编号越界等内部算术错误不在此列，它们会直接 panic。
#[derive(Error, Debug)]
pub enum FsError {
    #[error("file system is not mounted")]
    NotMounted,

    #[error("file system is already mounted")]
    AlreadyMounted,

    #[error("disk does not contain a valid file system (magic {0:#010x})")]
    InvalidMagic(u32),

    #[error("inode number {0} is out of range")]
    InvalidInumber(Inumber),

    #[error("inode {0} is not valid")]
    InodeNotValid(Inumber),

    #[error("inode table is full")]
    NoFreeInode,

    /// 写到一半磁盘满了，`written` 字节已经落盘
    #[error("disk is full after writing {written} bytes")]
    DiskFull { written: usize },

    #[error("offset {offset} is beyond the file size {size}")]
    OffsetOutOfRange { offset: usize, size: usize },

    #[error("{0} bytes exceed the maximum file size")]
    FileTooLarge(usize),

    #[error("device of {0} blocks is too small to hold a file system")]
    DiskTooSmall(usize),

    #[error("corrupted file system: {0}")]
    Corrupted(&'static str),

    #[error("failed to encode or decode a block: {0}")]
    Codec(#[from] binrw::Error),
}
