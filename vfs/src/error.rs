use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// 对象数或空闲块耗尽，或目录块已满
    NoSpace,
    /// 不支持的对象类型或参数格式错误
    InvalidArgument,
    NotFound,
    /// 更新了从未追加进 inode 表的对象的元数据
    StaleReference { inode: u64 },
    /// 目录项指向缺失或不一致的 inode
    CorruptReference { inode: u64 },
    /// 块 I/O 故障
    Device { block_id: usize },
    /// 等锁时被中断
    Cancelled,
    BadMagic,
    BadBlockSize,
    AlreadyExists,
    NotADirectory,
    IsADirectory,
    NameTooLong,
    FileTooLarge,
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpace => f.write_str("no space left on device"),
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::NotFound => f.write_str("no such file or directory"),
            Self::StaleReference { inode } => {
                write!(f, "inode {inode} is not in the inode store")
            }
            Self::CorruptReference { inode } => {
                write!(f, "directory record refers to missing or corrupt inode {inode}")
            }
            Self::Device { block_id } => write!(f, "I/O fault on block {block_id}"),
            Self::Cancelled => f.write_str("interrupted while waiting for a lock"),
            Self::BadMagic => f.write_str("bad magic number"),
            Self::BadBlockSize => f.write_str("unsupported block size"),
            Self::AlreadyExists => f.write_str("file exists"),
            Self::NotADirectory => f.write_str("not a directory"),
            Self::IsADirectory => f.write_str("is a directory"),
            Self::NameTooLong => f.write_str("file name too long"),
            Self::FileTooLarge => f.write_str("file too large"),
        }
    }
}
