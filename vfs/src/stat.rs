use crate::DirEntryType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// inode 编号
    pub inode: u64,
    pub kind: DirEntryType,
    /// 原样存储的类型与权限位
    pub mode: u32,
    /// 最佳 I/O 块大小
    pub block_size: u64,
    /// 占用块数
    pub blocks: u64,
    /// 文件大小；目录则为其目录项的总字节数
    pub size: u64,
}
