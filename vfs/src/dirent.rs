use alloc::string::String;

/// 目录列表中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// inode 编号
    pub inode: u64,
    pub ty: DirEntryType,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DirEntryType {
    Directory,
    #[default]
    Regular,
    /// 目录项指向的对象无法解析
    Unknown,
}
