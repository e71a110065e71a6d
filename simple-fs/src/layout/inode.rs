//! inode 表中的 inode 记录
//!
//! 每个对象恰好拥有一个数据块。两种对象共用 `size`：
//! 普通文件存放其字节长度，目录存放其目录项个数。

use enumflags2::{BitFlags, bitflags};

use super::{read_u32, read_u64, write_u32, write_u64};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskInode {
    pub inode_no: u64,
    pub mode: Mode,
    /// 存放对象内容的唯一数据块
    pub data_block_number: u64,
    /// 文件的 `file_size`，目录的 `dir_children_count`
    pub size: u64,
}

impl DiskInode {
    pub const SIZE: usize = 32;

    #[inline]
    pub fn new(inode_no: u64, mode: Mode, data_block_number: u64) -> Self {
        Self {
            inode_no,
            mode,
            data_block_number,
            size: 0,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.mode.kind == InodeKind::Directory
    }

    /// 目录开头有效目录项的个数
    #[inline]
    pub fn children_count(&self) -> usize {
        self.size as usize
    }

    /// 编码记录中的对象编号，不校验其余字段
    #[inline]
    pub fn peek_inode_no(raw: &[u8]) -> u64 {
        read_u64(raw, 0)
    }

    /// 存储的 mode 不是本引擎会写出的值时，以 `CorruptReference` 失败
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let inode_no = read_u64(raw, 0);
        let mode = Mode::from_bits(read_u32(raw, 8))
            .ok_or(Error::CorruptReference { inode: inode_no })?;

        Ok(Self {
            inode_no,
            mode,
            data_block_number: read_u64(raw, 16),
            size: read_u64(raw, 24),
        })
    }

    pub fn encode(&self, raw: &mut [u8]) {
        write_u64(raw, 0, self.inode_no);
        write_u32(raw, 8, self.mode.bits());
        write_u32(raw, 12, 0);
        write_u64(raw, 16, self.data_block_number);
        write_u64(raw, 24, self.size);
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum InodeKind {
    #[default]
    Regular,
    Directory,
}

#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    OtherExec = 0o1,
    OtherWrite = 0o2,
    OtherRead = 0o4,
    GroupExec = 0o10,
    GroupWrite = 0o20,
    GroupRead = 0o40,
    UserExec = 0o100,
    UserWrite = 0o200,
    UserRead = 0o400,
    Sticky = 0o1000,
    SetGid = 0o2000,
    SetUid = 0o4000,
}

/// 对象类型加权限位，按 POSIX `st_mode` 存储
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub kind: InodeKind,
    pub perm: BitFlags<Permission>,
}

impl Mode {
    pub const S_IFMT: u32 = 0o170000;
    pub const S_IFDIR: u32 = 0o040000;
    pub const S_IFREG: u32 = 0o100000;

    #[inline]
    pub fn new(kind: InodeKind, perm: impl Into<BitFlags<Permission>>) -> Self {
        Self {
            kind,
            perm: perm.into(),
        }
    }

    /// 仅当 `raw` 是目录或普通文件的 mode，
    /// 且类型与权限之外没有多余的位时才返回值
    pub fn from_bits(raw: u32) -> Option<Self> {
        let kind = match raw & Self::S_IFMT {
            Self::S_IFDIR => InodeKind::Directory,
            Self::S_IFREG => InodeKind::Regular,
            _ => return None,
        };
        let perm = BitFlags::from_bits(raw & !Self::S_IFMT).ok()?;

        Some(Self { kind, perm })
    }

    pub fn bits(&self) -> u32 {
        let kind = match self.kind {
            InodeKind::Directory => Self::S_IFDIR,
            InodeKind::Regular => Self::S_IFREG,
        };
        kind | self.perm.bits()
    }
}
