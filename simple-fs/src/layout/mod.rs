//! # 磁盘数据结构层
//!
//! simple-fs 镜像：超级块 | inode 表 | 根目录项 | 数据块
//!
//! 这里的结构都是普通的值，各有一对在字节切片上显式小端序的 `decode`/`encode`。

mod super_block;
pub use super_block::SuperBlock;

mod inode;
pub use inode::{DiskInode, InodeKind, Mode, Permission};

/// 目录项，同样存放在磁盘上
mod dir_entry;
pub use dir_entry::{DirRecord, NAME_MAX_LEN, RECORDS_PER_BLOCK};

#[inline]
pub(crate) fn read_u64(raw: &[u8], offset: usize) -> u64 {
    let mut bytes = [0; 8];
    bytes.copy_from_slice(&raw[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

#[inline]
pub(crate) fn read_u32(raw: &[u8], offset: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&raw[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[inline]
pub(crate) fn write_u64(raw: &mut [u8], offset: usize, value: u64) {
    raw[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn write_u32(raw: &mut [u8], offset: usize, value: u32) {
    raw[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
