//! # simple-fs
//!
//! 极简的磁盘文件系统：每个对象一个块，每个目录一个扁平的目录项数组，
//! 单块的 inode 表，以及 64 位的空闲块位掩码。
//!
//! 自上而下的层次：
//!
//! - 索引节点层（[`Inode`]）：创建、查找、读写、列目录
//! - 磁盘块管理器层（[`SimpleFileSystem`]）：超级块、inode 表、目录项表及保护它们的锁
//! - 磁盘数据结构层（[`layout`]）：每种记录的显式编解码
//! - 块缓存层：设备块在内存中的副本，支持写回
//! - 块设备接口层（[`BlockDevice`]）：由宿主提供
//!
//! 固定的块编号：
//!
//! | 块 | 内容 |
//! |---|---|
//! | 0 | 超级块 |
//! | 1 | inode 表 |
//! | 2 | 根目录项 |
//! | 3.. | 数据块，由空闲块位掩码管理 |

#![no_std]

extern crate alloc;

// 索引节点层：实现文件创建、查找、读写等操作
mod inode;

// 磁盘块管理器层
mod check;
mod directory;
mod inode_store;
mod sfs;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
pub mod layout;

// 块缓存层：内存上的磁盘块数据缓存
mod block_cache;

mod sync;

#[cfg(test)]
mod testing;

pub use block_dev::{BlockDevice, DeviceError};
pub use vfs::{DirEntry, DirEntryType, Error, Result, Stat};

pub use self::{
    check::{CheckReport, Problem},
    sfs::{DirLockGranularity, MountOptions, SimpleFileSystem},
    inode::Inode,
};

pub const MAGIC: u64 = 0x1003_2013;
pub const VERSION: u64 = 1;
pub const BLOCK_SIZE: usize = 4096;

pub const SUPER_BLOCK_ID: usize = 0;
pub const INODE_STORE_BLOCK_ID: usize = 1;
pub const ROOT_DATA_BLOCK_ID: usize = 2;
/// 此编号以下的块永远不会被分配
pub const RESERVED_BLOCKS: usize = 3;

/// 存活对象数的上限，也是空闲块位掩码的宽度
pub const MAX_OBJECTS: usize = 64;

pub const ROOT_INODE_NO: u64 = 1;
pub const START_INO: u64 = 10;
pub const RESERVED_INODES: u64 = 3;

type DataBlock = [u8; BLOCK_SIZE];
