//! 离线一致性检查
//!
//! `create` 从不回滚，中断的创建可能留下无主的占用块，或没有目录链接的 inode。
//! [`SimpleFileSystem::check`] 找出这类问题，以及超级块、inode 表与目录项之间的其它不一致。
//! 检查只读不写。

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::layout::DiskInode;
use crate::sfs::SimpleFileSystem;
use crate::{MAX_OBJECTS, RESERVED_BLOCKS, ROOT_INODE_NO, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// 记录无法解码的 inode 表槽位
    CorruptInode { slot: usize },
    /// 没有任何目录项链接的已存 inode
    OrphanedInode { inode: u64 },
    /// 指向未存储 inode 的目录项
    DanglingRecord { dir: u64, inode: u64, name: String },
    /// 标记为占用却不属于任何 inode 的块
    LeakedBlock { block_id: usize },
    /// 属于某个 inode 却标记为空闲的块
    UnmarkedBlock { block_id: usize, inode: u64 },
    DoubleOwnedBlock { block_id: usize, first: u64, second: u64 },
    /// `inodes_count` 与占用块数不符
    CountMismatch { inodes_count: u64, allocated: u64 },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptInode { slot } => write!(f, "inode store slot {slot} is corrupt"),
            Self::OrphanedInode { inode } => {
                write!(f, "inode {inode} is not linked from any directory")
            }
            Self::DanglingRecord { dir, inode, name } => write!(
                f,
                "directory {dir}: {name:?} refers to missing inode {inode}"
            ),
            Self::LeakedBlock { block_id } => {
                write!(f, "block {block_id} is busy but owned by no inode")
            }
            Self::UnmarkedBlock { block_id, inode } => {
                write!(f, "block {block_id} of inode {inode} is marked free")
            }
            Self::DoubleOwnedBlock {
                block_id,
                first,
                second,
            } => write!(f, "block {block_id} is owned by inodes {first} and {second}"),
            Self::CountMismatch {
                inodes_count,
                allocated,
            } => write!(
                f,
                "superblock counts {inodes_count} inodes but {allocated} blocks are in use"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub problems: Vec<Problem>,
}

impl CheckReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

impl SimpleFileSystem {
    /// 检查共 `total_blocks` 块的镜像。运行时不应有其它操作进行。
    pub fn check(&self, total_blocks: usize) -> Result<CheckReport> {
        let super_block = self.super_block();
        let mut problems = Vec::new();

        let mut inodes: BTreeMap<u64, DiskInode> = BTreeMap::new();
        for (slot, inode) in self.inode_table()?.into_iter().enumerate() {
            match inode {
                Ok(inode) => {
                    inodes.insert(inode.inode_no, inode);
                }
                Err(_) => problems.push(Problem::CorruptInode { slot }),
            }
        }

        let mut owners: BTreeMap<usize, u64> = BTreeMap::new();
        for inode in inodes.values() {
            let block_id = inode.data_block_number as usize;
            if let Some(&first) = owners.get(&block_id) {
                problems.push(Problem::DoubleOwnedBlock {
                    block_id,
                    first,
                    second: inode.inode_no,
                });
                continue;
            }
            owners.insert(block_id, inode.inode_no);
            if super_block.is_free(block_id) {
                problems.push(Problem::UnmarkedBlock {
                    block_id,
                    inode: inode.inode_no,
                });
            }
        }

        // 根目录数据块是保留块，故多算一块
        let mut allocated = 1;
        for block_id in RESERVED_BLOCKS..total_blocks.min(MAX_OBJECTS) {
            if super_block.is_free(block_id) {
                continue;
            }
            allocated += 1;
            if !owners.contains_key(&block_id) {
                problems.push(Problem::LeakedBlock { block_id });
            }
        }
        if super_block.inodes_count != allocated {
            problems.push(Problem::CountMismatch {
                inodes_count: super_block.inodes_count,
                allocated,
            });
        }

        let mut linked = BTreeSet::from([ROOT_INODE_NO]);
        for dir in inodes.values().filter(|inode| inode.is_dir()) {
            for record in self.records(dir)? {
                if inodes.contains_key(&record.inode_no()) {
                    linked.insert(record.inode_no());
                } else {
                    problems.push(Problem::DanglingRecord {
                        dir: dir.inode_no,
                        inode: record.inode_no(),
                        name: String::from_utf8_lossy(record.name_bytes()).into_owned(),
                    });
                }
            }
        }
        problems.extend(
            inodes
                .keys()
                .filter(|inode_no| !linked.contains(*inode_no))
                .map(|&inode| Problem::OrphanedInode { inode }),
        );

        for problem in &problems {
            log::warn!("check: {problem}");
        }
        Ok(CheckReport { problems })
    }
}
