//! inode 表：位于单个块内、按插入顺序排列的扁平 inode 记录表
//!
//! 槽位 `i` 位于表块的第 `i * DiskInode::SIZE` 字节处，
//! `0..inodes_count` 的槽位有效。至多 [`MAX_OBJECTS`] 条记录，查找线性扫描即可。

use alloc::vec::Vec;

use crate::layout::{DiskInode, Mode};
use crate::sfs::SimpleFileSystem;
use crate::sync;
use crate::{
    BLOCK_SIZE, DataBlock, Error, INODE_STORE_BLOCK_ID, MAX_OBJECTS, RESERVED_INODES, Result,
    START_INO,
};

/// 表块能容纳的记录数
const STORE_SLOTS: usize = BLOCK_SIZE / DiskInode::SIZE;
/// inode 表接受的记录数
const STORE_CAPACITY: usize = if STORE_SLOTS < MAX_OBJECTS {
    STORE_SLOTS
} else {
    MAX_OBJECTS
};

#[inline]
fn slot(index: usize) -> core::ops::Range<usize> {
    index * DiskInode::SIZE..(index + 1) * DiskInode::SIZE
}

/// `inode_no` 的记录在前 `count` 个槽位中的下标
fn position(block: &DataBlock, count: usize, inode_no: u64) -> Option<usize> {
    (0..count.min(STORE_SLOTS)).find(|&index| DiskInode::peek_inode_no(&block[slot(index)]) == inode_no)
}

impl SimpleFileSystem {
    /// 线性查找 `inode_no`，查完 `inodes_count` 条记录即止。
    ///
    /// 不加锁：inode 数只是一个快照。
    pub fn find_inode(&self, inode_no: u64) -> Result<Option<DiskInode>> {
        let count = self.super_block().inodes_count as usize;
        self.cache
            .get(INODE_STORE_BLOCK_ID)?
            .lock()
            .map(|block: &DataBlock| {
                position(block, count, inode_no)
                    .map(|index| DiskInode::decode(&block[slot(index)]))
                    .transpose()
            })
    }

    /// 在槽位 `inodes_count` 追加新记录并为其分配下一个对象编号，
    /// 随后持久化表块与超级块。
    pub(crate) fn append_inode(&self, mode: Mode, data_block_number: u64) -> Result<DiskInode> {
        let _store = sync::lock_interruptible(&self.inode_store, &self.interrupt)?;

        // 持有表锁期间不会变化
        let count = self.object_count()?;
        if count as usize >= STORE_CAPACITY {
            log::warn!("inode store is full");
            return Err(Error::NoSpace);
        }

        let inode = DiskInode::new(
            count + START_INO - RESERVED_INODES + 1,
            mode,
            data_block_number,
        );

        let cache = self.cache.get(INODE_STORE_BLOCK_ID)?;
        let mut cache = cache.lock();
        cache.map_mut(|block: &mut DataBlock| inode.encode(&mut block[slot(count as usize)]));
        cache.sync()?;
        drop(cache);

        self.commit_inode_count(count + 1)?;

        log::debug!(
            "inode {} appended at slot {count}, data block {data_block_number}",
            inode.inode_no
        );
        Ok(inode)
    }

    /// 覆盖 `inode.inode_no` 的已存记录，返回前写回表块。
    ///
    /// 对象从未追加过时返回 `StaleReference`。
    pub fn update_inode(&self, inode: &DiskInode) -> Result<()> {
        let _store = sync::lock_interruptible(&self.inode_store, &self.interrupt)?;
        self.write_inode(inode)
    }

    /// 在表锁下对一条记录读取、修改、写回
    pub(crate) fn modify_inode(
        &self,
        inode_no: u64,
        f: impl FnOnce(&mut DiskInode),
    ) -> Result<DiskInode> {
        let _store = sync::lock_interruptible(&self.inode_store, &self.interrupt)?;

        let mut inode = self
            .find_inode(inode_no)?
            .ok_or(Error::StaleReference { inode: inode_no })?;
        f(&mut inode);
        self.write_inode(&inode)?;

        Ok(inode)
    }

    /// 前 `inodes_count` 个槽位中的全部记录，按追加顺序
    pub fn inode_table(&self) -> Result<Vec<Result<DiskInode>>> {
        let count = self.super_block().inodes_count as usize;
        Ok(self
            .cache
            .get(INODE_STORE_BLOCK_ID)?
            .lock()
            .map(|block: &DataBlock| {
                (0..count.min(STORE_SLOTS))
                    .map(|index| DiskInode::decode(&block[slot(index)]))
                    .collect()
            }))
    }

    fn write_inode(&self, inode: &DiskInode) -> Result<()> {
        let count = self.super_block().inodes_count as usize;
        let cache = self.cache.get(INODE_STORE_BLOCK_ID)?;
        let mut cache = cache.lock();

        let Some(index) = cache.map(|block: &DataBlock| position(block, count, inode.inode_no))
        else {
            log::error!("inode {} could not be stored: not in the inode store", inode.inode_no);
            return Err(Error::StaleReference {
                inode: inode.inode_no,
            });
        };

        cache.map_mut(|block: &mut DataBlock| inode.encode(&mut block[slot(index)]));
        cache.sync()?;

        log::debug!("inode {} updated", inode.inode_no);
        Ok(())
    }
}
