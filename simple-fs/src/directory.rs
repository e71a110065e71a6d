//! 目录项表：目录数据块开头的 `dir_children_count` 个目录项，按创建顺序排列

use alloc::vec::Vec;

use crate::layout::{DirRecord, DiskInode, RECORDS_PER_BLOCK};
use crate::sfs::SimpleFileSystem;
use crate::{DataBlock, Error, Result};

impl SimpleFileSystem {
    /// `name` 对应的对象编号，逐字节比较
    pub(crate) fn lookup_record(&self, dir: &DiskInode, name: &str) -> Result<Option<u64>> {
        let count = dir.children_count().min(RECORDS_PER_BLOCK);
        Ok(self
            .cache
            .get(dir.data_block_number as usize)?
            .lock()
            .map(|block: &DataBlock| {
                (0..count)
                    .map(|index| DirRecord::decode(&block[DirRecord::slot(index)]))
                    .find(|record| record.name_bytes() == name.as_bytes())
                    .map(|record| record.inode_no())
            }))
    }

    /// 在槽位 `dir_children_count` 写入 `{inode_no, name}` 并持久化。
    /// 子项数由调用者增加。
    pub(crate) fn append_record(&self, dir: &DiskInode, inode_no: u64, name: &str) -> Result<()> {
        let index = dir.children_count();
        if index >= RECORDS_PER_BLOCK {
            log::warn!("directory {} is full", dir.inode_no);
            return Err(Error::NoSpace);
        }
        let record = DirRecord::new(name, inode_no)?;

        let cache = self.cache.get(dir.data_block_number as usize)?;
        let mut cache = cache.lock();
        cache.map_mut(|block: &mut DataBlock| record.encode(&mut block[DirRecord::slot(index)]));
        cache.sync()?;

        log::debug!(
            "directory {}: record {index} links {name:?} to inode {inode_no}",
            dir.inode_no
        );
        Ok(())
    }

    /// `dir` 的有效目录项，按创建顺序
    pub(crate) fn records(&self, dir: &DiskInode) -> Result<Vec<DirRecord>> {
        let count = dir.children_count().min(RECORDS_PER_BLOCK);
        Ok(self
            .cache
            .get(dir.data_block_number as usize)?
            .lock()
            .map(|block: &DataBlock| {
                (0..count)
                    .map(|index| DirRecord::decode(&block[DirRecord::slot(index)]))
                    .collect()
            }))
    }
}
