//! # 磁盘块管理器层
//!
//! 构建新的磁盘布局或挂载已有的镜像，并持有已挂载文件系统的全局状态：
//! 内存中的超级块、inode 表锁以及目录链接锁。
//!
//! 加锁顺序：目录链接锁，inode 表锁，最后是超级块锁。
//! 回调上层时不持有其中任何一把。

use alloc::sync::Arc;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::block_cache::BlockCacheManager;
use crate::layout::{DiskInode, InodeKind, Mode, Permission, SuperBlock};
use crate::sync::{self, DirLocks, Interrupt};
use crate::{
    BLOCK_SIZE, DataBlock, Error, INODE_STORE_BLOCK_ID, Inode, RESERVED_BLOCKS, ROOT_DATA_BLOCK_ID,
    ROOT_INODE_NO, Result, SUPER_BLOCK_ID,
};

pub use crate::sync::DirLockGranularity;

/// 挂载时的运行参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountOptions {
    pub dir_lock: DirLockGranularity,
    /// 期望的缓存块数
    pub cache_capacity: usize,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            dir_lock: DirLockGranularity::default(),
            cache_capacity: BlockCacheManager::DEFAULT_CAPACITY,
        }
    }
}

pub struct SimpleFileSystem {
    pub(crate) cache: BlockCacheManager,
    /// 内存中的超级块，其互斥锁即超级块锁
    super_block: Mutex<SuperBlock>,
    /// inode 表锁
    pub(crate) inode_store: Mutex<()>,
    pub(crate) dir_locks: DirLocks,
    pub(crate) interrupt: Interrupt,
}

impl SimpleFileSystem {
    /// 写出只含空根目录的新镜像。
    ///
    /// 只会分配 `total_blocks` 以下的块。
    pub fn format(block_device: Arc<dyn BlockDevice>, total_blocks: usize) -> Result<()> {
        if total_blocks < RESERVED_BLOCKS {
            return Err(Error::InvalidArgument);
        }

        let cache = BlockCacheManager::new(block_device, RESERVED_BLOCKS);
        let root = DiskInode::new(
            ROOT_INODE_NO,
            Mode::new(
                InodeKind::Directory,
                Permission::UserRead
                    | Permission::UserWrite
                    | Permission::UserExec
                    | Permission::GroupRead
                    | Permission::GroupExec
                    | Permission::OtherRead
                    | Permission::OtherExec,
            ),
            ROOT_DATA_BLOCK_ID as u64,
        );

        // 先写根目录项，最后写超级块：写了一半的镜像无法挂载
        let root_data = cache.get(ROOT_DATA_BLOCK_ID)?;
        let mut root_data = root_data.lock();
        root_data.map_mut(|block: &mut DataBlock| block.fill(0));
        root_data.sync()?;

        let inode_store = cache.get(INODE_STORE_BLOCK_ID)?;
        let mut inode_store = inode_store.lock();
        inode_store.map_mut(|block: &mut DataBlock| {
            block.fill(0);
            root.encode(&mut block[..DiskInode::SIZE]);
        });
        inode_store.sync()?;

        let super_block = SuperBlock::new(total_blocks);
        let sb_cache = cache.get(SUPER_BLOCK_ID)?;
        let mut sb_cache = sb_cache.lock();
        sb_cache.map_mut(|block: &mut DataBlock| {
            block.fill(0);
            super_block.encode(block);
        });
        sb_cache.sync()?;

        log::info!(
            "formatted simple-fs image: {} allocatable blocks",
            super_block.free_count()
        );
        Ok(())
    }

    #[inline]
    pub fn mount(block_device: Arc<dyn BlockDevice>) -> Result<Arc<Self>> {
        Self::mount_with(block_device, MountOptions::default())
    }

    pub fn mount_with(
        block_device: Arc<dyn BlockDevice>,
        options: MountOptions,
    ) -> Result<Arc<Self>> {
        let cache = BlockCacheManager::new(block_device, options.cache_capacity);
        let super_block = cache
            .get(SUPER_BLOCK_ID)?
            .lock()
            .map(|block: &DataBlock| SuperBlock::decode(block));

        log::info!("magic number on disk: {:#x}", super_block.magic());
        if !super_block.is_valid() {
            log::error!("not a simple-fs image: magic number mismatch");
            return Err(Error::BadMagic);
        }
        if super_block.block_size != BLOCK_SIZE as u64 {
            log::error!(
                "image formatted with block size {}, expected {BLOCK_SIZE}",
                super_block.block_size
            );
            return Err(Error::BadBlockSize);
        }
        log::info!(
            "simple-fs version {} with block size {} detected",
            super_block.version,
            super_block.block_size
        );

        let fs = Arc::new(Self {
            cache,
            super_block: Mutex::new(super_block),
            inode_store: Mutex::new(()),
            dir_locks: DirLocks::new(options.dir_lock),
            interrupt: Interrupt::default(),
        });

        // 没有根目录的挂载毫无用处
        match fs.find_inode(ROOT_INODE_NO)? {
            Some(root) if root.is_dir() => Ok(fs),
            _ => {
                log::error!("root directory missing from the inode store");
                Err(Error::CorruptReference {
                    inode: ROOT_INODE_NO,
                })
            }
        }
    }

    pub fn root_inode(fs: &Arc<Self>) -> Inode {
        Inode::new(ROOT_INODE_NO, fs.clone())
    }

    /// 将 `super_block` 写回其固定块，并等待其持久。
    /// 调用者须持有超级块锁。
    fn sync_super_block(&self, super_block: &SuperBlock) -> Result<()> {
        let cache = self.cache.get(SUPER_BLOCK_ID)?;
        let mut cache = cache.lock();
        cache.map_mut(|block: &mut DataBlock| super_block.encode(block));
        cache.sync()
    }

    /// 首次适配分配块。更新后的超级块持久后位掩码才会改变。
    ///
    /// 没有对应的释放：对象未能进入 inode 表时，
    /// 它的块会一直占用，直到离线检查将其找出。
    pub fn alloc_block(&self) -> Result<u64> {
        let mut super_block = sync::lock_interruptible(&self.super_block, &self.interrupt)?;

        let Some(block_id) = super_block.first_free() else {
            log::warn!("no more free blocks available");
            return Err(Error::NoSpace);
        };

        let mut updated = *super_block;
        updated.mark_busy(block_id);
        self.sync_super_block(&updated)?;
        *super_block = updated;

        log::debug!("allocated block {block_id}");
        Ok(block_id as u64)
    }

    /// 存活的 inode 数
    pub fn object_count(&self) -> Result<u64> {
        Ok(sync::lock_interruptible(&self.super_block, &self.interrupt)?.inodes_count)
    }

    /// 内存中超级块的副本，返回时可能已经过时
    #[inline]
    pub fn super_block(&self) -> SuperBlock {
        *self.super_block.lock()
    }

    /// 槽位 `count` 写入记录后增加 `inodes_count`。
    /// 调用者须持有 inode 表锁。
    pub(crate) fn commit_inode_count(&self, count: u64) -> Result<()> {
        let mut super_block = sync::lock_interruptible(&self.super_block, &self.interrupt)?;
        let mut updated = *super_block;
        updated.inodes_count = count;
        self.sync_super_block(&updated)?;
        *super_block = updated;
        Ok(())
    }

    /// 挂起中断：在 [`clear_interrupt`](Self::clear_interrupt) 之前，
    /// 等待被争用的引擎锁的调用者以 `Cancelled` 放弃。
    #[inline]
    pub fn interrupt(&self) {
        self.interrupt.raise();
    }

    #[inline]
    pub fn clear_interrupt(&self) {
        self.interrupt.clear();
    }

    #[inline]
    pub fn dir_lock_granularity(&self) -> DirLockGranularity {
        self.dir_locks.granularity()
    }

    /// 写回所有脏的缓存块
    pub fn sync_all(&self) -> Result<()> {
        self.cache.sync_all()
    }
}

impl core::fmt::Debug for SimpleFileSystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimpleFileSystem")
            .field("super_block", &self.super_block())
            .field("dir_lock", &self.dir_locks.granularity())
            .field("cached_blocks", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::Disk;

    use super::*;

    fn mounted() -> Arc<SimpleFileSystem> {
        let disk = Disk::new(16, false);
        SimpleFileSystem::format(disk.clone(), 16).unwrap();
        SimpleFileSystem::mount(disk).unwrap()
    }

    #[test]
    fn format_flushes_superblock_last() {
        let disk = Disk::new(8, false);
        SimpleFileSystem::format(disk.clone(), 8).unwrap();
        assert_eq!(
            *disk.flushed.lock().unwrap(),
            [ROOT_DATA_BLOCK_ID, INODE_STORE_BLOCK_ID, SUPER_BLOCK_ID]
        );
    }

    #[test]
    fn free_blocks_end_at_device_size() {
        let fs = mounted();
        let super_block = fs.super_block();
        assert_eq!(super_block.free_count(), 16 - RESERVED_BLOCKS as u32);
        assert!(!super_block.is_free(16));
    }

    #[test]
    fn create_gives_up_on_contended_dir_lock() {
        let fs = mounted();
        let root = SimpleFileSystem::root_inode(&fs);

        let dir_lock = fs.dir_locks.get(ROOT_INODE_NO);
        let _held = dir_lock.lock();
        fs.interrupt();
        assert_eq!(root.create("f", 0o100644).unwrap_err(), Error::Cancelled);
        assert_eq!(fs.object_count().unwrap(), 1);
        assert_eq!(fs.super_block().first_free(), Some(RESERVED_BLOCKS));
    }

    #[test]
    fn append_gives_up_on_contended_inode_store() {
        let fs = mounted();
        let root = SimpleFileSystem::root_inode(&fs);
        let file = root.create("f", 0o100644).unwrap();

        let _held = fs.inode_store.lock();
        fs.interrupt();
        assert_eq!(file.write_at(0, b"data").unwrap_err(), Error::Cancelled);
        assert_eq!(root.create("g", 0o100644).unwrap_err(), Error::Cancelled);

        // 读不需要引擎锁
        assert_eq!(root.lookup("f").unwrap().inode_no(), file.inode_no());

        // 被取消的写入留下了数据，但没有更新大小
        let inode = file.disk_inode().unwrap();
        assert_eq!(inode.size, 0);
        let block = fs.cache.get(inode.data_block_number as usize).unwrap();
        assert!(block.lock().map(|block: &DataBlock| block[..4] == *b"data"));
    }

    #[test]
    fn allocation_is_first_fit() {
        let fs = mounted();
        assert_eq!(fs.alloc_block().unwrap(), 3);
        assert_eq!(fs.alloc_block().unwrap(), 4);
        assert!(!fs.super_block().is_free(3));
    }
}
