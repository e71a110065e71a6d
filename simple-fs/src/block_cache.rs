//! # 块缓存层
//!
//! 引擎访问的块都先复制到内存；调用者操作缓存副本，并决定何时写回。
//! 同一文件系统内每块至多缓存一份，所有线程共享这份副本，
//! 由其互斥锁串行化对该块的访问。
//!
//! 每个已挂载的文件系统拥有自己的 [`BlockCacheManager`]。

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::{BLOCK_SIZE, DataBlock, Error, Result};

/// 块在内存中的副本
pub struct BlockCache {
    data: Box<DataBlock>,
    block_id: usize,
    block_device: Arc<dyn BlockDevice>,
    /// 脏：与设备上的内容不同
    modified: bool,
}

impl BlockCache {
    pub fn new(block_id: usize, block_device: Arc<dyn BlockDevice>) -> Result<Self> {
        let mut data = Box::new([0; BLOCK_SIZE]);
        block_device
            .read_block(block_id, data.as_mut_slice())
            .map_err(|err| {
                log::error!("reading block {block_id} failed: {err}");
                Error::Device { block_id }
            })?;

        Ok(Self {
            data,
            block_id,
            block_device,
            modified: false,
        })
    }

    /// 写回脏块，并等待设备将其持久化。
    ///
    /// 失败时重新载入缓存副本，使其与设备一致。
    pub fn sync(&mut self) -> Result<()> {
        if !self.modified {
            return Ok(());
        }
        self.modified = false;

        let written = self
            .block_device
            .write_block(self.block_id, self.data.as_slice())
            .and_then(|()| self.block_device.flush(self.block_id));
        if let Err(err) = written {
            log::error!("writing back block {} failed: {err}", self.block_id);
            if self
                .block_device
                .read_block(self.block_id, self.data.as_mut_slice())
                .is_err()
            {
                log::error!("block {} could not be reloaded", self.block_id);
            }
            return Err(Error::Device {
                block_id: self.block_id,
            });
        }

        Ok(())
    }

    #[inline]
    pub fn map<V>(&self, f: impl FnOnce(&DataBlock) -> V) -> V {
        f(&self.data)
    }

    #[inline]
    pub fn map_mut<V>(&mut self, f: impl FnOnce(&mut DataBlock) -> V) -> V {
        self.modified = true;
        f(&mut self.data)
    }
}

impl Drop for BlockCache {
    fn drop(&mut self) {
        if self.sync().is_err() {
            log::error!("dirty block {} lost on eviction", self.block_id);
        }
    }
}

/// 缓存并调度块缓存
pub struct BlockCacheManager {
    block_device: Arc<dyn BlockDevice>,
    queue: Mutex<Vec<(usize, Arc<Mutex<BlockCache>>)>>,
    /// 缓存块数的期望上限
    capacity: usize,
}

impl BlockCacheManager {
    pub const DEFAULT_CAPACITY: usize = 16;

    pub fn new(block_device: Arc<dyn BlockDevice>, capacity: usize) -> Self {
        Self {
            block_device,
            queue: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    // 替换策略：丢弃无人持有的块
    pub fn get(&self, block_id: usize) -> Result<Arc<Mutex<BlockCache>>> {
        let mut queue = self.queue.lock();

        if let Some(cache) = queue
            .iter()
            .find_map(|(id, cache)| (block_id == *id).then_some(cache))
        {
            return Ok(Arc::clone(cache));
        }

        if queue.len() >= self.capacity {
            // 只有没有其它引用的块才能写回；
            // 若没有这样的块，缓存会超出容量
            if let Some(index) = queue
                .iter()
                .position(|(_, cache)| Arc::strong_count(cache) == 1)
            {
                queue.remove(index);
            }
        }

        let cache = Arc::new(Mutex::new(BlockCache::new(
            block_id,
            self.block_device.clone(),
        )?));
        queue.push((block_id, cache.clone()));

        Ok(cache)
    }

    pub fn sync_all(&self) -> Result<()> {
        let caches: Vec<_> = self
            .queue
            .lock()
            .iter()
            .map(|(_, cache)| cache.clone())
            .collect();
        caches.iter().try_for_each(|cache| cache.lock().sync())
    }

    /// 当前缓存的块数
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }
}
