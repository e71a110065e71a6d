//! 引擎锁
//!
//! 等待被争用的锁可以被中断：文件系统的 [`Interrupt`] 挂起时，
//! 等待者以 `Cancelled` 放弃而不再自旋。未被争用的锁总能拿到。

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::{Mutex, MutexGuard};

use crate::{Error, Result};

/// 同一文件系统所有等待者共享的挂起中断标志
#[derive(Debug, Default)]
pub struct Interrupt(AtomicBool);

impl Interrupt {
    #[inline]
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub fn lock_interruptible<'a, T>(
    mutex: &'a Mutex<T>,
    interrupt: &Interrupt,
) -> Result<MutexGuard<'a, T>> {
    loop {
        if let Some(guard) = mutex.try_lock() {
            return Ok(guard);
        }
        if interrupt.is_raised() {
            log::warn!("interrupted while waiting for a lock");
            return Err(Error::Cancelled);
        }
        core::hint::spin_loop();
    }
}

/// 哪些创建操作在目录链接锁上串行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirLockGranularity {
    /// 整个文件系统的目录共用一把锁
    Global,
    /// 每个目录对象编号一把锁
    #[default]
    PerDirectory,
}

/// 保护“向目录追加目录项，再增加其子项数”的锁
#[derive(Debug)]
pub struct DirLocks {
    granularity: DirLockGranularity,
    global: Arc<Mutex<()>>,
    per_dir: Mutex<BTreeMap<u64, Arc<Mutex<()>>>>,
}

impl DirLocks {
    pub fn new(granularity: DirLockGranularity) -> Self {
        Self {
            granularity,
            global: Arc::new(Mutex::new(())),
            per_dir: Mutex::new(BTreeMap::new()),
        }
    }

    /// 目录 `dir_inode_no` 对应的锁
    pub fn get(&self, dir_inode_no: u64) -> Arc<Mutex<()>> {
        match self.granularity {
            DirLockGranularity::Global => self.global.clone(),
            DirLockGranularity::PerDirectory => self
                .per_dir
                .lock()
                .entry(dir_inode_no)
                .or_default()
                .clone(),
        }
    }

    #[inline]
    pub fn granularity(&self) -> DirLockGranularity {
        self.granularity
    }
}
