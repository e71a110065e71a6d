//! Shared block devices for the integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use simple_fs::{BLOCK_SIZE, BlockDevice, DeviceError, Inode, SimpleFileSystem};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Device kept entirely in memory
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
    num_blocks: usize,
}

impl RamDisk {
    pub fn new(num_blocks: usize) -> Arc<Self> {
        Arc::new(Self {
            data: Mutex::new(vec![0; num_blocks * BLOCK_SIZE]),
            num_blocks,
        })
    }

    /// Raw copy of one block, bypassing any filesystem
    pub fn block(&self, block_id: usize) -> Vec<u8> {
        let start = block_id * BLOCK_SIZE;
        self.data.lock().unwrap()[start..start + BLOCK_SIZE].to_vec()
    }

    /// Edits one block in place, bypassing any filesystem
    pub fn patch(&self, block_id: usize, f: impl FnOnce(&mut [u8])) {
        let start = block_id * BLOCK_SIZE;
        f(&mut self.data.lock().unwrap()[start..start + BLOCK_SIZE]);
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        if block_id >= self.num_blocks {
            return Err(DeviceError::new(block_id));
        }
        let start = block_id * BLOCK_SIZE;
        buf.copy_from_slice(&self.data.lock().unwrap()[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        if block_id >= self.num_blocks {
            return Err(DeviceError::new(block_id));
        }
        let start = block_id * BLOCK_SIZE;
        self.data.lock().unwrap()[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&self, _block_id: usize) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// [`RamDisk`] that can be told to refuse writes to one block
pub struct FaultyDisk {
    pub disk: Arc<RamDisk>,
    /// `(block, writes still allowed)`
    fault: Mutex<Option<(usize, usize)>>,
}

impl FaultyDisk {
    pub fn new(disk: Arc<RamDisk>) -> Arc<Self> {
        Arc::new(Self {
            disk,
            fault: Mutex::new(None),
        })
    }

    /// Lets `allowed` more writes reach `block_id`, then fails every later one
    pub fn fail_writes_to(&self, block_id: usize, allowed: usize) {
        *self.fault.lock().unwrap() = Some((block_id, allowed));
    }

    pub fn heal(&self) {
        *self.fault.lock().unwrap() = None;
    }
}

impl BlockDevice for FaultyDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        self.disk.read_block(block_id, buf)
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        if let Some((faulty, allowed)) = self.fault.lock().unwrap().as_mut() {
            if *faulty == block_id {
                if *allowed == 0 {
                    return Err(DeviceError::new(block_id));
                }
                *allowed -= 1;
            }
        }
        self.disk.write_block(block_id, buf)
    }

    fn flush(&self, block_id: usize) -> Result<(), DeviceError> {
        self.disk.flush(block_id)
    }
}

pub const DISK_BLOCKS: usize = 64;

/// Formats a fresh [`RamDisk`] and mounts it
pub fn mounted() -> (Arc<RamDisk>, Arc<SimpleFileSystem>, Inode) {
    init_logger();
    let disk = RamDisk::new(DISK_BLOCKS);
    SimpleFileSystem::format(disk.clone(), DISK_BLOCKS).unwrap();
    let fs = SimpleFileSystem::mount(disk.clone()).unwrap();
    let root = SimpleFileSystem::root_inode(&fs);
    (disk, fs, root)
}

pub const FILE_MODE: u32 = 0o100644;
pub const DIR_MODE: u32 = 0o040755;
