extern crate std;

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use std::sync::Mutex;

use block_dev::{BlockDevice, DeviceError};

use crate::{BLOCK_SIZE, DataBlock};

/// In-memory device for unit tests
pub struct Disk {
    pub blocks: Mutex<Vec<DataBlock>>,
    /// Block ids in flush order
    pub flushed: Mutex<Vec<usize>>,
    pub fail_writes: bool,
}

impl Disk {
    pub fn new(blocks: usize, fail_writes: bool) -> Arc<Self> {
        Arc::new(Self {
            blocks: Mutex::new(vec![[0; BLOCK_SIZE]; blocks]),
            flushed: Mutex::new(Vec::new()),
            fail_writes,
        })
    }
}

impl BlockDevice for Disk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let blocks = self.blocks.lock().unwrap();
        let block = blocks.get(block_id).ok_or(DeviceError::new(block_id))?;
        buf.copy_from_slice(block);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        if self.fail_writes {
            return Err(DeviceError::new(block_id));
        }
        let mut blocks = self.blocks.lock().unwrap();
        let block = blocks.get_mut(block_id).ok_or(DeviceError::new(block_id))?;
        block.copy_from_slice(buf);
        Ok(())
    }

    fn flush(&self, block_id: usize) -> Result<(), DeviceError> {
        self.flushed.lock().unwrap().push(block_id);
        Ok(())
    }
}
