#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use block_dev::{BlockDevice, DeviceError};
use simple_fs::BLOCK_SIZE;

/// A host file used as a simple-fs block device
pub struct BlockFile(pub Mutex<File>);

impl BlockFile {
    #[inline]
    pub fn new(file: File) -> Self {
        Self(Mutex::new(file))
    }

    /// Whole blocks the backing file holds
    pub fn blocks(&self) -> std::io::Result<usize> {
        let file = self.0.lock().map_err(|_| std::io::Error::other("poisoned"))?;
        Ok(file.metadata()?.len() as usize / BLOCK_SIZE)
    }

    fn seek_to(file: &mut File, block_id: usize) -> std::io::Result<u64> {
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let mut file = self.0.lock().map_err(|_| DeviceError::new(block_id))?;
        Self::seek_to(&mut file, block_id)
            .and_then(|_| file.read_exact(buf))
            .map_err(|err| {
                log::error!("reading block {block_id}: {err}");
                DeviceError::new(block_id)
            })
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let mut file = self.0.lock().map_err(|_| DeviceError::new(block_id))?;
        Self::seek_to(&mut file, block_id)
            .and_then(|_| file.write_all(buf))
            .map_err(|err| {
                log::error!("writing block {block_id}: {err}");
                DeviceError::new(block_id)
            })
    }

    fn flush(&self, block_id: usize) -> Result<(), DeviceError> {
        let file = self.0.lock().map_err(|_| DeviceError::new(block_id))?;
        file.sync_data().map_err(|err| {
            log::error!("flushing block {block_id}: {err}");
            DeviceError::new(block_id)
        })
    }
}
