//! # 块设备接口层
//!
//! 块设备是以定长的**块**为单位、按编号存取数据的设备；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 数据何时落盘由驱动决定：`write_block` 可以只是缓冲，
//! 随后对同一块的 `flush` 返回才保证其持久。

#![no_std]

use core::fmt;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync {
    /// 将块 `block_id` 的内容读入 `buf`，
    /// `buf.len()` 等于文件系统的块大小
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError>;

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError>;

    /// 返回时先前对 `block_id` 的写入已持久
    fn flush(&self, block_id: usize) -> Result<(), DeviceError>;
}

/// 单个块上的 I/O 故障
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceError {
    pub block_id: usize,
}

impl DeviceError {
    #[inline]
    pub const fn new(block_id: usize) -> Self {
        Self { block_id }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I/O fault on block {}", self.block_id)
    }
}
