use super::{read_u64, write_u64};
use crate::{BLOCK_SIZE, MAGIC, MAX_OBJECTS, RESERVED_BLOCKS, VERSION};

const _: () = assert!(MAX_OBJECTS <= u64::BITS as usize);

/// 超级块：
/// - 标识格式；
/// - 记录存活的 inode 数；
/// - 以每块一位记录空闲块，置位表示空闲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数，挂载时检查
    magic: u64,
    pub version: u64,
    pub block_size: u64,
    pub inodes_count: u64,
    pub free_blocks: u64,
}

impl SuperBlock {
    /// 编码后的字节数，0 号块的其余部分为零
    pub const SIZE: usize = 40;

    /// 只含根目录的新镜像的超级块。
    /// 从 `RESERVED_BLOCKS` 到 `total_blocks` 的块初始均空闲。
    pub fn new(total_blocks: usize) -> Self {
        let free_blocks = (RESERVED_BLOCKS..total_blocks.min(MAX_OBJECTS))
            .fold(0, |mask, block_id| mask | 1u64 << block_id);

        Self {
            magic: MAGIC,
            version: VERSION,
            block_size: BLOCK_SIZE as u64,
            inodes_count: 1,
            free_blocks,
        }
    }

    pub fn decode(raw: &[u8]) -> Self {
        Self {
            magic: read_u64(raw, 0),
            version: read_u64(raw, 8),
            block_size: read_u64(raw, 16),
            inodes_count: read_u64(raw, 24),
            free_blocks: read_u64(raw, 32),
        }
    }

    pub fn encode(&self, raw: &mut [u8]) {
        write_u64(raw, 0, self.magic);
        write_u64(raw, 8, self.version);
        write_u64(raw, 16, self.block_size);
        write_u64(raw, 24, self.inodes_count);
        write_u64(raw, 32, self.free_blocks);
    }

    #[inline]
    pub fn magic(&self) -> u64 {
        self.magic
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    #[inline]
    pub fn is_free(&self, block_id: usize) -> bool {
        block_id < MAX_OBJECTS && self.free_blocks & (1u64 << block_id) != 0
    }

    /// 保留块之后编号最小的空闲块
    pub fn first_free(&self) -> Option<usize> {
        (RESERVED_BLOCKS..MAX_OBJECTS).find(|&block_id| self.is_free(block_id))
    }

    #[inline]
    pub fn mark_busy(&mut self, block_id: usize) {
        self.free_blocks &= !(1u64 << block_id);
    }

    #[inline]
    pub fn free_count(&self) -> u32 {
        (self.free_blocks >> RESERVED_BLOCKS).count_ones()
    }
}
