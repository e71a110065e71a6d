use core::str;

use super::{read_u64, write_u64};
use crate::{BLOCK_SIZE, Error, Result};

/// 文件名的最大字节数，另留一字节存放结尾的 NUL
pub const NAME_MAX_LEN: usize = 255;

/// 一个目录块可容纳的目录项数
pub const RECORDS_PER_BLOCK: usize = BLOCK_SIZE / DirRecord::SIZE;

/// 目录数据块中的 `{inode_no, filename}` 目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRecord {
    inode_no: u64,
    name: [u8; NAME_MAX_LEN + 1],
}

impl DirRecord {
    /// 目录项恒为 264 字节
    pub const SIZE: usize = 8 + NAME_MAX_LEN + 1;

    pub fn new(name: &str, inode_no: u64) -> Result<Self> {
        Self::validate_name(name)?;

        let bytes = name.as_bytes();
        let mut raw_name = [0; NAME_MAX_LEN + 1];
        raw_name[..bytes.len()].copy_from_slice(bytes);

        Ok(Self {
            inode_no,
            name: raw_name,
        })
    }

    /// 名字为 1..=255 字节，不含 NUL 与 `/`
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name.bytes().any(|b| b == 0 || b == b'/') {
            return Err(Error::InvalidArgument);
        }
        if name.len() > NAME_MAX_LEN {
            return Err(Error::NameTooLong);
        }
        Ok(())
    }

    #[inline]
    pub fn inode_no(&self) -> u64 {
        self.inode_no
    }

    /// 存储的名字字节，截至第一个 NUL
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(NAME_MAX_LEN + 1);
        &self.name[..len]
    }

    /// 存储的字节不是 UTF-8 时返回空
    #[inline]
    pub fn name(&self) -> Option<&str> {
        str::from_utf8(self.name_bytes()).ok()
    }

    pub fn decode(raw: &[u8]) -> Self {
        let mut name = [0; NAME_MAX_LEN + 1];
        name.copy_from_slice(&raw[8..Self::SIZE]);

        Self {
            inode_no: read_u64(raw, 0),
            name,
        }
    }

    pub fn encode(&self, raw: &mut [u8]) {
        write_u64(raw, 0, self.inode_no);
        raw[8..Self::SIZE].copy_from_slice(&self.name);
    }

    /// 第 `index` 个目录项在目录块内的字节范围
    #[inline]
    pub fn slot(index: usize) -> core::ops::Range<usize> {
        index * Self::SIZE..(index + 1) * Self::SIZE
    }
}
