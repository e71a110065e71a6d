//! # 索引节点层
//!
//! [`Inode`] 是已挂载的 [`SimpleFileSystem`] 中一个文件或目录的句柄。
//! 句柄不缓存元数据，每次操作都从 inode 表重新读取对象的记录。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::layout::{DirRecord, DiskInode, InodeKind, Mode, RECORDS_PER_BLOCK};
use crate::sfs::SimpleFileSystem;
use crate::sync;
use crate::{BLOCK_SIZE, DataBlock, DirEntry, DirEntryType, Error, MAX_OBJECTS, Result, Stat};

#[derive(Debug, Clone)]
pub struct Inode {
    inode_no: u64,
    fs: Arc<SimpleFileSystem>,
}

impl Inode {
    #[inline]
    pub(crate) fn new(inode_no: u64, fs: Arc<SimpleFileSystem>) -> Self {
        Self { inode_no, fs }
    }

    #[inline]
    pub fn inode_no(&self) -> u64 {
        self.inode_no
    }

    #[inline]
    pub fn fs(&self) -> &Arc<SimpleFileSystem> {
        &self.fs
    }

    /// 对象当前的记录
    pub fn disk_inode(&self) -> Result<DiskInode> {
        self.fs
            .find_inode(self.inode_no)?
            .ok_or(Error::StaleReference {
                inode: self.inode_no,
            })
    }

    pub fn is_dir(&self) -> Result<bool> {
        Ok(self.disk_inode()?.is_dir())
    }

    pub fn stat(&self) -> Result<Stat> {
        let inode = self.disk_inode()?;
        let (kind, size) = match inode.mode.kind {
            InodeKind::Directory => (
                DirEntryType::Directory,
                (inode.children_count().min(RECORDS_PER_BLOCK) * DirRecord::SIZE) as u64,
            ),
            InodeKind::Regular => (DirEntryType::Regular, inode.size),
        };

        Ok(Stat {
            inode: inode.inode_no,
            kind,
            mode: inode.mode.bits(),
            block_size: BLOCK_SIZE as u64,
            blocks: 1,
            size,
        })
    }

    /// 以给定的 `st_mode` 在本目录下创建 `name`。
    ///
    /// 先占空间再链接：依次是数据块、inode 记录、目录项、父目录的子项数。
    /// 中途失败时已写入的内容保留，不做任何回滚。
    pub fn create(&self, name: &str, mode: u32) -> Result<Inode> {
        let dir_lock = self.fs.dir_locks.get(self.inode_no);
        let _dir_lock = sync::lock_interruptible(&dir_lock, &self.fs.interrupt)?;

        let mut parent = self.disk_inode()?;
        if !parent.is_dir() {
            return Err(Error::NotADirectory);
        }
        DirRecord::validate_name(name)?;
        if self.fs.lookup_record(&parent, name)?.is_some() {
            return Err(Error::AlreadyExists);
        }
        if parent.children_count() >= RECORDS_PER_BLOCK {
            log::warn!("directory {} is full", self.inode_no);
            return Err(Error::NoSpace);
        }

        if self.fs.object_count()? as usize >= MAX_OBJECTS {
            log::warn!("object limit of {MAX_OBJECTS} reached");
            return Err(Error::NoSpace);
        }
        let mode = Mode::from_bits(mode).ok_or(Error::InvalidArgument)?;

        let block_id = self.fs.alloc_block()?;
        let cache = self.fs.cache.get(block_id as usize)?;
        let mut cache = cache.lock();
        cache.map_mut(|block: &mut DataBlock| block.fill(0));
        cache.sync()?;
        drop(cache);

        let inode = self.fs.append_inode(mode, block_id)?;

        self.fs.append_record(&parent, inode.inode_no, name)?;

        parent.size += 1;
        self.fs.update_inode(&parent)?;

        log::info!(
            "created {name:?} as inode {} in directory {}",
            inode.inode_no,
            self.inode_no
        );
        Ok(Inode::new(inode.inode_no, self.fs.clone()))
    }

    /// 将 `mode` 的类型强制为目录的 `create`
    pub fn mkdir(&self, name: &str, mode: u32) -> Result<Inode> {
        self.create(name, (mode & !Mode::S_IFMT) | Mode::S_IFDIR)
    }

    /// 在本目录下解析 `name`。
    ///
    /// 目录项指向的对象从未进入 inode 表时，报告为 `CorruptReference`。
    pub fn lookup(&self, name: &str) -> Result<Inode> {
        let dir = self.disk_inode()?;
        if !dir.is_dir() {
            return Err(Error::NotADirectory);
        }

        let inode_no = self
            .fs
            .lookup_record(&dir, name)?
            .ok_or(Error::NotFound)?;
        match self.fs.find_inode(inode_no)? {
            Some(_) => Ok(Inode::new(inode_no, self.fs.clone())),
            None => {
                log::error!(
                    "directory {}: {name:?} refers to inode {inode_no}, which is not stored",
                    self.inode_no
                );
                Err(Error::CorruptReference { inode: inode_no })
            }
        }
    }

    /// 从 `offset` 起至多读出 `buf.len()` 字节，不越过文件末尾。
    /// 返回读出的字节数。
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize> {
        let inode = self.disk_inode()?;
        if inode.is_dir() {
            return Err(Error::IsADirectory);
        }

        let end = (inode.size as usize).min(BLOCK_SIZE);
        if offset >= end {
            return Ok(0);
        }
        let len = buf.len().min(end - offset);

        self.fs
            .cache
            .get(inode.data_block_number as usize)?
            .lock()
            .map(|block: &DataBlock| buf[..len].copy_from_slice(&block[offset..offset + len]));

        Ok(len)
    }

    /// 在 `offset` 处写入 `buf`，并把文件大小设为 `offset + buf.len()`，
    /// 即使这会缩小文件。
    ///
    /// 数据先于新大小到达设备。越过唯一数据块的写入以 `FileTooLarge` 失败，
    /// 且不做任何修改。
    ///
    /// 更新大小时出错（包括 `Cancelled`）返回时数据已经持久：
    /// 数据块可能已是新内容，而存储的大小仍是旧值。
    pub fn write_at(&self, offset: usize, buf: &[u8]) -> Result<usize> {
        let inode = self.disk_inode()?;
        if inode.is_dir() {
            return Err(Error::IsADirectory);
        }

        let end = match offset.checked_add(buf.len()) {
            Some(end) if end <= BLOCK_SIZE => end,
            _ => return Err(Error::FileTooLarge),
        };

        let cache = self.fs.cache.get(inode.data_block_number as usize)?;
        let mut cache = cache.lock();
        cache.map_mut(|block: &mut DataBlock| block[offset..end].copy_from_slice(buf));
        cache.sync()?;
        drop(cache);

        self.fs
            .modify_inode(self.inode_no, |inode| inode.size = end as u64)?;

        Ok(buf.len())
    }

    /// 按创建顺序列出本目录的全部目录项
    #[inline]
    pub fn enumerate(&self) -> Result<Vec<DirEntry>> {
        self.read_dir(&mut 0)
    }

    /// `*pos` 为零时列出整个目录，并把 `pos` 移到最后一项之后。
    /// 不支持续读：游标非零时什么也不返回。
    pub fn read_dir(&self, pos: &mut u64) -> Result<Vec<DirEntry>> {
        let dir = self.disk_inode()?;
        if !dir.is_dir() {
            return Err(Error::NotADirectory);
        }
        if *pos != 0 {
            return Ok(Vec::new());
        }

        let entries = self
            .fs
            .records(&dir)?
            .into_iter()
            .map(|record| {
                let ty = match self.fs.find_inode(record.inode_no()) {
                    Ok(Some(inode)) if inode.is_dir() => DirEntryType::Directory,
                    Ok(Some(_)) => DirEntryType::Regular,
                    Ok(None) | Err(Error::CorruptReference { .. }) => DirEntryType::Unknown,
                    Err(err) => return Err(err),
                };

                Ok(DirEntry {
                    inode: record.inode_no(),
                    ty,
                    name: String::from_utf8_lossy(record.name_bytes()).into_owned(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        *pos = entries.len() as u64;
        Ok(entries)
    }
}
