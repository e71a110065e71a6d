//! 文件系统引擎与 VFS 胶水层之间交换的类型，
//! 后者把 `open`/`read`/`write`/`readdir`/`mkdir` 分派给引擎。

#![no_std]

extern crate alloc;

mod dirent;
mod error;
mod stat;

pub use self::{
    dirent::{DirEntry, DirEntryType},
    error::{Error, Result},
    stat::Stat,
};
