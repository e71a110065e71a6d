mod cli;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Command};
use simple_fs::{BLOCK_SIZE, SimpleFileSystem};
use simple_fs_fuse::BlockFile;
use vfs::DirEntryType;

const FILE_MODE: u32 = 0o100644;

fn main() -> io::Result<ExitCode> {
    env_logger::init();

    match Cli::parse().command {
        Command::Pack {
            source,
            image,
            blocks,
        } => pack(&source, &image, blocks),
        Command::Ls { image } => ls(&image),
        Command::Check { image } => check(&image),
    }
}

fn fs_error(err: vfs::Error) -> io::Error {
    io::Error::other(err.to_string())
}

fn open(image: &Path) -> io::Result<Arc<BlockFile>> {
    let fd = OpenOptions::new().read(true).write(true).open(image)?;
    Ok(Arc::new(BlockFile::new(fd)))
}

fn pack(source: &Path, image: &Path, blocks: usize) -> io::Result<ExitCode> {
    println!("source={source:?}\nimage={image:?}");

    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(image)?;
    fd.set_len((blocks * BLOCK_SIZE) as u64)?;
    let block_file = Arc::new(BlockFile::new(fd));

    SimpleFileSystem::format(block_file.clone(), blocks).map_err(fs_error)?;
    let sfs = SimpleFileSystem::mount(block_file).map_err(fs_error)?;
    let root_inode = SimpleFileSystem::root_inode(&sfs);

    let mut files = fs::read_dir(source)?
        .filter_map(|entry| {
            entry
                .and_then(|entry| Ok((entry.file_type()?.is_file(), entry)))
                .map(|(is_file, entry)| is_file.then_some(entry))
                .transpose()
        })
        .collect::<Result<Vec<_>, _>>()?;
    files.sort_by_key(|entry| entry.file_name());

    for entry in files {
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            log::warn!("skipping {:?}: name is not UTF-8", entry.path());
            continue;
        };

        let data = fs::read(entry.path())?;
        if data.len() > BLOCK_SIZE {
            log::warn!("skipping {name:?}: {} bytes do not fit one block", data.len());
            continue;
        }

        let inode = root_inode.create(&name, FILE_MODE).map_err(fs_error)?;
        inode.write_at(0, &data).map_err(fs_error)?;
        println!("file: {name:?} ({} bytes)", data.len());
    }

    sfs.sync_all().map_err(fs_error)?;
    Ok(ExitCode::SUCCESS)
}

fn ls(image: &Path) -> io::Result<ExitCode> {
    let sfs = SimpleFileSystem::mount(open(image)?).map_err(fs_error)?;
    let root_inode = SimpleFileSystem::root_inode(&sfs);

    for entry in root_inode.enumerate().map_err(fs_error)? {
        let kind = match entry.ty {
            DirEntryType::Directory => 'd',
            DirEntryType::Regular => '-',
            DirEntryType::Unknown => '?',
        };
        let size = match root_inode.lookup(&entry.name) {
            Ok(inode) => inode.stat().map_err(fs_error)?.size.to_string(),
            Err(_) => "?".to_owned(),
        };
        println!("{kind} {:>6} {:>8} {}", entry.inode, size, entry.name);
    }

    Ok(ExitCode::SUCCESS)
}

fn check(image: &Path) -> io::Result<ExitCode> {
    let block_file = open(image)?;
    let blocks = block_file.blocks()?;
    let sfs = SimpleFileSystem::mount(block_file).map_err(fs_error)?;

    let report = sfs.check(blocks).map_err(fs_error)?;
    if report.is_clean() {
        println!("{image:?}: clean");
        return Ok(ExitCode::SUCCESS);
    }

    for problem in &report.problems {
        println!("{problem}");
    }
    println!("{image:?}: {} problem(s)", report.problems.len());
    Ok(ExitCode::FAILURE)
}
