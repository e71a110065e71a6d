use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use block_dev::{BlockDevice, DeviceError};
use simple_fs::{BLOCK_SIZE, SimpleFileSystem};

use crate::BlockFile;

/// Scratch image under the system temp directory, removed on drop
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str, blocks: usize) -> (Self, File) {
        let path = std::env::temp_dir().join(format!(
            "simple-fs-fuse-{}-{name}.img",
            std::process::id()
        ));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        file.set_len((blocks * BLOCK_SIZE) as u64).unwrap();
        (Self(path), file)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

#[test]
fn blocks_round_trip_through_file() {
    let (_scratch, file) = Scratch::new("blocks", 4);
    let dev = BlockFile::new(file);
    assert_eq!(dev.blocks().unwrap(), 4);

    let written = [0x5a; BLOCK_SIZE];
    dev.write_block(2, &written).unwrap();
    dev.flush(2).unwrap();

    let mut buf = [0; BLOCK_SIZE];
    dev.read_block(2, &mut buf).unwrap();
    assert_eq!(buf, written);
    dev.read_block(1, &mut buf).unwrap();
    assert_eq!(buf, [0; BLOCK_SIZE]);
}

#[test]
fn reading_past_the_end_fails() {
    let (_scratch, file) = Scratch::new("short", 2);
    let dev = BlockFile::new(file);

    let mut buf = [0; BLOCK_SIZE];
    assert_eq!(dev.read_block(2, &mut buf), Err(DeviceError::new(2)));
}

#[test]
fn filesystem_on_a_host_file() {
    let (scratch, file) = Scratch::new("fs", 16);
    let dev = Arc::new(BlockFile::new(file));

    SimpleFileSystem::format(dev.clone(), dev.blocks().unwrap()).unwrap();
    let fs = SimpleFileSystem::mount(dev).unwrap();
    SimpleFileSystem::root_inode(&fs)
        .create("hello", 0o100644)
        .unwrap()
        .write_at(0, b"hello from the host")
        .unwrap();
    drop(fs);

    let reopened = File::options().read(true).write(true).open(&scratch.0).unwrap();
    let fs = SimpleFileSystem::mount(Arc::new(BlockFile::new(reopened))).unwrap();
    let file = SimpleFileSystem::root_inode(&fs).lookup("hello").unwrap();
    let mut buf = [0; 64];
    let len = file.read_at(0, &mut buf).unwrap();
    assert_eq!(&buf[..len], b"hello from the host");
    assert!(fs.check(16).unwrap().is_clean());
}
