mod common;

use common::FILE_MODE;
use simple_fs::{BLOCK_SIZE, Error};

#[test]
fn write_then_read_back() {
    let (_disk, _fs, root) = common::mounted();
    let file = root.create("f", FILE_MODE).unwrap();

    let data = b"hello, simple-fs";
    assert_eq!(file.write_at(0, data).unwrap(), data.len());

    let mut buf = vec![0; data.len()];
    assert_eq!(file.read_at(0, &mut buf).unwrap(), data.len());
    assert_eq!(buf, data);
}

#[test]
fn shorter_write_shrinks_file() {
    let (_disk, _fs, root) = common::mounted();
    let file = root.create("f", FILE_MODE).unwrap();

    file.write_at(0, b"a long first write").unwrap();
    file.write_at(0, b"short").unwrap();
    assert_eq!(file.stat().unwrap().size, 5);

    let mut buf = [0; 64];
    let len = file.read_at(0, &mut buf).unwrap();
    assert_eq!(&buf[..len], b"short");
}

#[test]
fn reads_stop_at_end_of_file() {
    let (_disk, _fs, root) = common::mounted();
    let file = root.create("f", FILE_MODE).unwrap();
    file.write_at(0, b"abcdef").unwrap();

    let mut buf = [0; 2];
    assert_eq!(file.read_at(2, &mut buf).unwrap(), 2);
    assert_eq!(&buf, b"cd");

    let mut buf = [0; 10];
    assert_eq!(file.read_at(4, &mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"ef");

    for offset in [6, 7, BLOCK_SIZE, usize::MAX] {
        assert_eq!(file.read_at(offset, &mut buf).unwrap(), 0);
    }
}

#[test]
fn empty_file_reads_nothing() {
    let (_disk, _fs, root) = common::mounted();
    let file = root.create("f", FILE_MODE).unwrap();

    let mut buf = [0xff; 8];
    assert_eq!(file.read_at(0, &mut buf).unwrap(), 0);
    assert_eq!(buf, [0xff; 8]);
}

#[test]
fn write_past_end_leaves_zeroed_gap() {
    let (_disk, _fs, root) = common::mounted();
    let file = root.create("f", FILE_MODE).unwrap();

    file.write_at(4, b"x").unwrap();
    let mut buf = [0xff; 8];
    assert_eq!(file.read_at(0, &mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], b"\0\0\0\0x");
}

#[test]
fn writes_are_limited_to_one_block() {
    let (_disk, _fs, root) = common::mounted();
    let file = root.create("f", FILE_MODE).unwrap();

    file.write_at(BLOCK_SIZE - 6, b"at end").unwrap();
    assert_eq!(file.stat().unwrap().size, BLOCK_SIZE as u64);

    assert_eq!(
        file.write_at(BLOCK_SIZE - 6, b"at end!").unwrap_err(),
        Error::FileTooLarge
    );
    assert_eq!(
        file.write_at(usize::MAX, b"x").unwrap_err(),
        Error::FileTooLarge
    );
    assert_eq!(
        file.write_at(0, &vec![1; BLOCK_SIZE + 1]).unwrap_err(),
        Error::FileTooLarge
    );

    // rejected writes change nothing
    assert_eq!(file.stat().unwrap().size, BLOCK_SIZE as u64);
    let mut buf = [0; 6];
    file.read_at(BLOCK_SIZE - 6, &mut buf).unwrap();
    assert_eq!(&buf, b"at end");
}

#[test]
fn whole_block_file() {
    let (_disk, _fs, root) = common::mounted();
    let file = root.create("f", FILE_MODE).unwrap();

    let data: Vec<u8> = (0..BLOCK_SIZE).map(|i| (i % 251) as u8).collect();
    file.write_at(0, &data).unwrap();

    let mut buf = vec![0; BLOCK_SIZE + 100];
    assert_eq!(file.read_at(0, &mut buf).unwrap(), BLOCK_SIZE);
    assert_eq!(&buf[..BLOCK_SIZE], data);
}

#[test]
fn directories_hold_no_bytes() {
    let (_disk, _fs, root) = common::mounted();

    let mut buf = [0; 4];
    assert_eq!(root.read_at(0, &mut buf).unwrap_err(), Error::IsADirectory);
    assert_eq!(root.write_at(0, b"data").unwrap_err(), Error::IsADirectory);
}

#[test]
fn files_do_not_share_blocks() {
    let (_disk, _fs, root) = common::mounted();
    let a = root.create("a", FILE_MODE).unwrap();
    let b = root.create("b", FILE_MODE).unwrap();

    a.write_at(0, b"aaaa").unwrap();
    b.write_at(0, b"bb").unwrap();

    let mut buf = [0; 4];
    assert_eq!(a.read_at(0, &mut buf).unwrap(), 4);
    assert_eq!(&buf, b"aaaa");
    assert_eq!(b.read_at(0, &mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"bb");
}
