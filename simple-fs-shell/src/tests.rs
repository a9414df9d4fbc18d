use std::fs;
use std::io::Write;
use std::ops::ControlFlow;
use std::sync::Arc;

use block_dev::{BlockDevice, BLOCK_SIZE};
use tempfile::{tempdir, NamedTempFile};

use crate::{BlockFile, Shell};

fn run(shell: &mut Shell<Vec<u8>>, line: &str) -> String {
    assert_eq!(ControlFlow::Continue(()), shell.execute(line).unwrap());
    String::from_utf8(shell.out_mut().drain(..).collect()).unwrap()
}

#[test]
fn block_file_round_trip() {
    let image = NamedTempFile::new().unwrap();
    let block_file = BlockFile::open(image.path(), 4).unwrap();
    assert_eq!(4, block_file.num_blocks());
    assert_eq!(4 * BLOCK_SIZE as u64, image.as_file().metadata().unwrap().len());

    let data = [3; BLOCK_SIZE];
    block_file.write_block(2, &data);
    let mut buf = [0; BLOCK_SIZE];
    block_file.read_block(2, &mut buf);
    assert_eq!(data, buf);

    block_file.read_block(3, &mut buf);
    assert_eq!([0; BLOCK_SIZE], buf);

    assert_eq!(2, block_file.reads());
    assert_eq!(1, block_file.writes());
}

#[test]
#[should_panic(expected = "out of the disk")]
fn block_file_rejects_out_of_range() {
    let image = NamedTempFile::new().unwrap();
    let block_file = BlockFile::open(image.path(), 4).unwrap();
    block_file.read_block(4, &mut [0; BLOCK_SIZE]);
}

#[test]
#[should_panic(expected = "not a complete block")]
fn block_file_rejects_partial_block() {
    let image = NamedTempFile::new().unwrap();
    let block_file = BlockFile::open(image.path(), 4).unwrap();
    block_file.write_block(0, &[0; 16]);
}

#[test]
fn shell_session() {
    let dir = tempdir().unwrap();
    let image = dir.path().join("image.20");
    let source = dir.path().join("source.txt");
    let target = dir.path().join("target.txt");
    let content = "hello world\n".repeat(1000);
    fs::write(&source, &content).unwrap();

    let block_file: Arc<dyn BlockDevice> = Arc::new(BlockFile::open(&image, 20).unwrap());
    let mut shell = Shell::new(block_file, Vec::new());

    assert_eq!("create failed: file system is not mounted\n", run(&mut shell, "create"));
    assert_eq!("disk formatted.\n", run(&mut shell, "format"));
    assert_eq!("disk mounted.\n", run(&mut shell, "mount"));
    assert_eq!("created inode 1\n", run(&mut shell, "create"));

    let copyin = format!("copyin {} 1", source.display());
    assert_eq!("12000 bytes copied\n", run(&mut shell, &copyin));
    assert_eq!("inode 1 has size 12000\n", run(&mut shell, "getsize 1"));
    assert_eq!(content, run(&mut shell, "cat 1"));

    let copyout = format!("copyout 1 {}", target.display());
    assert_eq!("12000 bytes copied\n", run(&mut shell, &copyout));
    assert_eq!(content, fs::read_to_string(&target).unwrap());

    let debug = run(&mut shell, "debug");
    assert!(debug.contains("inode 1:\n    size: 12000 bytes\n    direct blocks: 3 4 5\n"));

    assert_eq!("inode 1 deleted.\n", run(&mut shell, "delete 1"));
    assert_eq!(
        "getsize failed: inode 1 is not valid\n",
        run(&mut shell, "getsize 1")
    );

    assert_eq!(
        ControlFlow::Break(()),
        shell.execute("quit").unwrap()
    );
}

#[test]
fn image_survives_reopen() {
    let image = NamedTempFile::new().unwrap();
    let mut source = NamedTempFile::new().unwrap();
    source.write_all(b"persistent").unwrap();

    {
        let block_file: Arc<dyn BlockDevice> =
            Arc::new(BlockFile::open(image.path(), 10).unwrap());
        let mut shell = Shell::new(block_file, Vec::new());
        run(&mut shell, "format");
        run(&mut shell, "mount");
        run(&mut shell, "create");
        run(&mut shell, &format!("copyin {} 1", source.path().display()));
    }

    let block_file: Arc<dyn BlockDevice> = Arc::new(BlockFile::open(image.path(), 10).unwrap());
    let mut shell = Shell::new(block_file, Vec::new());
    assert_eq!("disk mounted.\n", run(&mut shell, "mount"));
    assert_eq!("persistent", run(&mut shell, "cat 1"));
}

#[test]
fn copyin_replaces_content() {
    let image = NamedTempFile::new().unwrap();
    let empty = NamedTempFile::new().unwrap();
    let mut source = NamedTempFile::new().unwrap();
    source.write_all(b"old content").unwrap();

    let block_file: Arc<dyn BlockDevice> = Arc::new(BlockFile::open(image.path(), 20).unwrap());
    let mut shell = Shell::new(block_file, Vec::new());
    run(&mut shell, "format");
    run(&mut shell, "mount");
    run(&mut shell, "create");
    run(&mut shell, &format!("copyin {} 1", source.path().display()));

    assert_eq!(
        "0 bytes copied\n",
        run(&mut shell, &format!("copyin {} 1", empty.path().display()))
    );
    assert_eq!("inode 1 has size 0\n", run(&mut shell, "getsize 1"));
}

#[test]
fn bad_input() {
    let image = NamedTempFile::new().unwrap();
    let block_file: Arc<dyn BlockDevice> = Arc::new(BlockFile::open(image.path(), 20).unwrap());
    let mut shell = Shell::new(block_file, Vec::new());

    assert_eq!("", run(&mut shell, "   "));
    assert_eq!(
        "mount failed: disk does not contain a valid file system (magic 0x00000000)\n",
        run(&mut shell, "mount")
    );
    assert_eq!(
        "unknown command: frobnicate 3\ntype 'help' for a list of commands.\n",
        run(&mut shell, "frobnicate 3")
    );
    assert_eq!(
        "wrong arguments for delete, see 'help'\n",
        run(&mut shell, "delete")
    );
    assert_eq!("invalid inode number: one\n", run(&mut shell, "getsize one"));
    assert!(run(&mut shell, "help").starts_with("Commands are:\n"));
}
