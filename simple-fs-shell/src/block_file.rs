use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use block_dev::{BlockDevice, BLOCK_SIZE};

/// 以宿主机上的文件作为磁盘镜像，统计读写的块数
#[derive(Debug)]
pub struct BlockFile {
    file: Mutex<File>,
    blocks: usize,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl BlockFile {
    /// 打开或创建镜像文件，并将其长度调整为 `blocks` 块
    pub fn open(path: impl AsRef<Path>, blocks: usize) -> io::Result<Self> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        fd.set_len((blocks * BLOCK_SIZE) as u64)?;

        Ok(Self {
            file: Mutex::new(fd),
            blocks,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        })
    }

    #[inline]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn sanity_check(&self, block_id: usize, buf: &[u8]) {
        assert!(
            block_id < self.blocks,
            "block {block_id} is out of the disk of {} blocks",
            self.blocks
        );
        assert_eq!(buf.len(), BLOCK_SIZE, "not a complete block!");
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        self.sanity_check(block_id, buf);
        let mut file = self.file.lock().expect("block file lock poisoned");
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        file.read_exact(buf).expect("not a complete block!");
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        self.sanity_check(block_id, buf);
        let mut file = self.file.lock().expect("block file lock poisoned");
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .expect("seeking error");
        file.write_all(buf).expect("not a complete block!");
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn num_blocks(&self) -> usize {
        self.blocks
    }
}
