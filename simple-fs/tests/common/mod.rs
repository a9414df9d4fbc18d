#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use simple_fs::{BlockDevice, SimpleFileSystem, BLOCK_SIZE};

/// 内存中的磁盘
pub struct MemDisk(Mutex<Vec<[u8; BLOCK_SIZE]>>);

impl MemDisk {
    pub fn new(blocks: usize) -> Arc<Self> {
        Arc::new(Self(Mutex::new(vec![[0; BLOCK_SIZE]; blocks])))
    }

    pub fn block(&self, block_id: usize) -> [u8; BLOCK_SIZE] {
        self.0.lock().unwrap()[block_id]
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        buf.copy_from_slice(&self.0.lock().unwrap()[block_id]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        self.0.lock().unwrap()[block_id].copy_from_slice(buf);
    }

    fn num_blocks(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// 格式化并挂载一块 `blocks` 块大小的内存磁盘
pub fn mounted(blocks: usize) -> (Arc<MemDisk>, SimpleFileSystem) {
    let disk = MemDisk::new(blocks);
    let mut fs = SimpleFileSystem::new(disk.clone());
    fs.format().unwrap();
    fs.mount().unwrap();
    (disk, fs)
}

/// 每个字节都不一样的测试数据
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
