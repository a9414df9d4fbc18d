//! # 块访问层
//!
//! 在块设备之上按块号读写整块数据，或者读写某一种磁盘记录。
//! 记录与字节之间的转换见 [`crate::layout`]。

use std::sync::Arc;

use binrw::{BinRead, BinWrite};

use crate::layout::{decode, encode};
use crate::{BlockDevice, DataBlock, Result, BLOCK_SIZE};

pub struct Disk {
    block_device: Arc<dyn BlockDevice>,
}

impl Disk {
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self { block_device }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.block_device.num_blocks()
    }

    pub fn read(&self, block_id: usize) -> DataBlock {
        let mut data = [0; BLOCK_SIZE];
        self.block_device.read_block(block_id, &mut data);
        data
    }

    #[inline]
    pub fn write(&self, block_id: usize, data: &DataBlock) {
        self.block_device.write_block(block_id, data);
    }

    #[inline]
    pub fn zeroize(&self, block_id: usize) {
        self.write(block_id, &[0; BLOCK_SIZE]);
    }

    pub fn load<T>(&self, block_id: usize) -> Result<T>
    where
        T: for<'a> BinRead<Args<'a> = ()>,
    {
        decode(&self.read(block_id))
    }

    pub fn store<T>(&self, block_id: usize, record: &T) -> Result<()>
    where
        T: for<'a> BinWrite<Args<'a> = ()>,
    {
        self.write(block_id, &encode(record)?);
        Ok(())
    }
}
