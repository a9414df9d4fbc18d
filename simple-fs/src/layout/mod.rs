//! # 磁盘数据结构层
//!
//! simple-fs 的磁盘布局：
//! 超级块 | inode 区域(约占总块数的 10%) | 数据块区域
//!
//! 每种记录都通过 binrw 显式编解码到一整块大小的字节缓冲区，
//! 不存在同一块内存被多种类型重叠解释的情况。

mod super_block;
pub use super_block::SuperBlock;

mod inode;
pub use inode::{DiskInode, InodeBlock, Inumber};

mod indirect;
pub use indirect::{BlockSlot, IndirectBlock};

use std::io::Cursor;

use binrw::{BinRead, BinWrite};

use crate::{DataBlock, Result, BLOCK_SIZE};

/// 把一整块字节解读为记录 `T`
pub fn decode<T>(block: &DataBlock) -> Result<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    Ok(T::read_le(&mut Cursor::new(&block[..]))?)
}

/// 把记录 `T` 写成一整块字节，剩余部分填 0
pub fn encode<T>(record: &T) -> Result<DataBlock>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut block = [0; BLOCK_SIZE];
    record.write_le(&mut Cursor::new(&mut block[..]))?;
    Ok(block)
}
