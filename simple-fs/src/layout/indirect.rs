//! 一级间接索引块：整个块连续存储**块编号**，每个编号都指向一个**数据块**，0 表示空位。
//!
//! 文件内第 `rank` 个数据块：
//! - `rank < POINTERS_PER_INODE` 时经 inode 的直接索引定位；
//! - 否则经间接索引块的第 `rank - POINTERS_PER_INODE` 项定位。

use binrw::binrw;

use crate::{FsError, Result, BLOCK_SIZE, POINTERS_PER_BLOCK, POINTERS_PER_INODE};

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectBlock {
    #[br(count = POINTERS_PER_BLOCK)]
    pub pointers: Vec<u32>,
}

impl Default for IndirectBlock {
    fn default() -> Self {
        Self {
            pointers: vec![0; POINTERS_PER_BLOCK],
        }
    }
}

impl IndirectBlock {
    /// 已分配的数据块
    pub fn data_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.pointers.iter().copied().filter(|&block_id| block_id != 0)
    }
}

/// 文件内某个数据块的编号存放在哪里
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSlot {
    /// inode 直接索引的下标
    Direct(usize),
    /// 间接索引块内的下标
    Indirect(usize),
}

impl BlockSlot {
    pub fn of_rank(rank: usize) -> Result<Self> {
        if rank < POINTERS_PER_INODE {
            Ok(Self::Direct(rank))
        } else if rank < POINTERS_PER_INODE + POINTERS_PER_BLOCK {
            Ok(Self::Indirect(rank - POINTERS_PER_INODE))
        } else {
            Err(FsError::FileTooLarge((rank + 1) * BLOCK_SIZE))
        }
    }
}
