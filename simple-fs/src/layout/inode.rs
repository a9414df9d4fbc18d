use core::fmt;

use binrw::binrw;
use derive_more::{From, Into};

use crate::{INODES_PER_BLOCK, POINTERS_PER_INODE};

/// inode 编号，从 1 开始；0 表示“没有 inode”
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[repr(transparent)]
pub struct Inumber(u32);

impl Inumber {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// inode 在磁盘上的位置：**inode 块的块号**以及**块内槽位**
    pub fn location(self) -> (usize, usize) {
        assert_ne!(self.0, 0, "inumber 0 names no inode");
        let index = self.0 as usize - 1;

        (1 + index / INODES_PER_BLOCK, index % INODES_PER_BLOCK)
    }

    /// `location` 的逆运算，`block_rank` 为 inode 区域内第几块(从 0 开始)
    pub fn from_location(block_rank: usize, slot: usize) -> Self {
        Self((block_rank * INODES_PER_BLOCK + slot + 1) as u32)
    }
}

impl fmt::Display for Inumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiskInode {
    /// 1 为有效
    valid: u32,
    // 不用usize是为了严控布局
    pub size: u32,
    /// 直接索引，0 表示未使用
    pub direct: [u32; POINTERS_PER_INODE],
    /// 指向一个一级索引块，0 表示没有
    pub indirect: u32,
}

impl DiskInode {
    #[inline]
    pub fn new_file() -> Self {
        Self {
            valid: 1,
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid != 0
    }

    /// 已分配的直接索引块
    pub fn direct_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.direct.iter().copied().filter(|&block_id| block_id != 0)
    }
}

/// inode 区域内的一整块
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeBlock {
    #[br(count = INODES_PER_BLOCK)]
    pub inodes: Vec<DiskInode>,
}

impl Default for InodeBlock {
    fn default() -> Self {
        Self {
            inodes: vec![DiskInode::default(); INODES_PER_BLOCK],
        }
    }
}
