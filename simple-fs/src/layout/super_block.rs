use binrw::binrw;

use crate::{INODES_PER_BLOCK, MAGIC};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位 inode 区域
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub total_blocks: u32,
    /// 存放 inode 的块数
    pub inode_blocks: u32,
    /// inode 总数，恒为 `inode_blocks * INODES_PER_BLOCK`
    pub total_inodes: u32,
}

impl SuperBlock {
    #[inline]
    pub fn new(total_blocks: u32, inode_blocks: u32) -> Self {
        Self {
            magic: MAGIC,
            total_blocks,
            inode_blocks,
            total_inodes: inode_blocks * INODES_PER_BLOCK as u32,
        }
    }

    #[inline]
    pub fn magic(&self) -> u32 {
        self.magic
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 数据块区域的起始块号，也是位图分配器开始查找空闲块的位置
    #[inline]
    pub fn data_area_start(&self) -> usize {
        self.inode_blocks as usize + 1
    }
}
