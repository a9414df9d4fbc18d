//! # 调试层
//!
//! 只读地收集超级块与所有有效 inode 的块分布，供诊断使用。

use core::fmt;

use crate::layout::{IndirectBlock, InodeBlock, Inumber, SuperBlock};
use crate::{Result, SimpleFileSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub super_block: SuperBlock,
    pub inodes: Vec<InodeReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeReport {
    pub inumber: Inumber,
    pub size: u32,
    /// 非零的直接索引
    pub direct: Vec<u32>,
    /// 间接索引块，及其中非零的块编号
    pub indirect: Option<(u32, Vec<u32>)>,
}

impl SimpleFileSystem {
    pub fn dump(&self) -> Result<DumpReport> {
        self.state.mounted()?;

        let super_block: SuperBlock = self.disk.load(0)?;
        let mut inodes = Vec::new();

        for block_rank in 0..super_block.inode_blocks as usize {
            let inode_block: InodeBlock = self.disk.load(block_rank + 1)?;

            for (slot, inode) in inode_block.inodes.iter().enumerate() {
                if !inode.is_valid() {
                    continue;
                }

                let indirect = if inode.indirect != 0 {
                    let indirect_block: IndirectBlock = self.disk.load(inode.indirect as usize)?;
                    Some((inode.indirect, indirect_block.data_blocks().collect()))
                } else {
                    None
                };

                inodes.push(InodeReport {
                    inumber: Inumber::from_location(block_rank, slot),
                    size: inode.size,
                    direct: inode.direct_blocks().collect(),
                    indirect,
                });
            }
        }

        Ok(DumpReport {
            super_block,
            inodes,
        })
    }
}

impl fmt::Display for DumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let super_block = &self.super_block;

        writeln!(f, "superblock:")?;
        if super_block.is_valid() {
            writeln!(f, "    magic number is valid")?;
        } else {
            writeln!(f, "    magic number is invalid!")?;
        }
        writeln!(f, "    {} blocks", super_block.total_blocks)?;
        writeln!(f, "    {} inode blocks", super_block.inode_blocks)?;
        writeln!(f, "    {} inodes", super_block.total_inodes)?;

        for inode in &self.inodes {
            write!(f, "{inode}")?;
        }
        Ok(())
    }
}

impl fmt::Display for InodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "inode {}:", self.inumber)?;
        writeln!(f, "    size: {} bytes", self.size)?;
        writeln!(f, "    direct blocks:{}", BlockList(&self.direct))?;

        if let Some((indirect, blocks)) = &self.indirect {
            writeln!(f, "    indirect block: {indirect}")?;
            writeln!(f, "    indirect data blocks:{}", BlockList(blocks))?;
        }
        Ok(())
    }
}

/// 以空格分隔的块编号
struct BlockList<'a>(&'a [u32]);

impl fmt::Display for BlockList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|block_id| write!(f, " {block_id}"))
    }
}
