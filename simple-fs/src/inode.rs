//! # 索引节点管理层
//!
//! inode 从不被真正移除：删除只是把它标记为无效，
//! 之后的 `create` 会按编号顺序复用它。

use log::debug;

use crate::disk::Disk;
use crate::layout::{DiskInode, IndirectBlock, InodeBlock, Inumber};
use crate::sfs::Mounted;
use crate::{FsError, Result, SimpleFileSystem};

impl SimpleFileSystem {
    /// 找到编号最小的无效 inode，初始化为空文件并返回其编号
    pub fn create(&mut self) -> Result<Inumber> {
        let mounted = self.state.mounted_mut()?;

        for block_rank in 0..mounted.super_block.inode_blocks as usize {
            let block_id = block_rank + 1;
            let mut inode_block: InodeBlock = self.disk.load(block_id)?;

            let Some(slot) = inode_block.inodes.iter().position(|inode| !inode.is_valid())
            else {
                continue;
            };

            inode_block.inodes[slot] = DiskInode::new_file();
            self.disk.store(block_id, &inode_block)?;
            mounted.bitmap.mark(block_id);

            let inumber = Inumber::from_location(block_rank, slot);
            debug!("created inode {inumber}");
            return Ok(inumber);
        }

        Err(FsError::NoFreeInode)
    }

    /// 释放 inode 占用的全部块，并将其标记为无效
    pub fn delete(&mut self, inumber: Inumber) -> Result<()> {
        let mounted = self.state.mounted_mut()?;
        mounted.check_inumber(inumber)?;

        let mut inode = self.disk.load_valid_inode(inumber)?;
        release_blocks(&self.disk, mounted, &mut inode)?;
        self.disk.store_inode(inumber, &DiskInode::default())?;

        debug!("deleted inode {inumber}");
        Ok(())
    }

    /// 文件的字节数。无效 inode 报 [`FsError::InodeNotValid`]，以区别于空文件。
    pub fn getsize(&self, inumber: Inumber) -> Result<usize> {
        let mounted = self.state.mounted()?;
        mounted.check_inumber(inumber)?;

        Ok(self.disk.load_valid_inode(inumber)?.size as usize)
    }
}

impl Disk {
    pub fn load_inode(&self, inumber: Inumber) -> Result<DiskInode> {
        let (block_id, slot) = inumber.location();
        let inode_block: InodeBlock = self.load(block_id)?;
        Ok(inode_block.inodes[slot])
    }

    pub fn load_valid_inode(&self, inumber: Inumber) -> Result<DiskInode> {
        let inode = self.load_inode(inumber)?;
        if inode.is_valid() {
            Ok(inode)
        } else {
            Err(FsError::InodeNotValid(inumber))
        }
    }

    /// 只改写 inode 所在块中属于它的那一项
    pub fn store_inode(&self, inumber: Inumber, inode: &DiskInode) -> Result<()> {
        let (block_id, slot) = inumber.location();
        let mut inode_block: InodeBlock = self.load(block_id)?;
        inode_block.inodes[slot] = *inode;
        self.store(block_id, &inode_block)
    }
}

/// 把 inode 的直接块、间接块以及间接块指向的数据块全部还给位图，
/// 并清空 inode 的索引与大小；inode 本身仍然有效。
pub(crate) fn release_blocks(
    disk: &Disk,
    mounted: &mut Mounted,
    inode: &mut DiskInode,
) -> Result<()> {
    for block_id in inode.direct_blocks() {
        mounted.dealloc(block_id);
    }

    if inode.indirect != 0 {
        let indirect: IndirectBlock = disk.load(inode.indirect as usize)?;
        for block_id in indirect.data_blocks() {
            mounted.dealloc(block_id);
        }
        mounted.dealloc(inode.indirect);
    }

    inode.direct.fill(0);
    inode.indirect = 0;
    inode.size = 0;
    Ok(())
}
