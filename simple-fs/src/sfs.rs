//! # 生命周期层
//!
//! 文件系统实例持有块设备、挂载状态以及挂载期间的位图。
//! 除了 `format` 与 `mount`，其余操作都要求已经挂载。

use std::ops::Range;
use std::sync::Arc;

use log::{debug, info};
use spin::Mutex;

use crate::bitmap::Bitmap;
use crate::disk::Disk;
use crate::layout::{IndirectBlock, InodeBlock, Inumber, SuperBlock};
use crate::{BlockDevice, FsError, Result};

/// 多线程共享时的文件系统：一把粗粒度的锁覆盖每一次操作
pub type SharedFileSystem = Arc<Mutex<SimpleFileSystem>>;

pub struct SimpleFileSystem {
    pub(crate) disk: Disk,
    pub(crate) state: State,
}

pub(crate) enum State {
    Unmounted,
    Mounted(Mounted),
}

/// 挂载后才存在的内存状态，卸载或重新挂载时整体丢弃
pub(crate) struct Mounted {
    pub super_block: SuperBlock,
    pub bitmap: Bitmap,
}

impl SimpleFileSystem {
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self {
            disk: Disk::new(block_device),
            state: State::Unmounted,
        }
    }

    pub fn into_shared(self) -> SharedFileSystem {
        Arc::new(Mutex::new(self))
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        matches!(self.state, State::Mounted(_))
    }

    /// 挂载时读入的超级块
    pub fn super_block(&self) -> Option<&SuperBlock> {
        self.state.mounted().ok().map(|mounted| &mounted.super_block)
    }

    /// 挂载期间的空闲块位图
    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.state.mounted().ok().map(|mounted| &mounted.bitmap)
    }

    /// 在磁盘上建立一个空的文件系统，磁盘上原有的内容全部丢失。
    ///
    /// 挂载期间不允许格式化；格式化之后仍处于未挂载状态。
    pub fn format(&mut self) -> Result<()> {
        if self.is_mounted() {
            return Err(FsError::AlreadyMounted);
        }

        let total_blocks = self.disk.size();
        if total_blocks == 0 {
            return Err(FsError::DiskTooSmall(total_blocks));
        }
        // 10% 的块用来存放 inode，向上取整；至少留出超级块的位置
        let inode_blocks = total_blocks.div_ceil(10).min(total_blocks - 1);

        for block_id in 0..total_blocks {
            self.disk.zeroize(block_id);
        }
        let super_block = SuperBlock::new(total_blocks as u32, inode_blocks as u32);
        self.disk.store(0, &super_block)?;

        info!(
            "formatted: {} blocks, {} inode blocks, {} inodes",
            super_block.total_blocks, super_block.inode_blocks, super_block.total_inodes
        );
        Ok(())
    }

    /// 校验超级块，并扫描整个 inode 表重建位图
    pub fn mount(&mut self) -> Result<()> {
        if self.is_mounted() {
            return Err(FsError::AlreadyMounted);
        }

        let super_block: SuperBlock = self.disk.load(0)?;
        if !super_block.is_valid() {
            return Err(FsError::InvalidMagic(super_block.magic()));
        }
        Self::check_super_block(&super_block, self.disk.size())?;

        let total_blocks = super_block.total_blocks as usize;
        let mut bitmap = Bitmap::new(total_blocks, super_block.data_area_start());
        let data_area = super_block.data_area_start()..total_blocks;

        for inode_block_id in 1..super_block.data_area_start() {
            let inode_block: InodeBlock = self.disk.load(inode_block_id)?;

            for inode in inode_block.inodes.iter().filter(|inode| inode.is_valid()) {
                for block_id in inode.direct_blocks() {
                    claim(&mut bitmap, &data_area, block_id)?;
                }

                if inode.indirect != 0 {
                    claim(&mut bitmap, &data_area, inode.indirect)?;
                    let indirect: IndirectBlock = self.disk.load(inode.indirect as usize)?;
                    for block_id in indirect.data_blocks() {
                        claim(&mut bitmap, &data_area, block_id)?;
                    }
                }
            }
        }

        info!(
            "mounted: {} blocks, {} inodes, {} blocks in use",
            super_block.total_blocks,
            super_block.total_inodes,
            bitmap.used()
        );
        self.state = State::Mounted(Mounted {
            super_block,
            bitmap,
        });
        Ok(())
    }

    /// 丢弃内存中的状态，下次挂载时重新扫描
    pub fn unmount(&mut self) -> Result<()> {
        self.state.mounted()?;
        self.state = State::Unmounted;
        info!("unmounted");
        Ok(())
    }

    fn check_super_block(super_block: &SuperBlock, device_blocks: usize) -> Result<()> {
        let total_blocks = super_block.total_blocks as usize;

        if total_blocks == 0 || total_blocks > device_blocks {
            return Err(FsError::Corrupted("block count does not match the device"));
        }
        if super_block.inode_blocks as usize >= total_blocks {
            return Err(FsError::Corrupted("inode area does not fit on the disk"));
        }
        if super_block.inode_blocks.checked_mul(crate::INODES_PER_BLOCK as u32)
            != Some(super_block.total_inodes)
        {
            return Err(FsError::Corrupted("inode count does not match the inode area"));
        }

        Ok(())
    }
}

impl State {
    pub fn mounted(&self) -> Result<&Mounted> {
        match self {
            Self::Mounted(mounted) => Ok(mounted),
            Self::Unmounted => Err(FsError::NotMounted),
        }
    }

    pub fn mounted_mut(&mut self) -> Result<&mut Mounted> {
        match self {
            Self::Mounted(mounted) => Ok(mounted),
            Self::Unmounted => Err(FsError::NotMounted),
        }
    }
}

impl Mounted {
    /// inode 编号必须落在 `[1, total_inodes]`
    pub fn check_inumber(&self, inumber: Inumber) -> Result<()> {
        if (1..=self.super_block.total_inodes).contains(&inumber.get()) {
            Ok(())
        } else {
            Err(FsError::InvalidInumber(inumber))
        }
    }

    /// 分配一个空闲块。磁盘已满时返回空。
    pub fn alloc(&mut self) -> Option<usize> {
        let block_id = self.bitmap.find_free()?;
        self.bitmap.mark(block_id);
        debug!("alloc block {block_id}");
        Some(block_id)
    }

    pub fn dealloc(&mut self, block_id: u32) {
        self.bitmap.clear(block_id as usize);
        debug!("free block {block_id}");
    }
}

/// 挂载时登记一个被 inode 引用的块
fn claim(bitmap: &mut Bitmap, data_area: &Range<usize>, block_id: u32) -> Result<()> {
    let block_id = block_id as usize;

    if !data_area.contains(&block_id) {
        return Err(FsError::Corrupted("block pointer outside the data area"));
    }
    if bitmap.is_marked(block_id) {
        return Err(FsError::Corrupted("block referenced more than once"));
    }

    bitmap.mark(block_id);
    Ok(())
}
