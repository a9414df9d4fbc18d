//! # 数据传输层
//!
//! 把文件内的字节偏移映射到磁盘块上，按块拷贝数据。
//!
//! 写入规则：
//! - 从偏移 0 开始写意味着重写整个文件，先释放 inode 原有的全部块；
//! - 其余情况下覆盖 `[offset, offset + len)`，用到哪个块才分配哪个块；
//! - 偏移不能超过当前文件大小，因此文件中间不会出现空洞；
//! - 写完后文件大小为 `max(原大小, offset + 实际写入量)`。

use log::warn;

use crate::disk::Disk;
use crate::inode::release_blocks;
use crate::layout::{BlockSlot, DiskInode, IndirectBlock, Inumber};
use crate::sfs::Mounted;
use crate::{FsError, Result, SimpleFileSystem, BLOCK_SIZE, MAX_FILE_SIZE};

impl SimpleFileSystem {
    /// 从文件的 `offset` 处读出数据填充 `buf`，返回读取的字节数。
    ///
    /// 读取不会越过文件末尾；`offset` 恰为文件大小时读到 0 字节。
    pub fn read(&self, inumber: Inumber, buf: &mut [u8], offset: usize) -> Result<usize> {
        let mounted = self.state.mounted()?;
        mounted.check_inumber(inumber)?;
        let inode = self.disk.load_valid_inode(inumber)?;

        let size = inode.size as usize;
        if offset > size {
            return Err(FsError::OffsetOutOfRange { offset, size });
        }

        let mut block_map = BlockMap::new(inode);
        let mut start = offset;
        let end = offset.saturating_add(buf.len()).min(size);

        // 已读取多少字节
        let mut read_size = 0;
        while start < end {
            // 当前块在文件内的序号
            let rank = start / BLOCK_SIZE;
            // 当前块的末地址(字节)
            let current_block_end = ((rank + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;
            let dest = &mut buf[read_size..read_size + block_read_size];

            match block_map.lookup(&self.disk, rank)? {
                Some(block_id) => {
                    let data_block = self.disk.read(block_id);
                    // 绝对地址 % 块大小 = 块内偏移
                    let inoffset = start % BLOCK_SIZE;
                    dest.copy_from_slice(&data_block[inoffset..inoffset + block_read_size]);
                }
                None => dest.fill(0),
            }

            read_size += block_read_size;
            start = current_block_end;
        }

        Ok(read_size)
    }

    /// 读出至多 `length` 个字节
    pub fn read_to_vec(&self, inumber: Inumber, length: usize, offset: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; length];
        let read_size = self.read(inumber, &mut buf, offset)?;
        buf.truncate(read_size);
        Ok(buf)
    }

    /// 把 `data` 写到文件的 `offset` 处，返回写入的字节数。
    ///
    /// 磁盘中途写满时，已写入的部分保留在文件中，
    /// 并以 [`FsError::DiskFull`] 报告实际写入量。
    pub fn write(&mut self, inumber: Inumber, data: &[u8], offset: usize) -> Result<usize> {
        let mounted = self.state.mounted_mut()?;
        mounted.check_inumber(inumber)?;
        let mut inode = self.disk.load_valid_inode(inumber)?;

        let size = inode.size as usize;
        if offset > size {
            return Err(FsError::OffsetOutOfRange { offset, size });
        }
        let end = offset.saturating_add(data.len());
        if end > MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge(end));
        }

        if offset == 0 {
            release_blocks(&self.disk, mounted, &mut inode)?;
        }

        let mut block_map = BlockMap::new(inode);
        let mut start = offset;
        let mut written_size = 0;
        let mut disk_full = false;
        while start < end {
            let rank = start / BLOCK_SIZE;
            let current_block_end = ((rank + 1) * BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;
            let src = &data[written_size..written_size + block_write_size];

            let Some((block_id, fresh)) = block_map.lookup_or_alloc(&self.disk, mounted, rank)?
            else {
                disk_full = true;
                break;
            };

            let mut data_block = if fresh || block_write_size == BLOCK_SIZE {
                [0; BLOCK_SIZE]
            } else {
                self.disk.read(block_id)
            };
            let inoffset = start % BLOCK_SIZE;
            data_block[inoffset..inoffset + block_write_size].copy_from_slice(src);
            self.disk.write(block_id, &data_block);

            written_size += block_write_size;
            start = current_block_end;
        }

        let mut inode = block_map.finish(&self.disk)?;
        inode.size = inode.size.max((offset + written_size) as u32);
        self.disk.store_inode(inumber, &inode)?;

        if disk_full {
            warn!(
                "disk full: wrote {written_size} of {} bytes to inode {inumber}",
                data.len()
            );
            return Err(FsError::DiskFull {
                written: written_size,
            });
        }
        Ok(written_size)
    }
}

/// 一个 inode 的块索引视图：按文件内的块序号找到磁盘块号，
/// 间接索引块在第一次用到时读入，修改过则在 `finish` 时写回。
struct BlockMap {
    inode: DiskInode,
    indirect: Option<IndirectBlock>,
    indirect_modified: bool,
}

impl BlockMap {
    fn new(inode: DiskInode) -> Self {
        Self {
            inode,
            indirect: None,
            indirect_modified: false,
        }
    }

    /// 第 `rank` 块的块号，未分配则为空
    fn lookup(&mut self, disk: &Disk, rank: usize) -> Result<Option<usize>> {
        let block_id = match BlockSlot::of_rank(rank)? {
            BlockSlot::Direct(index) => self.inode.direct[index],
            BlockSlot::Indirect(index) => {
                if self.inode.indirect == 0 {
                    return Ok(None);
                }
                self.indirect(disk)?.pointers[index]
            }
        };

        Ok((block_id != 0).then_some(block_id as usize))
    }

    /// 第 `rank` 块的块号，未分配则现在分配；第二项表示是否为新分配的块。
    /// 磁盘已满时返回空。
    fn lookup_or_alloc(
        &mut self,
        disk: &Disk,
        mounted: &mut Mounted,
        rank: usize,
    ) -> Result<Option<(usize, bool)>> {
        if let Some(block_id) = self.lookup(disk, rank)? {
            return Ok(Some((block_id, false)));
        }

        match BlockSlot::of_rank(rank)? {
            BlockSlot::Direct(index) => {
                let Some(block_id) = mounted.alloc() else {
                    return Ok(None);
                };
                self.inode.direct[index] = block_id as u32;
                Ok(Some((block_id, true)))
            }
            BlockSlot::Indirect(index) => {
                // 第一次越过直接索引，创建间接索引块
                let fresh_indirect = self.inode.indirect == 0;
                if fresh_indirect {
                    let Some(indirect_block_id) = mounted.alloc() else {
                        return Ok(None);
                    };
                    disk.zeroize(indirect_block_id);
                    self.inode.indirect = indirect_block_id as u32;
                    self.indirect = Some(IndirectBlock::default());
                }

                let Some(block_id) = mounted.alloc() else {
                    // 刚建的间接索引块一项都没用上，还给位图
                    if fresh_indirect {
                        mounted.dealloc(self.inode.indirect);
                        self.inode.indirect = 0;
                        self.indirect = None;
                    }
                    return Ok(None);
                };
                self.indirect(disk)?.pointers[index] = block_id as u32;
                self.indirect_modified = true;
                Ok(Some((block_id, true)))
            }
        }
    }

    fn indirect(&mut self, disk: &Disk) -> Result<&mut IndirectBlock> {
        if self.indirect.is_none() {
            self.indirect = Some(disk.load(self.inode.indirect as usize)?);
        }
        Ok(self.indirect.get_or_insert_with(IndirectBlock::default))
    }

    /// 写回修改过的间接索引块，交还更新后的 inode
    fn finish(self, disk: &Disk) -> Result<DiskInode> {
        if let (true, Some(indirect)) = (self.indirect_modified, &self.indirect) {
            disk.store(self.inode.indirect as usize, indirect)?;
        }
        Ok(self.inode)
    }
}
