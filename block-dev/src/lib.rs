//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 整个系统的块大小固定为 [`BLOCK_SIZE`] 字节。

use core::any::Any;

/// 块大小(字节)
pub const BLOCK_SIZE: usize = 4096;

/// 块设备驱动特质
///
/// 块编号越界、缓冲区不是恰好一块大小，都属于违反调用约定，实现者应直接 panic。
pub trait BlockDevice: Send + Sync + Any {
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);
    /// 设备的总块数
    fn num_blocks(&self) -> usize;
}
