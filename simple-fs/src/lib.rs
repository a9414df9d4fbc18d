/* simple-fs 的整体架构，自上而下 */

// 调试层：只读地导出磁盘布局
mod debug;
pub use debug::{DumpReport, InodeReport};

// 数据传输层：按字节偏移读写文件
mod transfer;

// 索引节点管理层：创建、删除、查询 inode
mod inode;

// 生命周期层：格式化与挂载，持有整个文件系统的状态
mod sfs;
pub use sfs::{SharedFileSystem, SimpleFileSystem};

// 位图分配器：挂载期间在内存中记录块的使用情况
mod bitmap;
pub use bitmap::Bitmap;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
pub mod layout;
pub use layout::Inumber;

// 块访问层：以记录为单位读写块设备
mod disk;

mod error;
pub use error::{FsError, Result};

pub use block_dev::{BlockDevice, BLOCK_SIZE};

pub const MAGIC: u32 = 0xf0f03410;
pub const INODES_PER_BLOCK: usize = 128;
pub const POINTERS_PER_INODE: usize = 5;
pub const POINTERS_PER_BLOCK: usize = 1024;
/// 单个文件的最大字节数：直接索引 + 一级索引
pub const MAX_FILE_SIZE: usize = (POINTERS_PER_INODE + POINTERS_PER_BLOCK) * BLOCK_SIZE;

type DataBlock = [u8; BLOCK_SIZE];
