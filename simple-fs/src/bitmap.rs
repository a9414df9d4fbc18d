//! 空闲块位图
//!
//! 只存在于内存中，每次挂载时通过扫描 inode 表重建，
//! 第 i 位为 1 表示第 i 块正被超级块、inode 块或某个文件占用。

/// 位图由若干 64 位的 bit 组构成
type BitGroup = u64;

const GROUP_BITS: usize = BitGroup::BITS as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    groups: Vec<BitGroup>,
    /// 位图所指示的总块数
    len: usize,
    /// 超级块与 inode 区域的块数，分配时跳过
    reserved: usize,
}

impl Bitmap {
    /// 新建位图，`0..reserved` 一开始就被标记为占用
    pub fn new(len: usize, reserved: usize) -> Self {
        assert!(reserved <= len, "reserved region exceeds the disk");

        let mut groups = vec![0; len.div_ceil(GROUP_BITS)];
        // 末尾不对应任何块的位恒为 1，查找空闲位时就不会越界
        if len % GROUP_BITS != 0 {
            if let Some(last) = groups.last_mut() {
                *last = BitGroup::MAX << (len % GROUP_BITS);
            }
        }

        let mut bitmap = Self {
            groups,
            len,
            reserved,
        };
        (0..reserved).for_each(|index| bitmap.mark(index));
        bitmap
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn mark(&mut self, index: usize) {
        let (group_index, ingroup_index) = self.locate(index);
        self.groups[group_index] |= (1 as BitGroup) << ingroup_index;
    }

    #[inline]
    pub fn clear(&mut self, index: usize) {
        let (group_index, ingroup_index) = self.locate(index);
        self.groups[group_index] &= !((1 as BitGroup) << ingroup_index);
    }

    #[inline]
    pub fn is_marked(&self, index: usize) -> bool {
        let (group_index, ingroup_index) = self.locate(index);
        self.groups[group_index] & ((1 as BitGroup) << ingroup_index) != 0
    }

    /// 从保留区之后开始，找到第一个空闲块。
    /// 若磁盘已满，则返回空。
    pub fn find_free(&self) -> Option<usize> {
        let first_group = self.reserved / GROUP_BITS;

        self.groups
            .iter()
            .enumerate()
            .skip(first_group)
            .find_map(|(group_index, &bits)| {
                // 保留区内的位即便被清掉也不参与分配
                let bits = if group_index == first_group {
                    bits | (((1 as BitGroup) << (self.reserved % GROUP_BITS)) - 1)
                } else {
                    bits
                };
                (bits != BitGroup::MAX)
                    .then(|| group_index * GROUP_BITS + bits.trailing_ones() as usize)
            })
    }

    /// 已占用的块数
    pub fn used(&self) -> usize {
        (0..self.len).filter(|&index| self.is_marked(index)).count()
    }

    fn locate(&self, index: usize) -> (usize, usize) {
        assert!(
            index < self.len,
            "block {index} is out of the bitmap of {} blocks",
            self.len
        );
        (index / GROUP_BITS, index % GROUP_BITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_region() {
        let bitmap = Bitmap::new(20, 3);
        assert_eq!(3, bitmap.used());
        assert!(bitmap.is_marked(0) && bitmap.is_marked(2));
        assert!(!bitmap.is_marked(3));
        assert_eq!(Some(3), bitmap.find_free());
    }

    #[test]
    fn find_free_skips_reserved_even_if_cleared() {
        let mut bitmap = Bitmap::new(10, 2);
        bitmap.clear(1);
        assert_eq!(Some(2), bitmap.find_free());
    }

    #[test]
    fn mark_and_clear() {
        let mut bitmap = Bitmap::new(130, 1);
        for index in 1..100 {
            bitmap.mark(index);
        }
        assert_eq!(Some(100), bitmap.find_free());

        bitmap.clear(42);
        assert_eq!(Some(42), bitmap.find_free());
        assert_eq!(99, bitmap.used());
    }

    #[test]
    fn full_disk() {
        let mut bitmap = Bitmap::new(70, 2);
        (2..70).for_each(|index| bitmap.mark(index));
        assert_eq!(None, bitmap.find_free());
        assert_eq!(70, bitmap.used());

        bitmap.clear(69);
        assert_eq!(Some(69), bitmap.find_free());
    }

    #[test]
    fn reserved_spans_groups() {
        let bitmap = Bitmap::new(200, 65);
        assert_eq!(Some(65), bitmap.find_free());
    }

    #[test]
    #[should_panic]
    fn out_of_range_is_a_bug() {
        Bitmap::new(8, 1).mark(8);
    }
}
