//! 点 ID 分配与点到图片的双向映射
//!
//! 点 ID 不持久化，每次重建索引时重新分配，进程存活期间保证唯一。

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// 进程级点 ID 分配器，单调递增，不会复用
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配 count 个连续的点 ID
    pub fn allocate(&self, count: usize) -> Range<u64> {
        let start = self.next.fetch_add(count as u64, Ordering::SeqCst);
        start..start + count as u64
    }

    /// 当前游标，等于已分配的点 ID 总数
    pub fn cursor(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

/// 点 ID 与图片 ID 的双向映射表
///
/// 正向映射多对一，反向映射保存每张图片的全部点 ID。
/// 不变量：各图片的点集合互不相交，且与外部索引中的向量一一对应。
/// 映射只允许协调器修改。
#[derive(Debug, Default)]
pub struct PointRegistry {
    forward: HashMap<u64, i64>,
    inverse: HashMap<i64, Vec<u64>>,
}

impl PointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把一组点 ID 绑定到图片
    ///
    /// 图片已有绑定时报错，必须先解绑再重新绑定
    pub fn bind(&mut self, image_id: i64, point_ids: &[u64]) -> Result<()> {
        if self.inverse.contains_key(&image_id) {
            return Err(Error::AlreadyExists(image_id));
        }
        for &point_id in point_ids {
            self.forward.insert(point_id, image_id);
        }
        self.inverse.insert(image_id, point_ids.to_vec());
        Ok(())
    }

    /// 解除图片的全部绑定，返回其点 ID 集合
    pub fn unbind(&mut self, image_id: i64) -> Result<Vec<u64>> {
        let point_ids = self.inverse.remove(&image_id).ok_or(Error::NotFound(image_id))?;
        for point_id in &point_ids {
            self.forward.remove(point_id);
        }
        Ok(point_ids)
    }

    /// 查询点 ID 归属的图片
    ///
    /// 对来自索引的点返回 None 意味着索引和映射表已经不同步，
    /// 调用方应当将其作为致命错误处理
    pub fn resolve(&self, point_id: u64) -> Option<i64> {
        self.forward.get(&point_id).copied()
    }

    /// 已绑定的图片数量
    pub fn image_count(&self) -> usize {
        self.inverse.len()
    }

    /// 已绑定的点数量
    pub fn point_count(&self) -> usize {
        self.forward.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_monotonic_and_contiguous() {
        let allocator = IdAllocator::new();
        assert_eq!(allocator.allocate(3), 0..3);
        assert_eq!(allocator.allocate(5), 3..8);
        assert_eq!(allocator.allocate(0), 8..8);
        assert_eq!(allocator.cursor(), 8);
    }

    #[test]
    fn test_bind_then_resolve() {
        let mut registry = PointRegistry::new();
        registry.bind(42, &[0, 1, 2]).unwrap();
        for point_id in 0..3 {
            assert_eq!(registry.resolve(point_id), Some(42));
        }
        assert_eq!(registry.resolve(3), None);
        assert_eq!(registry.image_count(), 1);
        assert_eq!(registry.point_count(), 3);
    }

    #[test]
    fn test_double_bind_rejected() {
        let mut registry = PointRegistry::new();
        registry.bind(42, &[0, 1]).unwrap();
        assert!(matches!(registry.bind(42, &[2, 3]), Err(Error::AlreadyExists(42))));
        // 原有绑定保持不变
        assert_eq!(registry.resolve(0), Some(42));
        assert_eq!(registry.resolve(2), None);
    }

    #[test]
    fn test_unbind_removes_forward_entries() {
        let mut registry = PointRegistry::new();
        registry.bind(1, &[0, 1]).unwrap();
        registry.bind(2, &[2, 3]).unwrap();

        let mut point_ids = registry.unbind(1).unwrap();
        point_ids.sort_unstable();
        assert_eq!(point_ids, vec![0, 1]);

        assert_eq!(registry.resolve(0), None);
        assert_eq!(registry.resolve(1), None);
        assert_eq!(registry.resolve(2), Some(2));
        assert_eq!(registry.image_count(), 1);
        assert_eq!(registry.point_count(), 2);
    }

    #[test]
    fn test_unbind_unknown_image() {
        let mut registry = PointRegistry::new();
        assert!(matches!(registry.unbind(7), Err(Error::NotFound(7))));
    }

    #[test]
    fn test_rebind_after_unbind() {
        let mut registry = PointRegistry::new();
        registry.bind(1, &[0, 1]).unwrap();
        registry.unbind(1).unwrap();
        registry.bind(1, &[5, 6]).unwrap();
        assert_eq!(registry.resolve(5), Some(1));
        assert_eq!(registry.resolve(0), None);
    }
}
