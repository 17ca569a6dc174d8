//! 二进制向量最近邻索引

use std::collections::HashSet;

use anyhow::{Result, bail};
use rayon::prelude::*;

use crate::hamming::knn_hamming;

/// 单个描述符的字节长度，AKAZE MLDB 描述符为 488 位
pub const DESCRIPTOR_SIZE: usize = 61;

/// 488 位的二进制描述符
pub type Descriptor = [u8; DESCRIPTOR_SIZE];

/// 一次最近邻命中
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub id: u64,
    /// 汉明距离，范围 0..=488
    pub distance: u32,
}

/// 二进制向量索引的统一接口
///
/// 向量的生命周期与点 ID 一一对应：加入时的 ID 必须是未使用过的，
/// 删除只按 ID 进行。
pub trait BinaryIndex: Send + Sync {
    /// 添加一组向量，ids 与 vectors 等长且一一对应
    fn add_with_ids(&mut self, vectors: &[Descriptor], ids: &[u64]) -> Result<()>;

    /// 按 ID 删除向量，返回实际删除的数量
    fn remove_ids(&mut self, ids: &[u64]) -> usize;

    /// 对每个查询向量返回至多 k 个最近邻，按距离升序排列
    fn search(&self, queries: &[Descriptor], k: usize) -> Vec<Vec<Neighbor>>;

    /// 索引中的向量总数
    fn ntotal(&self) -> usize;
}

/// 暴力扫描的精确索引
///
/// 向量按行连续存放，搜索对每个查询并行地扫描全部行。
/// 在单机十万级向量的规模下，精确扫描比近似索引更简单也足够快。
#[derive(Debug, Default)]
pub struct FlatBinaryIndex {
    ids: Vec<u64>,
    vectors: Vec<u8>,
}

impl FlatBinaryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BinaryIndex for FlatBinaryIndex {
    fn add_with_ids(&mut self, vectors: &[Descriptor], ids: &[u64]) -> Result<()> {
        if vectors.len() != ids.len() {
            bail!("向量数量与 ID 数量不一致: {} != {}", vectors.len(), ids.len());
        }
        self.ids.extend_from_slice(ids);
        for vector in vectors {
            self.vectors.extend_from_slice(vector);
        }
        Ok(())
    }

    fn remove_ids(&mut self, ids: &[u64]) -> usize {
        let remove: HashSet<u64> = ids.iter().copied().collect();
        let mut kept = 0;
        for i in 0..self.ids.len() {
            if remove.contains(&self.ids[i]) {
                continue;
            }
            if kept != i {
                self.ids[kept] = self.ids[i];
                self.vectors
                    .copy_within(i * DESCRIPTOR_SIZE..(i + 1) * DESCRIPTOR_SIZE, kept * DESCRIPTOR_SIZE);
            }
            kept += 1;
        }
        let removed = self.ids.len() - kept;
        self.ids.truncate(kept);
        self.vectors.truncate(kept * DESCRIPTOR_SIZE);
        removed
    }

    fn search(&self, queries: &[Descriptor], k: usize) -> Vec<Vec<Neighbor>> {
        queries
            .par_iter()
            .map(|query| {
                let (idx, dis) = knn_hamming::<488>(query, &self.vectors, k);
                idx.into_iter()
                    .zip(dis)
                    .map(|(i, distance)| Neighbor { id: self.ids[i], distance })
                    .collect()
            })
            .collect()
    }

    fn ntotal(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(fill: u8) -> Descriptor {
        [fill; DESCRIPTOR_SIZE]
    }

    #[test]
    fn test_add_and_search() {
        let mut index = FlatBinaryIndex::new();
        index.add_with_ids(&[descriptor(0), descriptor(0xFF), descriptor(0x0F)], &[10, 11, 12]).unwrap();
        assert_eq!(index.ntotal(), 3);

        let result = index.search(&[descriptor(0)], 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0], vec![Neighbor { id: 10, distance: 0 }]);

        // 距离按升序排列
        let result = index.search(&[descriptor(0)], 3);
        assert_eq!(result[0][0], Neighbor { id: 10, distance: 0 });
        assert_eq!(result[0][1], Neighbor { id: 12, distance: 244 });
        assert_eq!(result[0][2], Neighbor { id: 11, distance: 488 });
    }

    #[test]
    fn test_search_empty_index() {
        let index = FlatBinaryIndex::new();
        let result = index.search(&[descriptor(0)], 1);
        assert_eq!(result, vec![vec![]]);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let mut index = FlatBinaryIndex::new();
        assert!(index.add_with_ids(&[descriptor(0)], &[1, 2]).is_err());
        assert_eq!(index.ntotal(), 0);
    }

    #[test]
    fn test_remove_ids() {
        let mut index = FlatBinaryIndex::new();
        index.add_with_ids(&[descriptor(0), descriptor(0xFF), descriptor(0x0F)], &[10, 11, 12]).unwrap();

        let removed = index.remove_ids(&[10, 12, 99]);
        assert_eq!(removed, 2);
        assert_eq!(index.ntotal(), 1);

        // 留下的向量仍然可以被正确检索
        let result = index.search(&[descriptor(0xFF)], 1);
        assert_eq!(result[0], vec![Neighbor { id: 11, distance: 0 }]);
    }
}
