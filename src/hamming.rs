//! 488 位二进制描述符的汉明距离计算

#[inline(always)]
pub fn hamming<const N: usize>(va: &[u8], vb: &[u8]) -> u32 {
    match N {
        488 => hamming_488(va, vb),
        _ => hamming_naive::<N>(va, vb),
    }
}

#[inline(always)]
pub fn hamming_naive<const N: usize>(va: &[u8], vb: &[u8]) -> u32 {
    let mut sum = 0;
    for i in 0..N / 8 {
        sum += (va[i] ^ vb[i]).count_ones();
    }
    sum
}

/// 61 字节的向量无法整体按 u64 对齐，前 56 字节按 8 字节一组计算，
/// 剩余 5 字节逐字节异或
#[inline(always)]
pub fn hamming_488(va: &[u8], vb: &[u8]) -> u32 {
    let mut sum = 0;
    for (a, b) in va[..56].chunks_exact(8).zip(vb[..56].chunks_exact(8)) {
        let a = u64::from_le_bytes(a.try_into().unwrap());
        let b = u64::from_le_bytes(b.try_into().unwrap());
        sum += (a ^ b).count_ones();
    }
    for i in 56..61 {
        sum += (va[i] ^ vb[i]).count_ones();
    }
    sum
}

/// 计算向量 va 到 vb 中每一行的汉明距离，返回距离最小的 k 个行号和距离
///
/// 参数：
/// - va: N 位的向量 va
/// - vb: 若干组 N 位的向量，按行连续存放
/// - k: 返回的最近邻居数量
pub fn knn_hamming<const N: usize>(va: &[u8], vb: &[u8], k: usize) -> (Vec<usize>, Vec<u32>) {
    assert!(k <= 8, "k must not exceed 8");
    let mut dis = [u32::MAX; 8];
    let mut idx = [0; 8];
    for (i, chunk) in vb.chunks_exact(N / 8).enumerate() {
        let d = hamming::<N>(va, chunk);
        if d > dis[0] {
            continue;
        }
        // dis 维护成一个单调递减的数组，最大的距离在最前面；
        // 从后往前找到插入点，把它前面的元素整体左移一格
        for j in (0..k).rev() {
            if d < dis[j] {
                dis[..=j].rotate_left(1);
                dis[j] = d;
                idx[..=j].rotate_left(1);
                idx[j] = i;
                break;
            }
        }
    }
    idx.into_iter().zip(dis.into_iter()).filter(|(_, d)| *d != u32::MAX).rev().take(k).unzip()
}
