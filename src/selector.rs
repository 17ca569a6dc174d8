//! 特征点筛选
//!
//! 检测器输出的候选点数量没有上限，这里按响应值从高到低挑选出
//! 至多 256 个空间上分散的点：图片按中线分成四个象限，每个象限
//! 至多 64 个；同一邻域的压制桶吸收满之后，后续落入该邻域的
//! 候选点会被直接跳过，避免描述符集中在某一块重复纹理上。

use std::collections::HashMap;

/// 单个候选特征点，只在筛选期间存活
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// 检测器给出的置信度
    pub response: f32,
}

/// 选取的特征点总数上限
pub const MAX_KEYPOINTS: usize = 256;
/// 每个象限的特征点上限
const QUADRANT_CAP: usize = 64;
/// 近邻压制半径
const SUPPRESSION_RADIUS: f32 = 40.0;
/// 每个压制桶允许吸收的近邻数量
const SUPPRESSION_LIMIT: i64 = 3;

/// 从候选点中选出一个空间分散的有界子集
///
/// 返回原切片中的下标，按接受顺序排列；候选为空时返回空列表。
/// `size` 为图片的 (宽, 高)。
pub fn select_keypoints(size: (u32, u32), candidates: &[Keypoint]) -> Vec<usize> {
    let (width, height) = (size.0 as f32, size.1 as f32);
    let half_w = (size.0 / 2) as f32;
    let half_h = (size.1 / 2) as f32;

    // 响应值高的点优先考虑，排序是稳定的，同分时保持检测器顺序
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| candidates[b].response.total_cmp(&candidates[a].response));

    let mut accepted: Vec<usize> = Vec::new();
    let mut neighbors: HashMap<u32, i64> = HashMap::new();
    let mut quadrants = [0usize; 4];

    for idx in order {
        let kp = candidates[idx];

        if !accepted.is_empty() && suppressed(kp, candidates, &accepted, &mut neighbors) {
            continue;
        }

        if accepted.len() == MAX_KEYPOINTS {
            break;
        }

        // 象限判定使用严格不等号，恰好落在中线或边缘上的点不归属任何象限
        let quadrant = if 0.0 < kp.y && kp.y < half_h && 0.0 < kp.x && kp.x < half_w {
            0
        } else if 0.0 < kp.y && kp.y < half_h && half_w < kp.x && kp.x < width {
            1
        } else if half_h < kp.y && kp.y < height && 0.0 < kp.x && kp.x < half_w {
            2
        } else if half_h < kp.y && kp.y < height && half_w < kp.x && kp.x < width {
            3
        } else {
            continue;
        };

        if quadrants[quadrant] < QUADRANT_CAP {
            quadrants[quadrant] += 1;
            accepted.push(idx);
        }
    }

    accepted
}

/// 判断候选点是否因为邻域过密而跳过
///
/// 对每个距离小于压制半径的已接受点，以其坐标之和的位模式作为桶键累加计数，
/// 桶计数到达上限后，再碰到该桶的候选点一律跳过。
/// 注意坐标之和并不是真正的空间哈希，不同位置的两个点可能共享一个桶。
fn suppressed(
    kp: Keypoint,
    candidates: &[Keypoint],
    accepted: &[usize],
    neighbors: &mut HashMap<u32, i64>,
) -> bool {
    let mut skip = false;
    for &i in accepted {
        let other = candidates[i];
        let dist = ((kp.x - other.x).powi(2) + (kp.y - other.y).powi(2)).sqrt();
        if dist < SUPPRESSION_RADIUS {
            let bucket = (other.x + other.y).to_bits();
            let count = neighbors.entry(bucket).or_insert(1);
            if *count >= SUPPRESSION_LIMIT {
                skip = true;
            } else {
                *count += 1;
            }
        }
    }
    skip
}
