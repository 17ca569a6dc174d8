//! 匹配聚合
//!
//! 把每个查询描述符的最近邻命中按图片累计成多级投票，再从投票中
//! 判定出至多一张匹配的图片。距离越近的命中置信度越高，判定所需
//! 的票数越少。
//!
//! 等级表：
//! 等级 0 - 距离 <=5  - 2 票
//! 等级 1 - 距离 <=10 - 4 票
//! 等级 2 - 距离 <=15 - 6 票
//! 等级 3 - 距离 <=32 - 10 票

use std::collections::HashMap;
use std::fmt;

/// 超过该距离的命中视为与查询无关的噪声
pub const MAX_DISTANCE: u32 = 65;

/// 各投票等级的距离上限
const LEVEL_DISTANCES: [u32; 4] = [5, 10, 15, 32];
/// 各投票等级要求的最低票数
const LEVEL_THRESHOLDS: [usize; 4] = [2, 4, 6, 10];

/// 兜底判定要求的最低总票数
const FALLBACK_MIN_VOTES: usize = 10;
/// 兜底判定要求的最高票数与中位数之比
const FALLBACK_MIN_RATIO: f64 = 3.0;

/// 匹配到的图片以及命中的置信等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub image_id: i64,
    pub level: MatchLevel,
}

/// 匹配判定来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLevel {
    /// 在固定等级上达到票数阈值
    Level(usize),
    /// 通过票数中位数比例的兜底判定
    Fallback,
}

impl fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchLevel::Level(n) => write!(f, "level {n}"),
            MatchLevel::Fallback => write!(f, "fallback"),
        }
    }
}

/// 按图片累计的多级投票计数器
#[derive(Debug)]
pub struct MatchVotes {
    levels: [HashMap<i64, usize>; 4],
    all_points: HashMap<i64, usize>,
    max_distance: u32,
}

impl MatchVotes {
    pub fn new(max_distance: u32) -> Self {
        Self { levels: Default::default(), all_points: HashMap::new(), max_distance }
    }

    /// 记录一次最近邻命中
    ///
    /// 距离阈值是嵌套的，一次命中会同时落入所有距离上限不小于它的等级
    pub fn vote(&mut self, image_id: i64, distance: u32) {
        if distance > self.max_distance {
            return;
        }
        for (level, &limit) in LEVEL_DISTANCES.iter().enumerate() {
            if distance <= limit {
                *self.levels[level].entry(image_id).or_insert(0) += 1;
            }
        }
        *self.all_points.entry(image_id).or_insert(0) += 1;
    }

    /// 依次检查等级 0 到 3
    ///
    /// 低等级的距离上限更紧、单票置信度更高，所以要求的票数更少，
    /// 且优先判定；全部等级都未达标时走兜底逻辑
    pub fn best(&self) -> Option<Match> {
        for (level, counter) in self.levels.iter().enumerate() {
            if let Some((image_id, count)) = top_candidate(counter) {
                if count >= LEVEL_THRESHOLDS[level] {
                    return Some(Match { image_id, level: MatchLevel::Level(level) });
                }
            }
        }
        self.fallback()
    }

    /// 兜底判定：没有等级达标，但某张图片的总票数显著高于其余候选
    fn fallback(&self) -> Option<Match> {
        if self.all_points.len() < 2 {
            return None;
        }
        let (image_id, max) = top_candidate(&self.all_points)?;
        if max < FALLBACK_MIN_VOTES {
            return None;
        }
        if max as f64 / median_votes(&self.all_points) >= FALLBACK_MIN_RATIO {
            return Some(Match { image_id, level: MatchLevel::Fallback });
        }
        None
    }
}

/// 取票数最多的图片，票数相同时取图片 ID 较小者
fn top_candidate(counter: &HashMap<i64, usize>) -> Option<(i64, usize)> {
    counter
        .iter()
        .map(|(&id, &count)| (id, count))
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
}

/// 总票数的中位数，偶数个候选时取中间两数的平均值
fn median_votes(counter: &HashMap<i64, usize>) -> f64 {
    let mut counts: Vec<usize> = counter.values().copied().collect();
    counts.sort_unstable();
    let mid = (counts.len() - 1) / 2;
    if counts.len() % 2 == 1 {
        counts[mid] as f64
    } else {
        (counts[mid] + counts[mid + 1]) as f64 / 2.0
    }
}
