use std::sync::LazyLock;

use prometheus::*;

use crate::matcher::{Match, MatchLevel};

static METRIC_SEARCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!("aks_search_duration", "duration of the per-image search in seconds")
        .unwrap()
});

static METRIC_SEARCH_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("aks_search_count", "count of searches by match level", &["level"])
        .unwrap()
});

static METRIC_INDEXED_POINTS: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge!("aks_indexed_points", "number of vectors in the index").unwrap()
});

/// 记录一次搜索耗时
pub fn observe_search_duration(duration: f32) {
    METRIC_SEARCH_DURATION.observe(duration as f64);
}

/// 按命中等级累计搜索次数
pub fn inc_search_count(result: &Option<Match>) {
    let level = match result {
        Some(m) => match m.level {
            MatchLevel::Level(n) => ["0", "1", "2", "3"][n],
            MatchLevel::Fallback => "fallback",
        },
        None => "none",
    };
    METRIC_SEARCH_COUNT.with_label_values(&[level]).inc();
}

/// 更新索引中的向量总数
pub fn set_indexed_points(count: usize) {
    METRIC_INDEXED_POINTS.set(count as i64);
}
