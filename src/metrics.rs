use std::sync::LazyLock;

use log::error;
use prometheus::*;

static METRIC_SEARCH_COUNT: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    register_int_counter_vec!("im_sim_search_count", "count of the image to search", &["metric"])
        .inspect_err(|e| error!("注册指标失败: {e}"))
        .ok()
});

static METRIC_SEARCH_DURATION: LazyLock<Option<HistogramVec>> = LazyLock::new(|| {
    register_histogram_vec!(
        "im_sim_search_duration",
        "duration of the per-image search in seconds",
        &["metric"]
    )
    .inspect_err(|e| error!("注册指标失败: {e}"))
    .ok()
});

static METRIC_SEARCH_BEST_SCORE: LazyLock<Option<HistogramVec>> = LazyLock::new(|| {
    register_histogram_vec!(
        "im_sim_search_best_score",
        "score of the best result of the per-image search",
        &["metric"],
        (0..=20).map(|x| x as f64 * 0.1).collect()
    )
    .inspect_err(|e| error!("注册指标失败: {e}"))
    .ok()
});

static METRIC_BUILD_SKIPPED: LazyLock<Option<IntCounterVec>> = LazyLock::new(|| {
    register_int_counter_vec!(
        "im_sim_build_skipped",
        "count of catalog items skipped while building the feature database",
        &["reason"]
    )
    .inspect_err(|e| error!("注册指标失败: {e}"))
    .ok()
});

/// 记录一次搜索
pub fn inc_search_count(metric: &str) {
    if let Some(m) = &*METRIC_SEARCH_COUNT {
        m.with_label_values(&[metric]).inc();
    }
}

pub fn observe_search_duration(metric: &str, duration: f32) {
    if let Some(m) = &*METRIC_SEARCH_DURATION {
        m.with_label_values(&[metric]).observe(duration as f64);
    }
}

pub fn observe_best_score(metric: &str, score: f32) {
    if let Some(m) = &*METRIC_SEARCH_BEST_SCORE {
        m.with_label_values(&[metric]).observe(score as f64);
    }
}

/// 记录构建时跳过的商品
pub fn inc_build_skipped(reason: &str) {
    if let Some(m) = &*METRIC_BUILD_SKIPPED {
        m.with_label_values(&[reason]).inc();
    }
}
