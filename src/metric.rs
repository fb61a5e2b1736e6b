use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 相似度度量方式
#[derive(ValueEnum, Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// 余弦相似度，越大越相似
    Cosine,
    /// 欧氏距离，越小越相似
    Euclidean,
}

impl Metric {
    /// 按照当前度量的排序方向比较两个分数，`Less` 表示 `a` 更相似
    #[inline]
    pub fn compare(self, a: f32, b: f32) -> Ordering {
        match self {
            Metric::Cosine => b.total_cmp(&a),
            Metric::Euclidean => a.total_cmp(&b),
        }
    }

    /// `a` 是否不比 `b` 差
    pub fn not_worse(self, a: f32, b: f32) -> bool {
        self.compare(a, b) != Ordering::Greater
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[inline(always)]
pub fn dot(va: &[f32], vb: &[f32]) -> f32 {
    debug_assert_eq!(va.len(), vb.len());
    // 分成 4 路累加，方便 LLVM 向量化
    let (ca, ra) = va.as_chunks::<4>();
    let (cb, rb) = vb.as_chunks::<4>();
    let mut acc = [0f32; 4];
    for (a, b) in ca.iter().zip(cb) {
        acc[0] += a[0] * b[0];
        acc[1] += a[1] * b[1];
        acc[2] += a[2] * b[2];
        acc[3] += a[3] * b[3];
    }
    let tail: f32 = ra.iter().zip(rb).map(|(a, b)| a * b).sum();
    acc[0] + acc[1] + acc[2] + acc[3] + tail
}

#[inline(always)]
pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

#[inline(always)]
pub fn euclidean(va: &[f32], vb: &[f32]) -> f32 {
    debug_assert_eq!(va.len(), vb.len());
    va.iter().zip(vb).map(|(a, b)| (a - b) * (a - b)).sum::<f32>().sqrt()
}

/// 向量元素的最大绝对值
#[inline]
pub fn max_abs(v: &[f32]) -> f32 {
    v.iter().fold(0f32, |m, x| m.max(x.abs()))
}

/// 先按最大绝对值缩放再计算 L2 范数，极小或极大的有限向量也不会下溢或上溢
pub fn stable_l2_norm(v: &[f32]) -> f32 {
    let scale = max_abs(v);
    if scale == 0.0 || !scale.is_finite() {
        return l2_norm(v);
    }
    let sum = v.iter().map(|x| (x / scale) * (x / scale)).sum::<f32>();
    scale * sum.sqrt()
}

/// 计算余弦相似度，`na` 和 `nb` 为预先计算好的范数
///
/// 任一范数为 0 时返回 0
#[inline(always)]
pub fn cosine(va: &[f32], vb: &[f32], na: f32, nb: f32) -> f32 {
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot(va, vb) / (na * nb)).clamp(-1.0, 1.0)
}

/// 原地进行 L2 归一化，返回归一化前的范数
pub fn normalize_l2(v: &mut [f32]) -> f32 {
    let norm = l2_norm(v);
    if norm > 0.0 && norm.is_finite() {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    norm
}
