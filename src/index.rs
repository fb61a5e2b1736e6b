//! 暴力搜索的相似度索引
//!
//! 索引由一个 `N × D` 的 f32 矩阵、与之逐行对应的图片 key 列表以及度量方式组成。
//! 查询时对所有行逐一计算分数，时间复杂度 `O(N·D)`，分数占用 `O(N)` 空间，
//! 不使用任何剪枝或近似结构。构建完成后索引只读，可以被任意多个线程同时查询。

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::debug;
use ndarray::{Array2, ArrayView2};
use ndarray_npy::write_npy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::metric::{self, Metric};

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    /// 图片 key
    pub key: String,
    /// 原始分数，含义取决于度量方式
    pub score: f32,
}

#[derive(Debug)]
pub struct SimilarityIndex {
    matrix: Array2<f32>,
    keys: Vec<String>,
    metric: Metric,
    /// 每一行的 L2 范数，余弦度量时使用
    norms: Vec<f32>,
}

/// 持久化格式
#[derive(Serialize, Deserialize)]
struct IndexFile {
    metric: Metric,
    dim: usize,
    keys: Vec<String>,
    data: Vec<f32>,
}

impl SimilarityIndex {
    /// 从矩阵和 key 列表创建索引，要求行数与 key 数量一致
    pub fn new(matrix: Array2<f32>, keys: Vec<String>, metric: Metric) -> Result<Self> {
        if matrix.nrows() != keys.len() {
            return Err(SearchError::InvalidArgument(format!(
                "矩阵行数 {} 与 key 数量 {} 不一致",
                matrix.nrows(),
                keys.len()
            )));
        }
        if matrix.nrows() == 0 {
            return Err(SearchError::EmptyIndex);
        }
        if matrix.ncols() == 0 {
            return Err(SearchError::InvalidArgument("向量维度不能为 0".to_string()));
        }
        // 保证内存连续，方便按行取切片
        let matrix = if matrix.is_standard_layout() {
            matrix
        } else {
            matrix.as_standard_layout().into_owned()
        };
        let mut index = Self { matrix, keys, metric, norms: vec![] };
        index.norms = (0..index.len()).map(|i| metric::stable_l2_norm(index.row(i))).collect();
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 向量维度 D
    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn matrix(&self) -> ArrayView2<'_, f32> {
        self.matrix.view()
    }

    fn row(&self, i: usize) -> &[f32] {
        let d = self.dim();
        // new 中已保证标准布局
        &self.matrix.as_slice().unwrap_or_default()[i * d..(i + 1) * d]
    }

    /// 计算查询向量与每一行的分数，返回值与行一一对应
    fn scores(&self, query: &[f32]) -> Result<Vec<f32>> {
        match self.metric {
            Metric::Cosine => {
                // 余弦与尺度无关，先按最大绝对值缩放，避免范数上溢或下溢
                let scale = metric::max_abs(query);
                if scale == 0.0 {
                    return Err(SearchError::InvalidArgument(
                        "查询向量范数为 0，余弦相似度无定义".to_string(),
                    ));
                }
                let query = query.iter().map(|x| x / scale).collect::<Vec<_>>();
                let qnorm = metric::l2_norm(&query);
                Ok((0..self.len())
                    .map(|i| metric::cosine(self.row(i), &query, self.norms[i], qnorm))
                    .collect())
            }
            Metric::Euclidean => {
                Ok((0..self.len()).map(|i| metric::euclidean(self.row(i), query)).collect())
            }
        }
    }

    /// 搜索与查询向量最相似的 k 个结果
    ///
    /// 返回结果按照度量方向排序，分数相同时按照行号升序排列。
    /// `k` 大于索引大小时截断为索引大小，`k == 0` 返回空结果，`k < 0` 报错。
    pub fn find_similar(&self, query: &[f32], k: i64) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim() {
            return Err(SearchError::DimensionMismatch {
                expected: self.dim(),
                actual: query.len(),
            });
        }
        if k < 0 {
            return Err(SearchError::InvalidArgument(format!("k 不能为负数: {}", k)));
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(SearchError::InvalidArgument("查询向量包含 NaN 或无穷大".to_string()));
        }
        let k = (k as usize).min(self.len());
        if k == 0 {
            return Ok(vec![]);
        }

        let scores = self.scores(query)?;

        // 以 (分数, 行号) 作为全序比较键，行号保证并列时的顺序与构建顺序一致
        let metric = self.metric;
        let cmp = |a: &usize, b: &usize| metric.compare(scores[*a], scores[*b]).then(a.cmp(b));

        let mut order: Vec<usize> = (0..scores.len()).collect();
        if k < order.len() {
            order.select_nth_unstable_by(k - 1, cmp);
            order.truncate(k);
        }
        order.sort_unstable_by(cmp);

        debug!("搜索完成: n = {}, k = {}", self.len(), k);

        Ok(order
            .into_iter()
            .map(|i| Neighbor { key: self.keys[i].clone(), score: scores[i] })
            .collect())
    }

    /// 保存索引到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = IndexFile {
            metric: self.metric,
            dim: self.dim(),
            keys: self.keys.clone(),
            data: self.matrix.iter().copied().collect(),
        };
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &file)?;
        Ok(())
    }

    /// 先写入临时文件再重命名，避免读到写了一半的索引
    pub fn save_atomic(&self, path: impl AsRef<Path>, tmp: impl AsRef<Path>) -> Result<()> {
        self.save(tmp.as_ref())?;
        std::fs::rename(tmp.as_ref(), path.as_ref())?;
        Ok(())
    }

    /// 从文件加载索引
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("读取索引: {}", path.display());
        let reader = BufReader::new(File::open(path)?);
        let file: IndexFile = bincode::deserialize_from(reader)?;
        let expected = file.keys.len().checked_mul(file.dim);
        if file.dim == 0 || expected != Some(file.data.len()) {
            return Err(SearchError::Serialization(format!(
                "索引文件损坏: {} 个 key，维度 {}，数据长度 {}",
                file.keys.len(),
                file.dim,
                file.data.len()
            )));
        }
        let matrix = Array2::from_shape_vec((file.keys.len(), file.dim), file.data)
            .map_err(|e| SearchError::Serialization(e.to_string()))?;
        Self::new(matrix, file.keys, file.metric)
    }

    /// 导出特征矩阵为 npy 文件
    pub fn export_npy(&self, path: impl AsRef<Path>) -> Result<()> {
        write_npy(path, &self.matrix).map_err(|e| SearchError::Serialization(e.to_string()))
    }
}
