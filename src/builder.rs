//! 离线构建特征库
//!
//! 按商品元数据的顺序逐个提取图片特征，单个商品失败只会被跳过，不会中断整个构建。
//! 成功的向量按照元数据中的顺序组成矩阵的行，行号即为搜索时并列结果的排序依据。

use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ProgressBar;
use log::{info, warn};
use ndarray::Array2;
use rayon::prelude::*;

use crate::catalog::{Catalog, CatalogItem};
use crate::embed::Embedder;
use crate::error::{Result, SearchError};
use crate::index::SimilarityIndex;
use crate::metric::Metric;
use crate::metrics;
use crate::utils::pb_style_speed;

/// 构建时被跳过的商品
#[derive(Debug)]
pub struct SkippedItem {
    pub id: u64,
    pub image_path: String,
    pub error: SearchError,
}

/// 构建结果
#[derive(Debug)]
pub struct FeatureDatabase {
    /// `N × D` 特征矩阵
    pub matrix: Array2<f32>,
    /// 与矩阵逐行对应的图片 key
    pub keys: Vec<String>,
    /// 成功提取特征的商品，顺序与 keys 一致
    pub valid_items: Vec<CatalogItem>,
    pub skipped: Vec<SkippedItem>,
}

impl FeatureDatabase {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn into_index(self, metric: Metric) -> Result<SimilarityIndex> {
        SimilarityIndex::new(self.matrix, self.keys, metric)
    }
}

pub struct FeatureDbBuilder<'a, E: Embedder> {
    embedder: &'a E,
    root: Option<PathBuf>,
    progress: bool,
}

impl<'a, E: Embedder> FeatureDbBuilder<'a, E> {
    pub fn new(embedder: &'a E) -> Self {
        Self { embedder, root: None, progress: false }
    }

    /// 相对路径的图片以 `root` 为根目录解析
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// 是否显示进度条
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn resolve(&self, image_path: &str) -> PathBuf {
        let path = Path::new(image_path);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// 提取单个商品的特征
    fn embed_item(&self, item: &CatalogItem) -> Result<Vec<f32>> {
        let path = self.resolve(&item.image_path);
        let data = std::fs::read(&path).map_err(|_| SearchError::MissingImage { path })?;
        let v = self.embedder.embed(&data).map_err(|e| match e {
            SearchError::EmbeddingFailed(_) => e,
            e => SearchError::EmbeddingFailed(e.to_string()),
        })?;
        if v.len() != self.embedder.dim() {
            return Err(SearchError::EmbeddingFailed(format!(
                "特征维度为 {}，期望 {}",
                v.len(),
                self.embedder.dim()
            )));
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(SearchError::EmbeddingFailed("特征向量包含 NaN 或无穷大".to_string()));
        }
        Ok(v)
    }

    /// 构建特征库
    ///
    /// 没有任何商品成功时返回 `SearchError::EmptyIndex`
    pub fn build(&self, catalog: &Catalog) -> Result<FeatureDatabase> {
        let start = Instant::now();
        let dim = self.embedder.dim();
        let pb = if self.progress {
            ProgressBar::new(catalog.products.len() as u64).with_style(pb_style_speed())
        } else {
            ProgressBar::hidden()
        };

        // 索引型并行迭代器的 collect 保持原有顺序
        let vectors = catalog
            .products
            .par_iter()
            .map(|item| {
                let r = self.embed_item(item);
                pb.inc(1);
                r
            })
            .collect::<Vec<_>>();
        pb.finish_and_clear();

        let mut data = Vec::with_capacity(catalog.products.len() * dim);
        let mut keys = vec![];
        let mut valid_items = vec![];
        let mut skipped = vec![];

        for (item, r) in catalog.products.iter().zip(vectors) {
            match r {
                Ok(v) => {
                    data.extend_from_slice(&v);
                    keys.push(item.image_path.clone());
                    valid_items.push(item.clone());
                }
                Err(error) => {
                    warn!("跳过商品 {}: {}", item.id, error);
                    metrics::inc_build_skipped(error.kind());
                    skipped.push(SkippedItem {
                        id: item.id,
                        image_path: item.image_path.clone(),
                        error,
                    });
                }
            }
        }

        if keys.is_empty() {
            return Err(SearchError::EmptyIndex);
        }

        let matrix = Array2::from_shape_vec((keys.len(), dim), data)
            .map_err(|e| SearchError::EmbeddingFailed(e.to_string()))?;

        info!(
            "特征提取完成: {} / {}，耗时 {:.2}s",
            keys.len(),
            catalog.products.len(),
            start.elapsed().as_secs_f32()
        );

        Ok(FeatureDatabase { matrix, keys, valid_items, skipped })
    }
}
