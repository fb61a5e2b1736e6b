use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::{Catalog, CatalogItem};
use crate::config::ConfDir;
use crate::embed::Embedder;
use crate::error::{Result, SearchError};
use crate::index::{Neighbor, SimilarityIndex};
use crate::metric::Metric;
use crate::metrics;

/// 带有商品信息的搜索结果
#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct EnrichedResult {
    #[serde(flatten)]
    pub item: CatalogItem,
    /// 原始分数：余弦相似度或欧氏距离
    pub similarity: f32,
    /// 从 1 开始的排名
    pub rank: usize,
}

/// 一次查询的结果，`metric` 来自实际被搜索的快照
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub metric: Metric,
    pub results: Vec<EnrichedResult>,
}

/// 一份完整的、只读的检索数据：索引 + 商品元数据
pub struct Snapshot {
    index: SimilarityIndex,
    catalog: Catalog,
    /// key => 商品在 catalog.products 中的位置
    by_key: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new(index: SimilarityIndex, catalog: Catalog) -> Self {
        let by_key = catalog
            .products
            .iter()
            .enumerate()
            .map(|(i, item)| (item.image_path.clone(), i))
            .collect();
        Self { index, catalog, by_key }
    }

    /// 从配置目录加载特征库和有效商品元数据
    pub fn open(conf_dir: &ConfDir) -> Result<Self> {
        let index = SimilarityIndex::load(conf_dir.index())?;
        let catalog = Catalog::load(conf_dir.catalog_valid())?;
        info!("特征库已加载: {} x {}，度量方式 {}", index.len(), index.dim(), index.metric());
        Ok(Self::new(index, catalog))
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn item(&self, key: &str) -> Option<&CatalogItem> {
        self.by_key.get(key).map(|&i| &self.catalog.products[i])
    }

    /// 为搜索结果附加商品信息和排名
    ///
    /// 找不到商品的 key 会被跳过，排名仍然按照索引返回的位置计算
    pub fn enrich(&self, neighbors: Vec<Neighbor>) -> Vec<EnrichedResult> {
        neighbors
            .into_iter()
            .enumerate()
            .filter_map(|(pos, neighbor)| match self.item(&neighbor.key) {
                Some(item) => Some(EnrichedResult {
                    item: item.clone(),
                    similarity: neighbor.score,
                    rank: pos + 1,
                }),
                None => {
                    warn!("{}", SearchError::OrphanKey(neighbor.key));
                    None
                }
            })
            .collect()
    }
}

/// 检索服务，持有当前生效的数据快照
///
/// 查询时只克隆快照的 `Arc`，替换快照不会影响正在进行的查询
pub struct SearchService {
    embedder: Box<dyn Embedder>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl SearchService {
    pub fn new(embedder: Box<dyn Embedder>, snapshot: Snapshot) -> Self {
        Self { embedder, snapshot: RwLock::new(Arc::new(snapshot)) }
    }

    /// 当前生效的快照
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// 替换快照，返回旧快照
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let mut lock = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *lock, snapshot)
    }

    /// 从配置目录重新加载快照
    pub fn reload(&self, conf_dir: &ConfDir) -> Result<()> {
        let snapshot = Snapshot::open(conf_dir)?;
        self.replace(snapshot);
        info!("特征库已重新加载");
        Ok(())
    }

    /// 使用图片进行搜索
    pub fn query(&self, image: &[u8], k: i64) -> Result<SearchOutcome> {
        let vector = self.embedder.embed(image).map_err(|e| match e {
            SearchError::EmbeddingFailed(_) => e,
            e => SearchError::EmbeddingFailed(e.to_string()),
        })?;
        self.query_vector(&vector, k)
    }

    /// 使用特征向量进行搜索
    ///
    /// 整个查询只读取一次快照，期间发生的替换不影响本次结果
    pub fn query_vector(&self, vector: &[f32], k: i64) -> Result<SearchOutcome> {
        let start = Instant::now();
        let snapshot = self.snapshot();
        let metric = snapshot.index.metric().as_str();

        let neighbors = snapshot.index.find_similar(vector, k)?;
        if let Some(best) = neighbors.first() {
            metrics::observe_best_score(metric, best.score);
        }
        let results = snapshot.enrich(neighbors);

        let elapsed = start.elapsed().as_secs_f32();
        metrics::inc_search_count(metric);
        metrics::observe_search_duration(metric, elapsed);
        debug!("搜索耗时: {:.2}ms", elapsed * 1000.);

        Ok(SearchOutcome { metric: snapshot.index.metric(), results })
    }
}
