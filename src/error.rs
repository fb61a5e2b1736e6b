use std::path::PathBuf;

use thiserror::Error;

/// 检索引擎的错误类型
#[derive(Debug, Error)]
pub enum SearchError {
    /// 图片不存在或无法读取，构建时跳过该商品
    #[error("图片不可用: {path}")]
    MissingImage { path: PathBuf },

    /// 特征提取失败
    #[error("特征提取失败: {0}")]
    EmbeddingFailed(String),

    /// 构建结束后没有任何有效商品
    #[error("特征库为空，没有任何商品成功提取特征")]
    EmptyIndex,

    /// 商品元数据缺失或格式错误
    #[error("商品元数据无效: {0}")]
    MalformedCatalog(String),

    /// 查询向量维度与索引不一致
    #[error("向量维度不匹配: 期望 {expected}，实际 {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 非法参数，例如负数的 k 或零向量查询
    #[error("非法参数: {0}")]
    InvalidArgument(String),

    /// 索引中的 key 在商品元数据中找不到
    #[error("索引中的图片没有对应商品: {0}")]
    OrphanKey(String),

    /// 上传的文件无法解码为图片
    #[error("无效的图片: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("序列化失败: {0}")]
    Serialization(String),
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for SearchError {
    fn from(err: bincode::Error) -> Self {
        SearchError::Serialization(err.to_string())
    }
}

impl SearchError {
    /// 用于指标标签的简短名称
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::MissingImage { .. } => "missing_image",
            SearchError::EmbeddingFailed(_) => "embedding_failed",
            SearchError::EmptyIndex => "empty_index",
            SearchError::MalformedCatalog(_) => "malformed_catalog",
            SearchError::DimensionMismatch { .. } => "dimension_mismatch",
            SearchError::InvalidArgument(_) => "invalid_argument",
            SearchError::OrphanKey(_) => "orphan_key",
            SearchError::InvalidImage(_) => "invalid_image",
            SearchError::Io(_) => "io",
            SearchError::Serialization(_) => "serialization",
        }
    }
}
