use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::catalog::CatalogItem;
use crate::metric::Metric;

/// 搜索请求参数
#[derive(TryFromMultipart)]
pub struct SearchRequest {
    pub image: Option<FieldData<Bytes>>,
}

/// 搜索表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchForm {
    /// 上传的图片文件，支持 png、jpg、jpeg
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// 返回的结果数量
    pub top_k: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RandomQuery {
    /// 返回的商品数量，默认 20
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TextQuery {
    /// 搜索关键词
    pub query: Option<String>,
}

/// 对外展示的商品
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductView {
    #[serde(flatten)]
    pub item: CatalogItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// 单条搜索结果
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResultView {
    #[serde(flatten)]
    pub product: ProductView,
    /// 余弦相似度或欧氏距离，取决于 metric
    pub similarity: f32,
    /// 从 1 开始的排名
    pub rank: usize,
}

/// 图片搜索响应
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub success: bool,
    pub count: usize,
    /// 特征库使用的度量方式
    pub metric: Metric,
    pub results: Vec<SearchResultView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductsResponse {
    pub success: bool,
    pub count: usize,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AllProductsResponse {
    pub success: bool,
    pub total: usize,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TextSearchResponse {
    pub success: bool,
    pub count: usize,
    pub query: String,
    pub results: Vec<ProductView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesResponse {
    pub success: bool,
    pub count: usize,
    pub categories: Vec<String>,
}
