use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use axum_auth::AuthBearer;
use axum_typed_multipart::TypedMultipart;
use log::info;
use tokio::task::block_in_place;

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::*;
use crate::error::SearchError;
use crate::utils::has_extension;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// 上传图片，搜索相似商品
#[utoipa::path(
    post,
    path = "/api/search/image",
    params(SearchQuery),
    request_body(content = SearchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = SearchResponse),
        (status = 400, description = "没有上传图片、文件类型不支持或 top_k 非法"),
        (status = 500, description = "特征提取失败"),
    )
)]
pub async fn search_image_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
    data: TypedMultipart<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let Some(file) = &data.image else {
        return Err(AppError::bad_request("No image provided"));
    };
    let file_name = file.metadata.file_name.as_deref().unwrap_or_default();
    if file_name.is_empty() {
        return Err(AppError::bad_request("No selected file"));
    }
    if !has_extension(file_name, ALLOWED_EXTENSIONS) {
        return Err(AppError::bad_request("Invalid file type"));
    }

    // 无法识别格式的文件直接拒绝，不进入特征提取
    image::guess_format(&file.contents).map_err(|e| SearchError::InvalidImage(e.to_string()))?;

    let top_k = query.top_k.unwrap_or(state.top_k);
    let start = Instant::now();
    info!("正在搜索上传图片: {}", file_name);

    let outcome = block_in_place(|| state.service.query(&file.contents, top_k))?;

    info!("搜索完成: {} 个结果，耗时 {}ms", outcome.results.len(), start.elapsed().as_millis());

    let results = outcome
        .results
        .into_iter()
        .map(|r| SearchResultView {
            product: state.product_view(&r.item),
            similarity: r.similarity,
            rank: r.rank,
        })
        .collect::<Vec<_>>();

    Ok(Json(SearchResponse { success: true, count: results.len(), metric: outcome.metric, results }))
}

/// 随机返回若干商品
#[utoipa::path(
    get,
    path = "/api/products/random",
    params(RandomQuery),
    responses((status = 200, body = ProductsResponse))
)]
pub async fn random_products_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RandomQuery>,
) -> Json<ProductsResponse> {
    let snapshot = state.service.snapshot();
    let products = snapshot
        .catalog()
        .random(query.count.unwrap_or(20))
        .into_iter()
        .map(|item| state.product_view(item))
        .collect::<Vec<_>>();
    Json(ProductsResponse { success: true, count: products.len(), products })
}

/// 返回所有商品
#[utoipa::path(
    get,
    path = "/api/products/all",
    responses((status = 200, body = AllProductsResponse))
)]
pub async fn all_products_handler(State(state): State<Arc<AppState>>) -> Json<AllProductsResponse> {
    let snapshot = state.service.snapshot();
    let products = snapshot
        .catalog()
        .products
        .iter()
        .map(|item| state.product_view(item))
        .collect::<Vec<_>>();
    Json(AllProductsResponse { success: true, total: products.len(), products })
}

/// 按名称、分类、描述搜索商品
#[utoipa::path(
    get,
    path = "/api/search/text",
    params(TextQuery),
    responses(
        (status = 200, body = TextSearchResponse),
        (status = 400, description = "缺少搜索关键词"),
    )
)]
pub async fn search_text_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TextQuery>,
) -> Result<Json<TextSearchResponse>> {
    let text = query.query.unwrap_or_default().trim().to_lowercase();
    if text.is_empty() {
        return Err(AppError::bad_request("Query parameter is required"));
    }
    let snapshot = state.service.snapshot();
    let results = snapshot
        .catalog()
        .search_text(&text, 20)
        .into_iter()
        .map(|item| state.product_view(item))
        .collect::<Vec<_>>();
    Ok(Json(TextSearchResponse { success: true, count: results.len(), query: text, results }))
}

/// 返回所有分类
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, body = CategoriesResponse))
)]
pub async fn categories_handler(State(state): State<Arc<AppState>>) -> Json<CategoriesResponse> {
    let categories = state.service.snapshot().catalog().categories();
    Json(CategoriesResponse { success: true, count: categories.len(), categories })
}

/// 从磁盘重新加载特征库
#[utoipa::path(post, path = "/api/reload")]
pub async fn reload_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
) -> Result<()> {
    if token != state.token {
        return Err(AppError::unauthorized());
    }
    // 新快照完全加载后才会替换旧快照
    block_in_place(|| state.service.reload(&state.conf_dir))?;
    Ok(())
}
