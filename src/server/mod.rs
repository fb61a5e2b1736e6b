mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use self::state::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::search_image_handler,
        api::random_products_handler,
        api::all_products_handler,
        api::search_text_handler,
        api::categories_handler,
        api::reload_handler,
    ),
    components(schemas(types::SearchForm, types::SearchResponse))
)]
pub struct ApiDoc;

/// 构建API服务器
pub fn create_app(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/api/search/image", post(api::search_image_handler))
        .route("/api/search/text", get(api::search_text_handler))
        .route("/api/products/random", get(api::random_products_handler))
        .route("/api/products/all", get(api::all_products_handler))
        .route("/api/categories", get(api::categories_handler))
        .route("/api/reload", post(api::reload_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    if let Some(data_dir) = &state.data_dir {
        router = router.nest_service("/images", ServeDir::new(data_dir));
    }

    router
        .layer(DefaultBodyLimit::disable())
        // 上传限制：16M
        .layer(RequestBodyLimitLayer::new(1024 * 1024 * 16))
        .with_state(state)
}
