use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{CatalogItem, ImageKey};
use crate::config::ConfDir;
use crate::engine::SearchService;

use super::types::ProductView;

/// 应用状态
pub struct AppState {
    /// 检索服务
    pub service: SearchService,
    /// 配置目录，重新加载时使用
    pub conf_dir: ConfDir,
    /// 图片数据目录，用于生成图片 URL
    pub data_dir: Option<PathBuf>,
    /// 默认返回的结果数量
    pub top_k: i64,
    /// 鉴权 token
    pub token: String,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(
        service: SearchService,
        conf_dir: ConfDir,
        data_dir: Option<PathBuf>,
        top_k: i64,
        token: String,
    ) -> Arc<Self> {
        Arc::new(AppState { service, conf_dir, data_dir, top_k, token })
    }

    /// 将商品转换为对外展示的格式
    pub fn product_view(&self, item: &CatalogItem) -> ProductView {
        let image_url = self
            .data_dir
            .as_deref()
            .and_then(|dir| ImageKey::from_path(dir, &item.image_path))
            .map(|key| key.url());
        ProductView { item: item.clone(), image_url }
    }
}
