//! 商品元数据
//!
//! 元数据文件为 JSON 格式：`{ products, categories, total_products }`。

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};

use indicatif::ProgressBar;
use log::info;
use rand::seq::IndexedRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use walkdir::WalkDir;

use crate::error::{Result, SearchError};
use crate::utils::pb_style;

/// 商品记录
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: u64,
    pub name: String,
    pub category: String,
    /// 图片路径，同时作为特征库中的 key
    pub image_path: String,
    pub price: String,
    pub description: String,
    pub in_stock: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Catalog {
    pub products: Vec<CatalogItem>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub total_products: usize,
}

impl Catalog {
    /// 读取并校验商品元数据
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            SearchError::MalformedCatalog(format!("无法读取 {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&text)?;
        info!("读取商品元数据: {}，共 {} 个商品", path.display(), catalog.products.len());
        Ok(catalog)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_json::from_str(text).map_err(|e| SearchError::MalformedCatalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.total_products != self.products.len() {
            return Err(SearchError::MalformedCatalog(format!(
                "total_products = {}，但实际有 {} 个商品",
                self.total_products,
                self.products.len()
            )));
        }
        let mut seen = HashMap::with_capacity(self.products.len());
        for item in &self.products {
            if item.image_path.is_empty() {
                return Err(SearchError::MalformedCatalog(format!("商品 {} 缺少图片路径", item.id)));
            }
            if let Some(other) = seen.insert(item.image_path.as_str(), item.id) {
                return Err(SearchError::MalformedCatalog(format!(
                    "商品 {} 与 {} 使用了相同的图片: {}",
                    other, item.id, item.image_path
                )));
            }
        }
        Ok(())
    }

    /// 使用部分商品构建新的元数据，分类列表保持不变
    pub fn with_products(&self, products: Vec<CatalogItem>) -> Self {
        Self { total_products: products.len(), products, categories: self.categories.clone() }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// 扫描商品图片目录，每个子目录为一个分类
    ///
    /// # Arguments
    ///
    /// * `root` - 商品图片根目录
    /// * `suffix` - 图片后缀名，多个后缀用逗号分隔
    pub fn scan(root: impl AsRef<Path>, suffix: &str) -> Result<Self> {
        let root = root.as_ref();
        let re_suf = format!("(?i)^({})$", suffix.replace(',', "|"));
        let re_suf =
            Regex::new(&re_suf).map_err(|e| SearchError::InvalidArgument(e.to_string()))?;

        info!("开始扫描目录: {}", root.display());
        let mut dirs = fs::read_dir(root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        dirs.sort();

        let pb = ProgressBar::new(dirs.len() as u64).with_style(pb_style());
        let mut catalog = Catalog::default();
        for category in dirs {
            pb.set_message(category.clone());
            let images = WalkDir::new(root.join(&category))
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| {
                    entry
                        .path()
                        .extension()
                        .is_some_and(|ext| re_suf.is_match(&ext.to_string_lossy()))
                })
                .map(|entry| entry.into_path())
                .collect::<Vec<_>>();

            for path in &images {
                let id = catalog.products.len() as u64 + 1;
                catalog.products.push(CatalogItem {
                    id,
                    name: format!("{} #{}", capitalize(&category), id),
                    category: category.clone(),
                    image_path: path.to_string_lossy().replace('\\', "/"),
                    price: format!("{}.99 €", 20 + (id * 7) % 180),
                    description: format!("Beautiful {} from our collection", category),
                    in_stock: true,
                });
            }
            info!("分类 {}: {} 个商品", category, images.len());
            catalog.categories.push(category);
            pb.inc(1);
        }
        pb.finish_and_clear();

        catalog.total_products = catalog.products.len();
        Ok(catalog)
    }

    /// 所有分类，去重并排序
    pub fn categories(&self) -> Vec<String> {
        self.products
            .iter()
            .map(|p| p.category.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// 在名称、分类、描述中进行不区分大小写的子串匹配
    pub fn search_text(&self, query: &str, limit: usize) -> Vec<&CatalogItem> {
        let query = query.trim().to_lowercase();
        self.products
            .iter()
            .filter(|p| {
                let text = format!("{} {} {}", p.name, p.category, p.description).to_lowercase();
                text.contains(&query)
            })
            .take(limit)
            .collect()
    }

    /// 随机选取最多 `count` 个商品
    pub fn random(&self, count: usize) -> Vec<&CatalogItem> {
        let count = count.min(self.products.len());
        self.products.choose_multiple(&mut rand::rng(), count).collect()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// 结构化的图片 key，`bucket` 为数据目录下的第一级目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageKey {
    pub bucket: String,
    pub relative_path: String,
}

impl ImageKey {
    /// 从图片路径解析出 key，路径不在数据目录下时返回 None
    pub fn from_path(data_dir: &Path, image_path: &str) -> Option<Self> {
        let image_path = PathBuf::from(image_path.replace('\\', "/"));
        let rel = image_path.strip_prefix(data_dir).ok()?;
        let mut parts = rel.components().filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        });
        let bucket = parts.next()?;
        let relative_path = parts.collect::<Vec<_>>().join("/");
        if relative_path.is_empty() {
            return None;
        }
        Some(Self { bucket, relative_path })
    }

    /// 对外暴露的图片 URL
    pub fn url(&self) -> String {
        format!("/images/{}/{}", self.bucket, self.relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "products": [
            {"id": 1, "name": "Bag #1", "category": "bag", "image_path": "data/products/bag/1.png",
             "price": "27.99 €", "description": "Beautiful bag from our collection", "in_stock": true},
            {"id": 2, "name": "Shoe #2", "category": "shoe", "image_path": "data/products/shoe/2.png",
             "price": "34.99 €", "description": "Beautiful shoe from our collection", "in_stock": false}
        ],
        "categories": ["bag", "shoe"],
        "total_products": 2
    }"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.products[1].name, "Shoe #2");
        assert!(!catalog.products[1].in_stock);
    }

    #[test]
    fn test_malformed_catalog() {
        let err = Catalog::from_json("{\"products\": 1}").unwrap_err();
        assert!(matches!(err, SearchError::MalformedCatalog(_)));

        let wrong_total = SAMPLE.replace("\"total_products\": 2", "\"total_products\": 5");
        let err = Catalog::from_json(&wrong_total).unwrap_err();
        assert!(matches!(err, SearchError::MalformedCatalog(_)));

        let dup = SAMPLE.replace("data/products/shoe/2.png", "data/products/bag/1.png");
        let err = Catalog::from_json(&dup).unwrap_err();
        assert!(matches!(err, SearchError::MalformedCatalog(_)));
    }

    #[test]
    fn test_missing_catalog() {
        let err = Catalog::load("/nonexistent/catalog.json").unwrap_err();
        assert!(matches!(err, SearchError::MalformedCatalog(_)));
    }

    #[test]
    fn test_search_text_and_categories() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let found = catalog.search_text("  SHOE ", 20);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
        assert_eq!(catalog.search_text("collection", 1).len(), 1);
        assert_eq!(catalog.categories(), ["bag", "shoe"]);
    }

    #[test]
    fn test_random_is_clamped() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.random(20).len(), 2);
        assert_eq!(catalog.random(1).len(), 1);
    }

    #[test]
    fn test_image_key_url() {
        let key = ImageKey::from_path(Path::new("data"), "data/products/bag/1.png").unwrap();
        assert_eq!(key.bucket, "products");
        assert_eq!(key.relative_path, "bag/1.png");
        assert_eq!(key.url(), "/images/products/bag/1.png");

        let key = ImageKey::from_path(Path::new("data"), "data\\preprocessed\\shoe\\2.png").unwrap();
        assert_eq!(key.url(), "/images/preprocessed/shoe/2.png");

        assert!(ImageKey::from_path(Path::new("data"), "elsewhere/bag/1.png").is_none());
        assert!(ImageKey::from_path(Path::new("data"), "data/loose.png").is_none());
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        for (cat, files) in [("shoe", vec!["b.PNG", "a.jpg", "notes.txt"]), ("bag", vec!["x.jpeg"])] {
            fs::create_dir(dir.path().join(cat)).unwrap();
            for f in files {
                fs::write(dir.path().join(cat).join(f), b"").unwrap();
            }
        }
        let catalog = Catalog::scan(dir.path(), "jpg,jpeg,png").unwrap();
        assert_eq!(catalog.total_products, 3);
        assert_eq!(catalog.categories, ["bag", "shoe"]);
        assert_eq!(catalog.products[0].name, "Bag #1");
        assert_eq!(catalog.products[0].price, "27.99 €");
        assert!(catalog.products[1].image_path.ends_with("shoe/a.jpg"));
        assert!(catalog.products[2].image_path.ends_with("shoe/b.PNG"));
        assert_eq!(catalog.products[2].id, 3);
    }
}
