use std::fs;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use tokio::task::block_in_place;

use crate::Opts;
use crate::builder::FeatureDbBuilder;
use crate::catalog::Catalog;
use crate::cli::SubCommandExtend;
use crate::config::EmbedOptions;
use crate::embed::ThumbnailEmbedder;
use crate::metric::Metric;

#[derive(Parser, Debug, Clone)]
pub struct BuildCommand {
    #[command(flatten)]
    pub embed: EmbedOptions,
    /// 相似度度量方式
    #[arg(long, value_enum, default_value_t = Metric::Cosine)]
    pub metric: Metric,
    /// 相对路径的图片以此目录为根目录
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,
}

impl SubCommandExtend for BuildCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let conf_dir = &opts.conf_dir;
        let catalog = Catalog::load(conf_dir.catalog())?;
        let embedder = ThumbnailEmbedder::from(&self.embed);

        let mut builder = FeatureDbBuilder::new(&embedder).progress(true);
        if let Some(root) = &self.root {
            builder = builder.root(root);
        }
        let db = block_in_place(|| builder.build(&catalog))?;

        for skipped in &db.skipped {
            warn!("[{}] {}: {}", skipped.id, skipped.image_path, skipped.error);
        }

        let total = catalog.total_products;
        let processed = db.len();
        let dim = db.dim();
        let valid = catalog.with_products(db.valid_items.clone());
        let index = db.into_index(self.metric)?;

        fs::create_dir_all(conf_dir.path())?;
        block_in_place(|| index.save_atomic(conf_dir.index(), conf_dir.index_tmp()))?;
        valid.save(conf_dir.catalog_valid())?;
        info!("特征库已保存到 {}", conf_dir.index().display());

        let size_mb = (processed * dim * size_of::<f32>()) as f64 / 1024. / 1024.;
        println!("Processed: {}/{}", processed, total);
        println!("Dimension: {}", dim);
        println!("Size:      {:.2} MB", size_mb);
        println!("Metric:    {}", self.metric);
        if processed < total {
            warn!("{} 个商品被跳过", total - processed);
        }
        Ok(())
    }
}
