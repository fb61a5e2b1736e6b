use std::fs;

use anyhow::Result;
use clap::Parser;
use log::info;
use tokio::task::block_in_place;

use crate::Opts;
use crate::catalog::Catalog;
use crate::cli::SubCommandExtend;

#[derive(Parser, Debug, Clone)]
pub struct CatalogCommand {
    /// 商品图片目录，每个子目录为一个分类
    pub path: String,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png")]
    pub suffix: String,
}

impl SubCommandExtend for CatalogCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let catalog = block_in_place(|| Catalog::scan(&self.path, &self.suffix))?;
        fs::create_dir_all(opts.conf_dir.path())?;
        catalog.save(opts.conf_dir.catalog())?;
        info!(
            "商品元数据已保存到 {}：{} 个分类，{} 个商品",
            opts.conf_dir.catalog().display(),
            catalog.categories.len(),
            catalog.total_products
        );
        Ok(())
    }
}
