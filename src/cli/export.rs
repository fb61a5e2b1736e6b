use anyhow::Result;
use clap::Parser;
use log::info;

use crate::Opts;
use crate::cli::SubCommandExtend;
use crate::index::SimilarityIndex;

#[derive(Parser, Debug, Clone)]
pub struct ExportCommand {
    /// 输出文件路径
    #[arg(default_value = "features.npy")]
    pub output: String,
}

impl SubCommandExtend for ExportCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let index = SimilarityIndex::load(opts.conf_dir.index())?;
        index.export_npy(&self.output)?;
        info!("导出成功: {} x {} => {}", index.len(), index.dim(), self.output);
        Ok(())
    }
}
