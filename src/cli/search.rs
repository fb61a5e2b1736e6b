use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::config::{EmbedOptions, Opts, OutputFormat, SearchOptions};
use crate::embed::ThumbnailEmbedder;
use crate::engine::{EnrichedResult, SearchService, Snapshot};

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub embed: EmbedOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 被搜索的图片路径
    pub image: String,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let data = fs::read(&self.image).with_context(|| format!("无法读取图片 {}", self.image))?;
        let snapshot = block_in_place(|| Snapshot::open(&opts.conf_dir))?;
        let service = SearchService::new(Box::new(ThumbnailEmbedder::from(&self.embed)), snapshot);

        let outcome = block_in_place(|| service.query(&data, self.search.top_k))?;
        print_result(&outcome.results, self.output_format)
    }
}

fn print_result(result: &[EnrichedResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            for r in result {
                println!(
                    "{}\t{:.4}\t{}\t{}\t{}",
                    r.rank, r.similarity, r.item.id, r.item.name, r.item.image_path
                );
            }
        }
    }
    Ok(())
}
