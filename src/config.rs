use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;

use crate::cli::*;

static CONF_DIR: LazyLock<ConfDir> = LazyLock::new(|| {
    let path = ProjectDirs::from("", "imsim", "imsim")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".imsim"));
    ConfDir { path }
});

fn default_config_dir() -> &'static str {
    CONF_DIR.path().to_str().unwrap_or(".imsim")
}

#[derive(Parser, Debug, Clone)]
pub struct EmbedOptions {
    /// 特征提取时缩略图的边长，特征维度为 3 * SIZE * SIZE
    #[arg(long, value_name = "SIZE", default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..=256))]
    pub thumbnail_size: u32,
    /// 提取特征前进行对比度拉伸和去噪
    #[arg(long)]
    pub enhance: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 返回的结果数量
    #[arg(short = 'k', long, value_name = "K", default_value_t = 10)]
    pub top_k: i64,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imsim", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// imsim 配置文件目录
    #[arg(short, long, global = true, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 扫描商品图片目录，生成商品元数据
    Catalog(CatalogCommand),
    /// 提取所有商品图片的特征，构建特征库
    Build(BuildCommand),
    /// 使用一张图片搜索相似商品
    Search(SearchCommand),
    /// 导出特征矩阵为 npy 文件
    Export(ExportCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 返回商品元数据文件的路径
    pub fn catalog(&self) -> PathBuf {
        self.path.join("catalog.json")
    }

    /// 返回有效商品元数据文件的路径，只包含成功提取特征的商品
    pub fn catalog_valid(&self) -> PathBuf {
        self.path.join("catalog_valid.json")
    }

    /// 返回特征库文件的路径
    pub fn index(&self) -> PathBuf {
        self.path.join("features.bin")
    }

    /// 返回特征库临时文件的路径
    pub fn index_tmp(&self) -> PathBuf {
        self.path.join("features.bin.tmp")
    }
}

impl From<&str> for ConfDir {
    fn from(s: &str) -> Self {
        Self { path: PathBuf::from(s) }
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
