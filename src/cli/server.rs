use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use log::{error, info};
use prometheus::{BasicAuthentication, labels};
use rand::distr::{Alphanumeric, SampleString};
use tokio::net::TcpListener;
use tokio::task::{block_in_place, spawn_blocking};
use tokio::time::{Duration, sleep};

use crate::cli::SubCommandExtend;
use crate::config::{EmbedOptions, SearchOptions};
use crate::embed::ThumbnailEmbedder;
use crate::engine::{SearchService, Snapshot};
use crate::{Opts, server};

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub embed: EmbedOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// 商品图片目录，通过 /images 提供静态文件访问
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
    /// 请求验证 token，不填则随机生成
    #[arg(long, default_value_t = String::new())]
    pub token: String,
    /// prometheus 主动推送地址
    #[arg(long, value_name = "URL")]
    pub prometheus_push: Option<String>,
    /// 自定义 instance 标签值
    #[arg(long, value_name = "NAME")]
    pub prometheus_instance: Option<String>,
    /// prometheus 认证信息，格式为 username:password
    #[arg(long, value_name = "AUTH")]
    pub prometheus_auth: Option<String>,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let auth = match &self.prometheus_auth {
            Some(s) => match s.split_once(':') {
                Some((username, password)) => Some((username.to_string(), password.to_string())),
                None => bail!("prometheus 认证信息格式错误，应为 username:password"),
            },
            None => None,
        };

        let snapshot = block_in_place(|| Snapshot::open(&opts.conf_dir))?;
        let service = SearchService::new(Box::new(ThumbnailEmbedder::from(&self.embed)), snapshot);

        let mut token = self.token.clone();
        if token.is_empty() {
            token = Alphanumeric.sample_string(&mut rand::rng(), 32);
            info!("鉴权 token: {}", token);
        }

        // 创建应用状态
        let state = server::AppState::new(
            service,
            opts.conf_dir.clone(),
            self.data_dir.clone(),
            self.search.top_k,
            token,
        );

        // 创建应用
        let app = server::create_app(state);

        if let Some(url) = self.prometheus_push.clone() {
            let instance = self.prometheus_instance.clone().unwrap_or_else(|| self.addr.clone());
            tokio::spawn(async move {
                loop {
                    let metric_families = prometheus::gather();
                    let url = url.clone();
                    let instance = instance.clone();
                    let auth = auth.clone();
                    let r = spawn_blocking(move || {
                        prometheus::push_metrics(
                            "imsim",
                            labels! {
                                "instance".to_string() => instance,
                            },
                            &url,
                            metric_families,
                            auth.map(|(username, password)| BasicAuthentication {
                                username,
                                password,
                            }),
                        )
                    })
                    .await;
                    match r {
                        Ok(Err(e)) => error!("推送指标失败: {e}"),
                        Err(e) => error!("推送任务异常退出: {e}"),
                        Ok(Ok(())) => {}
                    }
                    sleep(Duration::from_secs(30)).await;
                }
            });
        }

        // 启动服务器
        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
