use clap::Parser;
use imsim::Opts;
use imsim::cli::SubCommandExtend;
use imsim::config::SubCommand;
use log::debug;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();
    debug!("配置目录: {}", opts.conf_dir.path().display());

    match &opts.subcmd {
        SubCommand::Catalog(cmd) => cmd.run(&opts).await,
        SubCommand::Build(cmd) => cmd.run(&opts).await,
        SubCommand::Search(cmd) => cmd.run(&opts).await,
        SubCommand::Export(cmd) => cmd.run(&opts).await,
        SubCommand::Server(cmd) => cmd.run(&opts).await,
    }
}
