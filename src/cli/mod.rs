mod build;
mod catalog;
mod export;
mod search;
pub mod server;

pub use build::*;
pub use catalog::*;
pub use export::*;
pub use search::*;
pub use server::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}
