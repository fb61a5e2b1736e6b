pub mod builder;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod embed;
pub mod engine;
pub mod error;
pub mod index;
pub mod metric;
mod metrics;
mod server;
pub mod utils;

pub use builder::{FeatureDatabase, FeatureDbBuilder};
pub use catalog::{Catalog, CatalogItem, ImageKey};
pub use config::Opts;
pub use engine::{EnrichedResult, SearchOutcome, SearchService, Snapshot};
pub use error::SearchError;
pub use index::{Neighbor, SimilarityIndex};
pub use metric::Metric;
