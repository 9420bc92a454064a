pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::{CliArgs, DumpArgs};

pub use crate::config::{DumpConfig, FetchConfig};
pub use crate::core::{
    browser::BrowserFetcher, direct::DirectFetcher, fetch_chain::FetchChain,
    formatter::{render_summary, Summary},
};
pub use crate::domain::{model::DrawResult, ports::DrawSource};
pub use crate::utils::error::{LottoError, Result};
