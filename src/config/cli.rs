use crate::config::{
    DumpConfig, FetchConfig, API_URL, DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
    DUMP_FILE, PAGE_URL,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "taiwan-lotto")]
#[command(about = "Print the latest Taiwan Lottery Super Lotto 638 draw")]
pub struct CliArgs {
    #[arg(long, default_value = API_URL)]
    pub api_endpoint: String,

    #[arg(long, default_value = PAGE_URL)]
    pub page_url: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = DEFAULT_NAVIGATION_TIMEOUT_SECS)]
    pub navigation_timeout_secs: u64,

    #[arg(long, help = "Chromium executable used by the browser fallback")]
    pub chromium_path: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl From<CliArgs> for FetchConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            api_endpoint: args.api_endpoint,
            page_url: args.page_url,
            timeout: Duration::from_secs(args.timeout_secs),
            navigation_timeout: Duration::from_secs(args.navigation_timeout_secs),
            chromium_path: args.chromium_path,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "api_dump")]
#[command(about = "Write the raw LatestResult API payload to a file")]
pub struct DumpArgs {
    #[arg(long, default_value = API_URL)]
    pub api_endpoint: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    #[arg(long, default_value = DUMP_FILE)]
    pub output: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl From<DumpArgs> for DumpConfig {
    fn from(args: DumpArgs) -> Self {
        Self {
            api_endpoint: args.api_endpoint,
            timeout: Duration::from_secs(args.timeout_secs),
            output: args.output,
        }
    }
}
