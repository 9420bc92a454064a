use anyhow::Context;
use clap::Parser;
use taiwan_lotto::core::dump;
use taiwan_lotto::utils::{logger, validation::Validate};
use taiwan_lotto::{DumpArgs, DumpConfig};

// 除錯用：錯誤直接往外拋，讓程式以非零狀態結束
fn main() -> anyhow::Result<()> {
    let args = DumpArgs::parse();
    logger::init_cli_logger(args.verbose);

    let config = DumpConfig::from(args);
    config.validate().context("invalid dump configuration")?;

    tracing::info!("🌐 正在抓取原始 API 回應: {}", config.api_endpoint);
    dump::run(&config)
        .with_context(|| format!("failed to dump {}", config.api_endpoint))?;

    println!("✅ 已輸出 {}", config.output.display());
    Ok(())
}
