use clap::Parser;
use taiwan_lotto::core::formatter::INSUFFICIENT_DATA_MESSAGE;
use taiwan_lotto::utils::{logger, validation::Validate};
use taiwan_lotto::{
    render_summary, BrowserFetcher, CliArgs, DirectFetcher, FetchChain, FetchConfig, Summary,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);
    tracing::debug!("CLI args: {:?}", args);

    let config = FetchConfig::from(args);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let chain = FetchChain::new(
        DirectFetcher::new(config.clone()),
        BrowserFetcher::new(config),
    );

    // 兩種方式都失敗時已經記錄過原因，正常結束即可
    let Some(result) = chain.fetch() else {
        return Ok(());
    };

    match render_summary(&result) {
        Summary::Ready(block) => println!("{}", block),
        Summary::InsufficientData => println!("{}", INSUFFICIENT_DATA_MESSAGE),
    }

    Ok(())
}
