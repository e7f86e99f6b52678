//! Boost Screener - aggregated view of boosted DexScreener tokens

use anyhow::Result;

use boost_screener::adapters::cli::{self, init_logging, load_app_config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (endpoint overrides can go here)
    dotenvy::dotenv().ok();

    let app = cli::init();
    let config = load_app_config(&app)?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    cli::execute(app, config).await
}
