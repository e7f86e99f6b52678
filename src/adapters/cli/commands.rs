//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the boosted token screener.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::believe::BelieveRegistry;
use crate::adapters::dexscreener::DexScreenerClient;
use crate::application::{AggregationOutcome, Aggregator, AggregatorConfig, Refresher, Snapshot};
use crate::config::{load_config, Config};
use crate::domain::{format_usd, Interval, MarketOverview, PairDetail, TrendSeries};
use crate::ports::RegistryClient;

/// Boost Screener - aggregated DexScreener boosted tokens, filtered by BelieveScreener
#[derive(Parser, Debug)]
#[command(
    name = "boost-screener",
    version = env!("CARGO_PKG_VERSION"),
    about = "Aggregated view of boosted DexScreener tokens listed on BelieveScreener",
    long_about = "Boost Screener merges the latest boosts, top boosts and latest profiles \
                  from DexScreener, keeps the tokens BelieveScreener knows about, and shows \
                  their market data."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the aggregation once and print the result
    Refresh(RefreshCmd),

    /// Re-run the aggregation periodically until Ctrl+C
    Watch(WatchCmd),

    /// Show the pair detail for a single token
    Token(TokenCmd),

    /// Check whether BelieveScreener lists a token
    Check(CheckCmd),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Run the aggregation once
#[derive(Parser, Debug)]
pub struct RefreshCmd {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Periodic refresh
#[derive(Parser, Debug)]
pub struct WatchCmd {
    /// Seconds between refreshes (overrides config)
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Single token lookup
#[derive(Parser, Debug)]
pub struct TokenCmd {
    /// Token address
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Chain the token lives on
    #[arg(long, value_name = "CHAIN", default_value = "solana")]
    pub chain: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Registry presence check
#[derive(Parser, Debug)]
pub struct CheckCmd {
    /// Token address
    #[arg(value_name = "ADDRESS")]
    pub address: String,
}

/// Load the configuration named by `--config`, or built-in defaults
pub fn load_app_config(app: &CliApp) -> Result<Config> {
    match &app.config {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
            load_config(&expanded).context("Failed to load configuration")
        }
        None => {
            let config = Config::default();
            config.validate().context("Invalid configuration")?;
            Ok(config)
        }
    }
}

/// Initialize tracing. `--debug` and `--verbose` win over `RUST_LOG`, which
/// wins over the configured level.
pub fn init_logging(verbose: bool, debug: bool, default_level: &str) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(default_level)
                .with_context(|| format!("Invalid log level: {}", default_level))?,
        }
    };

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    Ok(())
}

/// Execute the parsed command
pub async fn execute(app: CliApp, config: Config) -> Result<()> {
    match app.command {
        Command::Refresh(cmd) => refresh_command(cmd, &config).await,
        Command::Watch(cmd) => watch_command(cmd, &config).await,
        Command::Token(cmd) => token_command(cmd, &config).await,
        Command::Check(cmd) => check_command(cmd, &config).await,
    }
}

fn build_aggregator(config: &Config) -> Result<Aggregator> {
    let market = DexScreenerClient::with_config(config.dexscreener_config())
        .context("Failed to create DexScreener client")?;
    let registry = BelieveRegistry::with_config(config.believe_config())
        .context("Failed to create BelieveScreener client")?;

    Ok(Aggregator::new(
        Arc::new(market),
        Arc::new(registry),
        AggregatorConfig::from(config),
    ))
}

/// Handle refresh command
async fn refresh_command(cmd: RefreshCmd, config: &Config) -> Result<()> {
    let aggregator = build_aggregator(config)?;
    let outcome = aggregator.run().await;

    match cmd.format {
        OutputFormat::Text => print!("{}", render_outcome(&outcome)),
        OutputFormat::Json => println!("{}", outcome_json(&outcome)?),
    }

    if outcome.report.is_failed() {
        bail!("{}", outcome.report.summary());
    }
    Ok(())
}

/// Handle watch command
async fn watch_command(cmd: WatchCmd, config: &Config) -> Result<()> {
    let interval = match cmd.interval {
        Some(0) => bail!("Interval must be greater than 0"),
        Some(secs) => Duration::from_secs(secs),
        None => config.refresh_interval(),
    };

    let aggregator = build_aggregator(config)?;
    let refresher = Refresher::new(Arc::new(aggregator), interval);

    // Setup Ctrl+C handler
    let stopper = refresher.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        stopper.stop().await;
    });

    let printer = refresher.clone();
    let mut updates = refresher.subscribe();
    let format = cmd.format;
    let printing = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            if let Some(snapshot) = printer.snapshot().await {
                if let Err(e) = print_snapshot(&snapshot, format) {
                    tracing::error!("Failed to print snapshot: {}", e);
                }
            }
        }
    });

    refresher.run().await;
    printing.abort();
    Ok(())
}

/// Handle token command
async fn token_command(cmd: TokenCmd, config: &Config) -> Result<()> {
    let aggregator = build_aggregator(config)?;

    let Some(pair) = aggregator.fetch_token_detail(&cmd.chain, &cmd.address).await else {
        bail!("No pair data for {}:{}", cmd.chain, cmd.address);
    };

    match cmd.format {
        OutputFormat::Text => print!("{}", render_detail(&pair)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pair)?),
    }
    Ok(())
}

/// Handle check command
async fn check_command(cmd: CheckCmd, config: &Config) -> Result<()> {
    let registry = BelieveRegistry::with_config(config.believe_config())
        .context("Failed to create BelieveScreener client")?;

    let listed = registry
        .exists(&cmd.address)
        .await
        .with_context(|| format!("Registry check failed for {}", cmd.address))?;

    println!("{}: {}", cmd.address, if listed { "listed" } else { "not found" });
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "--- Snapshot #{} at {} ---",
                snapshot.generation,
                snapshot.refreshed_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            print!("{}", render_pairs(&snapshot.pairs));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(snapshot)?),
    }
    Ok(())
}

fn outcome_json(outcome: &AggregationOutcome) -> Result<String> {
    let value = serde_json::json!({
        "overview": outcome.overview(),
        "pairs": outcome.pairs,
        "report": outcome.report,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn render_outcome(outcome: &AggregationOutcome) -> String {
    let mut out = render_overview(&outcome.overview());
    out.push('\n');
    out.push_str(&render_pairs(&outcome.pairs));
    if outcome.report.is_degraded() || outcome.report.is_failed() {
        out.push_str(&format!("\n! {}\n", outcome.report.summary()));
    }
    out
}

fn render_overview(overview: &MarketOverview) -> String {
    format!(
        "Active pairs: {}  |  Market cap: {}  |  24h volume: {}  |  Liquidity: {}  |  24h: {} up / {} down\n",
        overview.active_pairs,
        format_usd(overview.total_market_cap),
        format_usd(overview.total_volume_24h),
        format_usd(overview.total_liquidity_usd),
        overview.gainers_24h,
        overview.losers_24h,
    )
}

fn render_pairs(pairs: &[PairDetail]) -> String {
    if pairs.is_empty() {
        return "No tokens found\n".to_string();
    }

    let mut out = format!(
        "{:>3}  {:<12} {:>14} {:>9} {:>9} {:>10} {:>10} {:>10} {:>6}\n",
        "#", "TOKEN", "PRICE", "1H", "24H", "LIQUIDITY", "MCAP", "VOL 24H", "BOOST"
    );
    for (i, pair) in pairs.iter().enumerate() {
        let trend = TrendSeries::from_pair(pair).trend();
        out.push_str(&format!(
            "{:>3}  {:<12} {:>14} {:>9} {:>9} {:>10} {:>10} {:>10} {:>6}  {}\n",
            i + 1,
            truncate(pair.base_symbol().unwrap_or("?"), 12),
            pair.price_usd.as_deref().map_or_else(|| "-".to_string(), |p| format!("${}", p)),
            format_change(pair.price_change_pct(Interval::H1)),
            format_change(pair.price_change_pct(Interval::H24)),
            format_usd(pair.liquidity_usd()),
            format_usd(pair.market_cap_or_zero()),
            format_usd(pair.volume(Interval::H24)),
            pair.active_boosts(),
            trend.arrow(),
        ));
    }
    out
}

fn render_detail(pair: &PairDetail) -> String {
    let mut out = format!(
        "{} ({}) on {}\n",
        pair.base_name().unwrap_or("?"),
        pair.base_symbol().unwrap_or("?"),
        pair.chain_id.as_deref().unwrap_or("?")
    );
    if let Some(url) = &pair.url {
        out.push_str(&format!("  {}\n", url));
    }
    out.push_str(&format!(
        "  Price:      {} ({} {})\n",
        pair.price_usd.as_deref().map_or_else(|| "-".to_string(), |p| format!("${}", p)),
        pair.price_native.as_deref().unwrap_or("-"),
        pair.quote_symbol().unwrap_or("")
    ));
    out.push_str(&format!("  Liquidity:  {}\n", format_usd(pair.liquidity_usd())));
    out.push_str(&format!("  Market cap: {}\n", format_usd(pair.market_cap_or_zero())));
    out.push_str(&format!("  FDV:        {}\n", format_usd(pair.fdv_or_zero())));

    for interval in Interval::ALL {
        let txns = pair.txns(interval);
        out.push_str(&format!(
            "  {:<4} change {:>9}  volume {:>10}  txns {} ({} buys / {} sells)\n",
            interval.key(),
            format_change(pair.price_change_pct(interval)),
            format_usd(pair.volume(interval)),
            txns.total(),
            txns.buys,
            txns.sells,
        ));
    }

    let series = TrendSeries::from_pair(pair);
    if let Some((low, high)) = series.range() {
        out.push_str(&format!(
            "  Trend:      {} (range {} - {})\n",
            series.trend().arrow(),
            format_usd(low),
            format_usd(high)
        ));
        for point in &series.points {
            let label = match point.minutes_ago {
                0 => "now".to_string(),
                m if m % 60 == 0 => format!("{}h ago", m / 60),
                m => format!("{}m ago", m),
            };
            out.push_str(&format!("    {:>8}  {}\n", label, format_usd(point.price_usd)));
        }
    }

    if let Some(age) = pair.age(chrono::Utc::now()) {
        out.push_str(&format!("  Age:        {}h\n", age.num_hours()));
    }
    for url in pair.websites().iter().filter_map(|w| w.url.as_deref()) {
        out.push_str(&format!("  Web:        {}\n", url));
    }
    for social in pair.socials() {
        if let Some(url) = &social.url {
            let kind = social.kind.as_deref().unwrap_or("social");
            out.push_str(&format!("  {:<11} {}\n", format!("{}:", kind), url));
        }
    }
    out
}

fn format_change(change: Option<f64>) -> String {
    match change {
        Some(pct) => format!("{:+.2}%", pct),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max - 1).collect();
        cut.push('~');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> PairDetail {
        serde_json::from_value(serde_json::json!({
            "chainId": "solana",
            "url": "https://dexscreener.com/solana/pairx",
            "baseToken": {"address": "X", "name": "Launch Coin", "symbol": "LAUNCH"},
            "quoteToken": {"address": "So11111111111111111111111111111111111111112", "symbol": "SOL"},
            "priceNative": "0.0005",
            "priceUsd": "0.08",
            "priceChange": {"h1": 2.5, "h24": -10.0},
            "volume": {"h24": 1500000.0},
            "liquidity": {"usd": 250000.0},
            "marketCap": 80000000.0,
            "boosts": {"active": 3}
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_refresh_json() {
        let app = CliApp::try_parse_from(["boost-screener", "refresh", "--format", "json"]).unwrap();
        match app.command {
            Command::Refresh(cmd) => assert_eq!(cmd.format, OutputFormat::Json),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_token_defaults_to_solana() {
        let app = CliApp::try_parse_from(["boost-screener", "-v", "token", "X"]).unwrap();
        assert!(app.verbose);
        match app.command {
            Command::Token(cmd) => {
                assert_eq!(cmd.address, "X");
                assert_eq!(cmd.chain, "solana");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let app =
            CliApp::try_parse_from(["boost-screener", "watch", "--interval", "5", "--config", "screener.toml"])
                .unwrap();
        assert_eq!(app.config, Some(PathBuf::from("screener.toml")));
        match app.command {
            Command::Watch(cmd) => assert_eq!(cmd.interval, Some(5)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        assert!(CliApp::try_parse_from(["boost-screener", "refresh", "--format", "xml"]).is_err());
        assert!(CliApp::try_parse_from(["boost-screener", "check"]).is_err());
    }

    #[test]
    fn test_render_pairs() {
        let table = render_pairs(&[pair()]);
        let row = table.lines().nth(1).unwrap();
        assert!(row.contains("LAUNCH"));
        assert!(row.contains("$0.08"));
        assert!(row.contains("+2.50%"));
        assert!(row.contains("-10.00%"));
        assert!(row.contains("$250.0K"));
        assert!(row.contains("$80.0M"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_pairs(&[]), "No tokens found\n");
    }

    #[test]
    fn test_render_detail() {
        let detail = render_detail(&pair());
        assert!(detail.starts_with("Launch Coin (LAUNCH) on solana"));
        assert!(detail.contains("0.0005 SOL"));
        assert!(detail.contains("h24"));
    }

    #[test]
    fn test_outcome_json_has_overview() {
        let outcome = AggregationOutcome {
            pairs: vec![pair()],
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::from_str(&outcome_json(&outcome).unwrap()).unwrap();
        assert_eq!(json["overview"]["active_pairs"], 1);
        assert_eq!(json["pairs"][0]["baseToken"]["symbol"], "LAUNCH");
        assert_eq!(json["report"]["cancelled"], false);
    }

    #[test]
    fn test_load_app_config_defaults() {
        let app = CliApp::try_parse_from(["boost-screener", "refresh"]).unwrap();
        let config = load_app_config(&app).unwrap();
        assert_eq!(config.refresh.interval_secs, 30);
    }

    #[test]
    fn test_load_app_config_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[refresh]\ninterval_secs = 5").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let app = CliApp::try_parse_from(["boost-screener", "--config", path.as_str(), "refresh"]).unwrap();
        let config = load_app_config(&app).unwrap();
        assert_eq!(config.refresh.interval_secs, 5);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("SHORT", 12), "SHORT");
        assert_eq!(truncate("AVERYLONGSYMBOLNAME", 6), "AVERY~");
    }
}
