//! Equity backtest command-line entry point

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use equity_backtest::comparator::{StrategyComparator, StrategyPortfolio};
use equity_backtest::config::AppConfig;
use equity_backtest::prices::InMemoryPriceSource;
use equity_backtest::report::{PerformanceSummary, ScreeningReport};
use equity_backtest::screening::{
    self, Fundamentals, PortfolioSummary, ScreenOutcome, equal_weight, filter_complete,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "equity-backtest")]
#[command(about = "Fundamental screening and equal-weight portfolio backtesting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a fundamentals universe with every strategy
    Screen {
        #[arg(long)]
        fundamentals: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Backtest screened and/or explicit portfolios against the benchmark
    Backtest(BacktestArgs),
}

#[derive(Args)]
struct BacktestArgs {
    /// Wide CSV of daily closes: a `date` column then one column per symbol
    #[arg(long)]
    prices: PathBuf,
    #[arg(long)]
    fundamentals: Option<PathBuf>,
    /// Explicit portfolio as NAME=SYM1,SYM2 (repeatable)
    #[arg(long = "portfolio", value_parser = parse_portfolio)]
    portfolios: Vec<StrategyPortfolio>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
    /// `annual` or `monthly`
    #[arg(long)]
    frequency: Option<String>,
    #[arg(long)]
    capital: Option<f64>,
    #[arg(long)]
    benchmark: Option<String>,
    /// Run strategies on parallel blocking tasks
    #[arg(long)]
    concurrent: bool,
    /// Print results as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_portfolio(raw: &str) -> std::result::Result<StrategyPortfolio, String> {
    let (name, symbols) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=SYM1,SYM2, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("portfolio name is empty in '{raw}'"));
    }
    let symbols: Vec<String> = symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Ok(StrategyPortfolio::new(name, symbols))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Screen {
            fundamentals,
            config,
        } => run_screen(&fundamentals, config.as_deref()),
        Commands::Backtest(args) => run_backtest(args).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

fn load_universe(path: &Path) -> Result<Vec<Fundamentals>> {
    let universe = screening::load_fundamentals_csv(path)
        .with_context(|| format!("Failed to load fundamentals from {}", path.display()))?;
    let complete = filter_complete(&universe);
    info!(
        "{} of {} tickers have complete fundamentals",
        complete.len(),
        universe.len()
    );
    Ok(complete)
}

fn run_screen(fundamentals: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let universe = load_universe(fundamentals)?;

    for (_, outcome) in screening::screen_all(&universe, &config.screening) {
        print_screen(&outcome);
    }
    Ok(())
}

fn print_screen(outcome: &ScreenOutcome) {
    let allocations = equal_weight(&outcome.tickers());
    println!("{}", ScreeningReport::new(outcome, &allocations));
    let summary = PortfolioSummary::from_holdings(&outcome.qualifying);
    if summary.num_stocks > 0 {
        let sectors: Vec<String> = summary
            .sector_distribution
            .iter()
            .map(|(sector, count)| format!("{sector}: {count}"))
            .collect();
        println!("  Sectors: {}\n", sectors.join(", "));
    }
}

async fn run_backtest(args: BacktestArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    let backtest = &mut config.backtest;
    if let Some(start) = args.start {
        backtest.start_date = start;
    }
    if let Some(end) = args.end {
        backtest.end_date = end;
    }
    if let Some(capital) = args.capital {
        backtest.initial_capital = capital;
    }
    if let Some(benchmark) = args.benchmark {
        backtest.benchmark_symbol = benchmark;
    }
    if let Some(token) = args.frequency.as_deref() {
        *backtest = backtest.clone().with_frequency_token(token)?;
    }
    backtest.validate().context("Invalid backtest configuration")?;

    let mut strategies = Vec::new();
    if let Some(path) = args.fundamentals.as_deref() {
        let universe = load_universe(path)?;
        for (strategy, outcome) in screening::screen_all(&universe, &config.screening) {
            if !args.json {
                print_screen(&outcome);
            }
            strategies.push(StrategyPortfolio::from_screen(strategy, &outcome));
        }
    }
    strategies.extend(args.portfolios);
    if strategies.is_empty() {
        bail!("Nothing to backtest: pass --fundamentals and/or at least one --portfolio");
    }

    let source = InMemoryPriceSource::from_csv_path(&args.prices)
        .with_context(|| format!("Failed to load prices from {}", args.prices.display()))?;

    let comparator = StrategyComparator::new(config.backtest.clone());
    let comparison = if args.concurrent {
        comparator
            .compare_concurrent(&strategies, Arc::new(source))
            .await
    } else {
        comparator.compare(&strategies, &source)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    for result in &comparison.results {
        println!("{}", PerformanceSummary::new(result));
    }
    for skipped in &comparison.skipped {
        warn!("Skipped {}: {}", skipped.name, skipped.reason);
    }
    if comparison.results.is_empty() {
        println!("No strategy produced results");
    } else {
        println!("{}", comparison.table());
    }
    Ok(())
}
