// Quant Discovery Terminal - command line entry point
// Replays trade logs by hand and drives the external analysis service

use clap::{Parser, Subcommand};
use discovery_terminal::{terminal_error, Config, ConfigError, TerminalError, TerminalResult};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

// Load command modules from cli directory
#[path = "../cli/backtest_commands.rs"]
mod backtest_commands;
#[path = "../cli/replay_commands.rs"]
mod replay_commands;

const EXAMPLE_CONFIG: &str = include_str!("../../config.toml.example");
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Parser)]
#[command(name = "qdt")]
#[command(version)]
#[command(about = "Quant Discovery Terminal: backtest reports and ledger verification", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Replay SIDE PRICE AMOUNT lines and print the ledger trace
    Replay {
        /// File with one trade per line (stdin when omitted)
        file: Option<PathBuf>,

        /// Starting cash balance
        #[arg(long)]
        cash: Option<f64>,

        /// Commission rate as a fraction of notional
        #[arg(long)]
        commission: Option<f64>,

        /// Reject lines with unknown sides or non-numeric values
        #[arg(short, long)]
        strict: bool,

        /// Print steps and summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List strategies, symbols, timeframes and scenarios
    Discovery {
        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run backtests on the analysis service
    #[command(subcommand)]
    Backtest(BacktestCommands),

    /// Cross-check a saved report's trade log against a ledger replay
    Audit {
        /// Report JSON saved with `backtest run --save`
        report: PathBuf,

        /// Starting capital (defaults to the first trade's cash_before)
        #[arg(long)]
        capital: Option<f64>,

        /// Allowed absolute difference per value
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Write a report's trades as replay input
    ExportTrades {
        /// Report JSON saved with `backtest run --save`
        report: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BacktestCommands {
    /// Submit a backtest and print the report
    Run {
        /// Symbol (e.g., BTC/USDT)
        #[arg(long)]
        symbol: Option<String>,

        /// Timeframe (e.g., 1h)
        #[arg(short, long)]
        timeframe: Option<String>,

        /// Strategy id from `qdt discovery`
        #[arg(long)]
        strategy: Option<String>,

        /// Strategy parameter as name=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Initial capital
        #[arg(long)]
        capital: Option<f64>,

        /// Market scenario id
        #[arg(long)]
        scenario: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Take profit as TYPE:VALUE (percent:10, absolute:65000)
        #[arg(long)]
        tp: Option<String>,

        /// Stop loss as TYPE:VALUE (percent:5, absolute:25000)
        #[arg(long)]
        sl: Option<String>,

        /// Save the report JSON to a file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Audit the report's trade log after printing it
        #[arg(short, long)]
        audit: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Config is read before logging so its log level applies; errors are
    // reported once logging is up.
    let config_path = cli.config.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path);
    let log_level = match (&config, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.logging.log_level.clone(),
        (Err(_), false) => "info".to_string(),
    };
    init_logging(&log_level, cli.verbose);

    if let Err(e) = run(cli, &config_path, config).await {
        error!("❌ {} error", e.category());
        for line in e.user_message().lines() {
            error!("{}", line);
        }
        std::process::exit(1);
    }
}

fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    // Logs go to stderr so trace tables and JSON can be piped
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, config_path: &str, config: Result<Config, ConfigError>) -> TerminalResult<()> {
    // Defaults only stand in for the implicit ./config.toml
    let explicit = cli.config.is_some();
    let config = move || -> TerminalResult<Config> {
        if explicit && !Path::new(config_path).exists() {
            return Err(terminal_error!(config_not_found, config_path));
        }
        debug!("📁 Config: {}", config_path);
        Ok(config?)
    };

    match cli.command {
        // Init doesn't require a valid config (it creates it)
        Commands::Init { force } => init_config(config_path, force),

        Commands::Replay { file, cash, commission, strict, json } => {
            replay_commands::run_replay(file.as_deref(), cash, commission, strict, json, &config()?)
        }

        Commands::Discovery { json } => backtest_commands::show_discovery(json, &config()?).await,

        Commands::Backtest(BacktestCommands::Run {
            symbol,
            timeframe,
            strategy,
            params,
            capital,
            scenario,
            start,
            end,
            tp,
            sl,
            save,
            audit,
            json,
        }) => {
            let opts = backtest_commands::RunOptions {
                symbol,
                timeframe,
                strategy,
                params,
                capital,
                scenario,
                start,
                end,
                take_profit: tp,
                stop_loss: sl,
                save,
                audit,
                json,
            };
            backtest_commands::run_backtest(opts, &config()?).await
        }

        Commands::Audit { report, capital, tolerance } => {
            backtest_commands::audit_report_file(&report, capital, tolerance, &config()?)
        }

        Commands::ExportTrades { report, output } => {
            backtest_commands::export_trades(&report, output.as_deref())
        }
    }
}

fn init_config(path: &str, force: bool) -> TerminalResult<()> {
    info!("🔧 Initializing configuration...");

    if Path::new(path).exists() && !force {
        warn!("⚠️  {} already exists, skipping (use --force to overwrite)", path);
        return Ok(());
    }

    std::fs::write(path, EXAMPLE_CONFIG)
        .map_err(|e| TerminalError::FileWrite(format!("{}: {}", path, e)))?;

    info!("📝 Created {}", path);
    info!("💡 Next steps:");
    info!("   1. Point [api] base_url at the analysis service");
    info!("   2. Run: qdt discovery");
    info!("   3. Run: qdt backtest run --strategy SmaCrossover --audit");
    Ok(())
}
