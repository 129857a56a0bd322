// Backtest, discovery and audit commands against the analysis service
use discovery_terminal::params::{check_date_range, parse_date, parse_exit_rule, parse_params};
use discovery_terminal::{
    report, terminal_error, trades_to_verifier_text, AnalysisClient, BacktestRequest, BacktestResult, Config,
    ReportAuditor, Spinner, TerminalError, TerminalResult,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Flags of `qdt backtest run`, unresolved against config defaults.
pub struct RunOptions {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub strategy: Option<String>,
    pub params: Vec<String>,
    pub capital: Option<f64>,
    pub scenario: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub take_profit: Option<String>,
    pub stop_loss: Option<String>,
    pub save: Option<PathBuf>,
    pub audit: bool,
    pub json: bool,
}

pub async fn show_discovery(json: bool, config: &Config) -> TerminalResult<()> {
    let client = AnalysisClient::new(&config.api)?;
    info!("🔭 Querying {}", client.base_url());

    let discovery = client.discovery().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&discovery)?);
    } else {
        report::display_discovery(&discovery);
    }
    Ok(())
}

pub fn build_request(opts: &RunOptions, config: &Config) -> TerminalResult<BacktestRequest> {
    let defaults = &config.backtest;
    let symbol = opts.symbol.clone().unwrap_or_else(|| defaults.symbol.clone());
    let timeframe = opts.timeframe.clone().unwrap_or_else(|| defaults.timeframe.clone());
    let strategy = opts.strategy.clone().unwrap_or_else(|| defaults.strategy.clone());

    let start = opts.start.as_deref().map(|d| parse_date("--start", d)).transpose()?;
    let end = opts.end.as_deref().map(|d| parse_date("--end", d)).transpose()?;
    check_date_range(start.as_deref(), end.as_deref())?;

    let mut builder = BacktestRequest::builder(&symbol, &timeframe, &strategy)
        .params(parse_params(&opts.params)?)
        .initial_capital(opts.capital.unwrap_or(defaults.initial_capital))
        .scenario(opts.scenario.clone().or_else(|| defaults.scenario_id.clone()))
        .date_range(start, end);

    if let Some(raw) = &opts.take_profit {
        let (kind, value) = parse_exit_rule("--tp", raw)?;
        builder = builder.take_profit(kind, value);
    }
    if let Some(raw) = &opts.stop_loss {
        let (kind, value) = parse_exit_rule("--sl", raw)?;
        builder = builder.stop_loss(kind, value);
    }

    let request = builder.build();
    request.validate().map_err(TerminalError::InvalidRequest)?;
    Ok(request)
}

pub async fn run_backtest(opts: RunOptions, config: &Config) -> TerminalResult<()> {
    let request = build_request(&opts, config)?;
    let client = AnalysisClient::new(&config.api)?;

    info!("🎯 Backtest {} on {} {}", request.strategy_name, request.symbol, request.timeframe);
    info!("   Capital: {:.2}", request.initial_capital);
    if let Some(scenario) = &request.scenario_id {
        info!("   Scenario: {}", scenario);
    }
    if !request.params.is_empty() {
        info!("   Params: {}", serde_json::to_string(&request.params)?);
    }

    let spinner = if opts.json {
        Spinner::hidden()
    } else {
        Spinner::new(&format!("Waiting for {}...", client.base_url()))
    };

    let result = match client.run_backtest(&request).await {
        Ok(result) => {
            spinner.finish(&format!("Report received: {} trades", result.total_trades));
            result
        }
        Err(e) => {
            spinner.finish_with_error("Backtest failed");
            return Err(e.into());
        }
    };

    if let Some(path) = &opts.save {
        std::fs::write(path, serde_json::to_string_pretty(&result)?)
            .map_err(|e| TerminalError::FileWrite(format!("{}: {}", path.display(), e)))?;
        info!("💾 Saved report to {}", path.display());
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report::display_backtest(&result);
    }

    if opts.audit {
        audit_result(&result, Some(request.initial_capital), None, config)?;
    }

    Ok(())
}

pub fn load_report(path: &Path) -> TerminalResult<BacktestResult> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TerminalError::FileRead(format!("{}: {}", path.display(), e)))?;
    let result = serde_json::from_str(&content)?;
    Ok(result)
}

pub fn audit_report_file(
    path: &Path,
    capital: Option<f64>,
    tolerance: Option<f64>,
    config: &Config,
) -> TerminalResult<()> {
    info!("🔍 Auditing {}", path.display());
    let result = load_report(path)?;
    audit_result(&result, capital, tolerance, config)
}

fn audit_result(
    result: &BacktestResult,
    capital: Option<f64>,
    tolerance: Option<f64>,
    config: &Config,
) -> TerminalResult<()> {
    let tolerance = tolerance.unwrap_or(config.audit.tolerance);
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        return Err(terminal_error!(invalid_param, "--tolerance", "must be non-negative"));
    }

    let mut auditor = ReportAuditor::new(tolerance, config.replay.commission_rate);
    if let Some(capital) = capital {
        auditor = auditor.with_starting_cash(capital);
    }

    let audit = auditor.audit(result);
    audit.display();

    if audit.trades_checked == 0 {
        warn!("⚠️  Report has no executions to replay");
    }

    if audit.passed() {
        Ok(())
    } else {
        Err(TerminalError::AuditFailed(audit.discrepancies.len()))
    }
}

pub fn export_trades(path: &Path, output: Option<&Path>) -> TerminalResult<()> {
    let result = load_report(path)?;
    let text = trades_to_verifier_text(&result.signals);
    let lines = text.lines().count();

    match output {
        Some(out) => {
            std::fs::write(out, &text)
                .map_err(|e| TerminalError::FileWrite(format!("{}: {}", out.display(), e)))?;
            info!("📤 Wrote {} trade line(s) to {}", lines, out.display());
        }
        None => {
            print!("{}", text);
            info!("📤 {} trade line(s)", lines);
        }
    }

    if lines == 0 {
        warn!("⚠️  No BUY/SELL executions found in {}", path.display());
    }
    Ok(())
}
