// Common test utilities and helpers
#![allow(dead_code)]

use discovery_terminal::{
    BacktestResult, Config, LedgerState, Side, Signal, TradeInstruction, DEFAULT_COMMISSION_RATE,
};
use rand::Rng;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a test configuration pointing at `base_url`
pub fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.timeout_seconds = 5;
    config
}

/// Write `content` to a config file inside a fresh temp directory
pub fn write_temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, content).expect("Failed to write config file");
    (temp_dir, path)
}

/// Generate random trades around `base_price`
pub fn generate_trades(base_price: f64, count: usize, side: Option<Side>) -> Vec<TradeInstruction> {
    let mut rng = rand::thread_rng();
    let mut price = base_price;

    (0..count)
        .map(|_| {
            price *= 1.0 + rng.gen_range(-0.02..0.02);
            let side = side.unwrap_or(if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell });
            let amount = rng.gen_range(0.001..2.0);
            TradeInstruction::new(side, price, amount)
        })
        .collect()
}

/// Render trades as replay input
pub fn to_text(trades: &[TradeInstruction]) -> String {
    trades
        .iter()
        .map(|t| format!("{} {} {}\n", t.side, t.price, t.amount))
        .collect()
}

/// Build a trade log with correct ledger columns, the way the engine reports it
pub fn consistent_signals(starting_cash: f64, trades: &[(&str, f64, f64)]) -> Vec<Signal> {
    let mut state = LedgerState::new(starting_cash);

    trades
        .iter()
        .enumerate()
        .map(|(i, (side, price, amount))| {
            let parsed = if side.eq_ignore_ascii_case("BUY") { Side::Buy } else { Side::Sell };
            let instruction = TradeInstruction::new(parsed, *price, *amount);
            let cash_before = state.cash;
            let pos_before = state.position;
            let commission = state.apply(&instruction, DEFAULT_COMMISSION_RATE);

            Signal {
                timestamp: format!("2021-01-{:02} 00:00:00", i + 1),
                side: side.to_string(),
                price: *price,
                trigger: "SIGNAL".to_string(),
                amount: *amount,
                cost: instruction.notional(),
                commission,
                cash_before,
                cash_after: state.cash,
                pos_before,
                pos_after: state.position,
                equity_after: state.equity_at(*price),
                signal_raw: None,
                indicators: None,
                rule: None,
            }
        })
        .collect()
}

/// Minimal report around `signals`
pub fn sample_result(signals: Vec<Signal>, final_equity: f64) -> BacktestResult {
    let json = serde_json::json!({
        "total_return": 0.0,
        "max_drawdown": 0.0,
        "sharpe_ratio": 0.0,
        "final_equity": final_equity,
        "total_trades": signals.len(),
        "benchmark_return": 0.0,
        "equity_curve": [10000.0, final_equity],
    });
    let mut result: BacktestResult = serde_json::from_value(json).expect("Failed to build sample result");
    result.signals = signals;
    result
}
