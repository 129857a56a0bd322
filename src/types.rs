// JSON models exchanged with the analysis service

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParameter {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub default: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetadata {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logic_explanation: String,
    #[serde(default)]
    pub risk_profile: String,
    #[serde(default)]
    pub parameters: Vec<StrategyParameter>,
    #[serde(default)]
    pub default_params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketScenario {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Response of `GET /discovery/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    #[serde(default)]
    pub scenarios: Vec<MarketScenario>,
    #[serde(default)]
    pub strategies: Vec<StrategyMetadata>,
    #[serde(default)]
    pub available_symbols: Vec<String>,
    #[serde(default)]
    pub available_timeframes: Vec<String>,
}

impl Discovery {
    pub fn strategy(&self, id: &str) -> Option<&StrategyMetadata> {
        self.strategies.iter().find(|s| s.id == id)
    }

    pub fn scenario(&self, id: &str) -> Option<&MarketScenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }
}

/// Take-profit / stop-loss rule kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitRuleType {
    Percent,
    Absolute,
    None,
}

impl std::str::FromStr for ExitRuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "percent" | "pct" | "%" => Ok(ExitRuleType::Percent),
            "absolute" | "abs" => Ok(ExitRuleType::Absolute),
            "none" => Ok(ExitRuleType::None),
            other => Err(format!("unknown exit rule type '{}' (expected percent, absolute or none)", other)),
        }
    }
}

fn default_initial_capital() -> f64 { 10000.0 }

/// Body of `POST /backtest/run/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub symbol: String,
    pub timeframe: String,
    pub strategy_name: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_type: Option<ExitRuleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl_type: Option<ExitRuleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl_value: Option<f64>,
}

impl BacktestRequest {
    pub fn builder(symbol: &str, timeframe: &str, strategy_name: &str) -> BacktestRequestBuilder {
        BacktestRequestBuilder {
            request: BacktestRequest {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
                strategy_name: strategy_name.to_string(),
                params: BTreeMap::new(),
                initial_capital: default_initial_capital(),
                scenario_id: None,
                start_date: None,
                end_date: None,
                tp_type: None,
                tp_value: None,
                sl_type: None,
                sl_value: None,
            },
        }
    }

    /// Check the request before it goes over the wire.
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("symbol must not be empty".to_string());
        }
        if self.timeframe.trim().is_empty() {
            return Err("timeframe must not be empty".to_string());
        }
        if self.strategy_name.trim().is_empty() {
            return Err("strategy_name must not be empty".to_string());
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err("initial_capital must be positive".to_string());
        }
        validate_exit_rule("take profit", self.tp_type, self.tp_value)?;
        validate_exit_rule("stop loss", self.sl_type, self.sl_value)?;
        Ok(())
    }
}

fn validate_exit_rule(name: &str, kind: Option<ExitRuleType>, value: Option<f64>) -> Result<(), String> {
    match (kind, value) {
        (Some(ExitRuleType::Percent), Some(v)) | (Some(ExitRuleType::Absolute), Some(v)) => {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(format!("{} value must be positive", name))
            }
        }
        (Some(ExitRuleType::Percent), None) | (Some(ExitRuleType::Absolute), None) => {
            Err(format!("{} needs a value", name))
        }
        _ => Ok(()),
    }
}

pub struct BacktestRequestBuilder {
    request: BacktestRequest,
}

impl BacktestRequestBuilder {
    pub fn param(mut self, name: &str, value: Value) -> Self {
        self.request.params.insert(name.to_string(), value);
        self
    }

    pub fn params(mut self, params: BTreeMap<String, Value>) -> Self {
        self.request.params.extend(params);
        self
    }

    pub fn initial_capital(mut self, capital: f64) -> Self {
        self.request.initial_capital = capital;
        self
    }

    pub fn scenario(mut self, scenario_id: Option<String>) -> Self {
        self.request.scenario_id = scenario_id;
        self
    }

    pub fn date_range(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.request.start_date = start;
        self.request.end_date = end;
        self
    }

    pub fn take_profit(mut self, kind: ExitRuleType, value: f64) -> Self {
        self.request.tp_type = Some(kind);
        self.request.tp_value = Some(value);
        self
    }

    pub fn stop_loss(mut self, kind: ExitRuleType, value: f64) -> Self {
        self.request.sl_type = Some(kind);
        self.request.sl_value = Some(value);
        self
    }

    pub fn build(self) -> BacktestRequest {
        self.request
    }
}

fn default_trigger() -> String { "SIGNAL".to_string() }

/// One execution in the report's trade log, with the engine's own ledger
/// columns before and after the fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: String,
    pub side: String,
    pub price: f64,
    #[serde(default = "default_trigger")]
    pub trigger: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub cash_before: f64,
    #[serde(default)]
    pub cash_after: f64,
    #[serde(default)]
    pub pos_before: f64,
    #[serde(default)]
    pub pos_after: f64,
    #[serde(default)]
    pub equity_after: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_raw: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regime {
    pub label: String,
    pub total_return: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub percentage_of_time: f64,
}

/// Data-quality findings the service reports about the candles it used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAudit {
    pub is_ordered: bool,
    pub duplicates: u64,
    pub gaps: u64,
    #[serde(default)]
    pub biggest_gap: String,
}

/// Response of `POST /backtest/run/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub final_equity: f64,
    pub total_trades: u64,
    pub benchmark_return: f64,

    #[serde(default)]
    pub equity_curve: Vec<f64>,
    #[serde(default)]
    pub benchmark_curve: Vec<f64>,
    #[serde(default)]
    pub drawdown_curve: Vec<f64>,

    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub regime_stats: Vec<Regime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<DataAudit>,
    #[serde(default)]
    pub p_value: f64,
    #[serde(default)]
    pub is_significant: bool,
    #[serde(default)]
    pub stability_variance: f64,
    #[serde(default)]
    pub inaction_value: f64,
    #[serde(default)]
    pub monte_carlo_runs: Vec<f64>,

    #[serde(default)]
    pub research_conclusion: String,
    #[serde(default)]
    pub stress_moment_explanation: String,
    #[serde(default)]
    pub summary_text: String,
    #[serde(default)]
    pub risk_assessment: String,

    #[serde(default)]
    pub time_in_market_pct: f64,
    #[serde(default)]
    pub time_in_loss_pct: f64,
    #[serde(default)]
    pub max_latent_drawdown: f64,
    #[serde(default)]
    pub avg_trade_duration_candles: f64,
    #[serde(default)]
    pub realized_drawdown: f64,
    #[serde(default)]
    pub max_money_at_risk: f64,
}

impl BacktestResult {
    /// Did the strategy beat buy-and-hold over the same window?
    pub fn beats_benchmark(&self) -> bool {
        self.total_return > self.benchmark_return
    }
}
