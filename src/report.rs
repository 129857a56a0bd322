// Terminal rendering of discovery data and backtest reports

use crate::types::{BacktestResult, Discovery};
use tracing::info;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Min/max/last of a curve, enough to eyeball it without a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveStats {
    pub points: usize,
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
}

impl CurveStats {
    pub fn from_curve(curve: &[f64]) -> Option<Self> {
        let first = *curve.first()?;
        let last = *curve.last()?;
        let (min, max) = curve
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        Some(Self {
            points: curve.len(),
            first,
            last,
            min,
            max,
        })
    }
}

pub fn backtest_lines(result: &BacktestResult) -> Vec<String> {
    let mut lines = vec![
        "📊 Backtest Report".to_string(),
        RULE.to_string(),
        format!("   Total return:      {:>10.2}%", result.total_return),
        format!("   Benchmark (B&H):   {:>10.2}%", result.benchmark_return),
        format!("   Max drawdown:      {:>10.2}%", result.max_drawdown),
        format!("   Sharpe ratio:      {:>10.2}", result.sharpe_ratio),
        format!("   Final equity:      {:>10.2}", result.final_equity),
        format!("   Trades:            {:>10}", result.total_trades),
    ];

    if result.beats_benchmark() {
        lines.push("   ✅ Beat buy & hold".to_string());
    } else {
        lines.push("   ⚠️  Did not beat buy & hold".to_string());
    }

    lines.push(RULE.to_string());
    lines.push("🧪 Significance".to_string());
    lines.push(format!(
        "   p-value: {:.4} ({})",
        result.p_value,
        if result.is_significant { "significant" } else { "not significant" }
    ));
    lines.push(format!("   Stability variance: {:.4}", result.stability_variance));
    lines.push(format!("   Inaction value: {:.2}", result.inaction_value));
    if !result.monte_carlo_runs.is_empty() {
        let beaten = result
            .monte_carlo_runs
            .iter()
            .filter(|r| **r < result.total_return)
            .count();
        lines.push(format!(
            "   Random baselines beaten: {}/{}",
            beaten,
            result.monte_carlo_runs.len()
        ));
    }

    lines.push(RULE.to_string());
    lines.push("⏱️  Exposure".to_string());
    lines.push(format!("   Time in market: {:.1}%", result.time_in_market_pct));
    lines.push(format!("   Time in loss: {:.1}%", result.time_in_loss_pct));
    lines.push(format!("   Max latent drawdown: {:.2}%", result.max_latent_drawdown));
    lines.push(format!("   Realized drawdown: {:.2}%", result.realized_drawdown));
    lines.push(format!("   Avg trade duration: {:.1} candles", result.avg_trade_duration_candles));
    lines.push(format!("   Max money at risk: {:.2}", result.max_money_at_risk));

    if let Some(stats) = CurveStats::from_curve(&result.equity_curve) {
        lines.push(format!(
            "   Equity curve: {} points, {:.2} → {:.2} (min {:.2}, max {:.2})",
            stats.points, stats.first, stats.last, stats.min, stats.max
        ));
    }

    if !result.regime_stats.is_empty() {
        lines.push(RULE.to_string());
        lines.push("🌦️  Regimes".to_string());
        for regime in &result.regime_stats {
            lines.push(format!(
                "   {:<20} return {:>8.2}%  vol {:>6.2}  sharpe {:>6.2}  time {:>5.1}%",
                regime.label,
                regime.total_return,
                regime.volatility,
                regime.sharpe,
                regime.percentage_of_time
            ));
        }
    }

    if let Some(audit) = &result.audit {
        lines.push(RULE.to_string());
        lines.push("🗂️  Data quality".to_string());
        lines.push(format!(
            "   Ordered: {}  Duplicates: {}  Gaps: {}  Biggest gap: {}",
            if audit.is_ordered { "yes" } else { "NO" },
            audit.duplicates,
            audit.gaps,
            audit.biggest_gap
        ));
    }

    let narratives = [
        ("Conclusion", &result.research_conclusion),
        ("Stress moment", &result.stress_moment_explanation),
        ("Risk", &result.risk_assessment),
        ("Summary", &result.summary_text),
    ];
    if narratives.iter().any(|(_, text)| !text.trim().is_empty()) {
        lines.push(RULE.to_string());
        for (title, text) in narratives {
            if !text.trim().is_empty() {
                lines.push(format!("   {}: {}", title, text.trim()));
            }
        }
    }

    lines.push(RULE.to_string());
    lines
}

pub fn discovery_lines(discovery: &Discovery) -> Vec<String> {
    let mut lines = vec!["🔭 Discovery".to_string(), RULE.to_string()];

    lines.push(format!("   Symbols: {}", discovery.available_symbols.join(", ")));
    lines.push(format!("   Timeframes: {}", discovery.available_timeframes.join(", ")));

    lines.push(format!("📅 Scenarios ({})", discovery.scenarios.len()));
    for scenario in &discovery.scenarios {
        lines.push(format!(
            "   {} - {} [{} → {}]",
            scenario.id, scenario.label, scenario.start, scenario.end
        ));
    }

    lines.push(format!("🧠 Strategies ({})", discovery.strategies.len()));
    for strategy in &discovery.strategies {
        lines.push(format!("   {} - {}", strategy.id, strategy.label));
        if !strategy.risk_profile.is_empty() {
            lines.push(format!("     Risk: {}", strategy.risk_profile));
        }
        for param in &strategy.parameters {
            let options = param
                .options
                .as_ref()
                .map(|o| format!(" options: {}", o.join("|")))
                .unwrap_or_default();
            lines.push(format!(
                "     --param {}=<{}> (default {}){}",
                param.name, param.kind, param.default, options
            ));
        }
    }

    lines.push(RULE.to_string());
    lines
}

pub fn display_backtest(result: &BacktestResult) {
    for line in backtest_lines(result) {
        info!("{}", line);
    }
}

pub fn display_discovery(discovery: &Discovery) {
    for line in discovery_lines(discovery) {
        info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketScenario, StrategyMetadata, StrategyParameter};
    use std::collections::BTreeMap;

    #[test]
    fn test_curve_stats() {
        let stats = CurveStats::from_curve(&[100.0, 90.0, 120.0, 110.0]).unwrap();
        assert_eq!(stats.points, 4);
        assert_eq!(stats.first, 100.0);
        assert_eq!(stats.last, 110.0);
        assert_eq!(stats.min, 90.0);
        assert_eq!(stats.max, 120.0);
        assert!(CurveStats::from_curve(&[]).is_none());
    }

    #[test]
    fn test_discovery_lines_list_parameters() {
        let discovery = Discovery {
            scenarios: vec![MarketScenario {
                id: "bull_2021".to_string(),
                label: "El Gran Bull Run (2021)".to_string(),
                description: String::new(),
                start: "2021-01-01T00:00:00Z".to_string(),
                end: "2021-12-31T23:59:59Z".to_string(),
                tags: vec![],
            }],
            strategies: vec![StrategyMetadata {
                id: "SmaCrossover".to_string(),
                label: "Cruce de Medias".to_string(),
                description: String::new(),
                logic_explanation: String::new(),
                risk_profile: "Medio".to_string(),
                parameters: vec![StrategyParameter {
                    name: "fast_period".to_string(),
                    label: "Fast".to_string(),
                    kind: "int".to_string(),
                    default: serde_json::json!(20),
                    options: None,
                }],
                default_params: BTreeMap::new(),
            }],
            available_symbols: vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()],
            available_timeframes: vec!["1h".to_string()],
        };

        let lines = discovery_lines(&discovery);
        assert!(lines.iter().any(|l| l.contains("BTC/USDT, ETH/USDT")));
        assert!(lines.iter().any(|l| l.contains("bull_2021")));
        assert!(lines.iter().any(|l| l.contains("--param fast_period=<int> (default 20)")));
    }
}
