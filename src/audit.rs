//! Report cross-check.
//!
//! Replays a backtest report's own trade log through the [`LedgerReplayer`]
//! and compares the result against the ledger columns the engine reported
//! for every fill (`cash_after`, `pos_after`, `equity_after`, `commission`).
//! A clean audit means the engine did not create or lose money between fills.

use crate::ledger::{LedgerReplayer, ParsePolicy, ReplayStep, Side, TradeInstruction, DEFAULT_COMMISSION_RATE};
use crate::types::{BacktestResult, Signal};
use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

pub const DEFAULT_TOLERANCE: f64 = 0.01;

// Below this the book counts as flat
const FLAT_POSITION_EPSILON: f64 = 1e-9;

/// Exit triggers are logged under their trigger name but are sells.
pub fn signal_side(signal: &Signal) -> Option<Side> {
    match signal.side.trim().to_uppercase().as_str() {
        "BUY" => Some(Side::Buy),
        "SELL" | "STOP_LOSS" | "TAKE_PROFIT" => Some(Side::Sell),
        _ => None,
    }
}

/// Signals that moved the ledger: a known side and a positive amount.
pub fn executions(signals: &[Signal]) -> Vec<(usize, TradeInstruction)> {
    signals
        .iter()
        .enumerate()
        .filter_map(|(idx, signal)| {
            let side = signal_side(signal)?;
            if signal.amount.is_finite() && signal.amount > 0.0 {
                Some((idx, TradeInstruction::new(side, signal.price, signal.amount)))
            } else {
                None
            }
        })
        .collect()
}

/// Render the trade log as `SIDE PRICE AMOUNT` lines for the verifier.
pub fn trades_to_verifier_text(signals: &[Signal]) -> String {
    executions(signals)
        .iter()
        .map(|(_, ins)| format!("{} {} {}\n", ins.side, ins.price, ins.amount))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditField {
    Cash,
    Position,
    Equity,
    Commission,
    FinalEquity,
}

impl fmt::Display for AuditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditField::Cash => "cash_after",
            AuditField::Position => "pos_after",
            AuditField::Equity => "equity_after",
            AuditField::Commission => "commission",
            AuditField::FinalEquity => "final_equity",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    /// Index into the report's `signals`; `None` for report-level fields.
    pub signal_index: Option<usize>,
    pub field: AuditField,
    pub reported: f64,
    pub replayed: f64,
}

impl Discrepancy {
    pub fn difference(&self) -> f64 {
        self.replayed - self.reported
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub starting_cash: f64,
    pub trades_checked: usize,
    pub ignored_signals: usize,
    pub replayed_final_equity: f64,
    pub discrepancies: Vec<Discrepancy>,
    pub steps: Vec<ReplayStep>,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.discrepancies.is_empty()
    }

    pub fn display(&self) {
        info!("🔍 Ledger Audit");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("   Starting cash: {:.2}", self.starting_cash);
        info!("   Trades replayed: {}", self.trades_checked);
        if self.ignored_signals > 0 {
            info!("   Non-execution signals ignored: {}", self.ignored_signals);
        }
        info!("   Replayed equity after last trade: {:.2}", self.replayed_final_equity);
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if self.passed() {
            info!("✅ Report ledger matches the replay");
            return;
        }

        error!("❌ {} discrepancy(ies) found", self.discrepancies.len());
        for d in &self.discrepancies {
            match d.signal_index {
                Some(idx) => warn!(
                    "   • trade #{} {}: reported {:.6}, replayed {:.6} (diff {:+.6})",
                    idx, d.field, d.reported, d.replayed, d.difference()
                ),
                None => warn!(
                    "   • {}: reported {:.6}, replayed {:.6} (diff {:+.6})",
                    d.field, d.reported, d.replayed, d.difference()
                ),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportAuditor {
    replayer: LedgerReplayer,
    tolerance: f64,
    starting_cash: Option<f64>,
}

impl Default for ReportAuditor {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE, DEFAULT_COMMISSION_RATE)
    }
}

impl ReportAuditor {
    pub fn new(tolerance: f64, commission_rate: f64) -> Self {
        Self {
            replayer: LedgerReplayer::new(commission_rate, ParsePolicy::Lenient),
            tolerance,
            starting_cash: None,
        }
    }

    /// Override the capital the replay starts from.
    pub fn with_starting_cash(mut self, starting_cash: f64) -> Self {
        self.starting_cash = Some(starting_cash);
        self
    }

    pub fn audit(&self, result: &BacktestResult) -> AuditReport {
        let trades = executions(&result.signals);
        let starting_cash = self.starting_cash.unwrap_or_else(|| infer_starting_cash(result, &trades));

        let instructions: Vec<TradeInstruction> = trades.iter().map(|(_, ins)| *ins).collect();
        let steps = self.replayer.replay_instructions(starting_cash, &instructions);

        let mut discrepancies = Vec::new();
        for ((signal_index, instruction), step) in trades.iter().zip(steps.iter().skip(1)) {
            let signal = &result.signals[*signal_index];
            let replayed_commission = instruction.commission(self.replayer.commission_rate());

            let checks = [
                (AuditField::Cash, signal.cash_after, step.cash_after),
                (AuditField::Position, signal.pos_after, step.position_after),
                (AuditField::Equity, signal.equity_after, step.equity_after),
                (AuditField::Commission, signal.commission, replayed_commission),
            ];
            for (field, reported, replayed) in checks {
                if !self.within_tolerance(reported, replayed) {
                    discrepancies.push(Discrepancy {
                        signal_index: Some(*signal_index),
                        field,
                        reported,
                        replayed,
                    });
                }
            }
        }

        // `final_equity` is marked at the last candle, so it only has to
        // match the replay when the book ends flat.
        let last = &steps[steps.len() - 1];
        let replayed_final_equity = last.equity_after;
        let ends_flat = last.position_after.abs() <= FLAT_POSITION_EPSILON;
        if !trades.is_empty() && ends_flat && !self.within_tolerance(result.final_equity, last.cash_after) {
            discrepancies.push(Discrepancy {
                signal_index: None,
                field: AuditField::FinalEquity,
                reported: result.final_equity,
                replayed: last.cash_after,
            });
        }

        AuditReport {
            starting_cash,
            trades_checked: trades.len(),
            ignored_signals: result.signals.len() - trades.len(),
            replayed_final_equity,
            discrepancies,
            steps,
        }
    }

    fn within_tolerance(&self, reported: f64, replayed: f64) -> bool {
        (reported - replayed).abs() <= self.tolerance
    }
}

/// First fill's `cash_before`, else the first equity point, else the
/// service's default capital.
fn infer_starting_cash(result: &BacktestResult, trades: &[(usize, TradeInstruction)]) -> f64 {
    trades
        .first()
        .map(|(idx, _)| result.signals[*idx].cash_before)
        .filter(|cash| *cash > 0.0)
        .or_else(|| result.equity_curve.first().copied())
        .unwrap_or(10000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(side: &str, price: f64, amount: f64) -> Signal {
        Signal {
            timestamp: "2021-01-01 00:00:00".to_string(),
            side: side.to_string(),
            price,
            trigger: "SIGNAL".to_string(),
            amount,
            cost: price * amount,
            commission: 0.0,
            cash_before: 0.0,
            cash_after: 0.0,
            pos_before: 0.0,
            pos_after: 0.0,
            equity_after: 0.0,
            signal_raw: None,
            indicators: None,
            rule: None,
        }
    }

    #[test]
    fn test_signal_side_mapping() {
        assert_eq!(signal_side(&signal("buy", 1.0, 1.0)), Some(Side::Buy));
        assert_eq!(signal_side(&signal("TAKE_PROFIT", 1.0, 1.0)), Some(Side::Sell));
        assert_eq!(signal_side(&signal("STOP_LOSS", 1.0, 1.0)), Some(Side::Sell));
        assert_eq!(signal_side(&signal("HOLD", 1.0, 1.0)), None);
    }

    #[test]
    fn test_executions_skip_noise() {
        let signals = vec![
            signal("BUY", 100.0, 1.0),
            signal("HOLD", 100.0, 1.0),
            signal("SELL", 110.0, 0.0),
            signal("SELL", 110.0, 1.0),
        ];
        let trades = executions(&signals);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].0, 0);
        assert_eq!(trades[1].0, 3);
    }

    #[test]
    fn test_verifier_text() {
        let signals = vec![signal("BUY", 29000.0, 0.1), signal("TAKE_PROFIT", 30000.0, 0.1)];
        assert_eq!(trades_to_verifier_text(&signals), "BUY 29000 0.1\nSELL 30000 0.1\n");
    }

    #[test]
    fn test_field_names() {
        assert_eq!(AuditField::Position.to_string(), "pos_after");
        assert_eq!(AuditField::FinalEquity.to_string(), "final_equity");
    }
}
