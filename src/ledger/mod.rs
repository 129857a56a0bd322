// Ledger replay: deterministic re-computation of cash, position and equity
// from an ordered list of pasted trade lines.

pub mod parser;
pub mod replayer;
pub mod trace;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Commission charged on every fill, as a fraction of notional (0.1%).
pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Spanish action word used in step narratives.
    pub fn action(&self) -> &'static str {
        match self {
            Side::Buy => "Compra",
            Side::Sell => "Venta",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One parsed `SIDE PRICE AMOUNT` line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeInstruction {
    pub side: Side,
    pub price: f64,
    pub amount: f64,
}

impl TradeInstruction {
    pub fn new(side: Side, price: f64, amount: f64) -> Self {
        Self { side, price, amount }
    }

    pub fn notional(&self) -> f64 {
        self.price * self.amount
    }

    pub fn commission(&self, rate: f64) -> f64 {
        self.notional() * rate
    }
}

/// Mutable accumulator owned by a single replay run.
///
/// Position is allowed to go negative: selling more than is held leaves a
/// net short rather than being rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerState {
    pub cash: f64,
    pub position: f64,
}

impl LedgerState {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            cash: starting_cash,
            position: 0.0,
        }
    }

    /// Apply one instruction and return the commission charged.
    pub fn apply(&mut self, instruction: &TradeInstruction, commission_rate: f64) -> f64 {
        let notional = instruction.notional();
        let commission = instruction.commission(commission_rate);

        match instruction.side {
            Side::Buy => {
                self.cash = self.cash - notional - commission;
                self.position += instruction.amount;
            }
            Side::Sell => {
                self.cash = self.cash + notional - commission;
                self.position -= instruction.amount;
            }
        }

        commission
    }

    /// Mark-to-last-trade valuation.
    pub fn equity_at(&self, price: f64) -> f64 {
        self.cash + self.position * price
    }
}

/// Immutable snapshot of the ledger after one instruction (or the start).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayStep {
    pub label: String,
    pub cash_after: f64,
    pub position_after: f64,
    pub equity_after: f64,
    pub narrative: String,
}

impl ReplayStep {
    pub fn start(starting_cash: f64) -> Self {
        Self {
            label: "Start".to_string(),
            cash_after: starting_cash,
            position_after: 0.0,
            equity_after: starting_cash,
            narrative: "Capital Inicial".to_string(),
        }
    }

    /// False once NaN or infinity has poisoned any of the ledger columns.
    pub fn is_finite(&self) -> bool {
        self.cash_after.is_finite() && self.position_after.is_finite() && self.equity_after.is_finite()
    }
}

pub use parser::{parse_line, parse_number, LineIssue, ParsedLine};
pub use replayer::{
    replay, LedgerReplayer, LineOutcome, LineReport, ParsePolicy, ReplayReport, ReplaySummary,
};
pub use trace::{format_number, narrative, render_trace};
