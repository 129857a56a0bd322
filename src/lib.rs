// Quant Discovery Terminal Library
//
// Ledger replay for verifying backtest trade logs by hand, plus a typed client
// for the external analysis service that runs the backtests.

pub mod ledger;
pub mod audit;
pub mod clients;
pub mod config;
pub mod error;       // Unified error handling
pub mod params;      // CLI value parsing
pub mod progress;
pub mod report;
pub mod types;

// Re-export ledger types
pub use ledger::{
    replay, render_trace, LedgerReplayer, LedgerState, LineIssue, LineOutcome, LineReport,
    ParsePolicy, ReplayReport, ReplayStep, ReplaySummary, Side, TradeInstruction,
    DEFAULT_COMMISSION_RATE,
};

// Re-export audit types
pub use audit::{trades_to_verifier_text, AuditField, AuditReport, Discrepancy, ReportAuditor};

// Re-export error types
pub use error::{TerminalError, TerminalResult};

// Re-export client types
pub use clients::{AnalysisClient, ApiError};

// Re-export configuration
pub use config::{ApiConfig, AuditConfig, BacktestDefaults, Config, ConfigError, LoggingConfig, ReplayConfig};

// Re-export service models
pub use types::{
    BacktestRequest, BacktestResult, DataAudit, Discovery, ExitRuleType, MarketScenario, Regime,
    Signal, StrategyMetadata, StrategyParameter,
};

pub use progress::Spinner;
