// External API clients

pub mod analysis_api;

// Re-export client types
pub use analysis_api::{AnalysisClient, ApiError, BACKTEST_RUN_PATH, DISCOVERY_PATH};
