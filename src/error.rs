//! Unified error handling for the discovery terminal
//!
//! Module-level errors (`ConfigError`, `ApiError`) fold into `TerminalError`,
//! which carries the context needed for actionable messages at the CLI.

use crate::clients::ApiError;
use crate::config::ConfigError;
use std::fmt;
use std::io;

/// Main error type for the discovery terminal
#[derive(Debug)]
pub enum TerminalError {
    // Configuration errors
    ConfigNotFound(String),
    ConfigParse(String),
    ConfigValidation(String),

    // Analysis service errors
    ApiConnection(String),
    ApiTimeout(String),
    ApiResponse(u16, String), // (status, detail)
    ApiDecode(String),

    // Input errors
    InvalidRequest(String),
    InvalidParameter(String, String), // (parameter_name, reason)
    InvalidInput(String),

    // Audit errors
    AuditFailed(usize), // number of discrepancies

    // IO errors
    FileNotFound(String),
    FileRead(String),
    FileWrite(String),

    // General errors
    Internal(String),
}

impl TerminalError {
    /// Get a user-friendly error message with helpful context
    pub fn user_message(&self) -> String {
        match self {
            TerminalError::ConfigNotFound(path) => {
                format!(
                    "Configuration file not found: {}\n\n\
                    💡 Quick fix:\n\
                    1. Run: qdt init\n\
                    2. Edit config.toml with the analysis service URL\n\
                    3. Try again",
                    path
                )
            }
            TerminalError::ConfigValidation(msg) => {
                format!(
                    "Configuration validation error: {}\n\n\
                    💡 Check config.toml for:\n\
                    - An http:// or https:// base_url\n\
                    - Positive cash and capital values\n\
                    - A commission_rate between 0 and 1",
                    msg
                )
            }
            TerminalError::ApiConnection(msg) => {
                format!(
                    "Could not reach the analysis service: {}\n\n\
                    💡 Try:\n\
                    1. Check the service is running\n\
                    2. Check [api] base_url in config.toml or QDT_API_URL\n\
                    3. Run: qdt discovery",
                    msg
                )
            }
            TerminalError::ApiTimeout(msg) => {
                format!(
                    "The analysis service did not answer in time: {}\n\n\
                    💡 Long backtests may need a larger [api] timeout_seconds",
                    msg
                )
            }
            TerminalError::ApiResponse(status, detail) if *status == 404 => {
                format!(
                    "The analysis service has no data for this request: {}\n\n\
                    💡 Run: qdt discovery to list available symbols and timeframes",
                    detail
                )
            }
            TerminalError::AuditFailed(count) => {
                format!(
                    "Ledger audit failed with {} discrepancy(ies)\n\n\
                    💡 Export the trades with: qdt export-trades <report.json>\n\
                    and replay them with: qdt replay <file> to inspect each step",
                    count
                )
            }
            _ => self.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            TerminalError::ApiConnection(_) | TerminalError::ApiTimeout(_) => true,
            TerminalError::ApiResponse(status, _) => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            TerminalError::ConfigNotFound(_)
            | TerminalError::ConfigParse(_)
            | TerminalError::ConfigValidation(_) => "config",

            TerminalError::ApiConnection(_)
            | TerminalError::ApiTimeout(_)
            | TerminalError::ApiResponse(_, _)
            | TerminalError::ApiDecode(_) => "api",

            TerminalError::InvalidRequest(_)
            | TerminalError::InvalidParameter(_, _)
            | TerminalError::InvalidInput(_) => "input",

            TerminalError::AuditFailed(_) => "audit",

            TerminalError::FileNotFound(_)
            | TerminalError::FileRead(_)
            | TerminalError::FileWrite(_) => "io",

            TerminalError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path)
            }
            TerminalError::ConfigParse(msg) => {
                write!(f, "Configuration parse error: {}", msg)
            }
            TerminalError::ConfigValidation(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }

            TerminalError::ApiConnection(msg) => {
                write!(f, "API connection error: {}", msg)
            }
            TerminalError::ApiTimeout(msg) => {
                write!(f, "API timeout: {}", msg)
            }
            TerminalError::ApiResponse(status, detail) => {
                write!(f, "API responded {}: {}", status, detail)
            }
            TerminalError::ApiDecode(msg) => {
                write!(f, "API response could not be decoded: {}", msg)
            }

            TerminalError::InvalidRequest(msg) => {
                write!(f, "Invalid backtest request: {}", msg)
            }
            TerminalError::InvalidParameter(param, reason) => {
                write!(f, "Invalid parameter '{}': {}", param, reason)
            }
            TerminalError::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }

            TerminalError::AuditFailed(count) => {
                write!(f, "Ledger audit failed: {} discrepancy(ies)", count)
            }

            TerminalError::FileNotFound(path) => {
                write!(f, "File not found: {}", path)
            }
            TerminalError::FileRead(msg) => {
                write!(f, "File read error: {}", msg)
            }
            TerminalError::FileWrite(msg) => {
                write!(f, "File write error: {}", msg)
            }

            TerminalError::Internal(msg) => {
                write!(f, "Internal error: {}", msg)
            }
        }
    }
}

impl std::error::Error for TerminalError {}

// Conversion implementations for common error types

impl From<io::Error> for TerminalError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => TerminalError::FileNotFound(err.to_string()),
            io::ErrorKind::PermissionDenied => TerminalError::FileRead(err.to_string()),
            _ => TerminalError::Internal(format!("IO error: {}", err)),
        }
    }
}

impl From<serde_json::Error> for TerminalError {
    fn from(err: serde_json::Error) -> Self {
        TerminalError::InvalidInput(format!("JSON parse error: {}", err))
    }
}

impl From<toml::de::Error> for TerminalError {
    fn from(err: toml::de::Error) -> Self {
        TerminalError::ConfigParse(format!("TOML parse error: {}", err))
    }
}

impl From<reqwest::Error> for TerminalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TerminalError::ApiTimeout(err.to_string())
        } else if err.is_decode() {
            TerminalError::ApiDecode(err.to_string())
        } else if let Some(status) = err.status() {
            TerminalError::ApiResponse(status.as_u16(), err.to_string())
        } else {
            TerminalError::ApiConnection(err.to_string())
        }
    }
}

impl From<ConfigError> for TerminalError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::FileRead(msg) => TerminalError::FileRead(msg),
            ConfigError::FileWrite(msg) => TerminalError::FileWrite(msg),
            ConfigError::Parse(msg) => TerminalError::ConfigParse(msg),
            ConfigError::Serialize(msg) => TerminalError::Internal(msg),
            ConfigError::Validation(msg) => TerminalError::ConfigValidation(msg),
        }
    }
}

impl From<ApiError> for TerminalError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(msg) => TerminalError::ApiConnection(msg),
            ApiError::Timeout(msg) => TerminalError::ApiTimeout(msg),
            ApiError::Http { status, detail } => TerminalError::ApiResponse(status, detail),
            ApiError::Decode(msg) => TerminalError::ApiDecode(msg),
            ApiError::InvalidRequest(msg) => TerminalError::InvalidRequest(msg),
        }
    }
}

impl From<String> for TerminalError {
    fn from(msg: String) -> Self {
        TerminalError::Internal(msg)
    }
}

impl From<&str> for TerminalError {
    fn from(msg: &str) -> Self {
        TerminalError::Internal(msg.to_string())
    }
}

/// Result type alias using TerminalError
pub type TerminalResult<T> = Result<T, TerminalError>;

/// Helper macro for creating context-rich errors
#[macro_export]
macro_rules! terminal_error {
    (config_not_found, $path:expr) => {
        $crate::error::TerminalError::ConfigNotFound($path.to_string())
    };
    (invalid_param, $param:expr, $reason:expr) => {
        $crate::error::TerminalError::InvalidParameter($param.to_string(), $reason.to_string())
    };
    (invalid_input, $msg:expr) => {
        $crate::error::TerminalError::InvalidInput($msg.to_string())
    };
}
