// Parsing of command-line values for backtest requests

use crate::error::{TerminalError, TerminalResult};
use crate::types::ExitRuleType;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parse `name=value`. Values that read as JSON (numbers, booleans, arrays)
/// keep that type; everything else is a string.
pub fn parse_param(raw: &str) -> TerminalResult<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| TerminalError::InvalidParameter(raw.to_string(), "expected name=value".to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(TerminalError::InvalidParameter(raw.to_string(), "parameter name is empty".to_string()));
    }

    let value = value.trim();
    let parsed = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), parsed))
}

pub fn parse_params(raw: &[String]) -> TerminalResult<BTreeMap<String, Value>> {
    raw.iter().map(String::as_str).map(parse_param).collect()
}

/// Parse `TYPE:VALUE`, e.g. `percent:5` or `absolute:25000`.
pub fn parse_exit_rule(flag: &str, raw: &str) -> TerminalResult<(ExitRuleType, f64)> {
    let (kind, value) = raw.split_once(':').ok_or_else(|| {
        TerminalError::InvalidParameter(flag.to_string(), format!("expected TYPE:VALUE, got '{}'", raw))
    })?;

    let kind = kind
        .parse::<ExitRuleType>()
        .map_err(|e| TerminalError::InvalidParameter(flag.to_string(), e))?;

    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| TerminalError::InvalidParameter(flag.to_string(), format!("'{}' is not a number", value)))?;

    if kind != ExitRuleType::None && !(value.is_finite() && value > 0.0) {
        return Err(TerminalError::InvalidParameter(flag.to_string(), "value must be positive".to_string()));
    }

    Ok((kind, value))
}

/// Accept `YYYY-MM-DD` only.
pub fn parse_date(flag: &str, raw: &str) -> TerminalResult<String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|e| TerminalError::InvalidParameter(flag.to_string(), format!("'{}': {}", raw, e)))
}

/// Check that `start` does not come after `end` when both are present.
pub fn check_date_range(start: Option<&str>, end: Option<&str>) -> TerminalResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        // Both are already normalised to YYYY-MM-DD, so string order is date order
        if start > end {
            return Err(TerminalError::InvalidParameter(
                "--start".to_string(),
                format!("{} is after --end {}", start, end),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_param_types() {
        assert_eq!(parse_param("fast_period=10").unwrap(), ("fast_period".to_string(), json!(10)));
        assert_eq!(parse_param("probability=0.05").unwrap().1, json!(0.05));
        assert_eq!(parse_param("enabled=true").unwrap().1, json!(true));
        assert_eq!(parse_param("operator=FILTER").unwrap().1, json!("FILTER"));
        assert_eq!(parse_param(" strat_a = SmaCrossover ").unwrap().0, "strat_a");
    }

    #[test]
    fn test_parse_param_errors() {
        assert!(matches!(parse_param("fast_period"), Err(TerminalError::InvalidParameter(_, _))));
        assert!(parse_param("=10").is_err());
    }

    #[test]
    fn test_parse_params_collects() {
        let params = parse_params(&["a=1".to_string(), "b=x".to_string()]).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["b"], json!("x"));
    }

    #[test]
    fn test_parse_exit_rule() {
        assert_eq!(parse_exit_rule("--sl", "percent:5").unwrap(), (ExitRuleType::Percent, 5.0));
        assert_eq!(parse_exit_rule("--tp", "absolute:25000").unwrap(), (ExitRuleType::Absolute, 25000.0));
        assert!(parse_exit_rule("--tp", "percent").is_err());
        assert!(parse_exit_rule("--tp", "percent:-1").is_err());
        assert!(parse_exit_rule("--tp", "trailing:5").is_err());
    }

    #[test]
    fn test_dates() {
        assert_eq!(parse_date("--start", "2021-01-01").unwrap(), "2021-01-01");
        assert!(parse_date("--start", "2021-13-01").is_err());
        assert!(parse_date("--start", "01/01/2021").is_err());
        assert!(check_date_range(Some("2021-01-01"), Some("2021-12-31")).is_ok());
        assert!(check_date_range(Some("2022-01-01"), Some("2021-12-31")).is_err());
        assert!(check_date_range(None, Some("2021-12-31")).is_ok());
    }
}
