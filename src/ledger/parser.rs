// Line parser for the `SIDE PRICE AMOUNT` verifier format

use super::{Side, TradeInstruction};
use std::fmt;

/// Something wrong with a line that still parsed into an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum LineIssue {
    UnrecognizedSide(String),
    InvalidPrice(String),
    InvalidAmount(String),
    NonPositivePrice(f64),
    NonPositiveAmount(f64),
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineIssue::UnrecognizedSide(token) => {
                write!(f, "unrecognized side '{}' (treated as SELL)", token)
            }
            LineIssue::InvalidPrice(token) => write!(f, "price '{}' is not a number", token),
            LineIssue::InvalidAmount(token) => write!(f, "amount '{}' is not a number", token),
            LineIssue::NonPositivePrice(value) => write!(f, "price {} is not positive", value),
            LineIssue::NonPositiveAmount(value) => write!(f, "amount {} is not positive", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Enough tokens were present. `issues` is empty for a clean line.
    Instruction {
        instruction: TradeInstruction,
        issues: Vec<LineIssue>,
    },
    /// Fewer than three tokens; the line contributes nothing.
    TooFewTokens { found: usize },
}

/// Parse one line of verifier input.
///
/// Never fails: a non-`BUY` side falls back to `SELL` and a token with no
/// numeric prefix becomes `NaN`. Everything suspicious is reported through
/// `issues` so callers can decide how strict to be.
pub fn parse_line(line: &str) -> ParsedLine {
    let tokens: Vec<&str> = line.split(is_separator).filter(|t| !t.is_empty()).collect();
    if tokens.len() < 3 {
        return ParsedLine::TooFewTokens { found: tokens.len() };
    }

    let mut issues = Vec::new();

    let side = match tokens[0].to_uppercase().as_str() {
        "BUY" => Side::Buy,
        "SELL" => Side::Sell,
        _ => {
            issues.push(LineIssue::UnrecognizedSide(tokens[0].to_string()));
            Side::Sell
        }
    };

    let price = parse_field(tokens[1], &mut issues, LineIssue::InvalidPrice, LineIssue::NonPositivePrice);
    let amount = parse_field(tokens[2], &mut issues, LineIssue::InvalidAmount, LineIssue::NonPositiveAmount);

    ParsedLine::Instruction {
        instruction: TradeInstruction::new(side, price, amount),
        issues,
    }
}

/// Whitespace, plus the byte-order mark editors leave at the start of a file.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

fn parse_field(
    token: &str,
    issues: &mut Vec<LineIssue>,
    invalid: fn(String) -> LineIssue,
    non_positive: fn(f64) -> LineIssue,
) -> f64 {
    let (value, consumed) = parse_number_prefix(token);
    if consumed != token.len() || !value.is_finite() {
        issues.push(invalid(token.to_string()));
    } else if value <= 0.0 {
        issues.push(non_positive(value));
    }
    value
}

/// Lenient float parsing: the longest leading decimal literal wins and a
/// token without one is `NaN` (`"29000USD"` is 29000, `"abc"` is NaN).
pub fn parse_number(token: &str) -> f64 {
    parse_number_prefix(token.trim_start()).0
}

/// Returns the parsed value and how many bytes of `token` it consumed.
fn parse_number_prefix(token: &str) -> (f64, usize) {
    let bytes = token.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    if token[pos..].starts_with("Infinity") {
        let value = if negative { f64::NEG_INFINITY } else { f64::INFINITY };
        return (value, pos + "Infinity".len());
    }

    let digits_start = pos;
    let mut mantissa_digits = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
        mantissa_digits += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        let mut frac = pos + 1;
        let mut frac_digits = 0;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
            frac_digits += 1;
        }
        // A bare "." only counts when it is attached to digits
        if mantissa_digits + frac_digits > 0 {
            pos = frac;
            mantissa_digits += frac_digits;
        }
    }
    if mantissa_digits == 0 {
        return (f64::NAN, 0);
    }

    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_digits_start = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits_start {
            pos = exp;
        }
    }

    let literal = &token[digits_start..pos];
    match literal.parse::<f64>() {
        Ok(value) if negative => (-value, pos),
        Ok(value) => (value, pos),
        Err(_) => (f64::NAN, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(line: &str) -> (TradeInstruction, Vec<LineIssue>) {
        match parse_line(line) {
            ParsedLine::Instruction { instruction, issues } => (instruction, issues),
            other => panic!("expected instruction, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_buy_line() {
        let (ins, issues) = instruction("BUY 29000 0.1");
        assert_eq!(ins, TradeInstruction::new(Side::Buy, 29000.0, 0.1));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_side_is_case_insensitive() {
        let (ins, issues) = instruction("  sell\t30000   0.1  ");
        assert_eq!(ins.side, Side::Sell);
        assert!(issues.is_empty());

        let (ins, _) = instruction("Buy 1 1");
        assert_eq!(ins.side, Side::Buy);
    }

    #[test]
    fn test_unknown_side_falls_back_to_sell() {
        let (ins, issues) = instruction("HOLD 100 1");
        assert_eq!(ins.side, Side::Sell);
        assert_eq!(issues, vec![LineIssue::UnrecognizedSide("HOLD".to_string())]);
    }

    #[test]
    fn test_byte_order_mark_is_whitespace() {
        let (ins, issues) = instruction("\u{feff}BUY 100 1");
        assert_eq!(ins, TradeInstruction::new(Side::Buy, 100.0, 1.0));
        assert!(issues.is_empty());

        assert_eq!(parse_line("\u{feff}"), ParsedLine::TooFewTokens { found: 0 });
    }

    #[test]
    fn test_too_few_tokens() {
        assert_eq!(parse_line("BUY 100"), ParsedLine::TooFewTokens { found: 2 });
        assert_eq!(parse_line(""), ParsedLine::TooFewTokens { found: 0 });
    }

    #[test]
    fn test_extra_tokens_are_ignored() {
        let (ins, issues) = instruction("BUY 10 2 fee=0.1 note");
        assert_eq!(ins.price, 10.0);
        assert_eq!(ins.amount, 2.0);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_non_numeric_amount_is_nan() {
        let (ins, issues) = instruction("BUY 100 abc");
        assert!(ins.amount.is_nan());
        assert_eq!(issues, vec![LineIssue::InvalidAmount("abc".to_string())]);
    }

    #[test]
    fn test_numeric_prefix_is_accepted_but_flagged() {
        let (ins, issues) = instruction("BUY 29000USD 0.1");
        assert_eq!(ins.price, 29000.0);
        assert_eq!(issues, vec![LineIssue::InvalidPrice("29000USD".to_string())]);
    }

    #[test]
    fn test_non_positive_values_are_flagged() {
        let (_, issues) = instruction("SELL -5 0");
        assert_eq!(
            issues,
            vec![LineIssue::NonPositivePrice(-5.0), LineIssue::NonPositiveAmount(0.0)]
        );
    }

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number("-1.5"), -1.5);
        assert_eq!(parse_number("+.5"), 0.5);
        assert_eq!(parse_number("3."), 3.0);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("2.5E-1x"), 0.25);
        assert_eq!(parse_number("7e"), 7.0);
        assert_eq!(parse_number("Infinity"), f64::INFINITY);
        assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number(".").is_nan());
        assert!(parse_number("-").is_nan());
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("NaN").is_nan());
    }
}
