// Human-readable rendering of replay steps

use super::{ReplayStep, TradeInstruction};

/// `"<Compra|Venta> <amount> @ <price> (Comm: <commission>)"`
pub fn narrative(instruction: &TradeInstruction, commission: f64) -> String {
    format!(
        "{} {} @ {} (Comm: {})",
        instruction.side.action(),
        format_number(instruction.amount),
        format_number(instruction.price),
        format_fixed(commission, 2),
    )
}

/// Shortest round-trip rendering, with `Infinity` spelled out, no `-0`, and
/// exponent form outside `1e-6..1e21`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        format_exponent(value)
    } else {
        value.to_string()
    }
}

/// `1e+21`, `1.5e-7`: shortest digits with an explicitly signed exponent.
fn format_exponent(value: f64) -> String {
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => formatted,
    }
}

fn format_fixed(value: f64, decimals: usize) -> String {
    if value == 0.0 {
        // Covers -0.0
        format!("{:.*}", decimals, 0.0)
    } else if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        format_number(value)
    }
}

/// Render steps as a fixed-width table, one row per step.
pub fn render_trace(steps: &[ReplayStep]) -> String {
    let label_width = steps
        .iter()
        .map(|s| s.label.len())
        .max()
        .unwrap_or(0)
        .max("Paso".len());

    let mut out = format!(
        "{:<lw$}  {:>14}  {:>14}  {:>14}  {}\n",
        "Paso",
        "Cash",
        "Position",
        "Equity",
        "Detalle",
        lw = label_width
    );

    for step in steps {
        out.push_str(&format!(
            "{:<lw$}  {:>14}  {:>14}  {:>14}  {}\n",
            step.label,
            format_fixed(step.cash_after, 2),
            format_position(step.position_after),
            format_fixed(step.equity_after, 2),
            step.narrative,
            lw = label_width
        ));
    }

    out
}

fn format_position(value: f64) -> String {
    if value.is_finite() {
        // Trim float noise such as 0.30000000000000004
        let rounded = (value * 1e8).round() / 1e8;
        format_number(rounded)
    } else {
        format_number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Side;

    #[test]
    fn test_narrative_format() {
        let ins = TradeInstruction::new(Side::Buy, 29000.0, 0.1);
        assert_eq!(narrative(&ins, 2.9), "Compra 0.1 @ 29000 (Comm: 2.90)");

        let ins = TradeInstruction::new(Side::Sell, 100.0, f64::NAN);
        assert_eq!(narrative(&ins, f64::NAN), "Venta NaN @ 100 (Comm: NaN)");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(29000.0), "29000");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_format_number_uses_exponent_at_extremes() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(0.000001), "0.000001");
    }

    #[test]
    fn test_negative_zero_commission() {
        assert_eq!(format_fixed(-0.0, 2), "0.00");

        let ins = TradeInstruction::new(Side::Sell, -5.0, 0.0);
        assert_eq!(narrative(&ins, ins.commission(0.001)), "Venta 0 @ -5 (Comm: 0.00)");
    }

    #[test]
    fn test_render_trace() {
        let steps = vec![
            ReplayStep::start(10000.0),
            ReplayStep {
                label: "Trade 1".to_string(),
                cash_after: 7097.1,
                position_after: 0.1,
                equity_after: 9997.1,
                narrative: "Compra 0.1 @ 29000 (Comm: 2.90)".to_string(),
            },
        ];
        let table = render_trace(&steps);
        let rows: Vec<&str> = table.lines().collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("Paso"));
        assert!(rows[1].contains("10000.00"));
        assert!(rows[1].ends_with("Capital Inicial"));
        assert!(rows[2].contains("7097.10"));
        assert!(rows[2].contains("9997.10"));
    }

    #[test]
    fn test_render_trace_shows_nan() {
        let steps = vec![ReplayStep {
            label: "Trade 1".to_string(),
            cash_after: f64::NAN,
            position_after: f64::NAN,
            equity_after: f64::NAN,
            narrative: String::new(),
        }];
        assert!(render_trace(&steps).contains("NaN"));
    }
}
