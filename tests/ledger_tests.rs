// Integration tests for the ledger replayer

mod common;

use common::{generate_trades, to_text};
use discovery_terminal::{
    render_trace, replay, LedgerReplayer, LineOutcome, ParsePolicy, Side, DEFAULT_COMMISSION_RATE,
};

const EPS: f64 = 1e-6;

#[test]
fn test_buy_then_sell_round_trip() {
    let steps = replay(10000.0, "BUY 29000 0.1\nSELL 30000 0.1");

    assert_eq!(steps.len(), 3);
    assert!((steps[1].cash_after - 7097.1).abs() < EPS);
    assert!((steps[1].position_after - 0.1).abs() < EPS);
    assert!((steps[1].equity_after - 9997.1).abs() < EPS);
    assert_eq!(steps[1].narrative, "Compra 0.1 @ 29000 (Comm: 2.90)");

    assert!((steps[2].cash_after - 10094.1).abs() < EPS);
    assert!(steps[2].position_after.abs() < EPS);
    assert!((steps[2].equity_after - 10094.1).abs() < EPS);
    assert_eq!(steps[2].narrative, "Venta 0.1 @ 30000 (Comm: 3.00)");
}

#[test]
fn test_blank_and_short_lines_produce_no_steps() {
    let steps = replay(500.0, "\n   \nBUY 10\n");

    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].label, "Start");
    assert_eq!(steps[0].cash_after, 500.0);
    assert_eq!(steps[0].narrative, "Capital Inicial");
}

#[test]
fn test_file_with_byte_order_mark() {
    let report = LedgerReplayer::default().replay_detailed(1000.0, "\u{feff}BUY 100 1\nSELL 110 1\n");

    assert_eq!(report.steps.len(), 3);
    assert_eq!(report.steps[1].position_after, 1.0);
    assert_eq!(report.steps[1].narrative, "Compra 1 @ 100 (Comm: 0.10)");
    assert_eq!(report.lines[0].text, "BUY 100 1");
    assert_eq!(report.lines[0].outcome, LineOutcome::Applied { step_index: 1 });
    assert_eq!(report.problem_lines().count(), 0);
}

#[test]
fn test_empty_input_only_has_start() {
    let steps = replay(1234.5, "");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].equity_after, 1234.5);
}

#[test]
fn test_unknown_side_is_treated_as_sell_when_lenient() {
    let report = LedgerReplayer::default().replay_detailed(1000.0, "hold 100 1");

    assert_eq!(report.steps.len(), 2);
    assert!((report.steps[1].cash_after - 1099.9).abs() < EPS);
    assert!((report.steps[1].position_after + 1.0).abs() < EPS);
    assert!(matches!(report.lines[0].outcome, LineOutcome::Flagged { step_index: 1, .. }));
}

#[test]
fn test_non_numeric_price_poisons_rest_of_trace() {
    let steps = replay(1000.0, "BUY abc 1\nSELL 10 1");

    assert_eq!(steps.len(), 3);
    assert!(steps[1].cash_after.is_nan());
    assert!(steps[1].equity_after.is_nan());
    assert_eq!(steps[1].position_after, 1.0);
    assert!(steps[2].cash_after.is_nan());
    assert!(!steps[2].is_finite());
}

#[test]
fn test_strict_policy_rejects_without_touching_ledger() {
    let replayer = LedgerReplayer::default().with_policy(ParsePolicy::Strict);
    let report = replayer.replay_detailed(1000.0, "BUY abc 1\nhold 10 1\nBUY 10 1");

    assert_eq!(report.steps.len(), 2);
    assert!(report.final_step().is_finite());
    assert_eq!(report.steps[1].label, "Trade 1");

    let summary = report.summary();
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.invalid, 2);
    assert_eq!(report.problem_lines().count(), 2);
}

#[test]
fn test_line_numbers_count_blank_lines() {
    let report = LedgerReplayer::default().replay_detailed(1000.0, "BUY 10 1\n\nSELL 5\n");

    assert_eq!(report.lines.len(), 2);
    assert_eq!(report.lines[0].line_number, 1);
    assert_eq!(report.lines[1].line_number, 3);
    assert_eq!(report.lines[1].outcome, LineOutcome::Skipped { found_tokens: 2 });
}

#[test]
fn test_all_buys_drain_cash_and_grow_position() {
    let trades = generate_trades(100.0, 50, Some(Side::Buy));
    let steps = replay(1_000_000.0, &to_text(&trades));

    assert_eq!(steps.len(), trades.len() + 1);
    for pair in steps.windows(2) {
        assert!(pair[1].cash_after < pair[0].cash_after);
        assert!(pair[1].position_after > pair[0].position_after);
    }

    let bought: f64 = trades.iter().map(|t| t.amount).sum();
    assert!((steps.last().unwrap().position_after - bought).abs() < 1e-9);
}

#[test]
fn test_all_sells_grow_cash_and_shrink_position() {
    let trades = generate_trades(100.0, 50, Some(Side::Sell));
    let steps = replay(0.0, &to_text(&trades));

    for pair in steps.windows(2) {
        assert!(pair[1].cash_after > pair[0].cash_after);
        assert!(pair[1].position_after < pair[0].position_after);
    }

    let sold: f64 = trades.iter().map(|t| t.amount).sum();
    assert!((steps.last().unwrap().position_after + sold).abs() < 1e-9);
}

#[test]
fn test_commission_is_the_only_leak() {
    let trades = generate_trades(250.0, 40, None);
    let steps = replay(10000.0, &to_text(&trades));

    let total_commission: f64 = trades.iter().map(|t| t.commission(DEFAULT_COMMISSION_RATE)).sum();
    let last = steps.last().unwrap();
    let last_price = trades.last().unwrap().price;

    // Marked at the last price, equity differs from start only by trading PnL minus fees
    let flows: f64 = trades
        .iter()
        .map(|t| match t.side {
            Side::Buy => t.amount * (last_price - t.price),
            Side::Sell => t.amount * (t.price - last_price),
        })
        .sum();
    assert!((last.equity_after - (10000.0 + flows - total_commission)).abs() < 1e-6);
}

#[test]
fn test_replay_is_deterministic() {
    let text = to_text(&generate_trades(30000.0, 25, None));
    assert_eq!(replay(10000.0, &text), replay(10000.0, &text));
}

#[test]
fn test_parsed_and_text_replays_agree() {
    let trades = generate_trades(50.0, 20, None);
    let replayer = LedgerReplayer::default();

    let from_text = replayer.replay(5000.0, &to_text(&trades));
    let from_instructions = replayer.replay_instructions(5000.0, &trades);

    assert_eq!(from_text.len(), from_instructions.len());
    for (a, b) in from_text.iter().zip(from_instructions.iter()) {
        assert!((a.cash_after - b.cash_after).abs() < 1e-9);
        assert!((a.position_after - b.position_after).abs() < 1e-12);
    }
}

#[test]
fn test_zero_commission_rate() {
    let replayer = LedgerReplayer::default().with_commission_rate(0.0);
    let steps = replayer.replay(100.0, "BUY 10 2\nSELL 10 2");

    assert_eq!(steps[2].cash_after, 100.0);
    assert!(steps[1].narrative.ends_with("(Comm: 0.00)"));
}

#[test]
fn test_trace_lists_every_step() {
    let steps = replay(10000.0, "BUY 29000 0.1\nSELL 30000 0.1");
    let trace = render_trace(&steps);

    assert!(trace.contains("Start"));
    assert!(trace.contains("Trade 1"));
    assert!(trace.contains("Trade 2"));
    assert!(trace.contains("Venta 0.1 @ 30000"));
}
