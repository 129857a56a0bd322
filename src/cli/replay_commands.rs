// Replay command - the terminal Equity Verifier
use discovery_terminal::{
    render_trace, terminal_error, Config, LedgerReplayer, ParsePolicy, ReplayStep, ReplaySummary, TerminalError,
    TerminalResult,
};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Serialize)]
struct ReplayOutput<'a> {
    steps: &'a [ReplayStep],
    summary: ReplaySummary,
}

pub fn run_replay(
    file: Option<&Path>,
    cash: Option<f64>,
    commission: Option<f64>,
    strict: bool,
    json: bool,
    config: &Config,
) -> TerminalResult<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| TerminalError::FileRead(format!("{}: {}", path.display(), e)))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let starting_cash = cash.unwrap_or(config.replay.starting_cash);
    if !starting_cash.is_finite() {
        return Err(terminal_error!(invalid_param, "--cash", "must be a number"));
    }

    let commission_rate = commission.unwrap_or(config.replay.commission_rate);
    if !(0.0..1.0).contains(&commission_rate) {
        return Err(terminal_error!(invalid_param, "--commission", "must be between 0 and 1"));
    }

    let policy = if strict { ParsePolicy::Strict } else { config.replay.policy() };
    let replayer = LedgerReplayer::new(commission_rate, policy);

    info!(
        "🧮 Replaying from {:.2} (commission {:.3}%, {:?} parsing)",
        starting_cash,
        commission_rate * 100.0,
        policy
    );

    let report = replayer.replay_detailed(starting_cash, &text);
    let summary = report.summary();

    if json {
        let output = ReplayOutput {
            steps: &report.steps,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render_trace(&report.steps));
    }

    info!(
        "📒 {} applied, {} flagged, {} skipped, {} rejected",
        summary.applied, summary.flagged, summary.skipped, summary.invalid
    );
    for line in report.problem_lines() {
        warn!("   line {}: '{}' {}", line.line_number, line.text, line.outcome);
    }

    if summary.final_is_finite {
        info!(
            "✅ Final equity {:.2} (cash {:.2}, position {})",
            summary.final_equity,
            summary.final_cash,
            summary.final_position
        );
    } else {
        warn!("⚠️  Ledger is no longer numeric; fix the flagged lines or rerun with --strict");
    }

    Ok(())
}
