// Ledger replayer - turns verifier text into a step-by-step ledger trace

use super::parser::{is_separator, parse_line, LineIssue, ParsedLine};
use super::trace::narrative;
use super::{LedgerState, ReplayStep, TradeInstruction, DEFAULT_COMMISSION_RATE};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// How lines with issues are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Apply them anyway: unknown sides sell, bad numbers poison the ledger.
    #[default]
    Lenient,
    /// Reject them without touching the ledger.
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Applied { step_index: usize },
    Flagged { step_index: usize, issues: Vec<LineIssue> },
    Skipped { found_tokens: usize },
    Invalid { issues: Vec<LineIssue> },
}

impl LineOutcome {
    pub fn step_index(&self) -> Option<usize> {
        match self {
            LineOutcome::Applied { step_index } | LineOutcome::Flagged { step_index, .. } => {
                Some(*step_index)
            }
            _ => None,
        }
    }
}

impl fmt::Display for LineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineOutcome::Applied { step_index } => write!(f, "applied as Trade {}", step_index),
            LineOutcome::Flagged { step_index, issues } => {
                write!(f, "applied as Trade {} with issues: {}", step_index, join_issues(issues))
            }
            LineOutcome::Skipped { found_tokens } => {
                write!(f, "skipped, expected SIDE PRICE AMOUNT but found {} token(s)", found_tokens)
            }
            LineOutcome::Invalid { issues } => write!(f, "rejected: {}", join_issues(issues)),
        }
    }
}

/// Outcome of one non-blank input line. `line_number` is 1-based and
/// counts blank lines too, so it matches what the user pasted.
#[derive(Debug, Clone, PartialEq)]
pub struct LineReport {
    pub line_number: usize,
    pub text: String,
    pub outcome: LineOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub applied: usize,
    pub flagged: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub final_cash: f64,
    pub final_position: f64,
    pub final_equity: f64,
    pub final_is_finite: bool,
}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub steps: Vec<ReplayStep>,
    pub lines: Vec<LineReport>,
}

impl ReplayReport {
    pub fn final_step(&self) -> &ReplayStep {
        // steps always holds at least the start step
        &self.steps[self.steps.len() - 1]
    }

    pub fn problem_lines(&self) -> impl Iterator<Item = &LineReport> {
        self.lines
            .iter()
            .filter(|l| !matches!(l.outcome, LineOutcome::Applied { .. }))
    }

    pub fn summary(&self) -> ReplaySummary {
        let mut summary = ReplaySummary {
            applied: 0,
            flagged: 0,
            skipped: 0,
            invalid: 0,
            final_cash: 0.0,
            final_position: 0.0,
            final_equity: 0.0,
            final_is_finite: true,
        };

        for line in &self.lines {
            match line.outcome {
                LineOutcome::Applied { .. } => summary.applied += 1,
                LineOutcome::Flagged { .. } => summary.flagged += 1,
                LineOutcome::Skipped { .. } => summary.skipped += 1,
                LineOutcome::Invalid { .. } => summary.invalid += 1,
            }
        }

        let last = self.final_step();
        summary.final_cash = last.cash_after;
        summary.final_position = last.position_after;
        summary.final_equity = last.equity_after;
        summary.final_is_finite = last.is_finite();
        summary
    }
}

#[derive(Debug, Clone)]
pub struct LedgerReplayer {
    commission_rate: f64,
    policy: ParsePolicy,
}

impl Default for LedgerReplayer {
    fn default() -> Self {
        Self {
            commission_rate: DEFAULT_COMMISSION_RATE,
            policy: ParsePolicy::Lenient,
        }
    }
}

impl LedgerReplayer {
    pub fn new(commission_rate: f64, policy: ParsePolicy) -> Self {
        Self {
            commission_rate,
            policy,
        }
    }

    pub fn with_commission_rate(mut self, commission_rate: f64) -> Self {
        self.commission_rate = commission_rate;
        self
    }

    pub fn with_policy(mut self, policy: ParsePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn policy(&self) -> ParsePolicy {
        self.policy
    }

    /// Replay `raw_text` and return only the step trace.
    pub fn replay(&self, starting_cash: f64, raw_text: &str) -> Vec<ReplayStep> {
        self.replay_detailed(starting_cash, raw_text).steps
    }

    /// Replay `raw_text`, one instruction per line, blank lines ignored.
    pub fn replay_detailed(&self, starting_cash: f64, raw_text: &str) -> ReplayReport {
        let mut state = LedgerState::new(starting_cash);
        let mut steps = vec![ReplayStep::start(starting_cash)];
        let mut lines = Vec::new();

        for (idx, line) in raw_text.lines().enumerate() {
            if line.trim_matches(is_separator).is_empty() {
                continue;
            }
            let line_number = idx + 1;

            let outcome = match parse_line(line) {
                ParsedLine::TooFewTokens { found } => {
                    debug!("Line {} skipped: {} token(s)", line_number, found);
                    LineOutcome::Skipped { found_tokens: found }
                }
                ParsedLine::Instruction { issues, .. } if self.policy == ParsePolicy::Strict && !issues.is_empty() => {
                    warn!("Line {} rejected: {}", line_number, join_issues(&issues));
                    LineOutcome::Invalid { issues }
                }
                ParsedLine::Instruction { instruction, issues } => {
                    let step_index = steps.len();
                    steps.push(self.apply(&mut state, &instruction, step_index));
                    if issues.is_empty() {
                        LineOutcome::Applied { step_index }
                    } else {
                        warn!("Line {} applied with issues: {}", line_number, join_issues(&issues));
                        LineOutcome::Flagged { step_index, issues }
                    }
                }
            };

            lines.push(LineReport {
                line_number,
                text: line.trim_matches(is_separator).to_string(),
                outcome,
            });
        }

        ReplayReport { steps, lines }
    }

    /// Replay already-parsed instructions (no line bookkeeping).
    pub fn replay_instructions(&self, starting_cash: f64, instructions: &[TradeInstruction]) -> Vec<ReplayStep> {
        let mut state = LedgerState::new(starting_cash);
        let mut steps = Vec::with_capacity(instructions.len() + 1);
        steps.push(ReplayStep::start(starting_cash));

        for instruction in instructions {
            let step_index = steps.len();
            steps.push(self.apply(&mut state, instruction, step_index));
        }

        steps
    }

    fn apply(&self, state: &mut LedgerState, instruction: &TradeInstruction, step_index: usize) -> ReplayStep {
        let commission = state.apply(instruction, self.commission_rate);
        ReplayStep {
            label: format!("Trade {}", step_index),
            cash_after: state.cash,
            position_after: state.position,
            equity_after: state.equity_at(instruction.price),
            narrative: narrative(instruction, commission),
        }
    }
}

fn join_issues(issues: &[LineIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Replay with the default commission and lenient parsing.
pub fn replay(starting_cash: f64, raw_text: &str) -> Vec<ReplayStep> {
    LedgerReplayer::default().replay(starting_cash, raw_text)
}
