//! Scheduled agents
//!
//! An [`Agent`] is anything the scheduler can tick: it has a name, a
//! frequency, and a single best-effort `run_cycle`. Cycles never return
//! errors; every failure is folded into a [`CycleOutcome`] and logged inside
//! the agent.

mod trader;

pub use trader::TradingAgent;

use async_trait::async_trait;
use chrono::Timelike;
use std::fmt;
use std::time::Duration;

/// What one decision cycle ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Trade cap reached; no work done
    Throttled { trade_count: u32 },
    /// Reading chain state failed; no trade attempted
    QueryFailed { error: String },
    /// Quote below the configured bound
    BelowThreshold { rate: u64, lower_bound: u64 },
    /// Trade broadcast
    Submitted { rate: u64, tx_id: String },
    /// Trade attempted but the submitter reported an error
    SubmissionFailed { rate: u64, error: String },
}

impl CycleOutcome {
    /// Short label for log fields
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Throttled { .. } => "throttled",
            CycleOutcome::QueryFailed { .. } => "query_failed",
            CycleOutcome::BelowThreshold { .. } => "below_threshold",
            CycleOutcome::Submitted { .. } => "submitted",
            CycleOutcome::SubmissionFailed { .. } => "submission_failed",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            CycleOutcome::QueryFailed { .. } | CycleOutcome::SubmissionFailed { .. }
        )
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A unit of scheduled work
#[async_trait]
pub trait Agent: Send {
    fn name(&self) -> &str;

    /// Time to wait between the end of one cycle and the start of the next
    fn frequency(&self) -> Duration;

    /// Run one decision cycle to completion
    async fn run_cycle(&mut self) -> CycleOutcome;
}

/// Source of the current hour of day
pub trait Clock: Send + Sync {
    /// Hour of day, 0..24
    fn hour(&self) -> u32;
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn hour(&self) -> u32 {
        chrono::Local::now().hour()
    }
}
