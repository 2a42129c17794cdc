//! Run state machine for the scrape pipeline
//!
//! A run moves through policy checking, crawling, detail fetching, and
//! aggregation. Two terminal failure/stop paths exist: `Aborted` when the
//! crawl policy denies the target, and `Stopped` when the listing is
//! exhausted or the operator interrupts; a stopped run still aggregates
//! whatever was collected.

use std::fmt;

/// Represents the current phase of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Run created, nothing fetched yet
    Init,

    /// Fetching and evaluating the crawl-exclusion policy
    CheckPolicy,

    /// Sequential listing pagination in progress
    Crawling,

    /// Concurrent detail-page fetching in progress
    DetailFetching,

    /// Truncating and deduplicating the accumulated records
    Aggregating,

    /// Run finished and output written
    Done,

    /// Crawl policy denied the target prefix; nothing was fetched
    Aborted,

    /// Listing exhausted or operator interrupt; partial results kept
    Stopped,
}

impl RunState {
    /// Returns true if no further phase follows this state.
    ///
    /// `Stopped` is not terminal: a stopped crawl still proceeds through
    /// detail fetching and aggregation with its partial results.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (*self, next),
            (Init, CheckPolicy)
                | (CheckPolicy, Crawling)
                | (CheckPolicy, Aborted)
                | (Crawling, DetailFetching)
                | (Crawling, Stopped)
                | (Stopped, DetailFetching)
                | (Stopped, Aggregating)
                | (DetailFetching, Aggregating)
                | (Aggregating, Done)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::CheckPolicy => "check_policy",
            Self::Crawling => "crawling",
            Self::DetailFetching => "detail_fetching",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
            Self::Aborted => "aborted",
            Self::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// Tracks the run state and enforces legal transitions
#[derive(Debug)]
pub struct RunTracker {
    current: RunState,
}

impl RunTracker {
    pub fn new() -> Self {
        Self {
            current: RunState::Init,
        }
    }

    pub fn current(&self) -> RunState {
        self.current
    }

    /// Advances to `next`, failing on an illegal transition.
    pub fn advance(&mut self, next: RunState) -> crate::Result<()> {
        if !self.current.can_transition_to(next) {
            return Err(crate::ScrapeError::InvalidTransition {
                from: self.current,
                to: next,
            });
        }
        tracing::debug!("Run state: {} -> {}", self.current, next);
        self.current = next;
        Ok(())
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
