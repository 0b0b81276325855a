//! Generation bookkeeping: the explicit counter and the result of one run.

use flap_core::{ActorId, GenerationStats, RemovalCause};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal of the generation being evaluated.
///
/// Threaded through each run instead of living in a global: the caller passes
/// the current value in and receives the advanced value back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GenerationCounter(u64);

impl GenerationCounter {
    pub fn new() -> Self {
        Self(0)
    }

    /// Start counting from a given value, e.g. when resuming a run.
    pub fn starting_at(completed: u64) -> Self {
        Self(completed)
    }

    /// Number of generations completed so far
    pub fn completed(&self) -> u64 {
        self.0
    }

    /// Ordinal of the generation about to run (1-based)
    pub fn next_ordinal(&self) -> u64 {
        self.0 + 1
    }

    pub fn advance(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Why a generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Every actor was removed
    Extinct,
    /// The external quit signal was observed
    Quit,
    /// The configured tick cap was reached
    TickLimit,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Extinct => write!(f, "extinct"),
            TerminationReason::Quit => write!(f, "quit"),
            TerminationReason::TickLimit => write!(f, "tick_limit"),
        }
    }
}

/// One actor leaving the live set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemovalRecord {
    pub actor: ActorId,
    pub tick: u64,
    pub cause: RemovalCause,
}

/// Everything the training collaborator needs once a generation is over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub generation: u64,
    pub ticks: u64,
    /// Obstacle pairs cleared (the displayed score)
    pub pipes_passed: u32,
    pub reason: TerminationReason,
    /// Final fitness per member, in population order
    pub scores: Vec<f64>,
    /// Actors still alive at termination
    pub survivors: Vec<ActorId>,
    pub removals: Vec<RemovalRecord>,
    pub stats: GenerationStats,
}

impl GenerationOutcome {
    pub fn removals_by(&self, cause: RemovalCause) -> usize {
        self.removals.iter().filter(|r| r.cause == cause).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_advances() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.completed(), 0);
        assert_eq!(counter.next_ordinal(), 1);

        let counter = counter.advance().advance();
        assert_eq!(counter.completed(), 2);
        assert_eq!(counter.next_ordinal(), 3);

        assert_eq!(GenerationCounter::starting_at(41).next_ordinal(), 42);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = GenerationOutcome {
            generation: 1,
            ticks: 40,
            pipes_passed: 0,
            reason: TerminationReason::Extinct,
            scores: vec![4.0, 3.0],
            survivors: vec![],
            removals: vec![
                RemovalRecord { actor: ActorId(1), tick: 30, cause: RemovalCause::Collision },
                RemovalRecord { actor: ActorId(0), tick: 40, cause: RemovalCause::OutOfBounds },
            ],
            stats: GenerationStats::from_scores(&[4.0, 3.0]),
        };

        assert_eq!(outcome.removals_by(RemovalCause::Collision), 1);

        let json = serde_json::to_string(&outcome).unwrap();
        let back: GenerationOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reason, TerminationReason::Extinct);
        assert_eq!(back.removals, outcome.removals);
        assert_eq!(back.stats, outcome.stats);
    }
}
