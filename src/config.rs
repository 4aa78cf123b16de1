use std::time::Duration;

use crate::search::MAX_DEPTH;

/// Engine-wide settings, fixed for the life of a `SearchContext` except for the hash size.
///
/// ```
/// use chess_search::SearchConfig;
///
/// let config = SearchConfig::default().with_threads(2).with_hash_mb(16);
/// assert_eq!(config.threads, 2);
/// assert_eq!(config.hash_mb, 16);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Search threads, the main thread included.  Never zero.
    pub threads: usize,
    /// Transposition table size in mebibytes.
    pub hash_mb: usize,
    /// Taken off every timed budget to cover communication lag.
    pub move_overhead: Duration,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            threads: num_cpus::get().max(1),
            hash_mb: 64,
            move_overhead: Duration::from_millis(10),
        }
    }
}

impl SearchConfig {
    pub fn with_threads(mut self, threads: usize) -> SearchConfig {
        self.threads = threads.max(1);
        self
    }

    pub fn with_hash_mb(mut self, hash_mb: usize) -> SearchConfig {
        self.hash_mb = hash_mb;
        self
    }

    pub fn with_move_overhead(mut self, move_overhead: Duration) -> SearchConfig {
        self.move_overhead = move_overhead;
        self
    }
}

/// Budget for a single search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchLimits {
    /// Deepest iteration to run.
    pub depth: usize,
    /// Hard deadline: once passed the search stops as soon as it has a move.
    pub move_time: Option<Duration>,
    /// Recommended time, which the driver may stretch or shrink.
    pub soft_time: Option<Duration>,
    /// May the driver stop before `move_time` when the result looks settled?
    pub can_shorten: bool,
}

impl Default for SearchLimits {
    fn default() -> SearchLimits {
        SearchLimits::infinite()
    }
}

impl SearchLimits {
    /// Search to exactly `depth`, however long that takes.
    pub fn depth(depth: usize) -> SearchLimits {
        SearchLimits {
            depth: depth.max(1).min(MAX_DEPTH),
            move_time: None,
            soft_time: None,
            can_shorten: false,
        }
    }

    /// Search for at most `max`, aiming for `recommended`.
    pub fn time(max: Duration, recommended: Duration) -> SearchLimits {
        SearchLimits {
            depth: MAX_DEPTH,
            move_time: Some(max),
            soft_time: Some(recommended.min(max)),
            can_shorten: true,
        }
    }

    /// Search until told to stop.
    pub fn infinite() -> SearchLimits {
        SearchLimits {
            depth: MAX_DEPTH,
            move_time: None,
            soft_time: None,
            can_shorten: false,
        }
    }

    /// The same limits with `overhead` taken off both time budgets.
    pub fn less_overhead(&self, overhead: Duration) -> SearchLimits {
        SearchLimits {
            move_time: self.move_time.map(|t| t.checked_sub(overhead).unwrap_or_default()),
            soft_time: self.soft_time.map(|t| t.checked_sub(overhead).unwrap_or_default()),
            ..*self
        }
    }
}
