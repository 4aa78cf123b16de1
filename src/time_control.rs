use std::time::Duration;

use crate::chess_move::ChessMove;
use crate::search::is_mate_score;

const SEARCH_REDUCTION_LEVEL: f64 = 0.75;
const SEARCH_EXTENSION_LEVEL: f64 = 1.5;

// Iterations looked back over when judging whether the result has settled.
const STABILITY_WINDOW: usize = 7;
const STABLE_SPREAD: i32 = 100;
const UNSTABLE_SPREAD: i32 = 1000;
const UNSTABLE_CHANGES: usize = 3;

/// How the driver wants to adjust the recommended time.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TimePreference {
    Normal,
    /// The result is unsettled; spend more.
    Extend,
    /// The result is settled; spend less.
    Reduce,
    /// Nothing to think about.
    Halt,
}

/// Decides, after each finished iteration, whether the main thread should keep deepening.
#[derive(Clone, Debug)]
pub struct TimeManager {
    soft: Option<Duration>,
    can_shorten: bool,
    preference: TimePreference,
    found: Vec<(ChessMove, i32)>,
}

impl TimeManager {
    pub fn new(soft: Option<Duration>, can_shorten: bool) -> TimeManager {
        TimeManager {
            soft,
            can_shorten,
            preference: TimePreference::Normal,
            found: Vec::new(),
        }
    }

    pub fn preference(&self) -> TimePreference {
        self.preference
    }

    pub fn soft_time(&self) -> Option<Duration> {
        self.soft
    }

    /// Only one move is legal, so there is no point searching.
    pub fn halt(&mut self) {
        self.preference = TimePreference::Halt;
    }

    /// Ask for more time, e.g. after an aspiration fail-low.
    pub fn extend(&mut self) {
        if self.preference != TimePreference::Halt {
            self.preference = TimePreference::Extend;
        }
    }

    /// Drop the budget to nothing, so the next accepted iteration ends the search.
    pub fn expire(&mut self) {
        self.soft = Some(Duration::from_millis(0));
        self.can_shorten = true;
    }

    /// The average of the last two iterations' scores, the centre of the next window.
    pub fn guess(&self) -> i32 {
        match self.found.as_slice() {
            [.., (_, a), (_, b)] => (a + b) / 2,
            [(_, a)] => *a,
            [] => 0,
        }
    }

    /// Record a finished iteration and rescale the recommended time.
    pub fn record(&mut self, best_move: ChessMove, eval: i32, updated: bool, endgame: bool) {
        self.found.push((best_move, eval));
        if !self.can_shorten {
            return;
        }

        if self.preference == TimePreference::Halt || (eval > 0 && is_mate_score(eval)) {
            self.soft = Some(Duration::from_millis(0));
            return;
        }

        // a winning endgame is worth searching longer for a mate
        if !updated && endgame && eval > 0 {
            self.preference = TimePreference::Extend;
        }

        if self.preference == TimePreference::Normal && self.found.len() >= STABILITY_WINDOW {
            let recent = &self.found[self.found.len() - STABILITY_WINDOW..];
            let min = recent.iter().map(|(_, e)| *e).min().unwrap_or(0);
            let max = recent.iter().map(|(_, e)| *e).max().unwrap_or(0);
            let changes = recent.windows(2).filter(|w| w[0].0 != w[1].0).count();
            let spread = (max - min).abs();

            if changes == 0 || spread <= STABLE_SPREAD {
                self.preference = TimePreference::Reduce;
            }
            if changes > UNSTABLE_CHANGES || spread >= UNSTABLE_SPREAD {
                self.preference = TimePreference::Extend;
            }
        }

        self.soft = self.soft.map(|soft| match self.preference {
            TimePreference::Reduce => soft.mul_f64(SEARCH_REDUCTION_LEVEL),
            TimePreference::Extend => soft.mul_f64(SEARCH_EXTENSION_LEVEL),
            _ => soft,
        });
    }

    /// After an accepted iteration: is half the recommended time gone?
    pub fn should_stop(&self, updated: bool, elapsed: Duration) -> bool {
        self.can_shorten && updated && self.soft.map_or(false, |soft| elapsed >= soft / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::CHECKMATE_VALUE;
    use crate::square::Square;

    fn mv(n: u8) -> ChessMove {
        ChessMove::new(Square::new(n), Square::new(n + 8), 0)
    }

    #[test]
    fn settled_results_reduce_time() {
        let mut tm = TimeManager::new(Some(Duration::from_millis(1000)), true);
        for _ in 0..7 {
            tm.record(mv(8), 150, true, false);
        }
        assert_eq!(tm.preference(), TimePreference::Reduce);
        assert!(tm.soft_time().unwrap() < Duration::from_millis(1000));
    }

    #[test]
    fn wandering_results_extend_time() {
        let mut tm = TimeManager::new(Some(Duration::from_millis(1000)), true);
        for i in 0..7 {
            tm.record(mv(8 + i), if i % 2 == 0 { 0 } else { 1500 }, true, false);
        }
        assert_eq!(tm.preference(), TimePreference::Extend);
        assert!(tm.soft_time().unwrap() > Duration::from_millis(1000));
    }

    #[test]
    fn mate_and_halt_stop_immediately() {
        let mut tm = TimeManager::new(Some(Duration::from_secs(10)), true);
        tm.record(mv(8), CHECKMATE_VALUE - 3, true, false);
        assert!(tm.should_stop(true, Duration::from_millis(0)));

        let mut tm = TimeManager::new(Some(Duration::from_secs(10)), true);
        tm.halt();
        tm.record(mv(8), 10, true, false);
        assert!(tm.should_stop(true, Duration::from_millis(0)));
        assert!(!tm.should_stop(false, Duration::from_millis(0)));
    }

    #[test]
    fn fixed_budgets_never_shorten() {
        let mut tm = TimeManager::new(Some(Duration::from_millis(10)), false);
        tm.record(mv(8), CHECKMATE_VALUE - 1, true, false);
        assert!(!tm.should_stop(true, Duration::from_secs(1)));
        tm.expire();
        assert!(tm.should_stop(true, Duration::from_millis(0)));
    }

    #[test]
    fn guess_averages_the_last_two() {
        let mut tm = TimeManager::new(None, false);
        assert_eq!(tm.guess(), 0);
        tm.record(mv(8), 100, true, false);
        assert_eq!(tm.guess(), 100);
        tm.record(mv(8), 300, true, false);
        assert_eq!(tm.guess(), 200);
    }
}
