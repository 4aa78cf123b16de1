use log::debug;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::chess_move::ChessMove;
use crate::evaluate::{evaluate, material_eval, Stage};
use crate::movegen::MoveGen;
use crate::ordering::{score_move, HistoryTable, KillerMoves, MovePicker};
use crate::position::Position;
use crate::transposition::{Bound, TranspositionTable};

/// Deepest iteration the driver will ask for.
pub const MAX_DEPTH: usize = 256;

/// Moves searched at a PV node before pruning may start.
pub const PV_PRUNE_MOVE_IDX: usize = 5;
/// Moves searched at a zero-window node before pruning may start.
pub const PRUNE_MOVE_IDX: usize = 2;
pub const MAX_QUIESCE_PLY: usize = 5;
/// Remaining depth below which late moves are never reduced.
pub const LMR_DEPTH: i32 = 3;

pub const ASP_EDGE: i32 = 250;
pub const HELPER_ASP_EDGE: i32 = 500;

pub const PV_FUTIL_MARGIN: i32 = 300;
pub const ZW_FUTIL_MARGIN: i32 = 200;

pub const NULL_PRUNE_R: i32 = 3;
/// Null moves are only tried when material is no worse than `beta - NMR_MARGIN`.
pub const NMR_MARGIN: i32 = 2000;

pub const DELTA_VALUE: i32 = 750;
pub const EARLY_DELTA_VALUE: i32 = 9000;
pub const PROMOTION_BUFFER: i32 = 9000;

pub const MAX_EVAL: i32 = 9_999_999;
pub const CHECKMATE_VALUE: i32 = MAX_EVAL - 1000;
pub const DRAW_VALUE: i32 = 0;

/// Helper threads bump every `HELPER_MOVE_DISORDER`th move...
pub const HELPER_MOVE_DISORDER: usize = 3;
/// ...by an amount that cycles with the thread number modulo this.
pub const HELPER_THREAD_DISORDER: usize = 3;

// Plies past this are scored statically.  Helpers search up to two plies beyond the main
// thread.
const MAX_PLY: usize = MAX_DEPTH + 4;

/// Returned by every search routine once the stop flag is seen.  The partial result of an
/// aborted search is never a score.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Aborted;

/// The score for the side to move being mated `ply` plies from the root.
#[inline]
pub fn mated_in(ply: usize) -> i32 {
    -(CHECKMATE_VALUE - ply as i32)
}

/// Is this a forced mate for either side?
#[inline]
pub fn is_mate_score(eval: i32) -> bool {
    eval.abs() >= CHECKMATE_VALUE - MAX_PLY as i32
}

// Table scores count mate distance from the stored node, not from the root.
#[inline]
fn to_tt(eval: i32, ply: usize) -> i32 {
    if eval >= CHECKMATE_VALUE - MAX_PLY as i32 {
        eval + ply as i32
    } else if eval <= -(CHECKMATE_VALUE - MAX_PLY as i32) {
        eval - ply as i32
    } else {
        eval
    }
}

#[inline]
fn from_tt(eval: i32, ply: usize) -> i32 {
    if eval >= CHECKMATE_VALUE - MAX_PLY as i32 {
        eval - ply as i32
    } else if eval <= -(CHECKMATE_VALUE - MAX_PLY as i32) {
        eval + ply as i32
    } else {
        eval
    }
}

/// Remaining depth for the `index`th of `count` moves at a zero-window node.
pub fn lmr_depth(depth: i32, index: usize, count: usize, allowed: bool, m: ChessMove) -> i32 {
    if depth < LMR_DEPTH || !allowed || !m.is_quiet() {
        return depth - 1;
    }
    if index < count / 8 {
        depth - 1
    } else if index < count / 4 {
        depth - 2
    } else if index < count / 2 {
        depth / 3
    } else {
        depth / 4
    }
}

/// Per-thread counters, reset for every iteration.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_hits: u64,
    pub beta_cutoffs: u64,
    pub null_prunes: u64,
    pub futility_prunes: u64,
    pub lmr_reductions: u64,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "nodes {} qnodes {} tt hits {} cutoffs {} null prunes {} futility prunes {} lmr {}",
            self.nodes,
            self.qnodes,
            self.tt_hits,
            self.beta_cutoffs,
            self.null_prunes,
            self.futility_prunes,
            self.lmr_reductions
        )
    }
}

/// The outcome of one completed iterative-deepening pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Iteration {
    pub depth: i32,
    pub eval: i32,
    pub pv: Vec<ChessMove>,
    /// The aspiration window had to be widened downward at least once.
    pub failed_low: bool,
}

impl Iteration {
    pub fn best_move(&self) -> Option<ChessMove> {
        self.pv.first().copied()
    }
}

/// One search thread's private state.  The transposition table and stop flag are shared.
pub struct Searcher<'a> {
    tt: &'a TranspositionTable,
    stop: &'a AtomicBool,
    thread: usize,
    killers: KillerMoves,
    history: HistoryTable,
    // Hashes of the game so far followed by the current search path, not counting the node
    // being searched.
    hashes: Vec<u64>,
    game_len: usize,
    // Start of the part of `hashes` reachable from the current node.  Positions before the
    // last null move on the path cannot repeat.
    null_floor: usize,
    pv: Vec<Vec<ChessMove>>,
    stats: SearchStats,
}

impl<'a> Searcher<'a> {
    /// `game` holds the hashes of every position before the root, oldest first.
    pub fn new(
        tt: &'a TranspositionTable,
        stop: &'a AtomicBool,
        thread: usize,
        game: &[u64],
    ) -> Searcher<'a> {
        let mut hashes = Vec::with_capacity(game.len() + MAX_PLY);
        hashes.extend_from_slice(game);
        Searcher {
            tt,
            stop,
            thread,
            killers: KillerMoves::new(),
            history: HistoryTable::new(),
            hashes,
            game_len: game.len(),
            null_floor: 0,
            pv: vec![Vec::new(); MAX_PLY + 1],
            stats: SearchStats::default(),
        }
    }

    pub fn thread(&self) -> usize {
        self.thread
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Search to `depth` inside an aspiration window of `edge` on either side of `guess`,
    /// widening until the score lands inside.  The first two depths use a full window.
    pub fn aspiration(
        &mut self,
        position: &Position,
        depth: i32,
        guess: i32,
        edge: i32,
    ) -> Result<Iteration, Aborted> {
        self.stats = SearchStats::default();
        let mut failed_low = false;

        let eval = if depth <= 2 {
            self.search_root(position, -MAX_EVAL + 1, MAX_EVAL - 1, depth)?
        } else {
            let widen = |w: i32| ((w + edge) * 2).min(2 * MAX_EVAL);
            let (mut lower, mut upper) = (edge, edge);
            let mut q = guess;
            loop {
                let alpha = (q - lower).max(-MAX_EVAL + 1);
                let beta = (q + upper).min(MAX_EVAL - 1);
                let eval = self.search_root(position, alpha, beta, depth)?;
                let no_move = self.pv[0].is_empty();
                let full_window = alpha == -MAX_EVAL + 1 && beta == MAX_EVAL - 1;
                // a failure against an edge that cannot move any further
                let stuck = (eval <= alpha && alpha == -MAX_EVAL + 1)
                    || (eval >= beta && beta == MAX_EVAL - 1);
                if (eval > alpha && eval < beta && !no_move) || full_window || stuck {
                    break eval;
                }

                if eval <= alpha {
                    upper = edge;
                    lower = widen(lower);
                    failed_low = true;
                } else if eval >= beta {
                    upper = widen(upper);
                    lower = edge;
                } else {
                    upper = widen(upper);
                    lower = widen(lower);
                }
                debug!(
                    "thread {} depth {}: {} outside [{}, {}], retrying with [{}, {}]",
                    self.thread,
                    depth,
                    eval,
                    alpha,
                    beta,
                    eval - lower,
                    eval + upper
                );
                q = eval;
            }
        };

        let pv = self.principal_variation(position, depth);
        Ok(Iteration {
            depth,
            eval,
            pv,
            failed_low,
        })
    }

    /// One full-width pass from the root.
    pub fn search_root(
        &mut self,
        position: &Position,
        alpha: i32,
        beta: i32,
        depth: i32,
    ) -> Result<i32, Aborted> {
        self.hashes.truncate(self.game_len);
        self.null_floor = 0;
        self.pv_search(position, alpha, beta, depth, 0)
    }

    /// The root line from the last search, extended with exact table moves out to `depth`.
    fn principal_variation(&self, root: &Position, depth: i32) -> Vec<ChessMove> {
        let mut line = Vec::with_capacity(depth.max(0) as usize);
        let mut position = *root;
        for m in self.pv[0].iter() {
            if !MoveGen::legal(&position).contains(m) {
                break;
            }
            line.push(*m);
            position = position.make_move(*m);
        }
        while (line.len() as i32) < depth {
            let next = match self.tt.probe(position.get_hash()) {
                Some(entry) if entry.bound == Bound::Exact && entry.depth > 0 => entry.best_move,
                _ => break,
            };
            if next.is_none() || !MoveGen::legal(&position).contains(&next) {
                break;
            }
            line.push(next);
            position = position.make_move(next);
        }
        line
    }

    #[inline]
    fn check_stop(&self) -> Result<(), Aborted> {
        if self.stop.load(Ordering::Relaxed) {
            Err(Aborted)
        } else {
            Ok(())
        }
    }

    fn is_repetition(&self, position: &Position) -> bool {
        let hash = position.get_hash();
        let reachable = self.hashes.len() - self.null_floor;
        let window = (position.halfmove_clock() as usize).min(reachable);
        self.hashes
            .iter()
            .rev()
            .take(window)
            .skip(1)
            .step_by(2)
            .any(|h| *h == hash)
    }

    fn is_draw(&self, position: &Position) -> bool {
        position.is_fifty_move_draw()
            || position.is_insufficient_material()
            || self.is_repetition(position)
    }

    fn update_pv(&mut self, ply: usize, m: ChessMove) {
        let (head, tail) = self.pv.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line.clear();
        line.push(m);
        line.extend_from_slice(&tail[0]);
    }

    fn pv_search(
        &mut self,
        position: &Position,
        mut alpha: i32,
        beta: i32,
        depth: i32,
        ply: usize,
    ) -> Result<i32, Aborted> {
        self.check_stop()?;
        self.stats.nodes += 1;
        if ply >= MAX_PLY {
            return Ok(evaluate(position));
        }
        self.pv[ply].clear();

        if ply > 0 && self.is_draw(position) {
            return Ok(DRAW_VALUE);
        }

        let moves = MoveGen::legal(position);
        if moves.is_empty() {
            return Ok(if position.in_check() {
                mated_in(ply)
            } else {
                DRAW_VALUE
            });
        }

        let hash = position.get_hash();
        let mut tt_move = ChessMove::NONE;
        if let Some(entry) = self.tt.probe(hash) {
            tt_move = entry.best_move;
            let eval = from_tt(entry.eval, ply);
            if ply > 0 && entry.depth as i32 >= depth {
                self.stats.tt_hits += 1;
                match entry.bound {
                    Bound::Exact => return Ok(eval),
                    Bound::Lower if eval >= beta => return Ok(beta),
                    Bound::Upper if eval < alpha => return Ok(alpha),
                    _ => {}
                }
            }
        }

        if depth <= 0 {
            let eval = self.q_search(position, alpha, beta, ply, 0)?;
            let bound = if eval >= beta {
                Bound::Lower
            } else if eval <= alpha {
                Bound::Upper
            } else {
                Bound::Exact
            };
            self.tt.store(hash, 0, to_tt(eval, ply), bound, ChessMove::NONE);
            return Ok(eval);
        }

        let us = position.side_to_move();
        let stage = position.stage();
        let prunable_node = !position.in_check()
            && (beta - 1).abs() < CHECKMATE_VALUE / 2
            && stage != Stage::EndGame;
        let futile = depth == 1
            && alpha.abs() < CHECKMATE_VALUE / 2
            && beta.abs() < CHECKMATE_VALUE / 2;
        let material = material_eval(position);

        let mut exact = false;
        let mut best = -MAX_EVAL;
        let mut best_move = ChessMove::NONE;

        let picker = MovePicker::for_search(
            position,
            moves,
            tt_move,
            &self.killers,
            &self.history,
            ply,
            self.thread,
        );
        for (i, (m, _)) in picker.enumerate() {
            let child = position.make_move(m);
            let prunable =
                prunable_node && i > PV_PRUNE_MOVE_IDX && !child.in_check() && m.is_quiet();
            if prunable
                && futile
                && material + score_move(position, m, stage) < alpha - PV_FUTIL_MARGIN
            {
                self.stats.futility_prunes += 1;
                continue;
            }

            self.hashes.push(hash);
            let score = if i == 0 {
                -self.pv_search(&child, -beta, -alpha, depth - 1, ply + 1)?
            } else {
                let probe = -self.zw_search(&child, -alpha, depth - 1, ply + 1, false)?;
                if probe > alpha {
                    -self.pv_search(&child, -beta, -alpha, depth - 1, ply + 1)?
                } else {
                    probe
                }
            };
            self.hashes.pop();

            if score >= beta {
                self.stats.beta_cutoffs += 1;
                self.tt.store(hash, depth, to_tt(beta, ply), Bound::Lower, m);
                if m.is_quiet() {
                    self.killers.add(ply, m);
                    self.history.add(us, m, depth);
                }
                return Ok(beta);
            }
            if score > best {
                best = score;
                best_move = m;
            }
            if score > alpha {
                alpha = score;
                exact = true;
                self.update_pv(ply, m);
            }
        }

        if exact {
            self.tt.store(hash, depth, to_tt(alpha, ply), Bound::Exact, self.pv[ply][0]);
        } else if best_move.is_none() {
            self.tt.store(hash, depth, to_tt(alpha, ply), Bound::Upper, ChessMove::NONE);
        } else {
            self.tt.store(hash, depth, to_tt(best, ply), Bound::Upper, best_move);
        }
        Ok(alpha)
    }

    /// Search the window `[beta - 1, beta]`.  Returns `beta` on a fail high and `beta - 1` on
    /// a fail low, or the exact score of a terminal node.
    fn zw_search(
        &mut self,
        position: &Position,
        beta: i32,
        depth: i32,
        ply: usize,
        is_null: bool,
    ) -> Result<i32, Aborted> {
        self.check_stop()?;
        self.stats.nodes += 1;
        if ply >= MAX_PLY {
            return Ok(evaluate(position));
        }

        if self.is_draw(position) {
            return Ok(DRAW_VALUE);
        }

        let moves = MoveGen::legal(position);
        if moves.is_empty() {
            return Ok(if position.in_check() {
                mated_in(ply)
            } else {
                DRAW_VALUE
            });
        }

        let hash = position.get_hash();
        let mut tt_move = ChessMove::NONE;
        if let Some(entry) = self.tt.probe(hash) {
            tt_move = entry.best_move;
            let eval = from_tt(entry.eval, ply);
            if entry.depth as i32 >= depth {
                self.stats.tt_hits += 1;
                match entry.bound {
                    Bound::Exact => return Ok(eval),
                    Bound::Lower if eval >= beta => return Ok(beta),
                    Bound::Upper if eval < beta - 1 => return Ok(beta - 1),
                    _ => {}
                }
            }
        }

        if depth <= 0 {
            return self.q_search(position, beta - 1, beta, ply, 0);
        }

        let stage = position.stage();
        let prunable_node = !position.in_check() && stage != Stage::EndGame;
        let material = material_eval(position);

        if prunable_node
            && !is_null
            && depth > NULL_PRUNE_R + 1
            && material >= beta - NMR_MARGIN
        {
            let score = -self.null_search(position, hash, beta, depth, ply)?;
            if score >= beta {
                self.stats.null_prunes += 1;
                return Ok(beta);
            }
        }

        let futile = depth == 1 && beta.abs() < CHECKMATE_VALUE / 2;
        let picker = MovePicker::for_search(
            position,
            moves,
            tt_move,
            &self.killers,
            &self.history,
            ply,
            self.thread,
        );
        let count = picker.len();
        for (i, (m, _)) in picker.enumerate() {
            let child = position.make_move(m);
            let prunable = prunable_node && i > PRUNE_MOVE_IDX && !child.in_check() && m.is_quiet();
            if prunable
                && futile
                && material + score_move(position, m, stage) < (beta - 1) - ZW_FUTIL_MARGIN
            {
                self.stats.futility_prunes += 1;
                continue;
            }

            let search_depth = lmr_depth(depth, i, count, prunable, m);
            if search_depth < depth - 1 {
                self.stats.lmr_reductions += (depth - 1 - search_depth) as u64;
            }

            self.hashes.push(hash);
            let score = -self.zw_search(&child, 1 - beta, search_depth, ply + 1, false)?;
            self.hashes.pop();

            if score >= beta {
                self.stats.beta_cutoffs += 1;
                self.tt.store(hash, depth, to_tt(beta, ply), Bound::Lower, m);
                if m.is_quiet() {
                    self.killers.add(ply, m);
                }
                return Ok(beta);
            }
        }

        Ok(beta - 1)
    }

    // Pass, and search the reply at reduced depth with repetitions cut off at the pass.
    fn null_search(
        &mut self,
        position: &Position,
        hash: u64,
        beta: i32,
        depth: i32,
        ply: usize,
    ) -> Result<i32, Aborted> {
        let child = position.make_null_move();
        self.hashes.push(hash);
        let floor = self.null_floor;
        self.null_floor = self.hashes.len();
        let result = self.zw_search(&child, 1 - beta, depth - NULL_PRUNE_R - 1, ply + 1, true);
        self.null_floor = floor;
        self.hashes.pop();
        result
    }

    /// Captures, promotions and checks only, until the position is quiet.  Every legal
    /// move is searched while in check.
    fn q_search(
        &mut self,
        position: &Position,
        mut alpha: i32,
        beta: i32,
        ply: usize,
        q_ply: usize,
    ) -> Result<i32, Aborted> {
        self.check_stop()?;
        self.stats.qnodes += 1;
        if self.is_draw(position) {
            return Ok(DRAW_VALUE);
        }

        let stand_pat = evaluate(position);
        // out of plies: the static score inside the window, in check or not
        if q_ply >= MAX_QUIESCE_PLY {
            return Ok(stand_pat.max(alpha).min(beta));
        }

        let in_check = position.in_check();
        let endgame = position.stage() == Stage::EndGame;
        if !in_check {
            if stand_pat >= beta {
                return Ok(beta);
            }
            if alpha < stand_pat {
                alpha = stand_pat;
            }

            let mut early_delta = EARLY_DELTA_VALUE;
            if position.can_promote_pawn() {
                early_delta += PROMOTION_BUFFER;
            }
            if !endgame && stand_pat + early_delta < alpha {
                self.stats.futility_prunes += 1;
                return Ok(alpha);
            }
        }

        let moves = if in_check {
            MoveGen::legal(position)
        } else {
            MoveGen::threats(position)
        };
        if moves.is_empty() {
            if in_check {
                return Ok(mated_in(ply));
            }
            return Ok(if MoveGen::legal(position).is_empty() {
                DRAW_VALUE
            } else {
                alpha
            });
        }

        let hash = position.get_hash();
        for (m, q_score) in MovePicker::for_quiescence(position, moves) {
            let mut delta = DELTA_VALUE;
            if m.is_promotion() {
                delta += PROMOTION_BUFFER;
            }
            if !in_check && !endgame && stand_pat + delta + q_score < alpha {
                self.stats.futility_prunes += 1;
                continue;
            }

            self.hashes.push(hash);
            let score = -self.q_search(&position.make_move(m), -beta, -alpha, ply + 1, q_ply + 1)?;
            self.hashes.pop();

            if score >= beta {
                return Ok(beta);
            }
            if score > alpha {
                alpha = score;
            }
        }
        Ok(alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(fen: &str, depth: i32) -> Iteration {
        let position = Position::from_fen(fen).unwrap();
        let tt = TranspositionTable::with_slots(1 << 16);
        let stop = AtomicBool::new(false);
        let mut searcher = Searcher::new(&tt, &stop, 0, &[]);
        let mut guess = 0;
        let mut last = None;
        for d in 1..=depth {
            let it = searcher.aspiration(&position, d, guess, ASP_EDGE).unwrap();
            guess = it.eval;
            last = Some(it);
        }
        last.unwrap()
    }

    #[test]
    fn finds_back_rank_mate() {
        let it = search("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 3);
        assert_eq!(it.eval, CHECKMATE_VALUE - 1);
        assert_eq!(it.best_move().unwrap().to_string(), "a1a8");
    }

    #[test]
    fn shorter_mates_score_higher() {
        let in_one = search("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 4);
        let in_two = search("k7/8/2K5/8/8/8/8/7R w - - 0 1", 4);
        assert_eq!(in_two.eval, CHECKMATE_VALUE - 3);
        assert!(in_one.eval > in_two.eval);
        assert!(is_mate_score(in_two.eval));
    }

    #[test]
    fn stalemate_is_a_draw() {
        let position = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let tt = TranspositionTable::with_slots(1024);
        let stop = AtomicBool::new(false);
        let mut searcher = Searcher::new(&tt, &stop, 0, &[]);
        assert_eq!(searcher.search_root(&position, -MAX_EVAL + 1, MAX_EVAL - 1, 3), Ok(0));
    }

    #[test]
    fn mated_root_scores_mate() {
        let position = Position::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        let tt = TranspositionTable::with_slots(1024);
        let stop = AtomicBool::new(false);
        let mut searcher = Searcher::new(&tt, &stop, 0, &[]);
        assert_eq!(
            searcher.search_root(&position, -MAX_EVAL + 1, MAX_EVAL - 1, 2),
            Ok(-CHECKMATE_VALUE)
        );
    }

    #[test]
    fn wins_a_hanging_queen() {
        let it = search("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1", 3);
        assert_eq!(it.best_move().unwrap().to_string(), "d2d5");
        assert!(it.eval > 3000);
    }

    #[test]
    fn stop_flag_aborts() {
        let position = Position::default();
        let tt = TranspositionTable::with_slots(1024);
        let stop = AtomicBool::new(true);
        let mut searcher = Searcher::new(&tt, &stop, 0, &[]);
        assert_eq!(searcher.aspiration(&position, 5, 0, ASP_EDGE), Err(Aborted));
    }

    #[test]
    fn repetition_in_game_history_is_a_draw() {
        // Shuffling knights back to the start repeats the root position.
        let start = Position::default();
        let mut game = vec![];
        let mut position = start;
        for text in ["g1f3", "g8f6", "f3g1", "f6g8"].iter() {
            game.push(position.get_hash());
            position = position.make_move(position.parse_move(text).unwrap());
        }
        assert_eq!(position.get_hash(), start.get_hash());

        let tt = TranspositionTable::with_slots(1024);
        let stop = AtomicBool::new(false);
        let searcher = Searcher::new(&tt, &stop, 0, &game);
        assert!(searcher.is_repetition(&position));
        let fresh = Searcher::new(&tt, &stop, 0, &[]);
        assert!(!fresh.is_repetition(&position));
    }

    #[test]
    fn repetitions_do_not_reach_across_a_null_move() {
        let start = Position::default();
        let mut game = vec![];
        let mut position = start;
        for text in ["g1f3", "g8f6", "f3g1", "f6g8"].iter() {
            game.push(position.get_hash());
            position = position.make_move(position.parse_move(text).unwrap());
        }

        let tt = TranspositionTable::with_slots(1024);
        let stop = AtomicBool::new(false);
        let mut searcher = Searcher::new(&tt, &stop, 0, &game);
        assert!(searcher.is_repetition(&position));
        searcher.null_floor = 1;
        assert!(!searcher.is_repetition(&position));
        searcher.null_floor = game.len();
        assert!(!searcher.is_repetition(&position));
    }

    #[test]
    fn quiescence_in_check_at_the_ply_cap_scores_statically() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/3QK2r w - - 0 1").unwrap();
        assert!(position.in_check());
        let tt = TranspositionTable::with_slots(1024);
        let stop = AtomicBool::new(false);
        let mut searcher = Searcher::new(&tt, &stop, 0, &[]);
        let eval = searcher
            .q_search(&position, -MAX_EVAL + 1, MAX_EVAL - 1, 0, MAX_QUIESCE_PLY)
            .unwrap();
        assert_eq!(eval, evaluate(&position));

        let eval = searcher
            .q_search(&position, 100, 200, 0, MAX_QUIESCE_PLY)
            .unwrap();
        assert!(eval >= 100 && eval <= 200);
    }

    #[test]
    fn full_window_scores_stay_in_bounds() {
        let position = Position::from_fen("4k3/8/8/8/3r4/8/8/3QK3 w - - 0 1").unwrap();
        let tt = TranspositionTable::with_slots(1 << 16);
        let stop = AtomicBool::new(false);
        let mut searcher = Searcher::new(&tt, &stop, 0, &[]);
        for depth in 1..=6 {
            let eval = searcher
                .search_root(&position, -MAX_EVAL + 1, MAX_EVAL - 1, depth)
                .unwrap();
            assert!(eval.abs() <= CHECKMATE_VALUE, "depth {}: {}", depth, eval);
            assert!(!searcher.pv[0].is_empty(), "depth {}", depth);
        }
    }

    #[test]
    fn aspiration_settles_from_any_guess() {
        let position = Position::from_fen("4k3/8/8/8/3r4/8/8/3QK3 w - - 0 1").unwrap();
        for guess in [-(MAX_EVAL - 1), 0, CHECKMATE_VALUE, MAX_EVAL - 1].iter() {
            let tt = TranspositionTable::with_slots(1 << 16);
            let stop = AtomicBool::new(false);
            let mut searcher = Searcher::new(&tt, &stop, 0, &[]);
            let it = searcher.aspiration(&position, 3, *guess, ASP_EDGE).unwrap();
            assert!(it.eval.abs() <= CHECKMATE_VALUE, "guess {}: {}", guess, it.eval);
            assert_eq!(it.best_move().unwrap().to_string(), "d1d4");
        }
    }

    #[test]
    fn late_quiet_moves_are_reduced() {
        let quiet = ChessMove::NONE;
        assert_eq!(lmr_depth(2, 30, 40, true, quiet), 1);
        assert_eq!(lmr_depth(8, 1, 40, true, quiet), 7);
        assert_eq!(lmr_depth(8, 6, 40, true, quiet), 6);
        assert_eq!(lmr_depth(8, 12, 40, true, quiet), 2);
        assert_eq!(lmr_depth(8, 30, 40, true, quiet), 2);
        assert_eq!(lmr_depth(8, 30, 40, false, quiet), 7);
    }

    #[test]
    fn mate_scores_survive_the_table() {
        let eval = CHECKMATE_VALUE - 5;
        assert_eq!(from_tt(to_tt(eval, 3), 3), eval);
        assert_eq!(from_tt(to_tt(-eval, 3), 3), -eval);
        assert_eq!(from_tt(to_tt(eval, 3), 1), eval + 2);
        assert_eq!(to_tt(1234, 9), 1234);
    }
}
