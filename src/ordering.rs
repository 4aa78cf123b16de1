use arrayvec::ArrayVec;

use crate::bitboard::{BitBoard, EMPTY};
use crate::chess_move::ChessMove;
use crate::color::{Color, NUM_COLORS};
use crate::evaluate::{pst, Stage};
use crate::magic::{get_bishop_moves, get_rook_moves};
use crate::movegen::MoveList;
use crate::piece::{Piece, ALL_PIECES, NUM_PIECES};
use crate::position::Position;
use crate::search::{HELPER_MOVE_DISORDER, HELPER_THREAD_DISORDER, MAX_DEPTH};
use crate::square::NUM_SQUARES;

/// Piece values used for ordering and exchange evaluation.
pub const ORDER_VALUES: [i32; NUM_PIECES] = [1000, 3500, 3600, 5000, 10000, 100000];
pub const CASTLE_BONUS: i32 = 30;

pub const TT_MOVE_BONUS: i32 = 3_000_000;
pub const CAPTURE_MOVE_BONUS: i32 = 2_000_000;
pub const KILLER_MOVE_BONUS: i32 = 1_000_000;

/// Killer moves remembered per ply.
pub const KMV_CNT: usize = 3;

// History scores are halved once any entry passes this, keeping them below the killer bonus.
const HISTORY_MAX: u32 = 500_000;

// Added to every `HELPER_MOVE_DISORDER`th move searched by a helper thread.
const DISORDER_STEP: i32 = 100;

#[inline]
pub fn order_value(piece: Piece) -> i32 {
    ORDER_VALUES[piece.to_index()]
}

/// The least valuable piece of `color` in `attackers`, as a single-square `BitBoard`.
fn least_valuable(
    position: &Position,
    attackers: BitBoard,
    color: Color,
) -> Option<(Piece, BitBoard)> {
    let mine = attackers & position.color_combined(color);
    ALL_PIECES.iter().find_map(|p| {
        let candidates = mine & position.pieces(*p);
        if candidates != EMPTY {
            Some((*p, candidates.lsb()))
        } else {
            None
        }
    })
}

/// Static exchange evaluation: the material the side to move nets if both sides keep
/// recapturing on `m`'s destination with their cheapest piece, each side free to stop.
///
/// The whole swap list is built before folding it back, so the result is the exact net
/// gain rather than just its sign.
pub fn see(position: &Position, m: ChessMove) -> i32 {
    let to = m.get_dest();
    let mut gain = [0i32; 32];
    let mut d = 0;

    gain[0] = if m.is_en_passant() {
        order_value(Piece::Pawn)
    } else {
        position.piece_on(to).map(order_value).unwrap_or(0)
    };

    let rooks = position.pieces(Piece::Rook) | position.pieces(Piece::Queen);
    let bishops = position.pieces(Piece::Bishop) | position.pieces(Piece::Queen);

    let mut occupied = position.combined();
    if m.is_en_passant() {
        occupied ^= BitBoard::from_square(to.ubackward(position.side_to_move()));
    }
    let mut attackers = position.attackers_to(to, occupied);
    let mut from = BitBoard::from_square(m.get_source());
    let mut piece = position.piece_on(m.get_source()).unwrap_or(Piece::Pawn);
    let mut side = position.side_to_move();

    loop {
        d += 1;
        // what the other side nets if it takes `piece` back
        gain[d] = order_value(piece) - gain[d - 1];
        if d == gain.len() - 1 {
            break;
        }

        attackers ^= from;
        occupied ^= from;
        // sliders behind the piece that just moved join in
        attackers |= ((get_rook_moves(to, occupied) & rooks)
            | (get_bishop_moves(to, occupied) & bishops))
            & occupied;

        side = !side;
        match least_valuable(position, attackers & occupied, side) {
            Some((p, bb)) => {
                piece = p;
                from = bb;
            }
            None => break,
        }
    }

    // gain[d] assumed a recapture nobody can make, so folding starts one step back
    while d > 1 {
        d -= 1;
        gain[d - 1] = -(-gain[d - 1]).max(gain[d]);
    }
    gain[0]
}

/// Heuristic value of a move for ordering and futility: the piece-square delta of the
/// moving piece, plus the exchange value of any capture and the gain of any promotion.
pub fn score_move(position: &Position, m: ChessMove, stage: Stage) -> i32 {
    let us = position.side_to_move();
    let from = m.get_source();
    let to = m.get_dest();
    let moved = position.piece_on(from).unwrap_or(Piece::Pawn);

    let mut score = pst(stage, moved, us, to) - pst(stage, moved, us, from);

    if m.is_capture() {
        score += see(position, m);
        if m.is_en_passant() {
            score += pst(stage, Piece::Pawn, !us, to.ubackward(us));
        } else if let Some(captured) = position.piece_on(to) {
            score += pst(stage, captured, !us, to);
        }
    }

    if let Some(promoted) = m.get_promotion() {
        score += order_value(promoted) - order_value(Piece::Pawn);
    }

    if m.is_castle() {
        score += CASTLE_BONUS;
    }

    score
}

/// Ordering value for quiescence moves: exchange value, plus the gain of any promotion.
pub fn q_score(position: &Position, m: ChessMove) -> i32 {
    let mut score = see(position, m);
    if let Some(promoted) = m.get_promotion() {
        score += order_value(promoted) - order_value(Piece::Pawn);
    }
    score
}

/// Quiet moves that caused a cutoff, `KMV_CNT` per ply in a ring.
pub struct KillerMoves {
    moves: Vec<[ChessMove; KMV_CNT]>,
    next: Vec<usize>,
}

impl KillerMoves {
    pub fn new() -> KillerMoves {
        KillerMoves {
            moves: vec![[ChessMove::NONE; KMV_CNT]; MAX_DEPTH + 1],
            next: vec![0; MAX_DEPTH + 1],
        }
    }

    pub fn add(&mut self, ply: usize, m: ChessMove) {
        if ply > MAX_DEPTH || self.contains(ply, m) {
            return;
        }
        let slot = self.next[ply];
        self.moves[ply][slot] = m;
        self.next[ply] = (slot + 1) % KMV_CNT;
    }

    #[inline]
    pub fn contains(&self, ply: usize, m: ChessMove) -> bool {
        ply <= MAX_DEPTH && self.moves[ply].contains(&m)
    }

    pub fn clear(&mut self) {
        for slots in self.moves.iter_mut() {
            *slots = [ChessMove::NONE; KMV_CNT];
        }
        for n in self.next.iter_mut() {
            *n = 0;
        }
    }
}

impl Default for KillerMoves {
    fn default() -> KillerMoves {
        KillerMoves::new()
    }
}

/// Cutoff counts per (color, from, to), weighted by the square of the remaining depth.
pub struct HistoryTable {
    scores: Vec<[[u32; NUM_SQUARES]; NUM_SQUARES]>,
}

impl HistoryTable {
    pub fn new() -> HistoryTable {
        HistoryTable {
            scores: vec![[[0; NUM_SQUARES]; NUM_SQUARES]; NUM_COLORS],
        }
    }

    pub fn add(&mut self, color: Color, m: ChessMove, depth: i32) {
        let depth = depth.max(1) as u32;
        let entry = &mut self.scores[color.to_index()][m.get_source().to_index()]
            [m.get_dest().to_index()];
        *entry += depth * depth;
        if *entry > HISTORY_MAX {
            self.age();
        }
    }

    #[inline]
    pub fn get(&self, color: Color, m: ChessMove) -> i32 {
        self.scores[color.to_index()][m.get_source().to_index()][m.get_dest().to_index()] as i32
    }

    fn age(&mut self) {
        for from in self.scores.iter_mut().flat_map(|c| c.iter_mut()) {
            for score in from.iter_mut() {
                *score /= 2;
            }
        }
    }

    pub fn clear(&mut self) {
        for from in self.scores.iter_mut().flat_map(|c| c.iter_mut()) {
            for score in from.iter_mut() {
                *score = 0;
            }
        }
    }
}

impl Default for HistoryTable {
    fn default() -> HistoryTable {
        HistoryTable::new()
    }
}

/// Hands out moves best-first by lazy selection sort.  Only the moves actually searched
/// are ever sorted.
pub struct MovePicker {
    moves: MoveList,
    scores: ArrayVec<i32, 256>,
    index: usize,
}

impl MovePicker {
    pub fn new(moves: MoveList, scores: ArrayVec<i32, 256>) -> MovePicker {
        debug_assert_eq!(moves.len(), scores.len());
        MovePicker {
            moves,
            scores,
            index: 0,
        }
    }

    /// Main-search ordering: the table move, then captures, then killers, then quiet moves
    /// by piece-square delta and history.  `thread` above zero perturbs the order.
    pub fn for_search(
        position: &Position,
        moves: MoveList,
        tt_move: ChessMove,
        killers: &KillerMoves,
        history: &HistoryTable,
        ply: usize,
        thread: usize,
    ) -> MovePicker {
        let stage = position.stage();
        let us = position.side_to_move();
        let scores = moves
            .iter()
            .enumerate()
            .map(|(i, m)| {
                if *m == tt_move {
                    return TT_MOVE_BONUS;
                }
                let base = score_move(position, *m, stage);
                let mut score = if m.is_capture() {
                    CAPTURE_MOVE_BONUS + base
                } else if killers.contains(ply, *m) {
                    KILLER_MOVE_BONUS + base
                } else {
                    base + history.get(us, *m)
                };
                if thread > 0 && (i + thread) % HELPER_MOVE_DISORDER == 0 {
                    score += (thread % HELPER_THREAD_DISORDER + 1) as i32 * DISORDER_STEP;
                }
                score
            })
            .collect();
        MovePicker::new(moves, scores)
    }

    /// Quiescence ordering by exchange value.
    pub fn for_quiescence(position: &Position, moves: MoveList) -> MovePicker {
        let scores = moves.iter().map(|m| q_score(position, *m)).collect();
        MovePicker::new(moves, scores)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Iterator for MovePicker {
    /// The move and its ordering score.
    type Item = (ChessMove, i32);

    fn next(&mut self) -> Option<(ChessMove, i32)> {
        if self.index >= self.moves.len() {
            return None;
        }
        let mut best = self.index;
        for i in (self.index + 1)..self.moves.len() {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.swap(self.index, best);
        self.scores.swap(self.index, best);
        let result = (self.moves[self.index], self.scores[self.index]);
        self.index += 1;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::MoveGen;

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn see_pawn_takes_rook_defended_by_king() {
        let position = position("8/8/4k3/3r4/4P3/8/8/4K3 w - - 0 1");
        let m = position.parse_move("e4d5").unwrap();
        assert_eq!(see(&position, m), 5000 - 1000);
    }

    #[test]
    fn see_queen_takes_pawn_defended_by_pawn() {
        let position = position("4k3/8/2p5/3p4/8/8/8/3QK3 w - - 0 1");
        let m = position.parse_move("d1d5").unwrap();
        assert_eq!(see(&position, m), 1000 - 10000);
    }

    #[test]
    fn see_counts_xray_recaptures() {
        // the rook behind on d1 wins back the defending rook
        let xray = position("3rk3/8/8/3p4/8/8/3R4/3RK3 w - - 0 1");
        let m = xray.parse_move("d2d5").unwrap();
        assert_eq!(see(&xray, m), 1000);

        // a pawn defender makes the first capture a losing one
        let defended = position("4k3/8/4p3/3p4/8/8/3R4/3RK3 w - - 0 1");
        let m = defended.parse_move("d2d5").unwrap();
        assert!(see(&defended, m) < 0);
    }

    #[test]
    fn promotion_capture_counts_the_promotion_once() {
        let position = position("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let m = position.parse_move("a7b8q").unwrap();
        let stage = position.stage();
        let expected = see(&position, m) + pst(stage, Piece::Pawn, Color::White, m.get_dest())
            - pst(stage, Piece::Pawn, Color::White, m.get_source())
            + pst(stage, Piece::Rook, Color::Black, m.get_dest())
            + order_value(Piece::Queen)
            - order_value(Piece::Pawn);
        assert_eq!(score_move(&position, m, stage), expected);
        let push = position.parse_move("a7a8q").unwrap();
        assert!(score_move(&position, m, stage) > score_move(&position, push, stage));
    }

    #[test]
    fn killers_ring_and_skip_duplicates() {
        let mut killers = KillerMoves::new();
        let position = Position::default();
        let moves = MoveGen::legal(&position);
        for m in moves.iter().take(KMV_CNT) {
            killers.add(3, *m);
            killers.add(3, *m);
        }
        assert!(moves.iter().take(KMV_CNT).all(|m| killers.contains(3, *m)));
        killers.add(3, moves[KMV_CNT]);
        assert!(!killers.contains(3, moves[0]));
        assert!(killers.contains(3, moves[KMV_CNT]));
        assert!(!killers.contains(4, moves[1]));
        killers.clear();
        assert!(!killers.contains(3, moves[1]));
    }

    #[test]
    fn picker_yields_best_first() {
        let position = position("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");
        let moves = MoveGen::legal(&position);
        let tt_move = position.parse_move("e1f1").unwrap();
        let killers = KillerMoves::new();
        let history = HistoryTable::new();
        let mut picker =
            MovePicker::for_search(&position, moves, tt_move, &killers, &history, 0, 0);
        assert_eq!(picker.next().map(|(m, _)| m), Some(tt_move));
        assert_eq!(picker.next().map(|(m, _)| m.to_string()), Some("e4d5".to_string()));
        let rest: Vec<i32> = picker.map(|(_, s)| s).collect();
        assert!(rest.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn history_accumulates_depth_squared() {
        let mut history = HistoryTable::new();
        let m = Position::default().parse_move("g1f3").unwrap();
        history.add(Color::White, m, 3);
        history.add(Color::White, m, 2);
        assert_eq!(history.get(Color::White, m), 13);
        assert_eq!(history.get(Color::Black, m), 0);
    }
}
