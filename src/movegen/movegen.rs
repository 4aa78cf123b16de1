use arrayvec::ArrayVec;

use crate::bitboard::{BitBoard, EMPTY};
use crate::chess_move::ChessMove;
use crate::magic::{get_bishop_moves, get_knight_moves, get_pawn_attacks, get_rook_moves};
use crate::movegen::piece_type::*;
use crate::piece::Piece;
use crate::position::Position;

/// No legal position has more than 218 moves.
pub type MoveList = ArrayVec<ChessMove, 256>;

/// Never Call Directly!
///
/// Enumerate all legal moves for a particular position into a `MoveList`.  Pieces are
/// generated in a fixed order, so move lists are deterministic.
macro_rules! enumerate_moves {
    ($movelist:expr, $position:expr, $mask:expr) => {{
        let checkers = $position.checkers();
        if checkers == EMPTY {
            PawnType::legals::<NotInCheckType>($movelist, $position, $mask);
            KnightType::legals::<NotInCheckType>($movelist, $position, $mask);
            BishopType::legals::<NotInCheckType>($movelist, $position, $mask);
            RookType::legals::<NotInCheckType>($movelist, $position, $mask);
            QueenType::legals::<NotInCheckType>($movelist, $position, $mask);
            KingType::legals::<NotInCheckType>($movelist, $position, $mask);
        } else if checkers.popcnt() == 1 {
            PawnType::legals::<InCheckType>($movelist, $position, $mask);
            KnightType::legals::<InCheckType>($movelist, $position, $mask);
            BishopType::legals::<InCheckType>($movelist, $position, $mask);
            RookType::legals::<InCheckType>($movelist, $position, $mask);
            QueenType::legals::<InCheckType>($movelist, $position, $mask);
            KingType::legals::<InCheckType>($movelist, $position, $mask);
        } else {
            KingType::legals::<InCheckType>($movelist, $position, $mask);
        }
    }};
}

/// The legal move generator.
///
/// ```
/// use chess_search::{MoveGen, Position};
///
/// let position = Position::default();
/// assert_eq!(MoveGen::legal(&position).len(), 20);
/// assert_eq!(MoveGen::perft(&position, 3), 8902);
/// ```
pub struct MoveGen;

impl MoveGen {
    /// Every legal move for the side to move.
    pub fn legal(position: &Position) -> MoveList {
        let mut movelist = MoveList::new();
        let mask = !position.color_combined(position.side_to_move());
        enumerate_moves!(&mut movelist, position, mask);
        movelist
    }

    /// The legal moves that change the material balance or give check: captures (en passant
    /// included), promotions and checking quiet moves.
    pub fn threats(position: &Position) -> MoveList {
        let mut movelist = MoveGen::legal(position);
        movelist
            .retain(|m| m.is_capture() || m.is_promotion() || MoveGen::gives_check(position, *m));
        movelist
    }

    /// Does this legal move attack the enemy king, directly or by discovery?
    pub fn gives_check(position: &Position, m: ChessMove) -> bool {
        if m.is_castle() || m.is_en_passant() {
            return position.make_move(m).in_check();
        }

        let us = position.side_to_move();
        let ksq = position.king_square(!us);
        let king = BitBoard::from_square(ksq);
        let src = BitBoard::from_square(m.get_source());
        let dest = m.get_dest();
        let occupied = (position.combined() ^ src) | BitBoard::from_square(dest);

        let moved = m
            .get_promotion()
            .or_else(|| position.piece_on(m.get_source()))
            .unwrap_or(Piece::Pawn);
        let direct = match moved {
            Piece::Pawn => get_pawn_attacks(dest, us, king),
            Piece::Knight => get_knight_moves(dest) & king,
            Piece::Bishop => get_bishop_moves(dest, occupied) & king,
            Piece::Rook => get_rook_moves(dest, occupied) & king,
            Piece::Queen => (get_bishop_moves(dest, occupied) | get_rook_moves(dest, occupied)) & king,
            Piece::King => EMPTY,
        };
        if direct != EMPTY {
            return true;
        }

        let mine = position.color_combined(us) ^ src;
        let rooks = (position.pieces(Piece::Rook) | position.pieces(Piece::Queen)) & mine;
        let bishops = (position.pieces(Piece::Bishop) | position.pieces(Piece::Queen)) & mine;
        (get_rook_moves(ksq, occupied) & rooks) | (get_bishop_moves(ksq, occupied) & bishops)
            != EMPTY
    }

    /// Count the leaves of the legal move tree, `depth` plies deep.
    pub fn perft(position: &Position, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = MoveGen::legal(position);
        if depth == 1 {
            moves.len() as u64
        } else {
            moves
                .iter()
                .map(|m| MoveGen::perft(&position.make_move(*m), depth - 1))
                .sum()
        }
    }

    /// Perft split by root move, for tracking down a miscount.
    pub fn perft_divide(position: &Position, depth: usize) -> Vec<(ChessMove, u64)> {
        if depth == 0 {
            return Vec::new();
        }
        MoveGen::legal(position)
            .iter()
            .map(|m| (*m, MoveGen::perft(&position.make_move(*m), depth - 1)))
            .collect()
    }
}

#[cfg(test)]
fn movegen_perft_test(fen: &str, depth: usize, result: u64) {
    crate::tables::construct().unwrap();
    let position = Position::from_fen(fen).unwrap();
    assert_eq!(MoveGen::perft(&position, depth), result);
}

// Walk the tree checking that no generated move leaves the mover's king attacked and that
// the threat list is exactly the captures, promotions and checks of the legal list.
#[cfg(test)]
fn walk_legality(position: &Position, depth: usize) {
    let legal = MoveGen::legal(position);
    let threats = MoveGen::threats(position);
    for m in legal.iter() {
        let next = position.make_move(*m);
        let us = position.side_to_move();
        let ksq = next.king_square(us);
        assert_eq!(
            next.attackers_to(ksq, next.combined()) & next.color_combined(!us),
            EMPTY,
            "{} leaves the king attacked in {}",
            m,
            position
        );
        let is_threat = m.is_capture() || m.is_promotion() || next.in_check();
        assert_eq!(threats.contains(m), is_threat, "{} in {}", m, position);
        if depth > 1 {
            walk_legality(&next, depth - 1);
        }
    }
}

#[test]
fn movegen_perft_startpos() {
    let position = Position::default();
    assert_eq!(MoveGen::perft(&position, 1), 20);
    assert_eq!(MoveGen::perft(&position, 2), 400);
    assert_eq!(MoveGen::perft(&position, 3), 8902);
    assert_eq!(MoveGen::perft(&position, 4), 197281);
}

#[test]
fn movegen_perft_kiwipete() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    movegen_perft_test(fen, 1, 48);
    movegen_perft_test(fen, 2, 2039);
    movegen_perft_test(fen, 3, 97862);
    movegen_perft_test(fen, 4, 4085603);
}

#[test]
fn movegen_perft_divide_sums() {
    let position = Position::default();
    let divide = MoveGen::perft_divide(&position, 3);
    assert_eq!(divide.len(), 20);
    assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 8902);
}

#[test]
fn movegen_perft_1() {
    movegen_perft_test("8/5bk1/8/2Pp4/8/1K6/8/8 w - d6 0 1", 6, 824064);
}

#[test]
fn movegen_perft_2() {
    movegen_perft_test("8/8/1k6/8/2pP4/8/5BK1/8 b - d3 0 1", 6, 824064);
}

#[test]
fn movegen_perft_3() {
    movegen_perft_test("8/8/1k6/2b5/2pP4/8/5K2/8 b - d3 0 1", 6, 1440467);
}

#[test]
fn movegen_perft_4() {
    movegen_perft_test("8/5k2/8/2Pp4/2B5/1K6/8/8 w - d6 0 1", 6, 1440467);
}

#[test]
fn movegen_perft_5() {
    movegen_perft_test("5k2/8/8/8/8/8/8/4K2R w K - 0 1", 6, 661072);
}

#[test]
fn movegen_perft_6() {
    movegen_perft_test("4k2r/8/8/8/8/8/8/5K2 b k - 0 1", 6, 661072);
}

#[test]
fn movegen_perft_7() {
    movegen_perft_test("3k4/8/8/8/8/8/8/R3K3 w Q - 0 1", 6, 803711);
}

#[test]
fn movegen_perft_8() {
    movegen_perft_test("r3k3/8/8/8/8/8/8/3K4 b q - 0 1", 6, 803711);
}

#[test]
fn movegen_perft_9() {
    movegen_perft_test("r3k2r/1b4bq/8/8/8/8/7B/R3K2R w KQkq - 0 1", 4, 1274206);
}

#[test]
fn movegen_perft_10() {
    movegen_perft_test("r3k2r/7b/8/8/8/8/1B4BQ/R3K2R b KQkq - 0 1", 4, 1274206);
}

#[test]
fn movegen_perft_11() {
    movegen_perft_test("r3k2r/8/3Q4/8/8/5q2/8/R3K2R b KQkq - 0 1", 4, 1720476);
}

#[test]
fn movegen_perft_12() {
    movegen_perft_test("r3k2r/8/5Q2/8/8/3q4/8/R3K2R w KQkq - 0 1", 4, 1720476);
}

#[test]
fn movegen_perft_13() {
    movegen_perft_test("2K2r2/4P3/8/8/8/8/8/3k4 w - - 0 1", 6, 3821001);
}

#[test]
fn movegen_perft_14() {
    movegen_perft_test("3K4/8/8/8/8/8/4p3/2k2R2 b - - 0 1", 6, 3821001);
}

#[test]
fn movegen_perft_15() {
    movegen_perft_test("8/8/1P2K3/8/2n5/1q6/8/5k2 b - - 0 1", 5, 1004658);
}

#[test]
fn movegen_perft_16() {
    movegen_perft_test("5K2/8/1Q6/2N5/8/1p2k3/8/8 w - - 0 1", 5, 1004658);
}

#[test]
fn movegen_perft_17() {
    movegen_perft_test("4k3/1P6/8/8/8/8/K7/8 w - - 0 1", 6, 217342);
}

#[test]
fn movegen_perft_18() {
    movegen_perft_test("8/k7/8/8/8/8/1p6/4K3 b - - 0 1", 6, 217342);
}

#[test]
fn movegen_perft_19() {
    movegen_perft_test("8/P1k5/K7/8/8/8/8/8 w - - 0 1", 6, 92683);
}

#[test]
fn movegen_perft_20() {
    movegen_perft_test("8/8/8/8/8/k7/p1K5/8 b - - 0 1", 6, 92683);
}

#[test]
fn movegen_perft_21() {
    movegen_perft_test("K1k5/8/P7/8/8/8/8/8 w - - 0 1", 6, 2217);
}

#[test]
fn movegen_perft_22() {
    movegen_perft_test("8/8/8/8/8/p7/8/k1K5 b - - 0 1", 6, 2217);
}

#[test]
fn movegen_perft_23() {
    movegen_perft_test("8/k1P5/8/1K6/8/8/8/8 w - - 0 1", 7, 567584);
}

#[test]
fn movegen_perft_24() {
    movegen_perft_test("8/8/8/8/1k6/8/K1p5/8 b - - 0 1", 7, 567584);
}

#[test]
fn movegen_perft_25() {
    movegen_perft_test("8/8/2k5/5q2/5n2/8/5K2/8 b - - 0 1", 4, 23527);
}

#[test]
fn movegen_perft_26() {
    movegen_perft_test("8/5k2/8/5N2/5Q2/2K5/8/8 w - - 0 1", 4, 23527);
}

#[test]
fn no_move_leaves_the_king_attacked() {
    for fen in [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        // pinned sliders on both diagonals and files
        "4k3/4r3/8/b7/8/8/3BR3/r2QK3 w - - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ]
    .iter()
    {
        walk_legality(&Position::from_fen(fen).unwrap(), 3);
    }
}

#[test]
fn pinned_rook_slides_along_the_pin() {
    let position = Position::from_fen("4r1k1/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
    let moves = MoveGen::legal(&position);
    let rook_moves: Vec<String> = moves
        .iter()
        .filter(|m| m.get_source() == crate::square::Square::E2)
        .map(|m| m.to_string())
        .collect();
    assert_eq!(rook_moves.len(), 6);
    assert!(rook_moves.iter().all(|m| m.as_bytes()[2] == b'e'));
}

#[test]
fn en_passant_discovered_check_is_illegal() {
    // taking on c6 would open the fifth rank to the rook
    let position = Position::from_fen("8/8/8/KPp4r/8/8/8/6k1 w - c6 0 1").unwrap();
    assert!(MoveGen::legal(&position).iter().all(|m| !m.is_en_passant()));
}
