use crate::bitboard::{BitBoard, EMPTY};
use crate::color::Color;
use crate::square::Square;
use crate::tables::{tables, BISHOP, ROOK};

/// Get the rays for a bishop on a particular square.
#[inline]
pub fn get_bishop_rays(sq: Square) -> BitBoard {
    tables().rays[BISHOP][sq.to_index()]
}

/// Get the rays for a rook on a particular square.
#[inline]
pub fn get_rook_rays(sq: Square) -> BitBoard {
    tables().rays[ROOK][sq.to_index()]
}

/// Get the moves for a rook on a particular square, given blockers blocking my movement.
#[inline]
pub fn get_rook_moves(sq: Square, blockers: BitBoard) -> BitBoard {
    let t = tables();
    t.moves[t.magics[ROOK][sq.to_index()].index(blockers)]
}

/// Get the moves for a bishop on a particular square, given blockers blocking my movement.
#[inline]
pub fn get_bishop_moves(sq: Square, blockers: BitBoard) -> BitBoard {
    let t = tables();
    t.moves[t.magics[BISHOP][sq.to_index()].index(blockers)]
}

#[inline]
pub fn get_queen_moves(sq: Square, blockers: BitBoard) -> BitBoard {
    get_rook_moves(sq, blockers) | get_bishop_moves(sq, blockers)
}

/// Get the king moves for a particular square.
#[inline]
pub fn get_king_moves(sq: Square) -> BitBoard {
    tables().king_moves[sq.to_index()]
}

/// Get the knight moves for a particular square.
#[inline]
pub fn get_knight_moves(sq: Square) -> BitBoard {
    tables().knight_moves[sq.to_index()]
}

/// Get the pawn capture move for a particular square, given the pawn's color and the potential
/// victims
#[inline]
pub fn get_pawn_attacks(sq: Square, color: Color, victims: BitBoard) -> BitBoard {
    tables().pawn_attacks[color.to_index()][sq.to_index()] & victims
}

/// Get the quiet pawn moves (non-captures) for a particular square, given the pawn's color and
/// the potential blocking pieces.
#[inline]
pub fn get_pawn_quiets(sq: Square, color: Color, blockers: BitBoard) -> BitBoard {
    match sq.forward(color) {
        Some(one) if (BitBoard::from_square(one) & blockers) == EMPTY => {
            tables().pawn_moves[color.to_index()][sq.to_index()] & !blockers
        }
        _ => EMPTY,
    }
}

/// Get all the pawn moves for a particular square, given the pawn's color and the potential
/// blocking pieces and victims.
#[inline]
pub fn get_pawn_moves(sq: Square, color: Color, blockers: BitBoard) -> BitBoard {
    get_pawn_attacks(sq, color, blockers) ^ get_pawn_quiets(sq, color, blockers)
}

/// Get a line (extending to infinity, which in chess is 8 squares), given two squares.
/// This line does extend past the squares.
#[inline]
pub fn line(sq1: Square, sq2: Square) -> BitBoard {
    tables().line[sq1.to_index()][sq2.to_index()]
}

/// Get a line between these two squares, not including the squares themselves.
#[inline]
pub fn between(sq1: Square, sq2: Square) -> BitBoard {
    tables().between[sq1.to_index()][sq2.to_index()]
}

/// Get a `BitBoard` that represents all the squares on a particular rank.
#[inline]
pub fn get_rank(rank: u8) -> BitBoard {
    tables().ranks[rank as usize]
}

/// Get a `BitBoard` that represents all the squares on a particular file.
#[inline]
pub fn get_file(file: u8) -> BitBoard {
    tables().files[file as usize]
}

/// Get a `BitBoard` that represents the squares on the 1 or 2 files next to this file.
#[inline]
pub fn get_adjacent_files(file: u8) -> BitBoard {
    tables().adjacent_files[file as usize]
}
