use crate::bitboard::{BitBoard, EMPTY};
use crate::piece::Piece;
use crate::square::Square;
use rand::Rng;

// (rank, file) steps for each slider.
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, -1), (0, 1), (1, 0), (-1, 0)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, -1), (1, 1), (-1, -1), (-1, 1)];

pub fn directions(piece: Piece) -> &'static [(i8, i8); 4] {
    if piece == Piece::Bishop {
        &BISHOP_DIRECTIONS
    } else {
        &ROOK_DIRECTIONS
    }
}

/// Short name used in errors and logs.
pub fn slider_name(piece: Piece) -> &'static str {
    if piece == Piece::Bishop {
        "bishop"
    } else {
        "rook"
    }
}

// Generate a random bitboard with a small number of bits.
pub fn random_bitboard<R: Rng>(rng: &mut R) -> BitBoard {
    BitBoard::new(rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>())
}

/// Every square a slider on `sq` sees on an empty board.
pub fn empty_board_rays(sq: Square, piece: Piece) -> BitBoard {
    ray_cast(sq, piece, EMPTY)
}

/// The squares whose occupancy can change a slider's attacks.  The last square of each
/// ray never matters, since the ray stops there anyway.
pub fn magic_mask(sq: Square, piece: Piece) -> BitBoard {
    let mut result = EMPTY;
    for &(dr, df) in directions(piece).iter() {
        let mut cur = sq.offset(dr, df);
        while let Some(s) = cur {
            let next = s.offset(dr, df);
            if next.is_none() {
                break;
            }
            result |= BitBoard::from_square(s);
            cur = next;
        }
    }
    result
}

/// Attacks of a slider on `sq` by walking each ray until it hits a blocker.  The blocker
/// square itself is attacked.
pub fn ray_cast(sq: Square, piece: Piece, blockers: BitBoard) -> BitBoard {
    let mut answer = EMPTY;
    for &(dr, df) in directions(piece).iter() {
        let mut cur = sq.offset(dr, df);
        while let Some(s) = cur {
            let bb = BitBoard::from_square(s);
            answer |= bb;
            if bb & blockers != EMPTY {
                break;
            }
            cur = s.offset(dr, df);
        }
    }
    answer
}

/// Every subset of `mask`, EMPTY first, enumerated with the carry-rippler trick.
pub fn subsets(mask: BitBoard) -> Vec<BitBoard> {
    let mut result = Vec::with_capacity(1 << mask.popcnt());
    let mut subset = 0u64;
    loop {
        result.push(BitBoard(subset));
        subset = subset.wrapping_sub(mask.0) & mask.0;
        if subset == 0 {
            break;
        }
    }
    result
}

/// All blocker configurations for a square and the attack set each one produces.
pub fn questions_and_answers(sq: Square, piece: Piece) -> (Vec<BitBoard>, Vec<BitBoard>) {
    let questions = subsets(magic_mask(sq, piece));
    let answers = questions.iter().map(|q| ray_cast(sq, piece, *q)).collect();
    (questions, answers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_mask_drops_edges() {
        // a1 rook: b1..g1 and a2..a7
        assert_eq!(magic_mask(Square::A1, Piece::Rook).popcnt(), 12);
        // d4 rook: 10 relevant squares
        assert_eq!(magic_mask(Square::D4, Piece::Rook).popcnt(), 10);
        assert_eq!(magic_mask(Square::D4, Piece::Bishop).popcnt(), 9);
    }

    #[test]
    fn subsets_are_complete() {
        let mask = magic_mask(Square::E4, Piece::Bishop);
        let all = subsets(mask);
        assert_eq!(all.len(), 1 << mask.popcnt());
        assert_eq!(all.iter().fold(EMPTY, |b, s| b | *s), mask);
    }

    #[test]
    fn ray_cast_stops_on_blockers() {
        let blockers = BitBoard::from_square(Square::A4) | BitBoard::from_square(Square::C1);
        let attacks = ray_cast(Square::A1, Piece::Rook, blockers);
        let expected = [Square::A2, Square::A3, Square::A4, Square::B1, Square::C1]
            .iter()
            .fold(EMPTY, |b, s| b | BitBoard::from_square(*s));
        assert_eq!(attacks, expected);
    }
}
