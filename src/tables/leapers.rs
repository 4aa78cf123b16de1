use crate::bitboard::{BitBoard, EMPTY};
use crate::color::{Color, ALL_COLORS, NUM_COLORS};
use crate::square::{ALL_SQUARES, NUM_SQUARES};

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

const KING_STEPS: [(i8, i8); 8] = [
    (1, 1),
    (1, 0),
    (1, -1),
    (0, 1),
    (0, -1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

fn steps_from_every_square(steps: &[(i8, i8)]) -> [BitBoard; NUM_SQUARES] {
    let mut result = [EMPTY; NUM_SQUARES];
    for src in ALL_SQUARES.iter() {
        result[src.to_index()] = steps
            .iter()
            .filter_map(|&(dr, df)| src.offset(dr, df))
            .fold(EMPTY, |b, s| b | BitBoard::from_square(s));
    }
    result
}

// Given a square, what are the valid knight moves?
pub fn gen_knight_moves() -> [BitBoard; NUM_SQUARES] {
    steps_from_every_square(&KNIGHT_STEPS)
}

// Given a square, what are the valid king moves?  Castling is handled by the move generator.
pub fn gen_king_moves() -> [BitBoard; NUM_SQUARES] {
    steps_from_every_square(&KING_STEPS)
}

// Diagonal captures for a pawn of each color.
pub fn gen_pawn_attacks() -> [[BitBoard; NUM_SQUARES]; NUM_COLORS] {
    let mut result = [[EMPTY; NUM_SQUARES]; NUM_COLORS];
    for color in ALL_COLORS.iter() {
        let dr = if *color == Color::White { 1 } else { -1 };
        for src in ALL_SQUARES.iter() {
            result[color.to_index()][src.to_index()] = [-1i8, 1]
                .iter()
                .filter_map(|&df| src.offset(dr, df))
                .fold(EMPTY, |b, s| b | BitBoard::from_square(s));
        }
    }
    result
}

// Quiet pawn pushes, including the double push from the second rank.
pub fn gen_pawn_moves() -> [[BitBoard; NUM_SQUARES]; NUM_COLORS] {
    let mut result = [[EMPTY; NUM_SQUARES]; NUM_COLORS];
    for color in ALL_COLORS.iter() {
        for src in ALL_SQUARES.iter() {
            result[color.to_index()][src.to_index()] = match src.forward(*color) {
                None => EMPTY,
                Some(one) if src.rank() == color.to_second_rank() => {
                    BitBoard::from_square(one) | BitBoard::from_square(one.uforward(*color))
                }
                Some(one) => BitBoard::from_square(one),
            };
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square;

    #[test]
    fn knight_in_corner_has_two_moves() {
        let knights = gen_knight_moves();
        assert_eq!(knights[Square::A1.to_index()].popcnt(), 2);
        assert_eq!(knights[Square::D4.to_index()].popcnt(), 8);
    }

    #[test]
    fn king_moves_count() {
        let kings = gen_king_moves();
        assert_eq!(kings[Square::H8.to_index()].popcnt(), 3);
        assert_eq!(kings[Square::E4.to_index()].popcnt(), 8);
    }

    #[test]
    fn pawn_tables() {
        let attacks = gen_pawn_attacks();
        let pushes = gen_pawn_moves();
        assert_eq!(
            attacks[Color::White.to_index()][Square::A2.to_index()],
            BitBoard::from_square(Square::B3)
        );
        assert_eq!(
            pushes[Color::Black.to_index()][Square::E7.to_index()],
            BitBoard::from_square(Square::E6) | BitBoard::from_square(Square::E5)
        );
        assert_eq!(pushes[Color::White.to_index()][Square::E8.to_index()], EMPTY);
    }
}
