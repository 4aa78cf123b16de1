use crate::bitboard::BitBoard;
use crate::color::Color;
use crate::square::Square;
use std::fmt;

/// The four castling flags packed into a nibble.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Debug, Default, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CastleRights(u8);

/// Which side of the board a castle goes to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CastleType {
    Kingside,
    Queenside,
}

const WHITE_KINGSIDE: u8 = 0b0001;
const WHITE_QUEENSIDE: u8 = 0b0010;
const BLACK_KINGSIDE: u8 = 0b0100;
const BLACK_QUEENSIDE: u8 = 0b1000;

// Rights that survive a move touching each square.
const KEEP_PER_SQUARE: [u8; 64] = {
    let mut keep = [0b1111u8; 64];
    keep[0] = !WHITE_QUEENSIDE & 0b1111; // a1
    keep[4] = !(WHITE_KINGSIDE | WHITE_QUEENSIDE) & 0b1111; // e1
    keep[7] = !WHITE_KINGSIDE & 0b1111; // h1
    keep[56] = !BLACK_QUEENSIDE & 0b1111; // a8
    keep[60] = !(BLACK_KINGSIDE | BLACK_QUEENSIDE) & 0b1111; // e8
    keep[63] = !BLACK_KINGSIDE & 0b1111; // h8
    keep
};

impl CastleRights {
    pub const NONE: CastleRights = CastleRights(0);
    pub const ALL: CastleRights = CastleRights(0b1111);

    #[inline]
    fn bit(color: Color, castle_type: CastleType) -> u8 {
        match (color, castle_type) {
            (Color::White, CastleType::Kingside) => WHITE_KINGSIDE,
            (Color::White, CastleType::Queenside) => WHITE_QUEENSIDE,
            (Color::Black, CastleType::Kingside) => BLACK_KINGSIDE,
            (Color::Black, CastleType::Queenside) => BLACK_QUEENSIDE,
        }
    }

    #[inline]
    pub fn has(&self, color: Color, castle_type: CastleType) -> bool {
        self.0 & CastleRights::bit(color, castle_type) != 0
    }

    #[inline]
    pub fn add(&self, color: Color, castle_type: CastleType) -> CastleRights {
        CastleRights(self.0 | CastleRights::bit(color, castle_type))
    }

    /// Drop whatever rights a move from `source` to `dest` destroys.  Moving a king or a
    /// rook off its home square, or capturing on a rook's home square, loses that right.
    #[inline]
    pub fn after_move(&self, source: Square, dest: Square) -> CastleRights {
        CastleRights(
            self.0 & KEEP_PER_SQUARE[source.to_index()] & KEEP_PER_SQUARE[dest.to_index()],
        )
    }

    /// The raw nibble, for hashing.
    #[inline]
    pub fn to_index(&self) -> usize {
        self.0 as usize
    }
}

impl CastleType {
    /// Where the king lands.
    #[inline]
    pub fn king_dest(&self, color: Color) -> Square {
        let file = match *self {
            CastleType::Kingside => 6,
            CastleType::Queenside => 2,
        };
        Square::make_square(color.to_my_backrank(), file)
    }

    /// Where the rook starts.
    #[inline]
    pub fn rook_source(&self, color: Color) -> Square {
        let file = match *self {
            CastleType::Kingside => 7,
            CastleType::Queenside => 0,
        };
        Square::make_square(color.to_my_backrank(), file)
    }

    /// Where the rook lands.
    #[inline]
    pub fn rook_dest(&self, color: Color) -> Square {
        let file = match *self {
            CastleType::Kingside => 5,
            CastleType::Queenside => 3,
        };
        Square::make_square(color.to_my_backrank(), file)
    }

    /// Squares that must be empty, between king and rook.
    pub fn empty_squares(&self, color: Color) -> BitBoard {
        let rank = color.to_my_backrank();
        let files: &[u8] = match *self {
            CastleType::Kingside => &[5, 6],
            CastleType::Queenside => &[1, 2, 3],
        };
        files.iter().fold(BitBoard(0), |bb, f| {
            bb | BitBoard::from_square(Square::make_square(rank, *f))
        })
    }

    /// Squares the king passes through, landing square included, which must not be
    /// attacked.
    pub fn king_path(&self, color: Color) -> BitBoard {
        let rank = color.to_my_backrank();
        let files: &[u8] = match *self {
            CastleType::Kingside => &[5, 6],
            CastleType::Queenside => &[2, 3],
        };
        files.iter().fold(BitBoard(0), |bb, f| {
            bb | BitBoard::from_square(Square::make_square(rank, *f))
        })
    }
}

/// FEN castling field, `-` when nobody can castle.
impl fmt::Display for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }
        for (bit, c) in [
            (WHITE_KINGSIDE, 'K'),
            (WHITE_QUEENSIDE, 'Q'),
            (BLACK_KINGSIDE, 'k'),
            (BLACK_QUEENSIDE, 'q'),
        ]
        .iter()
        {
            if self.0 & bit != 0 {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn king_move_clears_both_sides() {
        let rights = CastleRights::ALL.after_move(Square::E1, Square::E2);
        assert!(!rights.has(Color::White, CastleType::Kingside));
        assert!(!rights.has(Color::White, CastleType::Queenside));
        assert!(rights.has(Color::Black, CastleType::Kingside));
        assert_eq!(rights.to_string(), "kq");
    }

    #[test]
    fn capturing_a_rook_clears_its_side() {
        let rights = CastleRights::ALL.after_move(Square::B7, Square::H8);
        assert!(!rights.has(Color::Black, CastleType::Kingside));
        assert!(rights.has(Color::Black, CastleType::Queenside));
    }
}
