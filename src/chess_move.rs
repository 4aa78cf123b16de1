use crate::piece::Piece;
use crate::square::Square;
use std::fmt;

/// Bits 12-15 of a `ChessMove`.
///
/// ```text
/// prom cap  a   b
///  0    0   0   0   quiet
///  0    0   0   1   double pawn push
///  0    0   1   0   king castle
///  0    0   1   1   queen castle
///  0    1   0   0   capture
///  0    1   0   1   en-passant capture
///  1    0   x   x   promotion (knight, bishop, rook, queen)
///  1    1   x   x   promotion capture
/// ```
pub mod flags {
    pub const QUIET: u16 = 0x0;
    pub const DOUBLE_PAWN_PUSH: u16 = 0x1;
    pub const KING_CASTLE: u16 = 0x2;
    pub const QUEEN_CASTLE: u16 = 0x3;
    pub const CAPTURE: u16 = 0x4;
    pub const EP_CAPTURE: u16 = 0x5;
    pub const KNIGHT_PROMOTION: u16 = 0x8;
    pub const BISHOP_PROMOTION: u16 = 0x9;
    pub const ROOK_PROMOTION: u16 = 0xA;
    pub const QUEEN_PROMOTION: u16 = 0xB;
    pub const KNIGHT_PROMO_CAPTURE: u16 = 0xC;
    pub const BISHOP_PROMO_CAPTURE: u16 = 0xD;
    pub const ROOK_PROMO_CAPTURE: u16 = 0xE;
    pub const QUEEN_PROMO_CAPTURE: u16 = 0xF;

    pub const PROMOTION: u16 = 0x8;
    pub const CAPTURE_BIT: u16 = 0x4;
}

const FROM_MASK: u16 = 0x003F;
const TO_MASK: u16 = 0x0FC0;
const FLAG_MASK: u16 = 0xF000;

/// A move packed into 16 bits: origin in bits 0-5, destination in bits 6-11 and a
/// `flags` value in bits 12-15.  Equality is bitwise.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Default, Debug, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ChessMove(u16);

impl ChessMove {
    /// The empty move.  Never generated; used as "no move" in tables.
    pub const NONE: ChessMove = ChessMove(0);

    #[inline]
    pub fn new(source: Square, dest: Square, flags: u16) -> ChessMove {
        ChessMove(
            (source.to_int() as u16) | ((dest.to_int() as u16) << 6) | ((flags << 12) & FLAG_MASK),
        )
    }

    /// Build a promotion, `capture` selecting the promotion-capture flag.
    #[inline]
    pub fn new_promotion(source: Square, dest: Square, piece: Piece, capture: bool) -> ChessMove {
        let base = match piece {
            Piece::Knight => flags::KNIGHT_PROMOTION,
            Piece::Bishop => flags::BISHOP_PROMOTION,
            Piece::Rook => flags::ROOK_PROMOTION,
            _ => flags::QUEEN_PROMOTION,
        };
        let cap = if capture { flags::CAPTURE_BIT } else { 0 };
        ChessMove::new(source, dest, base | cap)
    }

    /// Rebuild a move from its raw 16 bits, as stored in the transposition table.
    #[inline]
    pub fn from_bits(bits: u16) -> ChessMove {
        ChessMove(bits)
    }

    #[inline]
    pub fn to_bits(&self) -> u16 {
        self.0
    }

    /// Get the source square (square the piece is currently on).
    #[inline]
    pub fn get_source(&self) -> Square {
        Square::new((self.0 & FROM_MASK) as u8)
    }

    /// Get the destination square (square the piece is going to).
    #[inline]
    pub fn get_dest(&self) -> Square {
        Square::new(((self.0 & TO_MASK) >> 6) as u8)
    }

    #[inline]
    pub fn flags(&self) -> u16 {
        (self.0 & FLAG_MASK) >> 12
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Quiet moves and double pawn pushes.  Everything above that changes material or
    /// castles.
    #[inline]
    pub fn is_quiet(&self) -> bool {
        self.flags() <= flags::DOUBLE_PAWN_PUSH
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.flags() & flags::CAPTURE_BIT != 0
    }

    #[inline]
    pub fn is_en_passant(&self) -> bool {
        self.flags() == flags::EP_CAPTURE
    }

    #[inline]
    pub fn is_castle(&self) -> bool {
        self.flags() == flags::KING_CASTLE || self.flags() == flags::QUEEN_CASTLE
    }

    #[inline]
    pub fn is_promotion(&self) -> bool {
        self.flags() & flags::PROMOTION != 0
    }

    /// Get the promotion piece (maybe).
    #[inline]
    pub fn get_promotion(&self) -> Option<Piece> {
        if !self.is_promotion() {
            return None;
        }
        Some(match self.flags() & 0x3 {
            0 => Piece::Knight,
            1 => Piece::Bishop,
            2 => Piece::Rook,
            _ => Piece::Queen,
        })
    }
}

/// UCI long algebraic text, e.g. `e2e4` or `e7e8q`.
impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_none() {
            return write!(f, "0000");
        }
        match self.get_promotion() {
            None => write!(f, "{}{}", self.get_source(), self.get_dest()),
            Some(p) => write!(f, "{}{}{}", self.get_source(), self.get_dest(), p),
        }
    }
}
