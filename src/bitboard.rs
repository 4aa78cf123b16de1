use crate::square::Square;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Mul, Not};

/// A set of squares, one bit per square, A1 is the least significant bit.
///
/// ```
/// use chess_search::{BitBoard, Square};
///
/// let bb = BitBoard(7); // A1, B1, C1
///
/// assert_eq!(bb.popcnt(), 3);
/// assert_eq!(bb.collect::<Vec<Square>>(), vec![Square::A1, Square::B1, Square::C1]);
/// ```
#[derive(PartialEq, Eq, PartialOrd, Clone, Copy, Debug, Default, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BitBoard(pub u64);

/// An empty bitboard.  `!EMPTY` is every square.
pub const EMPTY: BitBoard = BitBoard(0);

macro_rules! bitboard_binop {
    ($tr:ident, $func:ident, $assign_tr:ident, $assign_func:ident, $op:tt) => {
        impl $tr for BitBoard {
            type Output = BitBoard;

            #[inline]
            fn $func(self, other: BitBoard) -> BitBoard {
                BitBoard(self.0 $op other.0)
            }
        }

        impl $tr<&BitBoard> for BitBoard {
            type Output = BitBoard;

            #[inline]
            fn $func(self, other: &BitBoard) -> BitBoard {
                BitBoard(self.0 $op other.0)
            }
        }

        impl $tr<BitBoard> for &BitBoard {
            type Output = BitBoard;

            #[inline]
            fn $func(self, other: BitBoard) -> BitBoard {
                BitBoard(self.0 $op other.0)
            }
        }

        impl $assign_tr for BitBoard {
            #[inline]
            fn $assign_func(&mut self, other: BitBoard) {
                self.0 = self.0 $op other.0;
            }
        }
    };
}

bitboard_binop!(BitAnd, bitand, BitAndAssign, bitand_assign, &);
bitboard_binop!(BitOr, bitor, BitOrAssign, bitor_assign, |);
bitboard_binop!(BitXor, bitxor, BitXorAssign, bitxor_assign, ^);

// Magic index computation needs wrapping multiplication.
impl Mul for BitBoard {
    type Output = BitBoard;

    #[inline]
    fn mul(self, other: BitBoard) -> BitBoard {
        BitBoard(self.0.wrapping_mul(other.0))
    }
}

impl Not for BitBoard {
    type Output = BitBoard;

    #[inline]
    fn not(self) -> BitBoard {
        BitBoard(!self.0)
    }
}

impl Not for &BitBoard {
    type Output = BitBoard;

    #[inline]
    fn not(self) -> BitBoard {
        BitBoard(!self.0)
    }
}

/// Print rank 8 at the top, the way the board is usually drawn.
impl fmt::Display for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let sq = Square::make_square(rank, file);
                if *self & BitBoard::from_square(sq) != EMPTY {
                    write!(f, "X ")?;
                } else {
                    write!(f, ". ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl BitBoard {
    /// Construct a new bitboard from a u64
    #[inline]
    pub fn new(b: u64) -> BitBoard {
        BitBoard(b)
    }

    /// Construct a new `BitBoard` with a particular `Square` set
    #[inline]
    pub fn from_square(sq: Square) -> BitBoard {
        BitBoard(1u64 << sq.to_int())
    }

    /// Convert an `Option<Square>` to a `BitBoard`, empty for `None`.
    #[inline]
    pub fn from_maybe_square(sq: Option<Square>) -> BitBoard {
        sq.map(BitBoard::from_square).unwrap_or(EMPTY)
    }

    /// The least significant `Square` in this `BitBoard`.  Meaningless on `EMPTY`.
    #[inline]
    pub fn to_square(&self) -> Square {
        Square::new(self.0.trailing_zeros() as u8)
    }

    /// Isolate the least significant bit.
    #[inline]
    pub fn lsb(&self) -> BitBoard {
        BitBoard(self.0 & self.0.wrapping_neg())
    }

    /// Count the number of `Squares` set in this `BitBoard`
    #[inline]
    pub fn popcnt(&self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// More than one square set?
    #[inline]
    pub fn more_than_one(&self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    /// Shift right and convert to a `usize` for table lookups
    #[inline]
    pub fn to_size(&self, rightshift: u8) -> usize {
        (self.0 >> rightshift) as usize
    }
}

/// For the `BitBoard`, iterate over every `Square` set.
impl Iterator for BitBoard {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            let result = self.to_square();
            self.0 &= self.0 - 1;
            Some(result)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.popcnt() as usize;
        (n, Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterate_in_square_order() {
        let bb = BitBoard::from_square(Square::H8) | BitBoard::from_square(Square::A1);
        let squares: Vec<Square> = bb.collect();
        assert_eq!(squares, vec![Square::A1, Square::H8]);
    }

    #[test]
    fn more_than_one() {
        assert!(!EMPTY.more_than_one());
        assert!(!BitBoard::from_square(Square::E4).more_than_one());
        assert!(BitBoard(0b101).more_than_one());
    }

    #[test]
    fn display_puts_rank_eight_first() {
        let s = format!("{}", BitBoard::from_square(Square::A8));
        assert!(s.starts_with("X . . . . . . ."));
    }
}
