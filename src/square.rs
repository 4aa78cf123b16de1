use crate::color::Color;
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Represent a square on the chess board.  A1 is 0, H8 is 63.
#[derive(PartialEq, Eq, Ord, PartialOrd, Copy, Clone, Debug, Default, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Square(u8);

/// How many squares are there?
pub const NUM_SQUARES: usize = 64;

impl Square {
    /// Create a new square, given an index.
    /// Note: It is invalid, but allowed, to pass in a number >= 64.  Doing so will crash stuff.
    #[inline]
    pub const fn new(sq: u8) -> Square {
        Square(sq)
    }

    /// Make a square given a rank and a file, both 0 to 7.
    #[inline]
    pub const fn make_square(rank: u8, file: u8) -> Square {
        Square((rank << 3) | file)
    }

    /// Return the rank given this square.
    #[inline]
    pub const fn rank(&self) -> u8 {
        self.0 >> 3
    }

    /// Return the file given this square.
    #[inline]
    pub const fn file(&self) -> u8 {
        self.0 & 7
    }

    /// Offset this square by whole ranks and files.  `None` if that walks off the board.
    #[inline]
    pub fn offset(&self, ranks: i8, files: i8) -> Option<Square> {
        let rank = self.rank() as i8 + ranks;
        let file = self.file() as i8 + files;
        if (0..8).contains(&rank) && (0..8).contains(&file) {
            Some(Square::make_square(rank as u8, file as u8))
        } else {
            None
        }
    }

    /// If there is a square "forward", given my `Color`, go in that direction.  Otherwise, None.
    #[inline]
    pub fn forward(&self, color: Color) -> Option<Square> {
        match color {
            Color::White => self.offset(1, 0),
            Color::Black => self.offset(-1, 0),
        }
    }

    /// If there is a square "backward", given my `Color`, go in that direction.  Otherwise, None.
    #[inline]
    pub fn backward(&self, color: Color) -> Option<Square> {
        self.forward(!color)
    }

    /// Forward without the bounds check.  Only call this when the pawn is not on its last rank.
    #[inline]
    pub fn uforward(&self, color: Color) -> Square {
        match color {
            Color::White => Square(self.0 + 8),
            Color::Black => Square(self.0 - 8),
        }
    }

    /// Backward without the bounds check.
    #[inline]
    pub fn ubackward(&self, color: Color) -> Square {
        self.uforward(!color)
    }

    /// Convert this square to an integer.
    #[inline]
    pub const fn to_int(&self) -> u8 {
        self.0
    }

    /// Convert this `Square` to a `usize` for table lookup purposes
    #[inline]
    pub const fn to_index(&self) -> usize {
        self.0 as usize
    }

    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A2: Square = Square(8);
    pub const B2: Square = Square(9);
    pub const C2: Square = Square(10);
    pub const D2: Square = Square(11);
    pub const E2: Square = Square(12);
    pub const F2: Square = Square(13);
    pub const G2: Square = Square(14);
    pub const H2: Square = Square(15);
    pub const A3: Square = Square(16);
    pub const B3: Square = Square(17);
    pub const C3: Square = Square(18);
    pub const D3: Square = Square(19);
    pub const E3: Square = Square(20);
    pub const F3: Square = Square(21);
    pub const G3: Square = Square(22);
    pub const H3: Square = Square(23);
    pub const A4: Square = Square(24);
    pub const B4: Square = Square(25);
    pub const C4: Square = Square(26);
    pub const D4: Square = Square(27);
    pub const E4: Square = Square(28);
    pub const F4: Square = Square(29);
    pub const G4: Square = Square(30);
    pub const H4: Square = Square(31);
    pub const A5: Square = Square(32);
    pub const B5: Square = Square(33);
    pub const C5: Square = Square(34);
    pub const D5: Square = Square(35);
    pub const E5: Square = Square(36);
    pub const F5: Square = Square(37);
    pub const G5: Square = Square(38);
    pub const H5: Square = Square(39);
    pub const A6: Square = Square(40);
    pub const B6: Square = Square(41);
    pub const C6: Square = Square(42);
    pub const D6: Square = Square(43);
    pub const E6: Square = Square(44);
    pub const F6: Square = Square(45);
    pub const G6: Square = Square(46);
    pub const H6: Square = Square(47);
    pub const A7: Square = Square(48);
    pub const B7: Square = Square(49);
    pub const C7: Square = Square(50);
    pub const D7: Square = Square(51);
    pub const E7: Square = Square(52);
    pub const F7: Square = Square(53);
    pub const G7: Square = Square(54);
    pub const H7: Square = Square(55);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);
}

impl FromStr for Square {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(Error::InvalidSquare { text: s.to_owned() });
        }
        match (bytes[0], bytes[1]) {
            (f @ b'a'..=b'h', r @ b'1'..=b'8') => Ok(Square::make_square(r - b'1', f - b'a')),
            _ => Err(Error::InvalidSquare { text: s.to_owned() }),
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file()) as char,
            (b'1' + self.rank()) as char
        )
    }
}

/// A list of every square on the chessboard.
pub const ALL_SQUARES: [Square; NUM_SQUARES] = {
    let mut result = [Square(0); NUM_SQUARES];
    let mut i = 0;
    while i < NUM_SQUARES {
        result[i] = Square(i as u8);
        i += 1;
    }
    result
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print() {
        assert_eq!("e4".parse::<Square>().unwrap(), Square::E4);
        assert_eq!(Square::H8.to_string(), "h8");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn offsets_stay_on_board() {
        assert_eq!(Square::A1.offset(-1, 0), None);
        assert_eq!(Square::H1.offset(0, 1), None);
        assert_eq!(Square::B1.offset(2, 1), Some(Square::C3));
        assert_eq!(Square::E2.forward(Color::Black), Some(Square::E1));
        assert_eq!(Square::E8.forward(Color::White), None);
    }
}
