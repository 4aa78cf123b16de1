use std::ops::Not;

/// Represent a color.
#[derive(PartialOrd, PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    White,
    Black,
}

/// How many colors are there?
pub const NUM_COLORS: usize = 2;
/// List all colors
pub const ALL_COLORS: [Color; NUM_COLORS] = [Color::White, Color::Black];

impl Color {
    /// Convert the `Color` to a `usize` for table lookups.
    #[inline]
    pub fn to_index(&self) -> usize {
        *self as usize
    }

    /// The rank my pieces start on, 0 for white.
    #[inline]
    pub fn to_my_backrank(&self) -> u8 {
        match *self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// The rank my pawns start on.
    #[inline]
    pub fn to_second_rank(&self) -> u8 {
        match *self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// The rank my pawns land on after a double push.
    #[inline]
    pub fn to_fourth_rank(&self) -> u8 {
        match *self {
            Color::White => 3,
            Color::Black => 4,
        }
    }

    /// The rank my pawns promote from.
    #[inline]
    pub fn to_seventh_rank(&self) -> u8 {
        match *self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// +1 for white, -1 for black.  Converts white-relative scores to mover-relative ones.
    #[inline]
    pub fn sign(&self) -> i32 {
        match *self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl Not for Color {
    type Output = Color;

    /// Get the other color.
    #[inline]
    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}
