use once_cell::sync::Lazy;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::castle_rights::CastleRights;
use crate::color::{Color, NUM_COLORS};
use crate::piece::{Piece, NUM_PIECES};
use crate::square::{Square, NUM_SQUARES};

/// Create a completely blank type.  This allows all the functions to be part of this type, which I
/// think is a bit cleaner than bare functions everywhere.
pub struct Zobrist;

struct ZobristKeys {
    side_to_move: u64,
    pieces: [[[u64; NUM_SQUARES]; NUM_PIECES]; NUM_COLORS],
    // One key per combination of the four castle bits, each the XOR of its bits' keys.
    castles: [u64; 16],
    en_passant: [u64; 8],
}

static KEYS: Lazy<ZobristKeys> = Lazy::new(|| {
    let mut rng = SmallRng::seed_from_u64(0xDEADBEEF12345678);

    let side_to_move = rng.next_u64();

    let mut pieces = [[[0u64; NUM_SQUARES]; NUM_PIECES]; NUM_COLORS];
    for color in pieces.iter_mut() {
        for piece in color.iter_mut() {
            for key in piece.iter_mut() {
                *key = rng.next_u64();
            }
        }
    }

    let bits = [rng.next_u64(), rng.next_u64(), rng.next_u64(), rng.next_u64()];
    let mut castles = [0u64; 16];
    for (rights, key) in castles.iter_mut().enumerate() {
        *key = (0..4)
            .filter(|b| rights & (1 << b) != 0)
            .fold(0, |acc, b| acc ^ bits[b]);
    }

    let mut en_passant = [0u64; 8];
    for key in en_passant.iter_mut() {
        *key = rng.next_u64();
    }

    ZobristKeys {
        side_to_move,
        pieces,
        castles,
        en_passant,
    }
});

impl Zobrist {
    /// Get the value for a particular piece
    #[inline]
    pub fn piece(piece: Piece, square: Square, color: Color) -> u64 {
        KEYS.pieces[color.to_index()][piece.to_index()][square.to_index()]
    }

    /// The key for a whole set of castle rights.  No rights hash to zero.
    #[inline]
    pub fn castles(castle_rights: CastleRights) -> u64 {
        KEYS.castles[castle_rights.to_index()]
    }

    /// The key for an en-passant target on `file`.
    #[inline]
    pub fn en_passant(file: u8) -> u64 {
        KEYS.en_passant[file as usize]
    }

    /// XORed in when black is to move.
    #[inline]
    pub fn color() -> u64 {
        KEYS.side_to_move
    }
}
