use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::bitboard::{BitBoard, EMPTY};
use crate::error::Error;
use crate::piece::Piece;
use crate::square::{Square, ALL_SQUARES, NUM_SQUARES};
use crate::tables::magic_helpers::{
    magic_mask, questions_and_answers, random_bitboard, ray_cast, slider_name, subsets,
};

/// Candidates tried per square before giving up.
pub const MAX_MAGIC_TRIALS: usize = 100_000_000;

// Fixed so every process builds identical tables.
const MAGIC_SEED: u64 = 0x5EED_0F_C0FFEE;

/// Per-square perfect hash into the shared attack array.
#[derive(Copy, Clone, Debug, Default)]
pub struct Magic {
    pub magic_number: BitBoard,
    pub mask: BitBoard,
    pub offset: u32,
    pub rightshift: u8,
}

impl Magic {
    #[inline]
    pub fn index(&self, blockers: BitBoard) -> usize {
        (self.offset as usize) + ((blockers & self.mask) * self.magic_number).to_size(self.rightshift)
    }
}

/// Rook magics at index 0, bishop magics at index 1, plus the attack array both index into.
pub struct MagicTables {
    pub magics: [[Magic; NUM_SQUARES]; 2],
    pub moves: Vec<BitBoard>,
}

pub const ROOK: usize = 0;
pub const BISHOP: usize = 1;

// Find a perfect hashing function for the move generation for a particular square and piece
// type.  The attack sets are appended to `moves`.
fn generate_magic<R: rand::Rng>(
    sq: Square,
    piece: Piece,
    moves: &mut Vec<BitBoard>,
    rng: &mut R,
) -> Result<Magic, Error> {
    let (questions, answers) = questions_and_answers(sq, piece);
    let mask = magic_mask(sq, piece);
    let bits = mask.popcnt();

    let mut new_magic = Magic {
        magic_number: EMPTY,
        mask,
        offset: moves.len() as u32,
        rightshift: (64 - bits) as u8,
    };

    // Attack sets are never empty, so EMPTY marks an unused slot.
    let mut table = vec![EMPTY; questions.len()];

    for trial in 0..MAX_MAGIC_TRIALS {
        let candidate = random_bitboard(rng);

        if ((mask * candidate).0 >> 56).count_ones() < 6 {
            continue;
        }

        for slot in table.iter_mut() {
            *slot = EMPTY;
        }

        let mut collision = false;
        for (question, answer) in questions.iter().zip(answers.iter()) {
            let j = (*question * candidate).to_size(new_magic.rightshift);
            if table[j] == EMPTY {
                table[j] = *answer;
            } else if table[j] != *answer {
                collision = true;
                break;
            }
        }

        if !collision {
            new_magic.magic_number = candidate;
            moves.extend_from_slice(&table);
            if trial > 100_000 {
                debug!("{} magic for {} took {} trials", slider_name(piece), sq, trial);
            }
            return Ok(new_magic);
        }
    }

    Err(Error::MagicNotFound {
        square: sq,
        slider: slider_name(piece),
    })
}

/// Recompute every blocker subset by ray-casting and compare with the table.
pub fn verify_magic(
    sq: Square,
    piece: Piece,
    magic: &Magic,
    moves: &[BitBoard],
) -> Result<(), Error> {
    for blockers in subsets(magic.mask) {
        let expected = ray_cast(sq, piece, blockers);
        let found = moves.get(magic.index(blockers)).copied().unwrap_or(EMPTY);
        if found != expected {
            return Err(Error::MagicMismatch {
                square: sq,
                slider: slider_name(piece),
            });
        }
    }
    Ok(())
}

// Generate and verify the magic for each square for both rooks and bishops.
pub fn gen_all_magic() -> Result<MagicTables, Error> {
    let mut rng = SmallRng::seed_from_u64(MAGIC_SEED);
    let mut magics = [[Magic::default(); NUM_SQUARES]; 2];
    let mut moves = Vec::with_capacity(64 * (1 << 12) + 64 * (1 << 9));

    for (idx, piece) in [(ROOK, Piece::Rook), (BISHOP, Piece::Bishop)].iter() {
        for sq in ALL_SQUARES.iter() {
            magics[*idx][sq.to_index()] = generate_magic(*sq, *piece, &mut moves, &mut rng)?;
        }
    }

    for (idx, piece) in [(ROOK, Piece::Rook), (BISHOP, Piece::Bishop)].iter() {
        for sq in ALL_SQUARES.iter() {
            verify_magic(*sq, *piece, &magics[*idx][sq.to_index()], &moves)?;
        }
    }

    debug!("magic tables built: {} attack sets", moves.len());
    Ok(MagicTables { magics, moves })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupted_table_fails_verification() {
        let tables = gen_all_magic().unwrap();
        let magic = tables.magics[ROOK][Square::D4.to_index()];
        let mut moves = tables.moves.clone();
        moves[magic.index(EMPTY)] = EMPTY;
        assert_eq!(
            verify_magic(Square::D4, Piece::Rook, &magic, &moves),
            Err(Error::MagicMismatch {
                square: Square::D4,
                slider: "rook"
            })
        );
    }

    #[test]
    fn table_is_densely_packed() {
        let tables = gen_all_magic().unwrap();
        // 102400 rook entries and 5248 bishop entries
        assert_eq!(tables.moves.len(), 102_400 + 5_248);
    }
}
