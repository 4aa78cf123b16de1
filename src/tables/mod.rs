//! Attack tables, built once per process and shared read-only by every thread.

pub mod leapers;
pub mod lines;
pub mod magic;
pub mod magic_helpers;

use log::debug;
use once_cell::sync::OnceCell;

use crate::bitboard::BitBoard;
use crate::color::NUM_COLORS;
use crate::error::Error;
use crate::square::NUM_SQUARES;

pub use self::magic::{Magic, BISHOP, ROOK};

/// Every precomputed lookup the move generator needs.
pub struct AttackTables {
    pub rays: [[BitBoard; NUM_SQUARES]; 2],
    pub knight_moves: [BitBoard; NUM_SQUARES],
    pub king_moves: [BitBoard; NUM_SQUARES],
    pub pawn_attacks: [[BitBoard; NUM_SQUARES]; NUM_COLORS],
    pub pawn_moves: [[BitBoard; NUM_SQUARES]; NUM_COLORS],
    pub between: lines::SquarePairs,
    pub line: lines::SquarePairs,
    pub ranks: [BitBoard; 8],
    pub files: [BitBoard; 8],
    pub adjacent_files: [BitBoard; 8],
    pub magics: [[Magic; NUM_SQUARES]; 2],
    pub moves: Vec<BitBoard>,
}

static TABLES: OnceCell<AttackTables> = OnceCell::new();

fn build() -> Result<AttackTables, Error> {
    debug!("generating attack tables");
    let magic_tables = magic::gen_all_magic()?;
    let files = lines::gen_files();
    let tables = AttackTables {
        rays: lines::gen_rays(),
        knight_moves: leapers::gen_knight_moves(),
        king_moves: leapers::gen_king_moves(),
        pawn_attacks: leapers::gen_pawn_attacks(),
        pawn_moves: leapers::gen_pawn_moves(),
        between: lines::gen_between(),
        line: lines::gen_lines(),
        ranks: lines::gen_ranks(),
        files,
        adjacent_files: lines::gen_adjacent_files(&files),
        magics: magic_tables.magics,
        moves: magic_tables.moves,
    };
    debug!("attack tables verified");
    Ok(tables)
}

/// Build and verify the attack tables.  Only the first call does any work; later calls,
/// from any thread, return immediately.
pub fn construct() -> Result<(), Error> {
    TABLES.get_or_try_init(build).map(|_| ())
}

/// The shared tables.  Built on first use if `construct` has not been called; panics only
/// if that build fails.
#[inline]
pub fn tables() -> &'static AttackTables {
    match TABLES.get() {
        Some(t) => t,
        None => match TABLES.get_or_try_init(build) {
            Ok(t) => t,
            Err(e) => panic!("attack table initialization failed: {}", e),
        },
    }
}
