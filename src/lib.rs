//! A bitboard chess engine core: magic attack tables built at startup, a strictly legal move
//! generator, and a multi-threaded principal-variation search driven through a
//! `SearchContext`.
pub mod bitboard;
pub mod castle_rights;
pub mod chess_move;
pub mod color;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluate;
pub mod fen;
pub mod magic;
pub mod movegen;
pub mod ordering;
pub mod piece;
pub mod position;
pub mod search;
pub mod square;
pub mod tables;
pub mod time_control;
pub mod transposition;
pub mod zobrist;

pub use crate::bitboard::{BitBoard, EMPTY};
pub use crate::castle_rights::{CastleRights, CastleType};
pub use crate::chess_move::ChessMove;
pub use crate::color::{Color, ALL_COLORS, NUM_COLORS};
pub use crate::config::{SearchConfig, SearchLimits};
pub use crate::context::{GameState, SearchContext, SearchInfo};
pub use crate::error::Error;
pub use crate::evaluate::{evaluate, material_eval, Stage};
pub use crate::fen::{Fen, STARTING_FEN};
pub use crate::movegen::{MoveGen, MoveList};
pub use crate::ordering::{see, HistoryTable, KillerMoves, MovePicker};
pub use crate::piece::{Piece, ALL_PIECES, NUM_PIECES};
pub use crate::position::Position;
pub use crate::search::{
    Aborted, Iteration, SearchStats, Searcher, ASP_EDGE, CHECKMATE_VALUE, HELPER_ASP_EDGE,
    MAX_DEPTH, MAX_EVAL,
};
pub use crate::square::{Square, ALL_SQUARES, NUM_SQUARES};
pub use crate::tables::construct;
pub use crate::time_control::{TimeManager, TimePreference};
pub use crate::transposition::{Bound, TranspositionTable, TtEntry};
pub use crate::zobrist::Zobrist;
