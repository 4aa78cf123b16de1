use crate::bitboard::{BitBoard, EMPTY};
use crate::castle_rights::{CastleRights, CastleType};
use crate::chess_move::{flags, ChessMove};
use crate::color::{Color, ALL_COLORS, NUM_COLORS};
use crate::error::Error;
use crate::evaluate::Stage;
use crate::fen::Fen;
use crate::magic::{
    between, get_bishop_moves, get_bishop_rays, get_king_moves, get_knight_moves,
    get_pawn_attacks, get_rank, get_rook_moves, get_rook_rays,
};
use crate::movegen::MoveGen;
use crate::piece::{Piece, ALL_PIECES, NUM_PIECES};
use crate::square::{Square, ALL_SQUARES};
use crate::zobrist::Zobrist;

use log::warn;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// Fullmove number up to which the game counts as the opening.
pub const OPN_GAME_MOVES: u32 = 8;
/// Piece count at or below which the game counts as an endgame.
pub const END_GAME_PIECES: u32 = 16;

const LIGHT_SQUARES: BitBoard = BitBoard(0x55AA_55AA_55AA_55AA);

/// A chess position.  Moves are applied by copying: `make_move` returns a new `Position` and
/// leaves `self` alone, so undoing a move is just going back to the parent value.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Position {
    pieces: [BitBoard; NUM_PIECES],
    color_combined: [BitBoard; NUM_COLORS],
    combined: BitBoard,
    side_to_move: Color,
    castle_rights: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
    attacks: [BitBoard; NUM_COLORS],
    pinned: BitBoard,
    checkers: BitBoard,
}

impl Default for Position {
    /// The standard starting position.
    fn default() -> Position {
        match Position::try_from(&Fen::default()) {
            Ok(position) => position,
            Err(e) => unreachable!("starting position rejected: {}", e),
        }
    }
}

impl Position {
    fn empty() -> Position {
        Position {
            pieces: [EMPTY; NUM_PIECES],
            color_combined: [EMPTY; NUM_COLORS],
            combined: EMPTY,
            side_to_move: Color::White,
            castle_rights: CastleRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            attacks: [EMPTY; NUM_COLORS],
            pinned: EMPTY,
            checkers: EMPTY,
        }
    }

    /// Parse and validate a FEN string.
    pub fn from_fen(fen: &str) -> Result<Position, Error> {
        let parsed = Fen::from_str(fen).map_err(|e| {
            warn!("rejected FEN {:?}", fen);
            e
        })?;
        Position::try_from(&parsed).map_err(|e| {
            warn!("rejected FEN {:?}: {}", fen, e);
            e
        })
    }

    pub fn to_fen(&self) -> String {
        Fen::from(self).to_string()
    }

    /// A `BitBoard` of every occupied square.
    #[inline]
    pub fn combined(&self) -> BitBoard {
        self.combined
    }

    /// Every square occupied by a piece of `color`.
    #[inline]
    pub fn color_combined(&self, color: Color) -> BitBoard {
        self.color_combined[color.to_index()]
    }

    /// Every square occupied by a `piece` of either color.
    #[inline]
    pub fn pieces(&self, piece: Piece) -> BitBoard {
        self.pieces[piece.to_index()]
    }

    #[inline]
    pub fn pieces_of(&self, piece: Piece, color: Color) -> BitBoard {
        self.pieces[piece.to_index()] & self.color_combined[color.to_index()]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castle_rights(&self) -> CastleRights {
        self.castle_rights
    }

    /// The en-passant target square, if the last move was a double pawn push that an enemy pawn
    /// can capture.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// The Zobrist hash, maintained incrementally by `make_move`.
    #[inline]
    pub fn get_hash(&self) -> u64 {
        self.hash
    }

    /// Pieces of the side to move that are pinned to their king.
    #[inline]
    pub fn pinned(&self) -> BitBoard {
        self.pinned
    }

    /// Enemy pieces giving check.
    #[inline]
    pub fn checkers(&self) -> BitBoard {
        self.checkers
    }

    /// Squares attacked by `color`.  The attacks of the side not to move pass through the
    /// mover's king, so a king can never step back along a checking ray.
    #[inline]
    pub fn attacks(&self, color: Color) -> BitBoard {
        self.attacks[color.to_index()]
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        self.checkers != EMPTY
    }

    #[inline]
    pub fn in_double_check(&self) -> bool {
        self.checkers.popcnt() == 2
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces_of(Piece::King, color).to_square()
    }

    /// What piece is on a particular `Square`?  Is there even one?
    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        let opp = BitBoard::from_square(square);
        if self.combined & opp == EMPTY {
            return None;
        }
        ALL_PIECES
            .iter()
            .find(|p| self.pieces[p.to_index()] & opp != EMPTY)
            .copied()
    }

    /// What color piece is on a particular square?
    #[inline]
    pub fn color_on(&self, square: Square) -> Option<Color> {
        let bb = BitBoard::from_square(square);
        if self.color_combined(Color::White) & bb != EMPTY {
            Some(Color::White)
        } else if self.color_combined(Color::Black) & bb != EMPTY {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Pieces of both colors that attack `sq`, given the occupancy `occupied`.
    pub fn attackers_to(&self, sq: Square, occupied: BitBoard) -> BitBoard {
        let rooks = self.pieces(Piece::Rook) | self.pieces(Piece::Queen);
        let bishops = self.pieces(Piece::Bishop) | self.pieces(Piece::Queen);
        (get_rook_moves(sq, occupied) & rooks)
            | (get_bishop_moves(sq, occupied) & bishops)
            | (get_knight_moves(sq) & self.pieces(Piece::Knight))
            | (get_king_moves(sq) & self.pieces(Piece::King))
            | get_pawn_attacks(sq, Color::White, self.pieces_of(Piece::Pawn, Color::Black))
            | get_pawn_attacks(sq, Color::Black, self.pieces_of(Piece::Pawn, Color::White))
    }

    /// Every square `color` attacks, with sliders blocked by `occupied`.
    fn attacks_by(&self, color: Color, occupied: BitBoard) -> BitBoard {
        let mut result = EMPTY;
        for sq in self.pieces_of(Piece::Pawn, color) {
            result |= get_pawn_attacks(sq, color, !EMPTY);
        }
        for sq in self.pieces_of(Piece::Knight, color) {
            result |= get_knight_moves(sq);
        }
        for sq in self.pieces_of(Piece::Bishop, color) | self.pieces_of(Piece::Queen, color) {
            result |= get_bishop_moves(sq, occupied);
        }
        for sq in self.pieces_of(Piece::Rook, color) | self.pieces_of(Piece::Queen, color) {
            result |= get_rook_moves(sq, occupied);
        }
        for sq in self.pieces_of(Piece::King, color) {
            result |= get_king_moves(sq);
        }
        result
    }

    /// Recompute every derived field (attacks, pins and checkers) from the piece placement.
    /// Each way of producing a position ends here.
    fn refresh(&mut self) {
        let us = self.side_to_move;
        let them = !us;
        let ksq = self.king_square(us);
        let my_king = BitBoard::from_square(ksq);

        self.attacks[us.to_index()] = self.attacks_by(us, self.combined);
        self.attacks[them.to_index()] = self.attacks_by(them, self.combined ^ my_king);

        self.pinned = EMPTY;
        self.checkers = EMPTY;

        let pinners = self.color_combined(them)
            & ((get_bishop_rays(ksq)
                & (self.pieces(Piece::Bishop) | self.pieces(Piece::Queen)))
                | (get_rook_rays(ksq) & (self.pieces(Piece::Rook) | self.pieces(Piece::Queen))));

        for sq in pinners {
            let blockers = between(sq, ksq) & self.combined;
            if blockers == EMPTY {
                self.checkers ^= BitBoard::from_square(sq);
            } else if !blockers.more_than_one() {
                self.pinned ^= blockers & self.color_combined(us);
            }
        }

        self.checkers ^= get_knight_moves(ksq) & self.pieces_of(Piece::Knight, them);
        self.checkers ^= get_pawn_attacks(ksq, us, self.pieces_of(Piece::Pawn, them));
    }

    /// Zobrist hash computed from scratch.
    pub fn compute_hash(&self) -> u64 {
        let mut hash = 0;
        for sq in ALL_SQUARES.iter() {
            if let (Some(piece), Some(color)) = (self.piece_on(*sq), self.color_on(*sq)) {
                hash ^= Zobrist::piece(piece, *sq, color);
            }
        }
        hash ^= Zobrist::castles(self.castle_rights);
        if let Some(ep) = self.en_passant {
            hash ^= Zobrist::en_passant(ep.file());
        }
        if self.side_to_move == Color::Black {
            hash ^= Zobrist::color();
        }
        hash
    }

    #[inline]
    fn xor(&mut self, piece: Piece, sq: Square, color: Color) {
        let bb = BitBoard::from_square(sq);
        self.pieces[piece.to_index()] ^= bb;
        self.color_combined[color.to_index()] ^= bb;
        self.combined ^= bb;
        self.hash ^= Zobrist::piece(piece, sq, color);
    }

    /// Apply a legal move, returning the resulting position.
    pub fn make_move(&self, m: ChessMove) -> Position {
        let mut result = *self;
        let us = self.side_to_move;
        let them = !us;
        let source = m.get_source();
        let dest = m.get_dest();

        debug_assert!(self.color_on(source) == Some(us), "no piece to move for {}", m);
        let moved = self.piece_on(source).unwrap_or(Piece::Pawn);

        result.hash ^= Zobrist::castles(self.castle_rights);
        if let Some(ep) = self.en_passant {
            result.hash ^= Zobrist::en_passant(ep.file());
        }
        result.en_passant = None;

        if m.is_en_passant() {
            result.xor(Piece::Pawn, dest.ubackward(us), them);
        } else if m.is_capture() {
            if let Some(captured) = self.piece_on(dest) {
                result.xor(captured, dest, them);
            }
        }

        result.xor(moved, source, us);
        result.xor(m.get_promotion().unwrap_or(moved), dest, us);

        match m.flags() {
            flags::KING_CASTLE | flags::QUEEN_CASTLE => {
                let castle_type = if m.flags() == flags::KING_CASTLE {
                    CastleType::Kingside
                } else {
                    CastleType::Queenside
                };
                result.xor(Piece::Rook, castle_type.rook_source(us), us);
                result.xor(Piece::Rook, castle_type.rook_dest(us), us);
            }
            flags::DOUBLE_PAWN_PUSH => {
                let skipped = source.uforward(us);
                if get_pawn_attacks(skipped, us, result.pieces_of(Piece::Pawn, them)) != EMPTY {
                    result.en_passant = Some(skipped);
                    result.hash ^= Zobrist::en_passant(skipped.file());
                }
            }
            _ => {}
        }

        result.castle_rights = self.castle_rights.after_move(source, dest);
        result.hash ^= Zobrist::castles(result.castle_rights);

        if moved == Piece::Pawn || m.is_capture() {
            result.halfmove_clock = 0;
        } else {
            result.halfmove_clock += 1;
        }
        if us == Color::Black {
            result.fullmove_number += 1;
        }

        result.side_to_move = them;
        result.hash ^= Zobrist::color();
        result.refresh();

        debug_assert_eq!(result.hash, result.compute_hash());
        result
    }

    /// Pass the turn without moving.  Only meaningful when not in check.
    pub fn make_null_move(&self) -> Position {
        let mut result = *self;
        if let Some(ep) = self.en_passant {
            result.hash ^= Zobrist::en_passant(ep.file());
        }
        result.en_passant = None;
        result.side_to_move = !self.side_to_move;
        result.hash ^= Zobrist::color();
        result.halfmove_clock += 1;
        result.refresh();
        result
    }

    /// Neither side can possibly deliver mate: bare kings, a single minor piece, or one bishop
    /// each on the same square color.
    pub fn is_insufficient_material(&self) -> bool {
        if self.pieces(Piece::Pawn) | self.pieces(Piece::Rook) | self.pieces(Piece::Queen)
            != EMPTY
        {
            return false;
        }
        let minors = self.pieces(Piece::Knight) | self.pieces(Piece::Bishop);
        if minors.popcnt() <= 1 {
            return true;
        }
        let bishops = self.pieces(Piece::Bishop);
        minors == bishops
            && bishops.popcnt() == 2
            && self.pieces_of(Piece::Bishop, Color::White).popcnt() == 1
            && ((bishops & LIGHT_SQUARES) == EMPTY || (bishops & !LIGHT_SQUARES) == EMPTY)
    }

    /// The fifty-move rule.
    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Does the side to move have a pawn on its seventh rank that can advance or capture?
    pub fn can_promote_pawn(&self) -> bool {
        let us = self.side_to_move;
        let candidates = self.pieces_of(Piece::Pawn, us) & get_rank(us.to_seventh_rank());
        candidates.into_iter().any(|sq| {
            let push = BitBoard::from_square(sq.uforward(us)) & !self.combined;
            let captures = get_pawn_attacks(sq, us, self.color_combined(!us));
            (push | captures) != EMPTY
        })
    }

    pub fn stage(&self) -> Stage {
        if self.fullmove_number <= OPN_GAME_MOVES {
            Stage::Opening
        } else if self.combined.popcnt() <= END_GAME_PIECES {
            Stage::EndGame
        } else {
            Stage::MiddleGame
        }
    }

    /// Resolve UCI move text like `e2e4` or `e7e8q` against the legal moves here.
    pub fn parse_move(&self, text: &str) -> Result<ChessMove, Error> {
        let wanted = text.trim().to_ascii_lowercase();
        MoveGen::legal(self)
            .iter()
            .find(|m| m.to_string() == wanted)
            .copied()
            .ok_or_else(|| {
                warn!("rejected move {:?} in {}", text, self);
                Error::InvalidMove {
                    text: text.to_string(),
                }
            })
    }

    /// Does the en-passant square make sense for this placement?  The square must be empty
    /// and on the right rank, with the pawn that just double-pushed in front of it.
    fn en_passant_is_sane(&self, ep: Square) -> bool {
        let us = self.side_to_move;
        let them = !us;
        let expected_rank = if us == Color::White { 5 } else { 2 };
        if ep.rank() != expected_rank {
            return false;
        }
        let pushed = ep.ubackward(us);
        let origin = ep.uforward(us);
        self.combined & BitBoard::from_square(ep) == EMPTY
            && self.combined & BitBoard::from_square(origin) == EMPTY
            && self.pieces_of(Piece::Pawn, them) & BitBoard::from_square(pushed) != EMPTY
    }
}

impl TryFrom<&Fen> for Position {
    type Error = Error;

    /// Build a position and run the sanity checks the rest of the crate relies on: one king
    /// each, no pawns on the back ranks, the side not to move not in check, and at most two
    /// checkers.  Castle rights without the king and rook at home are dropped.
    fn try_from(fen: &Fen) -> Result<Self, Self::Error> {
        let mut position = Position::empty();
        for sq in ALL_SQUARES.iter() {
            if let Some((piece, color)) = fen[*sq] {
                position.xor(piece, *sq, color);
            }
        }
        position.side_to_move = fen.side_to_move();
        position.halfmove_clock = fen.halfmove_clock();
        position.fullmove_number = fen.fullmove_number();

        for color in ALL_COLORS.iter() {
            if position.pieces_of(Piece::King, *color).popcnt() != 1 {
                return Err(Error::InvalidPosition);
            }
        }
        if position.pieces(Piece::Pawn) & (get_rank(0) | get_rank(7)) != EMPTY {
            return Err(Error::InvalidPosition);
        }

        let mut rights = CastleRights::NONE;
        for color in ALL_COLORS.iter() {
            let king_home = Square::make_square(color.to_my_backrank(), 4);
            for castle_type in [CastleType::Kingside, CastleType::Queenside].iter() {
                let rook_home = castle_type.rook_source(*color);
                if fen.castle_rights().has(*color, *castle_type)
                    && position.pieces_of(Piece::King, *color) == BitBoard::from_square(king_home)
                    && position.pieces_of(Piece::Rook, *color) & BitBoard::from_square(rook_home)
                        != EMPTY
                {
                    rights = rights.add(*color, *castle_type);
                }
            }
        }
        position.castle_rights = rights;

        if let Some(ep) = fen.en_passant() {
            if !position.en_passant_is_sane(ep) {
                return Err(Error::InvalidPosition);
            }
            position.en_passant = Some(ep);
        }

        position.refresh();
        position.hash = position.compute_hash();

        let them = !position.side_to_move;
        let their_king = position.king_square(them);
        if position.attackers_to(their_king, position.combined)
            & position.color_combined(position.side_to_move)
            != EMPTY
        {
            return Err(Error::InvalidPosition);
        }
        if position.checkers.popcnt() > 2 {
            return Err(Error::InvalidPosition);
        }

        Ok(position)
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Position::from_fen(value)
    }
}

/// Prints the FEN.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", Fen::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::STARTING_FEN;
    use crate::movegen::MoveGen;

    fn walk_hashes(position: &Position, depth: usize) {
        assert_eq!(position.get_hash(), position.compute_hash());
        if depth == 0 {
            return;
        }
        for m in MoveGen::legal(position).iter() {
            walk_hashes(&position.make_move(*m), depth - 1);
        }
    }

    #[test]
    fn fen_round_trip() {
        for fen in [
            STARTING_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/8/1k6/8/2pP4/8/5BK1/8 b - d3 0 1",
            "4k3/8/8/8/8/8/8/4K2R w K - 17 42",
        ]
        .iter()
        {
            assert_eq!(Position::from_fen(fen).unwrap().to_fen(), *fen);
        }
        assert_eq!(Position::default().to_fen(), STARTING_FEN);
    }

    #[test]
    fn impossible_positions_are_rejected() {
        for fen in [
            // no black king
            "8/8/8/8/8/8/8/4K3 w - - 0 1",
            // two white kings
            "4k3/8/8/8/8/8/8/3KK3 w - - 0 1",
            // pawn on the first rank
            "4k3/8/8/8/8/8/8/P3K3 w - - 0 1",
            // white to move while black is in check
            "4k3/4R3/8/8/8/8/8/4K3 w - - 0 1",
            // en passant square with no pawn behind it
            "4k3/8/8/8/8/8/8/4K3 b - e3 0 1",
        ]
        .iter()
        {
            assert_eq!(Position::from_fen(fen), Err(Error::InvalidPosition), "{}", fen);
        }
    }

    #[test]
    fn castle_rights_follow_the_pieces() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
        assert_eq!(position.castle_rights(), CastleRights::NONE);
    }

    #[test]
    fn hash_is_incremental() {
        walk_hashes(&Position::default(), 3);
        walk_hashes(
            &Position::from_fen(
                "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            )
            .unwrap(),
            2,
        );
    }

    #[test]
    fn transpositions_share_a_hash() {
        let start = Position::default();
        let a = ["g1f3", "g8f6", "b1c3"]
            .iter()
            .fold(start, |p, m| p.make_move(p.parse_move(m).unwrap()));
        let b = ["b1c3", "g8f6", "g1f3"]
            .iter()
            .fold(start, |p, m| p.make_move(p.parse_move(m).unwrap()));
        assert_eq!(a.get_hash(), b.get_hash());
    }

    #[test]
    fn double_push_sets_en_passant_only_when_capturable() {
        let start = Position::default();
        let e4 = start.make_move(start.parse_move("e2e4").unwrap());
        assert_eq!(e4.en_passant(), None);

        let position = Position::from_fen("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1").unwrap();
        let e4 = position.make_move(position.parse_move("e2e4").unwrap());
        assert_eq!(e4.en_passant(), Some(Square::E3));
        assert!(e4.parse_move("d4e3").unwrap().is_en_passant());
    }

    #[test]
    fn pins_and_checks() {
        // the e-file knight is pinned by the rook
        let position = Position::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert_eq!(position.pinned(), BitBoard::from_square(Square::E2));
        assert!(!position.in_check());

        let position = Position::from_fen("4r1k1/8/8/8/8/3n4/8/4K3 w - - 0 1").unwrap();
        assert!(position.in_double_check());
    }

    #[test]
    fn insufficient_material() {
        let draw = |fen: &str| Position::from_fen(fen).unwrap().is_insufficient_material();
        assert!(draw("4k3/8/8/8/8/8/8/4K3 w - - 0 1"));
        assert!(draw("4k3/8/8/8/8/8/8/4KN2 w - - 0 1"));
        assert!(draw("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1"));
        assert!(!draw("4k1b1/8/8/8/8/8/8/2B1K3 w - - 0 1"));
        assert!(!draw("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"));
    }

    #[test]
    fn light_squares_start_on_h1() {
        let light = |sq: Square| BitBoard::from_square(sq) & LIGHT_SQUARES != EMPTY;
        assert!(light(Square::H1) && light(Square::B1) && light(Square::A8));
        assert!(!light(Square::A1) && !light(Square::H8) && !light(Square::E1));
    }

    #[test]
    fn null_move_flips_the_side() {
        let position = Position::default();
        let null = position.make_null_move();
        assert_eq!(null.side_to_move(), Color::Black);
        assert_eq!(null.get_hash(), null.compute_hash());
        assert_eq!(null.make_null_move().get_hash(), position.get_hash());
    }

    #[test]
    fn promotion_is_detected() {
        let position = Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(position.can_promote_pawn());
        let blocked = Position::from_fen("1n2k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(!blocked.can_promote_pawn());
    }

    #[test]
    fn bad_move_text_is_an_error() {
        let position = Position::default();
        assert!(position.parse_move("e2e5").is_err());
        assert!(position.parse_move("zz").is_err());
        assert_eq!(
            position.parse_move("E2E4").unwrap().flags(),
            flags::DOUBLE_PAWN_PUSH
        );
    }
}
