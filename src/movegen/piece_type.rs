use crate::bitboard::{BitBoard, EMPTY};
use crate::castle_rights::CastleType;
use crate::chess_move::{flags, ChessMove};
use crate::color::Color;
use crate::movegen::MoveList;
use crate::piece::{Piece, PROMOTION_PIECES};
use crate::position::Position;
use crate::square::Square;

use crate::magic::{
    between, get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks,
    get_pawn_moves, get_rook_moves, line,
};

/// Emit one move per destination, flagged as a capture when an enemy piece sits there.
#[inline(always)]
fn push_moves(movelist: &mut MoveList, position: &Position, src: Square, dests: BitBoard) {
    let enemies = position.color_combined(!position.side_to_move());
    for dest in dests {
        let flag = if enemies & BitBoard::from_square(dest) != EMPTY {
            flags::CAPTURE
        } else {
            flags::QUIET
        };
        movelist.push(ChessMove::new(src, dest, flag));
    }
}

pub trait PieceType {
    fn into_piece() -> Piece;
    fn pseudo_legals(src: Square, color: Color, combined: BitBoard, mask: BitBoard) -> BitBoard;

    /// Append this piece type's legal moves landing on `mask`.
    #[inline(always)]
    fn legals<T>(movelist: &mut MoveList, position: &Position, mask: BitBoard)
    where
        T: CheckType,
    {
        let combined = position.combined();
        let color = position.side_to_move();
        let ksq = position.king_square(color);

        let pieces = position.pieces_of(Self::into_piece(), color);
        let pinned = position.pinned();
        let checkers = position.checkers();

        let check_mask = if T::IN_CHECK {
            between(checkers.to_square(), ksq) ^ checkers
        } else {
            !EMPTY
        };

        for src in pieces & !pinned {
            let moves = Self::pseudo_legals(src, color, combined, mask) & check_mask;
            push_moves(movelist, position, src, moves);
        }

        // A pinned piece cannot answer a check: it would have to leave the pin line.
        if !T::IN_CHECK {
            for src in pieces & pinned {
                let moves = Self::pseudo_legals(src, color, combined, mask) & line(src, ksq);
                push_moves(movelist, position, src, moves);
            }
        }
    }
}

pub struct PawnType;
pub struct BishopType;
pub struct KnightType;
pub struct RookType;
pub struct QueenType;
pub struct KingType;

pub trait CheckType {
    const IN_CHECK: bool;
}

pub struct InCheckType;
pub struct NotInCheckType;

impl CheckType for InCheckType {
    const IN_CHECK: bool = true;
}

impl CheckType for NotInCheckType {
    const IN_CHECK: bool = false;
}

impl PawnType {
    /// Is a particular en-passant capture legal?  Both the capturing and the captured pawn
    /// leave their squares, which can uncover an attack along the rank.
    pub fn legal_ep_move(position: &Position, source: Square, dest: Square) -> bool {
        let color = position.side_to_move();
        let captured = BitBoard::from_square(dest.ubackward(color));
        let combined = position.combined()
            ^ captured
            ^ BitBoard::from_square(source)
            ^ BitBoard::from_square(dest);

        let ksq = position.king_square(color);
        let attackers =
            position.attackers_to(ksq, combined) & position.color_combined(!color) & !captured;
        attackers == EMPTY
    }

    #[inline(always)]
    fn push_pawn_moves(movelist: &mut MoveList, position: &Position, src: Square, dests: BitBoard) {
        let color = position.side_to_move();
        let enemies = position.color_combined(!color);
        let promotes = src.rank() == color.to_seventh_rank();
        for dest in dests {
            let capture = enemies & BitBoard::from_square(dest) != EMPTY;
            if promotes {
                for piece in PROMOTION_PIECES.iter() {
                    movelist.push(ChessMove::new_promotion(src, dest, *piece, capture));
                }
            } else if capture {
                movelist.push(ChessMove::new(src, dest, flags::CAPTURE));
            } else if (src.rank() as i8 - dest.rank() as i8).abs() == 2 {
                movelist.push(ChessMove::new(src, dest, flags::DOUBLE_PAWN_PUSH));
            } else {
                movelist.push(ChessMove::new(src, dest, flags::QUIET));
            }
        }
    }
}

impl PieceType for PawnType {
    fn into_piece() -> Piece {
        Piece::Pawn
    }

    #[inline(always)]
    fn pseudo_legals(src: Square, color: Color, combined: BitBoard, mask: BitBoard) -> BitBoard {
        get_pawn_moves(src, color, combined) & mask
    }

    #[inline(always)]
    fn legals<T>(movelist: &mut MoveList, position: &Position, mask: BitBoard)
    where
        T: CheckType,
    {
        let combined = position.combined();
        let color = position.side_to_move();
        let ksq = position.king_square(color);

        let pieces = position.pieces_of(Piece::Pawn, color);
        let pinned = position.pinned();
        let checkers = position.checkers();

        let check_mask = if T::IN_CHECK {
            between(checkers.to_square(), ksq) ^ checkers
        } else {
            !EMPTY
        };

        for src in pieces & !pinned {
            let moves = Self::pseudo_legals(src, color, combined, mask) & check_mask;
            PawnType::push_pawn_moves(movelist, position, src, moves);
        }

        if !T::IN_CHECK {
            for src in pieces & pinned {
                let moves = Self::pseudo_legals(src, color, combined, mask) & line(ksq, src);
                PawnType::push_pawn_moves(movelist, position, src, moves);
            }
        }

        if let Some(ep_sq) = position.en_passant() {
            // pawns that attack the target square are the ones that can take
            for src in get_pawn_attacks(ep_sq, !color, pieces) {
                if PawnType::legal_ep_move(position, src, ep_sq) {
                    movelist.push(ChessMove::new(src, ep_sq, flags::EP_CAPTURE));
                }
            }
        }
    }
}

impl PieceType for BishopType {
    fn into_piece() -> Piece {
        Piece::Bishop
    }

    #[inline(always)]
    fn pseudo_legals(src: Square, _color: Color, combined: BitBoard, mask: BitBoard) -> BitBoard {
        get_bishop_moves(src, combined) & mask
    }
}

impl PieceType for KnightType {
    fn into_piece() -> Piece {
        Piece::Knight
    }

    #[inline(always)]
    fn pseudo_legals(src: Square, _color: Color, _combined: BitBoard, mask: BitBoard) -> BitBoard {
        get_knight_moves(src) & mask
    }
}

impl PieceType for RookType {
    fn into_piece() -> Piece {
        Piece::Rook
    }

    #[inline(always)]
    fn pseudo_legals(src: Square, _color: Color, combined: BitBoard, mask: BitBoard) -> BitBoard {
        get_rook_moves(src, combined) & mask
    }
}

impl PieceType for QueenType {
    fn into_piece() -> Piece {
        Piece::Queen
    }

    #[inline(always)]
    fn pseudo_legals(src: Square, _color: Color, combined: BitBoard, mask: BitBoard) -> BitBoard {
        (get_rook_moves(src, combined) ^ get_bishop_moves(src, combined)) & mask
    }
}

impl PieceType for KingType {
    fn into_piece() -> Piece {
        Piece::King
    }

    #[inline(always)]
    fn pseudo_legals(src: Square, _color: Color, _combined: BitBoard, mask: BitBoard) -> BitBoard {
        get_king_moves(src) & mask
    }

    #[inline(always)]
    fn legals<T>(movelist: &mut MoveList, position: &Position, mask: BitBoard)
    where
        T: CheckType,
    {
        let combined = position.combined();
        let color = position.side_to_move();
        let ksq = position.king_square(color);

        // the enemy attack map already looks through our king
        let moves = Self::pseudo_legals(ksq, color, combined, mask) & !position.attacks(!color);
        push_moves(movelist, position, ksq, moves);

        // We can castle iff:
        //  * we are not in check,
        //  * the castle rights say we can,
        //  * the squares between the king and the rook are empty,
        //  * no enemy piece attacks a square the king crosses or lands on.
        if !T::IN_CHECK {
            let rights = position.castle_rights();
            for castle_type in [CastleType::Kingside, CastleType::Queenside].iter() {
                if rights.has(color, *castle_type)
                    && combined & castle_type.empty_squares(color) == EMPTY
                    && position.attacks(!color) & castle_type.king_path(color) == EMPTY
                {
                    let flag = match castle_type {
                        CastleType::Kingside => flags::KING_CASTLE,
                        CastleType::Queenside => flags::QUEEN_CASTLE,
                    };
                    movelist.push(ChessMove::new(ksq, castle_type.king_dest(color), flag));
                }
            }
        }
    }
}
