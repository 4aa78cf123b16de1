use crate::color::{Color, ALL_COLORS};
use crate::piece::{Piece, ALL_PIECES, NUM_PIECES};
use crate::position::Position;
use crate::square::Square;

/// Game phase, used to pick piece-square tables and to switch off pruning that is unsafe in
/// endgames.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Stage {
    Opening,
    MiddleGame,
    EndGame,
}

/// Material values used by the static evaluation, in thousandths of a pawn.
pub const MATERIAL: [i32; NUM_PIECES] = [1000, 3200, 3300, 5000, 9000, 0];

// Piece-square tables, laid out as seen from white with rank 8 on top.
#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
    500, 500, 500, 500, 500, 500, 500, 500,
    100, 100, 200, 300, 300, 200, 100, 100,
     50,  50, 100, 250, 250, 100,  50,  50,
      0,   0,   0, 200, 200,   0,   0,   0,
     50, -50,-100,   0,   0,-100, -50,  50,
     50, 100, 100,-200,-200, 100, 100,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const PAWN_END_TABLE: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
    800, 800, 800, 800, 800, 800, 800, 800,
    500, 500, 500, 500, 500, 500, 500, 500,
    300, 300, 300, 300, 300, 300, 300, 300,
    150, 150, 150, 150, 150, 150, 150, 150,
     50,  50,  50,  50,  50,  50,  50,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
   -500,-400,-300,-300,-300,-300,-400,-500,
   -400,-200,   0,   0,   0,   0,-200,-400,
   -300,   0, 100, 150, 150, 100,   0,-300,
   -300,  50, 150, 200, 200, 150,  50,-300,
   -300,   0, 150, 200, 200, 150,   0,-300,
   -300,  50, 100, 150, 150, 100,  50,-300,
   -400,-200,   0,  50,  50,   0,-200,-400,
   -500,-400,-300,-300,-300,-300,-400,-500,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
   -200,-100,-100,-100,-100,-100,-100,-200,
   -100,   0,   0,   0,   0,   0,   0,-100,
   -100,   0,  50, 100, 100,  50,   0,-100,
   -100,  50,  50, 100, 100,  50,  50,-100,
   -100,   0, 100, 100, 100, 100,   0,-100,
   -100, 100, 100, 100, 100, 100, 100,-100,
   -100,  50,   0,   0,   0,   0,  50,-100,
   -200,-100,-100,-100,-100,-100,-100,-200,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     50, 100, 100, 100, 100, 100, 100,  50,
    -50,   0,   0,   0,   0,   0,   0, -50,
    -50,   0,   0,   0,   0,   0,   0, -50,
    -50,   0,   0,   0,   0,   0,   0, -50,
    -50,   0,   0,   0,   0,   0,   0, -50,
    -50,   0,   0,   0,   0,   0,   0, -50,
      0,   0,   0,  50,  50,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
   -200,-100,-100, -50, -50,-100,-100,-200,
   -100,   0,   0,   0,   0,   0,   0,-100,
   -100,   0,  50,  50,  50,  50,   0,-100,
    -50,   0,  50,  50,  50,  50,   0, -50,
      0,   0,  50,  50,  50,  50,   0, -50,
   -100,  50,  50,  50,  50,  50,   0,-100,
   -100,   0,  50,   0,   0,   0,   0,-100,
   -200,-100,-100, -50, -50,-100,-100,-200,
];

#[rustfmt::skip]
const KING_TABLE: [i32; 64] = [
   -300,-400,-400,-500,-500,-400,-400,-300,
   -300,-400,-400,-500,-500,-400,-400,-300,
   -300,-400,-400,-500,-500,-400,-400,-300,
   -300,-400,-400,-500,-500,-400,-400,-300,
   -200,-300,-300,-400,-400,-300,-300,-200,
   -100,-200,-200,-200,-200,-200,-200,-100,
    200, 200,   0,   0,   0,   0, 200, 200,
    200, 300, 100,   0,   0, 100, 300, 200,
];

#[rustfmt::skip]
const KING_END_TABLE: [i32; 64] = [
   -500,-400,-300,-200,-200,-300,-400,-500,
   -300,-200,-100,   0,   0,-100,-200,-300,
   -300,-100, 200, 300, 300, 200,-100,-300,
   -300,-100, 300, 400, 400, 300,-100,-300,
   -300,-100, 300, 400, 400, 300,-100,-300,
   -300,-100, 200, 300, 300, 200,-100,-300,
   -300,-300,   0,   0,   0,   0,-300,-300,
   -500,-300,-300,-300,-300,-300,-300,-500,
];

fn table(stage: Stage, piece: Piece) -> &'static [i32; 64] {
    match (piece, stage) {
        (Piece::Pawn, Stage::EndGame) => &PAWN_END_TABLE,
        (Piece::Pawn, _) => &PAWN_TABLE,
        (Piece::Knight, _) => &KNIGHT_TABLE,
        (Piece::Bishop, _) => &BISHOP_TABLE,
        (Piece::Rook, _) => &ROOK_TABLE,
        (Piece::Queen, _) => &QUEEN_TABLE,
        (Piece::King, Stage::EndGame) => &KING_END_TABLE,
        (Piece::King, _) => &KING_TABLE,
    }
}

/// Piece-square bonus for a `color` `piece` standing on `sq`.
#[inline]
pub fn pst(stage: Stage, piece: Piece, color: Color, sq: Square) -> i32 {
    let rank = match color {
        Color::White => 7 - sq.rank(),
        Color::Black => sq.rank(),
    };
    table(stage, piece)[(rank as usize) * 8 + sq.file() as usize]
}

/// Material balance from the side to move's point of view.
pub fn material_eval(position: &Position) -> i32 {
    let us = position.side_to_move();
    ALL_PIECES
        .iter()
        .map(|p| {
            let mine = position.pieces_of(*p, us).popcnt() as i32;
            let theirs = position.pieces_of(*p, !us).popcnt() as i32;
            (mine - theirs) * MATERIAL[p.to_index()]
        })
        .sum()
}

/// Static evaluation from the side to move's point of view: material plus piece-square
/// bonuses for the current stage.
pub fn evaluate(position: &Position) -> i32 {
    let stage = position.stage();
    let mut score = 0;
    for color in ALL_COLORS.iter() {
        let mut side = 0;
        for piece in ALL_PIECES.iter() {
            for sq in position.pieces_of(*piece, *color) {
                side += MATERIAL[piece.to_index()] + pst(stage, *piece, *color, sq);
            }
        }
        score += color.sign() * side;
    }
    score * position.side_to_move().sign()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_is_balanced() {
        let position = Position::default();
        assert_eq!(evaluate(&position), 0);
        assert_eq!(material_eval(&position), 0);
    }

    #[test]
    fn tables_are_mirrored_for_black() {
        for piece in ALL_PIECES.iter() {
            assert_eq!(
                pst(Stage::MiddleGame, *piece, Color::White, Square::E2),
                pst(Stage::MiddleGame, *piece, Color::Black, Square::E7)
            );
        }
    }

    #[test]
    fn evaluation_is_side_relative() {
        let white = Position::from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1").unwrap();
        let black = Position::from_fen("4k3/8/8/8/8/8/8/Q3K3 b - - 0 1").unwrap();
        assert!(evaluate(&white) > 0);
        assert_eq!(evaluate(&white), -evaluate(&black));
        assert_eq!(material_eval(&white), MATERIAL[Piece::Queen.to_index()]);
    }

    #[test]
    fn stages() {
        assert_eq!(Position::default().stage(), Stage::Opening);
        let late = Position::from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 40").unwrap();
        assert_eq!(late.stage(), Stage::EndGame);
        let middle = Position::from_fen(
            "r1bq1rk1/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQ1RK1 w - - 0 12",
        )
        .unwrap();
        assert_eq!(middle.stage(), Stage::MiddleGame);
    }
}
