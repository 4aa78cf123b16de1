use crate::castle_rights::{CastleRights, CastleType};
use crate::color::Color;
use crate::error::Error;
use crate::piece::Piece;
use crate::position::Position;
use crate::square::{Square, ALL_SQUARES};

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A position exactly as written in Forsyth-Edwards Notation, before any sanity checks.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Fen {
    pieces: [Option<(Piece, Color)>; 64],
    side_to_move: Color,
    castle_rights: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Fen {
    pub fn new() -> Fen {
        Fen {
            pieces: [None; 64],
            side_to_move: Color::White,
            castle_rights: CastleRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castle_rights(&self) -> CastleRights {
        self.castle_rights
    }

    /// The en-passant target square, the one the capturing pawn lands on.
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }
}

impl Index<Square> for Fen {
    type Output = Option<(Piece, Color)>;

    fn index(&self, index: Square) -> &Self::Output {
        &self.pieces[index.to_index()]
    }
}

impl IndexMut<Square> for Fen {
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self.pieces[index.to_index()]
    }
}

impl fmt::Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8u8).rev() {
            let mut count = 0;
            for file in 0..8u8 {
                match self[Square::make_square(rank, file)] {
                    Some((piece, color)) => {
                        if count != 0 {
                            write!(f, "{}", count)?;
                            count = 0;
                        }
                        write!(f, "{}", piece.to_fen_char(color))?;
                    }
                    None => count += 1,
                }
            }
            if count != 0 {
                write!(f, "{}", count)?;
            }
            if rank != 0 {
                write!(f, "/")?;
            }
        }

        let side = if self.side_to_move == Color::White {
            "w"
        } else {
            "b"
        };
        write!(f, " {} {} ", side, self.castle_rights)?;

        if let Some(sq) = self.en_passant {
            write!(f, "{}", sq)?;
        } else {
            write!(f, "-")?;
        }

        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)
    }
}

impl Default for Fen {
    fn default() -> Fen {
        let mut fen = Fen::new();
        let back_rank = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, piece) in back_rank.iter().enumerate() {
            let file = file as u8;
            fen[Square::make_square(0, file)] = Some((*piece, Color::White));
            fen[Square::make_square(1, file)] = Some((Piece::Pawn, Color::White));
            fen[Square::make_square(6, file)] = Some((Piece::Pawn, Color::Black));
            fen[Square::make_square(7, file)] = Some((*piece, Color::Black));
        }
        fen.castle_rights = CastleRights::ALL;
        fen
    }
}

impl FromStr for Fen {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidFen {
            fen: value.to_string(),
        };

        let tokens: Vec<&str> = value.split_whitespace().collect();
        if tokens.len() < 4 || tokens.len() > 6 {
            return Err(invalid());
        }

        let mut fen = Fen::new();

        let ranks: Vec<&str> = tokens[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid());
        }
        for (i, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if skip == 0 || skip > 8 {
                        return Err(invalid());
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or_else(invalid)?;
                    if file >= 8 {
                        return Err(invalid());
                    }
                    fen[Square::make_square(rank, file)] = Some(piece);
                    file += 1;
                }
                if file > 8 {
                    return Err(invalid());
                }
            }
            if file != 8 {
                return Err(invalid());
            }
        }

        fen.side_to_move = match tokens[1] {
            "w" | "W" => Color::White,
            "b" | "B" => Color::Black,
            _ => return Err(invalid()),
        };

        if tokens[2] != "-" {
            for c in tokens[2].chars() {
                let (color, castle_type) = match c {
                    'K' => (Color::White, CastleType::Kingside),
                    'Q' => (Color::White, CastleType::Queenside),
                    'k' => (Color::Black, CastleType::Kingside),
                    'q' => (Color::Black, CastleType::Queenside),
                    _ => return Err(invalid()),
                };
                fen.castle_rights = fen.castle_rights.add(color, castle_type);
            }
        }

        if tokens[3] != "-" {
            fen.en_passant = Some(Square::from_str(tokens[3]).map_err(|_| invalid())?);
        }

        if let Some(halfmove) = tokens.get(4) {
            fen.halfmove_clock = halfmove.parse().map_err(|_| invalid())?;
        }
        if let Some(fullmove) = tokens.get(5) {
            fen.fullmove_number = fullmove.parse().map_err(|_| invalid())?;
            if fen.fullmove_number == 0 {
                return Err(invalid());
            }
        }

        Ok(fen)
    }
}

impl From<&Position> for Fen {
    fn from(position: &Position) -> Self {
        let mut fen = Fen::new();
        for sq in ALL_SQUARES.iter() {
            if let (Some(piece), Some(color)) = (position.piece_on(*sq), position.color_on(*sq)) {
                fen[*sq] = Some((piece, color));
            }
        }
        fen.side_to_move = position.side_to_move();
        fen.castle_rights = position.castle_rights();
        fen.en_passant = position.en_passant();
        fen.halfmove_clock = position.halfmove_clock();
        fen.fullmove_number = position.fullmove_number();
        fen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_initial_position() {
        assert_eq!(Fen::default().to_string(), STARTING_FEN);
        assert_eq!(Fen::from_str(STARTING_FEN).unwrap(), Fen::default());
    }

    #[test]
    fn clocks_are_optional() {
        let fen = Fen::from_str("4k3/8/8/8/8/8/8/4K3 b - -").unwrap();
        assert_eq!(fen.halfmove_clock(), 0);
        assert_eq!(fen.fullmove_number(), 1);
        assert_eq!(fen.side_to_move(), Color::Black);
    }

    #[test]
    fn malformed_text_is_rejected() {
        for text in [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq z9 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - a 1",
            "rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        ]
        .iter()
        {
            assert!(Fen::from_str(text).is_err(), "accepted {:?}", text);
        }
    }
}
