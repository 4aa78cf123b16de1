use crate::bitboard::{BitBoard, EMPTY};
use crate::piece::Piece;
use crate::square::{Square, ALL_SQUARES, NUM_SQUARES};
use crate::tables::magic_helpers::empty_board_rays;

pub type SquarePairs = Vec<[BitBoard; NUM_SQUARES]>;

// Direction from `src` towards `dest` if they share a rank, file or diagonal.
fn direction(src: Square, dest: Square) -> Option<(i8, i8)> {
    if src == dest {
        return None;
    }
    let dr = dest.rank() as i8 - src.rank() as i8;
    let df = dest.file() as i8 - src.file() as i8;
    if dr == 0 || df == 0 || dr.abs() == df.abs() {
        Some((dr.signum(), df.signum()))
    } else {
        None
    }
}

fn walk(from: Square, (dr, df): (i8, i8), stop: Option<Square>) -> BitBoard {
    let mut result = EMPTY;
    let mut cur = from.offset(dr, df);
    while let Some(s) = cur {
        if Some(s) == stop {
            break;
        }
        result |= BitBoard::from_square(s);
        cur = s.offset(dr, df);
    }
    result
}

// Slider rays from each square on an empty board, rook at index 0, bishop at index 1.
pub fn gen_rays() -> [[BitBoard; NUM_SQUARES]; 2] {
    let mut result = [[EMPTY; NUM_SQUARES]; 2];
    for sq in ALL_SQUARES.iter() {
        result[0][sq.to_index()] = empty_board_rays(*sq, Piece::Rook);
        result[1][sq.to_index()] = empty_board_rays(*sq, Piece::Bishop);
    }
    result
}

// Squares strictly between two aligned squares, EMPTY when they are not aligned.
pub fn gen_between() -> SquarePairs {
    let mut result = vec![[EMPTY; NUM_SQUARES]; NUM_SQUARES];
    for src in ALL_SQUARES.iter() {
        for dest in ALL_SQUARES.iter() {
            if let Some(dir) = direction(*src, *dest) {
                result[src.to_index()][dest.to_index()] = walk(*src, dir, Some(*dest));
            }
        }
    }
    result
}

// The full edge-to-edge line through two aligned squares, both included.
pub fn gen_lines() -> SquarePairs {
    let mut result = vec![[EMPTY; NUM_SQUARES]; NUM_SQUARES];
    for src in ALL_SQUARES.iter() {
        for dest in ALL_SQUARES.iter() {
            if let Some((dr, df)) = direction(*src, *dest) {
                result[src.to_index()][dest.to_index()] = walk(*src, (dr, df), None)
                    | walk(*src, (-dr, -df), None)
                    | BitBoard::from_square(*src);
            }
        }
    }
    result
}

pub fn gen_ranks() -> [BitBoard; 8] {
    let mut result = [EMPTY; 8];
    for sq in ALL_SQUARES.iter() {
        result[sq.rank() as usize] |= BitBoard::from_square(*sq);
    }
    result
}

pub fn gen_files() -> [BitBoard; 8] {
    let mut result = [EMPTY; 8];
    for sq in ALL_SQUARES.iter() {
        result[sq.file() as usize] |= BitBoard::from_square(*sq);
    }
    result
}

pub fn gen_adjacent_files(files: &[BitBoard; 8]) -> [BitBoard; 8] {
    let mut result = [EMPTY; 8];
    for f in 0..8 {
        if f > 0 {
            result[f] |= files[f - 1];
        }
        if f < 7 {
            result[f] |= files[f + 1];
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_diagonal() {
        let between = gen_between();
        assert_eq!(
            between[Square::A1.to_index()][Square::D4.to_index()],
            BitBoard::from_square(Square::B2) | BitBoard::from_square(Square::C3)
        );
        assert_eq!(between[Square::A1.to_index()][Square::B3.to_index()], EMPTY);
        assert_eq!(between[Square::E1.to_index()][Square::E2.to_index()], EMPTY);
    }

    #[test]
    fn line_spans_the_board() {
        let lines = gen_lines();
        assert_eq!(lines[Square::C3.to_index()][Square::E5.to_index()].popcnt(), 8);
        assert_eq!(lines[Square::B1.to_index()][Square::B5.to_index()].popcnt(), 8);
        assert_eq!(lines[Square::A1.to_index()][Square::B3.to_index()], EMPTY);
    }

    #[test]
    fn adjacent_files_of_edge() {
        let files = gen_files();
        let adj = gen_adjacent_files(&files);
        assert_eq!(adj[0], files[1]);
        assert_eq!(adj[4], files[3] | files[5]);
    }
}
