use crate::square::Square;
use failure::Fail;

/// Sometimes, bad stuff happens.
#[derive(Clone, Debug, Fail, PartialEq)]
pub enum Error {
    /// The FEN string is invalid
    #[fail(display = "Invalid FEN string: {}", fen)]
    InvalidFen { fen: String },

    /// The FEN string parsed, but describes a position that cannot occur
    #[fail(
        display = "The position did not pass sanity checks.  Are you sure both kings exist and the side not to move is not in check?"
    )]
    InvalidPosition,

    /// A square in algebraic notation could not be parsed
    #[fail(display = "Invalid square: {}", text)]
    InvalidSquare { text: String },

    /// The move text does not name a legal move in the current position
    #[fail(display = "Illegal or malformed move: {}", text)]
    InvalidMove { text: String },

    /// The magic number search ran out of candidates
    #[fail(display = "No {} magic found for {} within the trial limit", slider, square)]
    MagicNotFound { square: Square, slider: &'static str },

    /// A magic lookup disagreed with ray-casting during verification
    #[fail(display = "{} magic for {} failed verification", slider, square)]
    MagicMismatch { square: Square, slider: &'static str },
}
