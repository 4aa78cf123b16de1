mod movegen;
mod piece_type;

pub use self::movegen::*;
