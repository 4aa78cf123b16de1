extern crate chess_search;

use chess_search::{
    construct, see, Bound, ChessMove, Iteration, MoveGen, Position, Searcher, Square,
    TranspositionTable, ASP_EDGE, CHECKMATE_VALUE,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
    construct().unwrap();
}

fn deepen(fen: &str, depth: i32) -> Vec<Iteration> {
    init();
    let position = Position::from_fen(fen).unwrap();
    let tt = TranspositionTable::with_slots(1 << 16);
    let stop = AtomicBool::new(false);
    let mut searcher = Searcher::new(&tt, &stop, 0, &[]);
    let mut guess = 0;
    (1..=depth)
        .map(|d| {
            let iteration = searcher.aspiration(&position, d, guess, ASP_EDGE).unwrap();
            guess = iteration.eval;
            iteration
        })
        .collect()
}

#[test]
fn found_mates_survive_deeper_iterations() {
    let iterations = deepen("k7/8/2K5/8/8/8/8/7R w - - 0 1", 6);
    for iteration in iterations.iter().skip(2) {
        assert_eq!(iteration.eval, CHECKMATE_VALUE - 3, "depth {}", iteration.depth);
    }
}

#[test]
fn principal_variation_is_playable() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let iterations = deepen(fen, 4);
    let last = iterations.last().unwrap();
    assert!(!last.pv.is_empty());
    assert!(last.pv.len() <= 4);

    let mut position = Position::from_fen(fen).unwrap();
    for m in last.pv.iter() {
        assert!(MoveGen::legal(&position).contains(m), "{} in {}", m, position);
        position = position.make_move(*m);
    }
}

#[test]
fn takes_the_free_rook() {
    let iterations = deepen("4k3/8/8/8/3r4/8/8/3QK3 w - - 0 1", 5);
    let last = iterations.last().unwrap();
    assert_eq!(last.best_move().unwrap().to_string(), "d1d4");
    assert!(last.eval > 0 && last.eval < CHECKMATE_VALUE / 2);
}

#[test]
fn checking_lines_keep_scores_in_bounds() {
    let fens = [
        "4k3/8/8/8/3r4/8/8/3QK3 w - - 0 1",
        "4k3/8/8/8/8/8/8/3QK2r w - - 0 1",
        "6k1/5ppp/8/8/8/8/5PP1/r5K1 w - - 0 1",
    ];
    for fen in fens.iter() {
        for iteration in deepen(fen, 6) {
            assert!(
                iteration.eval.abs() <= CHECKMATE_VALUE,
                "{} depth {}: {}",
                fen,
                iteration.depth,
                iteration.eval
            );
            assert!(!iteration.pv.is_empty(), "{} depth {}", fen, iteration.depth);
        }
    }
}

#[test]
fn exchange_signs() {
    init();
    // pawn takes a rook defended only by the king
    let position = Position::from_fen("4k3/4r3/3P4/8/8/8/8/4K3 w - - 0 1").unwrap();
    let capture = position.parse_move("d6e7").unwrap();
    assert!(see(&position, capture) > 0);

    // queen takes a pawn defended by a pawn
    let position = Position::from_fen("4k3/8/2p5/3p4/8/8/8/3QK3 w - - 0 1").unwrap();
    let capture = position.parse_move("d1d5").unwrap();
    assert!(see(&position, capture) < 0);
}

#[test]
fn concurrent_writers_never_tear_entries() {
    init();
    let tt = Arc::new(TranspositionTable::with_slots(1024));
    let writers: Vec<_> = (0..4u64)
        .map(|t| {
            let tt = Arc::clone(&tt);
            thread::spawn(move || {
                for i in 0..20_000u64 {
                    let hash = (i % 4096).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ t;
                    let eval = (hash % 100_000) as i32;
                    let m = ChessMove::new(Square::new((hash % 64) as u8), Square::E4, 0);
                    tt.store(hash, (hash % 20) as i32, eval, Bound::Lower, m);
                    if let Some(entry) = tt.probe(hash) {
                        assert_eq!(entry.eval, eval);
                        assert_eq!(entry.best_move, m);
                        assert_eq!(entry.depth as u64, hash % 20);
                    }
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    assert!(tt.hashfull() > 0);
}
