extern crate chess_search;

use chess_search::{
    Error, MoveGen, Position, SearchConfig, SearchContext, SearchLimits, CHECKMATE_VALUE,
    STARTING_FEN,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn context(threads: usize) -> SearchContext {
    init();
    let config = SearchConfig::default().with_threads(threads).with_hash_mb(4);
    SearchContext::new(config).unwrap()
}

#[test]
fn fixed_depth_search_reports_a_legal_move() {
    let ctx = context(1);
    ctx.start_search(SearchLimits::depth(4));
    ctx.wait();

    let info = ctx.info();
    assert_eq!(info.depth, 4);
    assert!(info.nodes > 0);
    let best = ctx.best_move().unwrap();
    assert!(MoveGen::legal(&Position::default()).contains(&best));
    assert_eq!(ctx.principal_variation().first(), Some(&best));
    assert!(!ctx.is_searching());
}

#[test]
fn helpers_agree_on_a_mate_in_one() {
    let ctx = context(4);
    ctx.set_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    ctx.start_search(SearchLimits::depth(5));
    ctx.wait();

    let info = ctx.info();
    assert_eq!(info.best_move.unwrap().to_string(), "a1a8");
    assert_eq!(info.eval, CHECKMATE_VALUE - 1);
    assert!(info.depth >= 5);
}

#[test]
fn stalemated_root_has_no_move() {
    let ctx = context(2);
    ctx.set_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    ctx.start_search(SearchLimits::depth(6));
    ctx.wait();

    assert_eq!(ctx.best_move(), None);
    assert_eq!(ctx.info().eval, 0);
    assert!(ctx.principal_variation().is_empty());
}

#[test]
fn mated_root_has_no_move() {
    let ctx = context(1);
    ctx.set_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
    ctx.start_search(SearchLimits::depth(3));
    ctx.wait();

    assert_eq!(ctx.best_move(), None);
    assert_eq!(ctx.info().eval, -CHECKMATE_VALUE);
}

#[test]
fn stop_ends_an_infinite_search() {
    let ctx = context(2);
    ctx.start_search(SearchLimits::infinite());
    thread::sleep(Duration::from_millis(200));
    assert!(ctx.is_searching());

    let asked = Instant::now();
    ctx.stop();
    ctx.wait();
    assert!(asked.elapsed() < Duration::from_secs(5));
    assert!(!ctx.is_searching());
    assert!(ctx.best_move().is_some());
}

#[test]
fn timed_search_respects_the_deadline() {
    let ctx = context(2);
    let start = Instant::now();
    ctx.start_search(SearchLimits::time(
        Duration::from_millis(300),
        Duration::from_millis(150),
    ));
    ctx.wait();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(ctx.best_move().is_some());
}

#[test]
fn bad_fen_keeps_the_old_position() {
    let ctx = context(1);
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    ctx.set_fen(fen).unwrap();

    match ctx.set_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3 w KQkq - 0 1") {
        Err(Error::InvalidFen { .. }) => {}
        other => panic!("expected an invalid FEN error, got {:?}", other),
    }
    assert!(ctx.set_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
    assert_eq!(ctx.position().to_fen(), fen);
}

#[test]
fn moves_are_applied_all_or_nothing() {
    let ctx = context(1);
    ctx.apply_moves(&["e2e4", "e7e5", "g1f3"]).unwrap();
    assert_eq!(
        ctx.position().to_fen(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
    );
    assert_eq!(ctx.game().history.len(), 3);

    let before = ctx.position();
    assert!(ctx.apply_moves(&["b8c6", "e1e3"]).is_err());
    assert_eq!(ctx.position(), before);
    assert_eq!(ctx.game().history.len(), 3);
}

#[test]
fn new_game_resets_everything() {
    let ctx = context(1);
    ctx.apply_moves(&["d2d4"]).unwrap();
    ctx.start_search(SearchLimits::depth(3));
    ctx.wait();
    assert!(ctx.best_move().is_some());

    ctx.new_game();
    assert_eq!(ctx.position().to_fen(), STARTING_FEN);
    assert!(ctx.game().history.is_empty());
    assert_eq!(ctx.best_move(), None);
}

#[test]
fn resizing_the_hash_keeps_searching() {
    let mut ctx = context(1);
    ctx.resize_hash(1);
    assert_eq!(ctx.config().hash_mb, 1);
    ctx.start_search(SearchLimits::depth(3));
    ctx.wait();
    assert!(ctx.best_move().is_some());
}

#[test]
fn a_new_search_replaces_a_running_one() {
    let ctx = context(2);
    ctx.start_search(SearchLimits::infinite());
    thread::sleep(Duration::from_millis(50));
    ctx.set_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    ctx.start_search(SearchLimits::depth(3));
    ctx.wait();
    assert_eq!(ctx.best_move().unwrap().to_string(), "a1a8");
}

#[test]
fn results_can_be_read_from_another_thread() {
    let ctx = Arc::new(context(2));
    ctx.start_search(SearchLimits::infinite());

    let reader = {
        let ctx = Arc::clone(&ctx);
        thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(10);
            while ctx.info().depth < 3 && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            ctx.info().depth
        })
    };
    let depth = reader.join().unwrap();
    ctx.stop();
    ctx.wait();
    assert!(depth >= 3);
    assert!(ctx.info().depth >= depth);
}
