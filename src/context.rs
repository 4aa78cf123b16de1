use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::chess_move::ChessMove;
use crate::config::{SearchConfig, SearchLimits};
use crate::error::Error;
use crate::evaluate::Stage;
use crate::movegen::MoveGen;
use crate::position::Position;
use crate::search::{
    mated_in, Aborted, Iteration, Searcher, ASP_EDGE, DRAW_VALUE, HELPER_ASP_EDGE,
};
use crate::tables::construct;
use crate::time_control::TimeManager;
use crate::transposition::TranspositionTable;

// A panicking search thread must not take the whole context down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn format_pv(pv: &[ChessMove]) -> String {
    pv.iter()
        .map(|m| m.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

/// The game being played: the current position, and the hash of every position before it
/// for repetition detection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameState {
    pub position: Position,
    pub history: Vec<u64>,
}

impl GameState {
    pub fn new(position: Position) -> GameState {
        GameState {
            position,
            history: vec![],
        }
    }

    /// Play a legal move.
    pub fn apply(&mut self, m: ChessMove) {
        self.history.push(self.position.get_hash());
        self.position = self.position.make_move(m);
    }
}

/// The best result found so far by any search thread.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchInfo {
    pub depth: i32,
    pub eval: i32,
    pub best_move: Option<ChessMove>,
    pub pv: Vec<ChessMove>,
    pub nodes: u64,
}

impl SearchInfo {
    /// Take a finished iteration, but only if it went deeper than the one already held.
    /// Returns whether it was accepted.
    ///
    /// ```
    /// use chess_search::{ChessMove, SearchInfo, Square};
    ///
    /// let e4 = ChessMove::new(Square::E2, Square::E4, 1);
    /// let d4 = ChessMove::new(Square::D2, Square::D4, 1);
    /// let mut info = SearchInfo::default();
    /// assert!(info.update(6, 120, &[e4]));
    /// assert!(!info.update(5, 300, &[d4]));
    /// assert_eq!(info.best_move, Some(e4));
    /// ```
    pub fn update(&mut self, depth: i32, eval: i32, pv: &[ChessMove]) -> bool {
        if depth <= self.depth || pv.is_empty() {
            return false;
        }
        self.depth = depth;
        self.eval = eval;
        self.best_move = pv.first().copied();
        self.pv = pv.to_vec();
        true
    }
}

struct Timer {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl Timer {
    fn reset(&self) {
        *lock(&self.cancelled) = false;
    }

    fn cancel(&self) {
        *lock(&self.cancelled) = true;
        self.wake.notify_all();
    }

    /// Sleep until `budget` has passed or the timer is cancelled.  True if time ran out.
    fn wait(&self, budget: Duration) -> bool {
        let deadline = Instant::now() + budget;
        let mut cancelled = lock(&self.cancelled);
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            cancelled = match self.wake.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        false
    }
}

// Everything the search threads share with the context.  The game and the search info sit
// behind separate locks, and neither is held while the other is taken.
struct Shared {
    game: Mutex<GameState>,
    info: Mutex<SearchInfo>,
    tt: Mutex<Arc<TranspositionTable>>,
    stop: AtomicBool,
    searching: AtomicBool,
    out_of_time: AtomicBool,
    nodes: AtomicU64,
    timer: Timer,
}

impl Shared {
    fn report(&self, iteration: &Iteration) -> bool {
        lock(&self.info).update(iteration.depth, iteration.eval, &iteration.pv)
    }

    fn has_move(&self) -> bool {
        lock(&self.info).best_move.is_some()
    }

    fn time_up(&self) {
        if self.has_move() {
            debug!("time is up, stopping the search");
            self.stop.store(true, Ordering::SeqCst);
        } else {
            debug!("time is up with no move yet, finishing the current iteration");
            self.out_of_time.store(true, Ordering::SeqCst);
        }
    }
}

/// Owns the game, the transposition table and the search threads.  Every method takes
/// `&self`, so a context can be shared between a control loop and whatever reads results.
///
/// ```
/// use chess_search::{SearchConfig, SearchContext, SearchLimits};
///
/// let config = SearchConfig::default().with_threads(1).with_hash_mb(1);
/// let context = SearchContext::new(config).unwrap();
/// context.set_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
/// context.start_search(SearchLimits::depth(3));
/// context.wait();
/// assert_eq!(context.best_move().unwrap().to_string(), "a1a8");
/// ```
pub struct SearchContext {
    config: SearchConfig,
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SearchContext {
    /// Build the attack tables if nobody has yet, and allocate the transposition table.
    pub fn new(config: SearchConfig) -> Result<SearchContext, Error> {
        construct()?;
        let tt = TranspositionTable::new(config.hash_mb);
        Ok(SearchContext {
            config,
            shared: Arc::new(Shared {
                game: Mutex::new(GameState::default()),
                info: Mutex::new(SearchInfo::default()),
                tt: Mutex::new(Arc::new(tt)),
                stop: AtomicBool::new(false),
                searching: AtomicBool::new(false),
                out_of_time: AtomicBool::new(false),
                nodes: AtomicU64::new(0),
                timer: Timer {
                    cancelled: Mutex::new(false),
                    wake: Condvar::new(),
                },
            }),
            handle: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Start a new game from `position`, forgetting the move history.
    pub fn set_position(&self, position: Position) {
        *lock(&self.shared.game) = GameState::new(position);
    }

    /// Like `set_position`, from FEN.  Bad text leaves the current game untouched.
    pub fn set_fen(&self, fen: &str) -> Result<(), Error> {
        let position = Position::from_fen(fen)?;
        self.set_position(position);
        Ok(())
    }

    /// Play a sequence of moves in UCI notation.  Either every move is played or, at the
    /// first illegal one, none are.
    pub fn apply_moves(&self, moves: &[&str]) -> Result<(), Error> {
        let mut game = lock(&self.shared.game);
        let mut next = game.clone();
        for text in moves {
            let m = next.position.parse_move(text)?;
            next.apply(m);
        }
        *game = next;
        Ok(())
    }

    pub fn position(&self) -> Position {
        lock(&self.shared.game).position
    }

    pub fn game(&self) -> GameState {
        lock(&self.shared.game).clone()
    }

    /// Start searching the current position in the background, stopping any search already
    /// running.  With no legal move the search finishes at once: `best_move` stays `None`
    /// and `info` holds the mate or stalemate score.
    pub fn start_search(&self, limits: SearchLimits) {
        self.stop();
        self.wait();

        let game = self.game();
        let limits = limits.less_overhead(self.config.move_overhead);
        *lock(&self.shared.info) = SearchInfo::default();
        self.shared.stop.store(false, Ordering::SeqCst);
        self.shared.out_of_time.store(false, Ordering::SeqCst);
        self.shared.nodes.store(0, Ordering::SeqCst);
        self.shared.timer.reset();

        let root_moves = MoveGen::legal(&game.position).len();
        if root_moves == 0 {
            let eval = if game.position.in_check() {
                mated_in(0)
            } else {
                DRAW_VALUE
            };
            lock(&self.shared.info).eval = eval;
            info!("no legal moves in {}, score {}", game.position, eval);
            return;
        }

        debug!(
            "searching {} with {} threads, {:?}",
            game.position, self.config.threads, limits
        );
        self.shared.searching.store(true, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let tt = Arc::clone(&lock(&self.shared.tt));
        let threads = self.config.threads;
        let handle =
            thread::spawn(move || run_search(shared, tt, game, limits, threads, root_moves));
        *lock(&self.handle) = Some(handle);
    }

    /// Ask the search to stop.  Returns at once; use `wait` to block until it has.
    pub fn stop(&self) {
        if self.is_searching() {
            debug!("stop requested");
        }
        self.shared.stop.store(true, Ordering::SeqCst);
        self.shared.timer.cancel();
    }

    /// Block until the running search, if any, has finished.
    pub fn wait(&self) {
        let handle = lock(&self.handle).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("search thread panicked");
                self.shared.searching.store(false, Ordering::SeqCst);
            }
        }
    }

    pub fn is_searching(&self) -> bool {
        self.shared.searching.load(Ordering::SeqCst)
    }

    pub fn best_move(&self) -> Option<ChessMove> {
        lock(&self.shared.info).best_move
    }

    pub fn principal_variation(&self) -> Vec<ChessMove> {
        lock(&self.shared.info).pv.clone()
    }

    /// A snapshot of the best result so far, with the node count of every thread.
    pub fn info(&self) -> SearchInfo {
        let mut info = lock(&self.shared.info).clone();
        info.nodes = self.shared.nodes.load(Ordering::Relaxed);
        info
    }

    /// Back to the starting position with an empty table and no history.
    pub fn new_game(&self) {
        self.stop();
        self.wait();
        lock(&self.shared.tt).clear();
        *lock(&self.shared.game) = GameState::default();
        *lock(&self.shared.info) = SearchInfo::default();
    }

    /// Replace the transposition table with an empty one of `hash_mb` mebibytes.
    pub fn resize_hash(&mut self, hash_mb: usize) {
        self.stop();
        self.wait();
        self.config.hash_mb = hash_mb;
        *lock(&self.shared.tt) = Arc::new(TranspositionTable::new(hash_mb));
    }
}

impl Drop for SearchContext {
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}

fn run_search(
    shared: Arc<Shared>,
    tt: Arc<TranspositionTable>,
    game: GameState,
    limits: SearchLimits,
    threads: usize,
    root_moves: usize,
) {
    let start = Instant::now();

    let timer = limits.move_time.map(|budget| {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            if shared.timer.wait(budget) {
                shared.time_up();
            }
        })
    });

    let helpers: Vec<JoinHandle<()>> = (1..threads)
        .map(|index| {
            let shared = Arc::clone(&shared);
            let tt = Arc::clone(&tt);
            let game = game.clone();
            thread::spawn(move || helper_loop(&shared, &tt, &game, limits.depth, index))
        })
        .collect();

    main_loop(&shared, &tt, &game, &limits, start, root_moves);

    shared.stop.store(true, Ordering::SeqCst);
    for helper in helpers {
        if helper.join().is_err() {
            error!("helper search thread panicked");
        }
    }
    shared.timer.cancel();
    if let Some(timer) = timer {
        if timer.join().is_err() {
            error!("timer thread panicked");
        }
    }

    let info = lock(&shared.info).clone();
    debug!(
        "search finished after {} ms: depth {} score {} best {}, hash {} permille full",
        start.elapsed().as_millis(),
        info.depth,
        info.eval,
        info.best_move.unwrap_or(ChessMove::NONE),
        tt.hashfull()
    );
    shared.searching.store(false, Ordering::SeqCst);
}

fn main_loop(
    shared: &Shared,
    tt: &TranspositionTable,
    game: &GameState,
    limits: &SearchLimits,
    start: Instant,
    root_moves: usize,
) {
    let position = &game.position;
    let endgame = position.stage() == Stage::EndGame;
    let mut searcher = Searcher::new(tt, &shared.stop, 0, &game.history);
    let mut time = TimeManager::new(limits.soft_time, limits.can_shorten);
    if root_moves == 1 {
        time.halt();
    }

    for depth in 1..=limits.depth as i32 {
        let iteration = match searcher.aspiration(position, depth, time.guess(), ASP_EDGE) {
            Ok(iteration) => iteration,
            Err(Aborted) => {
                debug!("main thread stopped during depth {}", depth);
                break;
            }
        };
        let stats = searcher.stats();
        let nodes = shared
            .nodes
            .fetch_add(stats.nodes + stats.qnodes, Ordering::Relaxed)
            + stats.nodes
            + stats.qnodes;
        let updated = shared.report(&iteration);
        info!(
            "depth {} score {} nodes {} time {} pv {}",
            depth,
            iteration.eval,
            nodes,
            start.elapsed().as_millis(),
            format_pv(&iteration.pv)
        );
        debug!("depth {}: {}", depth, stats);

        if iteration.failed_low {
            time.extend();
        }
        time.record(
            iteration.best_move().unwrap_or(ChessMove::NONE),
            iteration.eval,
            updated,
            endgame,
        );
        if shared.out_of_time.load(Ordering::SeqCst) {
            time.expire();
            if shared.has_move() {
                break;
            }
        }
        if time.should_stop(updated, start.elapsed()) {
            debug!(
                "stopping after depth {}, {:?} preferred",
                depth,
                time.preference()
            );
            break;
        }
    }
}

// Lazy SMP: helpers run their own deepening loop a little ahead of the main thread, with
// wider windows and perturbed move ordering, and feed the shared table.
fn helper_loop(
    shared: &Shared,
    tt: &TranspositionTable,
    game: &GameState,
    max_depth: usize,
    index: usize,
) {
    let mut searcher = Searcher::new(tt, &shared.stop, index, &game.history);
    let mut guess = 0;
    for depth in 1..=max_depth as i32 {
        let target = depth + (index % 3) as i32;
        if target > max_depth as i32 {
            break;
        }
        match searcher.aspiration(&game.position, target, guess, HELPER_ASP_EDGE) {
            Ok(iteration) => {
                let stats = searcher.stats();
                shared
                    .nodes
                    .fetch_add(stats.nodes + stats.qnodes, Ordering::Relaxed);
                guess = iteration.eval;
                if shared.report(&iteration) {
                    debug!(
                        "helper {} reported depth {} score {}",
                        searcher.thread(),
                        target,
                        iteration.eval
                    );
                }
            }
            Err(Aborted) => break,
        }
    }
}
