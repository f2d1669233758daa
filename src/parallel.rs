//! Parallel root search on a fixed pool of worker threads
//!
//! The dispatcher resolves root moves that end the game on the spot and
//! packages every other root move as a [`SearchJob`]: a private copy of the
//! board with the move already played. Jobs go out on a bounded channel to
//! long-lived workers, each running a full alpha-beta descent, and come back
//! on a second channel with their score and leaf count filled in. Returned
//! jobs are kept on a free list and reused by the next search.
//!
//! Results are merged through [`MoveKeeper`], so the arrival order does not
//! matter, and the outcome equals the sequential [`AlphaBeta`] search.
//!
//! [`AlphaBeta`]: crate::search::AlphaBeta

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, trace, warn};
use rand::rngs::StdRng;

use crate::board::{Board, Coord, Player, CELLS};
use crate::config::{make_rng, SearchConfig};
use crate::eval::{Evaluation, Evaluator};
use crate::ordering::MoveOrder;
use crate::search::{
    settled_root, MoveKeeper, SearchOutcome, SearchStrategy, Session, INFINITY,
};
use crate::{Result, SquavaError};

/// How long the dispatcher waits on results before checking worker health
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One root move handed to a worker
#[derive(Debug, Clone, Default)]
pub struct SearchJob {
    /// Position after the root move
    pub board: Board,
    pub max_depth: u32,
    /// The root move
    pub mv: Coord,
    /// Side that played the root move
    pub to_move: Player,
    /// Heuristic value of the root move
    pub carried: i32,
    /// Score of the root move for `to_move`, set by the worker
    pub value: i32,
    /// Leaves visited below the root move, set by the worker
    pub leaves: u64,
}

impl SearchJob {
    /// Runs the alpha-beta descent below the root move
    pub fn run(&mut self, evaluator: &dyn Evaluator, order: MoveOrder) {
        let mut session = Session::new(&mut self.board, evaluator, self.max_depth, order);
        let value = session.alpha_beta(
            1,
            self.to_move.opponent(),
            -INFINITY,
            INFINITY,
            self.carried,
        );
        self.leaves = session.leaves;
        self.value = self.to_move.sign() * value;
    }
}

fn worker_loop(
    id: usize,
    evaluator: Arc<dyn Evaluator>,
    order: MoveOrder,
    jobs: Receiver<Box<SearchJob>>,
    results: Sender<Box<SearchJob>>,
) {
    for mut job in jobs.iter() {
        trace!("worker {} searching {} at depth {}", id, job.mv, job.max_depth);
        job.run(&*evaluator, order);
        if results.send(job).is_err() {
            break;
        }
    }
    debug!("worker {} shutting down", id);
}

/// Fixed-size pool of alpha-beta workers
///
/// Workers live until the pool is shut down, either explicitly through
/// [`WorkerPool::shutdown`] or when the pool is dropped.
///
/// # Example
///
/// ```
/// use squava::{Board, Player, SearchConfig, SearchStrategy, WorkerPool};
///
/// let config = SearchConfig::default().with_workers(2).with_deterministic(true);
/// let mut pool = WorkerPool::from_config(&config).unwrap();
/// let outcome = pool.search(&Board::new(), Player::Max, 2, true).unwrap();
/// assert!(outcome.best.is_some());
/// pool.shutdown().unwrap();
/// ```
pub struct WorkerPool {
    jobs: Option<Sender<Box<SearchJob>>>,
    results: Receiver<Box<SearchJob>>,
    workers: Vec<JoinHandle<()>>,
    free: Vec<Box<SearchJob>>,
    evaluator: Arc<dyn Evaluator>,
    order: MoveOrder,
    rng: StdRng,
}

impl WorkerPool {
    /// Starts `workers` threads sharing `evaluator`
    pub fn new(evaluator: Arc<dyn Evaluator>, workers: usize, order: MoveOrder) -> Result<Self> {
        Self::start(evaluator, workers, order, None)
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        Self::start(config.evaluator(), config.workers, config.move_order, config.seed)
    }

    fn start(
        evaluator: Arc<dyn Evaluator>,
        workers: usize,
        order: MoveOrder,
        seed: Option<u64>,
    ) -> Result<Self> {
        if workers == 0 {
            return Err(SquavaError::InvalidConfiguration(
                "worker pool needs at least one worker".into(),
            ));
        }
        let (job_tx, job_rx) = bounded::<Box<SearchJob>>(CELLS);
        let (result_tx, result_rx) = bounded::<Box<SearchJob>>(CELLS);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let evaluator = Arc::clone(&evaluator);
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("squava-worker-{}", id))
                .spawn(move || worker_loop(id, evaluator, order, jobs, results))?;
            handles.push(handle);
        }
        debug!("started {} search workers", workers);

        Ok(WorkerPool {
            jobs: Some(job_tx),
            results: result_rx,
            workers: handles,
            free: Vec::with_capacity(CELLS),
            evaluator,
            order,
            rng: make_rng(seed),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Jobs waiting on the free list
    pub fn free_jobs(&self) -> usize {
        self.free.len()
    }

    pub fn is_closed(&self) -> bool {
        self.jobs.is_none()
    }

    /// Closes the job channel and waits for every worker to exit
    pub fn shutdown(&mut self) -> Result<()> {
        // Workers leave their loop once the channel is closed and drained.
        self.jobs = None;
        let mut lost = false;
        for handle in self.workers.drain(..) {
            lost |= handle.join().is_err();
        }
        if lost {
            Err(SquavaError::WorkerLost)
        } else {
            Ok(())
        }
    }

    fn take_job(&mut self) -> Box<SearchJob> {
        self.free.pop().unwrap_or_default()
    }

    /// Closes the pool after a search could not be completed.
    ///
    /// Results of the broken search may still be in flight, so the pool
    /// never reads from the result channel again.
    fn abandon(&mut self) -> SquavaError {
        warn!("search worker lost, closing the pool");
        self.jobs = None;
        SquavaError::WorkerLost
    }

    fn collect(&mut self) -> Result<Box<SearchJob>> {
        loop {
            match self.results.recv_timeout(POLL_INTERVAL) {
                Ok(job) => return Ok(job),
                Err(RecvTimeoutError::Timeout) => {
                    if self.workers.iter().any(|handle| handle.is_finished()) {
                        return Err(self.abandon());
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return Err(self.abandon()),
            }
        }
    }
}

impl SearchStrategy for WorkerPool {
    fn name(&self) -> &'static str {
        "parallel alpha-beta"
    }

    fn search(
        &mut self,
        board: &Board,
        to_move: Player,
        max_depth: u32,
        deterministic: bool,
    ) -> Result<SearchOutcome> {
        let start = Instant::now();
        let sender = self.jobs.clone().ok_or(SquavaError::PoolClosed)?;
        if let Some(outcome) = settled_root(&*self.evaluator, self.name(), board) {
            return Ok(outcome);
        }

        let mut keeper = MoveKeeper::new();
        let mut leaves = 0;
        let mut pending = 0;
        let mut scratch = *board;
        for cell in scratch.empty_cells().iter() {
            scratch.set(cell, to_move);
            match self.evaluator.delta(&scratch, 0, cell, 0, max_depth) {
                Evaluation::Continue(carried) => {
                    let mut job = self.take_job();
                    job.board = scratch;
                    job.max_depth = max_depth;
                    job.mv = cell;
                    job.to_move = to_move;
                    job.carried = carried;
                    job.value = 0;
                    job.leaves = 0;
                    if sender.send(job).is_err() {
                        return Err(self.abandon());
                    }
                    pending += 1;
                }
                stop => {
                    leaves += 1;
                    keeper.offer(cell, to_move.sign() * stop.value());
                }
            }
            scratch.clear(cell);
        }

        for _ in 0..pending {
            let job = self.collect()?;
            leaves += job.leaves;
            keeper.offer(job.mv, job.value);
            self.free.push(job);
        }

        let outcome = keeper.into_outcome(deterministic, &mut self.rng, leaves);
        debug!(
            "parallel alpha-beta ({} workers) chose {:?} for {:?}: score {}, {} leaves in {:?}",
            self.workers.len(),
            outcome.best,
            to_move,
            outcome.score,
            outcome.leaves,
            start.elapsed()
        );
        Ok(outcome)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() && self.shutdown().is_err() {
            warn!("a search worker panicked before shutdown");
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("free_jobs", &self.free.len())
            .field("closed", &self.is_closed())
            .field("evaluator", &self.evaluator.name())
            .field("order", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::StandardEvaluator;

    fn pool(workers: usize) -> WorkerPool {
        WorkerPool::new(Arc::new(StandardEvaluator::new()), workers, MoveOrder::Heuristic).unwrap()
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = WorkerPool::new(Arc::new(StandardEvaluator::new()), 0, MoveOrder::Natural);
        assert!(matches!(result, Err(SquavaError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_jobs_are_recycled() {
        let mut pool = pool(2);
        let board = Board::from_rows(&["X....", ".....", "..O..", ".....", "....."]).unwrap();
        pool.search(&board, Player::Max, 2, true).unwrap();
        let recycled = pool.free_jobs();
        assert_eq!(recycled, 23);
        pool.search(&board, Player::Min, 2, true).unwrap();
        assert_eq!(pool.free_jobs(), recycled);
    }

    #[test]
    fn test_search_after_shutdown_fails() {
        let mut pool = pool(1);
        pool.shutdown().unwrap();
        assert!(pool.is_closed());
        let result = pool.search(&Board::new(), Player::Max, 2, true);
        assert!(matches!(result, Err(SquavaError::PoolClosed)));
    }

    #[test]
    fn test_terminal_root_moves_resolved_inline() {
        let mut pool = pool(2);
        let board = Board::from_rows(&["XX.X.", "OO...", ".....", "...O.", "....."]).unwrap();
        let outcome = pool.search(&board, Player::Max, 3, true).unwrap();
        assert_eq!(outcome.best, Some(Coord::new(0, 2)));
    }

    #[test]
    fn test_decided_root_skips_workers() {
        let mut pool = pool(2);
        let board = Board::from_rows(&["XXXX.", "OO...", ".....", "..O..", "....."]).unwrap();
        let outcome = pool.search(&board, Player::Min, 3, true).unwrap();
        assert_eq!(outcome, SearchOutcome::no_move(0));
        assert_eq!(pool.free_jobs(), 0);
    }

    /// Panics on every position below the root
    #[derive(Debug)]
    struct PanicsBelowRoot;

    impl Evaluator for PanicsBelowRoot {
        fn name(&self) -> &'static str {
            "panics below root"
        }

        fn delta(&self, _: &Board, ply: u32, _: Coord, _: i32, _: u32) -> Evaluation {
            if ply > 0 {
                panic!("evaluator failure at ply {}", ply);
            }
            Evaluation::Continue(0)
        }

        fn static_value(&self, _: &Board, _: u32) -> Evaluation {
            Evaluation::Continue(0)
        }
    }

    #[test]
    fn test_panicking_worker_closes_pool() {
        let mut pool = WorkerPool::new(Arc::new(PanicsBelowRoot), 2, MoveOrder::Natural).unwrap();
        let board = Board::from_rows(&["X....", ".....", "..O..", ".....", "....."]).unwrap();
        let result = pool.search(&board, Player::Max, 3, true);
        assert!(matches!(result, Err(SquavaError::WorkerLost)));
        assert!(pool.is_closed());
        let again = pool.search(&board, Player::Max, 3, true);
        assert!(matches!(again, Err(SquavaError::PoolClosed)));
        assert!(matches!(pool.shutdown(), Err(SquavaError::WorkerLost)));
    }
}
