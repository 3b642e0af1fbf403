//! Backtracking solver for exact polycube packing.
//!
//! Depth-first search over placements with explicit undo:
//! - Every successful `try_place` is paired with a `remove` on the way back up
//! - Remaining pieces are tracked in a bitmask, like the occupied cells
//! - The cell-first strategy only tries placements covering the smallest
//!   empty cell, which prunes every candidate that could never fill it
//! - Cancellation (flag or deadline) is checked before every attempt

use std::ops::{AddAssign, ControlFlow};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::geometry::Cell;
use crate::grid::{canonical_key, Bounds, Volume};
use crate::pieces::{Catalog, PlacedInstance};
use crate::placement::{covering, placements};

/// Most pieces the remaining-piece bitmask can hold.
pub const MAX_PIECES: usize = 64;

/// Default number of spare cells around the target on every side.
pub const DEFAULT_MARGIN: i32 = 4;

/// How many solutions to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SolveMode {
    /// Stop at the first complete packing.
    #[default]
    FirstSolution,
    /// Enumerate every packing.
    AllSolutions,
}

/// Which decision the search branches on at each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Strategy {
    /// Fill the lexicographically smallest empty cell with any remaining piece.
    #[default]
    CellFirst,
    /// Place the next remaining piece, in catalog order, anywhere it fits.
    PieceOrder,
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverOutcome {
    /// At least one complete packing was found.
    Solved,
    /// The whole search space was explored without a packing.
    Exhausted,
    /// Stopped early by the cancel flag or the deadline; inconclusive.
    Cancelled,
}

/// Search configuration.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub mode: SolveMode,
    pub strategy: Strategy,
    /// Maximum wall-clock time before the search gives up (`None` = unlimited).
    pub time_limit: Option<Duration>,
    /// Stop after this many solutions in [`SolveMode::AllSolutions`].
    pub max_solutions: Option<usize>,
    /// Drop solutions that are a rotation of one already found.
    pub distinct: bool,
    /// Spare cells around the target in the occupancy grid.
    pub margin: i32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            mode: SolveMode::default(),
            strategy: Strategy::default(),
            time_limit: None,
            max_solutions: None,
            distinct: false,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl SolverConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: SolveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_max_solutions(mut self, max: usize) -> Self {
        self.max_solutions = Some(max);
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_margin(mut self, margin: i32) -> Self {
        self.margin = margin;
        self
    }
}

/// A complete packing: one placed instance per piece.
pub type Solution<'a> = Vec<PlacedInstance<'a>>;

/// Counters gathered during a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Search nodes entered.
    pub nodes: u64,
    /// Candidates handed to `try_place`.
    pub attempts: u64,
    /// Candidates that were committed.
    pub placements: u64,
    pub elapsed: Duration,
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, other: Self) {
        self.nodes += other.nodes;
        self.attempts += other.attempts;
        self.placements += other.placements;
    }
}

/// Result of a solve.
#[derive(Debug, Clone)]
pub struct SolveReport<'a> {
    pub outcome: SolverOutcome,
    /// Solutions found, in search order. May be non-empty even when
    /// cancelled during an all-solutions search.
    pub solutions: Vec<Solution<'a>>,
    pub stats: SearchStats,
}

impl<'a> SolveReport<'a> {
    #[inline]
    pub fn is_solved(&self) -> bool {
        self.outcome == SolverOutcome::Solved
    }

    /// The solutions of a conclusive search; empty when exhausted.
    pub fn into_solutions(self) -> Result<Vec<Solution<'a>>> {
        match self.outcome {
            SolverOutcome::Cancelled => Err(Error::SolverCancelled),
            SolverOutcome::Solved | SolverOutcome::Exhausted => Ok(self.solutions),
        }
    }
}

/// Why the search unwound early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    /// Enough solutions were collected.
    Finished,
    Cancelled,
}

/// Signals checked before every candidate attempt.
#[derive(Clone, Copy)]
struct StopSignals<'s> {
    cancelled: &'s AtomicBool,
    /// Set by a sibling branch of a parallel first-solution search.
    found: Option<&'s AtomicBool>,
    deadline: Option<Instant>,
}

impl StopSignals<'_> {
    #[inline]
    fn should_stop(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.found.is_some_and(|found| found.load(Ordering::Relaxed))
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Solves one packing problem: a catalog of pieces and a target box.
pub struct Solver<'a> {
    catalog: &'a Catalog,
    volume: Volume,
    config: SolverConfig,
    cancelled: Arc<AtomicBool>,
}

impl<'a> Solver<'a> {
    /// Creates a solver for filling a `dims` box with every piece of `catalog`.
    pub fn new(catalog: &'a Catalog, dims: [i32; 3], config: SolverConfig) -> Result<Self> {
        if catalog.len() > MAX_PIECES {
            return Err(Error::TooManyPieces(catalog.len()));
        }
        let volume = Volume::new(dims, config.margin)?;

        Ok(Self {
            catalog,
            volume,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns a handle to cancel the search from another thread.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// The target region in grid coordinates; solutions are expressed in
    /// the same coordinates.
    pub fn target(&self) -> &Bounds {
        self.volume.target()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Runs the search on the current thread.
    pub fn solve(&self) -> SolveReport<'a> {
        self.run(self.config.mode)
    }

    /// Finds one packing, or the outcome explaining why there is none.
    pub fn first_solution(&self) -> std::result::Result<Solution<'a>, SolverOutcome> {
        let report = self.run(SolveMode::FirstSolution);
        match (report.outcome, report.solutions.into_iter().next()) {
            (SolverOutcome::Solved, Some(solution)) => Ok(solution),
            (outcome, _) => Err(outcome),
        }
    }

    fn run(&self, mode: SolveMode) -> SolveReport<'a> {
        let start = Instant::now();
        if let Some(report) = self.check_cell_count() {
            return report;
        }

        let signals = self.signals(start, None);
        let mut search = self.search(mode, signals);
        let flow = search.search();
        debug_assert_eq!(search.volume.filled(), 0, "search must unwind every placement");

        let outcome = match flow {
            ControlFlow::Break(Halt::Cancelled) => SolverOutcome::Cancelled,
            _ if search.solutions.is_empty() => SolverOutcome::Exhausted,
            _ => SolverOutcome::Solved,
        };
        self.report(outcome, search.solutions, search.stats, start)
    }

    /// Runs the search on the rayon thread pool, one task per candidate for
    /// the first decision.
    ///
    /// Each branch owns a clone of the volume; the catalog is shared
    /// read-only. In first-solution mode the first branch to succeed stops
    /// the others.
    pub fn solve_parallel(&self) -> SolveReport<'a> {
        let start = Instant::now();
        if let Some(report) = self.check_cell_count() {
            return report;
        }

        let mode = self.config.mode;
        let found = AtomicBool::new(false);
        let signals = self.signals(start, (mode == SolveMode::FirstSolution).then_some(&found));

        let root = self.search(mode, signals);
        let branches = root.candidates();
        log::debug!("Splitting search into {} branches", branches.len());

        let results: Vec<(ControlFlow<Halt>, Vec<Solution<'a>>, SearchStats)> = branches
            .into_par_iter()
            .map(|instance| {
                let mut search = self.search(mode, signals);
                let flow = search.attempt(instance);
                (flow, search.solutions, search.stats)
            })
            .collect();

        let mut stats = SearchStats {
            nodes: 1,
            ..SearchStats::default()
        };
        let mut solutions = Vec::new();
        let mut cancelled = false;
        for (flow, branch_solutions, branch_stats) in results {
            stats += branch_stats;
            solutions.extend(branch_solutions);
            cancelled |= flow == ControlFlow::Break(Halt::Cancelled);
        }

        if self.config.distinct {
            let target = *self.target();
            let mut seen = FxHashSet::default();
            solutions.retain(|solution| seen.insert(canonical_key(&target, solution)));
        }
        match mode {
            SolveMode::FirstSolution => solutions.truncate(1),
            SolveMode::AllSolutions => {
                if let Some(max) = self.config.max_solutions {
                    solutions.truncate(max);
                }
            }
        }

        let outcome = if mode == SolveMode::FirstSolution && !solutions.is_empty() {
            SolverOutcome::Solved
        } else if cancelled {
            SolverOutcome::Cancelled
        } else if solutions.is_empty() {
            SolverOutcome::Exhausted
        } else {
            SolverOutcome::Solved
        };
        self.report(outcome, solutions, stats, start)
    }

    /// Reports `Exhausted` up front when the pieces cannot cover the target
    /// exactly.
    fn check_cell_count(&self) -> Option<SolveReport<'a>> {
        let pieces = self.catalog.total_cells();
        let target = self.target().cell_count();
        if pieces == target {
            return None;
        }

        log::info!(
            "Pieces cover {pieces} cells but the target has {target}, no exact packing exists"
        );
        Some(SolveReport {
            outcome: SolverOutcome::Exhausted,
            solutions: Vec::new(),
            stats: SearchStats::default(),
        })
    }

    fn signals<'s>(&'s self, start: Instant, found: Option<&'s AtomicBool>) -> StopSignals<'s> {
        StopSignals {
            cancelled: &self.cancelled,
            found,
            deadline: self.config.time_limit.map(|limit| start + limit),
        }
    }

    fn search<'s>(&self, mode: SolveMode, signals: StopSignals<'s>) -> Search<'s, 'a> {
        let count = self.catalog.len();
        Search {
            catalog: self.catalog,
            strategy: self.config.strategy,
            mode,
            max_solutions: self.config.max_solutions,
            distinct: self.config.distinct,
            volume: self.volume.clone(),
            placed: Vec::with_capacity(count),
            remaining: if count == MAX_PIECES {
                u64::MAX
            } else {
                (1u64 << count) - 1
            },
            solutions: Vec::new(),
            seen: FxHashSet::default(),
            stats: SearchStats::default(),
            signals,
        }
    }

    fn report(
        &self,
        outcome: SolverOutcome,
        solutions: Vec<Solution<'a>>,
        mut stats: SearchStats,
        start: Instant,
    ) -> SolveReport<'a> {
        stats.elapsed = start.elapsed();
        let message = format!(
            "{outcome:?} with {} solutions after {} nodes, {} attempts, {} placements in {:?}",
            solutions.len(),
            stats.nodes,
            stats.attempts,
            stats.placements,
            stats.elapsed
        );
        if outcome == SolverOutcome::Cancelled {
            log::warn!("{message}");
        } else {
            log::info!("{message}");
        }

        SolveReport {
            outcome,
            solutions,
            stats,
        }
    }
}

/// State of one depth-first search: the volume, the pieces placed so far and
/// what has been found.
struct Search<'s, 'a> {
    catalog: &'a Catalog,
    strategy: Strategy,
    mode: SolveMode,
    max_solutions: Option<usize>,
    distinct: bool,
    volume: Volume,
    placed: Vec<PlacedInstance<'a>>,
    /// Bit `i` is set while piece `i` is still unplaced.
    remaining: u64,
    solutions: Vec<Solution<'a>>,
    seen: FxHashSet<Vec<u8>>,
    stats: SearchStats,
    signals: StopSignals<'s>,
}

impl<'a> Search<'_, 'a> {
    fn search(&mut self) -> ControlFlow<Halt> {
        self.stats.nodes += 1;
        let catalog = self.catalog;
        let target = *self.volume.target();

        match self.strategy {
            Strategy::CellFirst => {
                let Some(cell) = self.volume.first_empty() else {
                    return self.record();
                };
                for instance in cell_candidates(catalog, target, cell, self.remaining) {
                    self.attempt(instance)?;
                }
            }
            Strategy::PieceOrder => {
                if self.volume.is_full() {
                    return self.record();
                }
                for instance in piece_candidates(catalog, target, self.remaining) {
                    self.attempt(instance)?;
                }
            }
        }

        // no candidate led to a packing
        ControlFlow::Continue(())
    }

    /// All candidates for the decision at the current node.
    fn candidates(&self) -> Vec<PlacedInstance<'a>> {
        let target = *self.volume.target();
        match self.strategy {
            Strategy::CellFirst => match self.volume.first_empty() {
                Some(cell) => cell_candidates(self.catalog, target, cell, self.remaining).collect(),
                None => Vec::new(),
            },
            Strategy::PieceOrder => {
                piece_candidates(self.catalog, target, self.remaining).collect()
            }
        }
    }

    fn attempt(&mut self, instance: PlacedInstance<'a>) -> ControlFlow<Halt> {
        if self.signals.should_stop() {
            return ControlFlow::Break(Halt::Cancelled);
        }

        self.stats.attempts += 1;
        if !self.volume.try_place(&instance) {
            return ControlFlow::Continue(());
        }
        self.stats.placements += 1;

        let bit = 1u64 << instance.piece_id();
        self.remaining &= !bit;
        self.placed.push(instance);

        let flow = self.search();

        // undo on every exit from the subtree, success included
        self.placed.pop();
        self.remaining |= bit;
        self.volume.remove(&instance);

        flow
    }

    fn record(&mut self) -> ControlFlow<Halt> {
        if self.distinct && !self.seen.insert(canonical_key(self.volume.target(), &self.placed)) {
            return ControlFlow::Continue(());
        }

        self.solutions.push(self.placed.clone());
        log::trace!("Solution {} found", self.solutions.len());

        let finished = match self.mode {
            SolveMode::FirstSolution => {
                if let Some(found) = self.signals.found {
                    found.store(true, Ordering::Relaxed);
                }
                true
            }
            SolveMode::AllSolutions => self
                .max_solutions
                .is_some_and(|max| self.solutions.len() >= max),
        };

        if finished {
            ControlFlow::Break(Halt::Finished)
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// Placements of every remaining piece that cover `cell`.
fn cell_candidates<'a>(
    catalog: &'a Catalog,
    target: Bounds,
    cell: Cell,
    remaining: u64,
) -> impl Iterator<Item = PlacedInstance<'a>> {
    catalog
        .orientation_sets()
        .filter(move |set| remaining & (1u64 << set.id()) != 0)
        .flat_map(|set| set.iter())
        .flat_map(move |orientation| {
            covering(orientation, &target, cell)
                .map(move |offset| PlacedInstance::new(orientation, offset))
        })
}

/// Every placement of the first remaining piece.
fn piece_candidates<'a>(
    catalog: &'a Catalog,
    target: Bounds,
    remaining: u64,
) -> impl Iterator<Item = PlacedInstance<'a>> {
    let next = (remaining != 0).then(|| remaining.trailing_zeros() as usize);
    next.and_then(|id| catalog.orientations(id))
        .into_iter()
        .flat_map(|set| set.iter())
        .flat_map(move |orientation| {
            placements(orientation, &target)
                .map(move |offset| PlacedInstance::new(orientation, offset))
        })
}
