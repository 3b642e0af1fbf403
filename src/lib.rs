//! Polycube Packing Library
//!
//! Fills a rectangular box with a fixed set of polycube pieces, each used
//! exactly once in any of its 24 rotations, by depth-first backtracking over
//! an occupancy grid.
//!
//! ```no_run
//! use cubepack::pieces::Preset;
//! use cubepack::solver::{Solver, SolverConfig};
//!
//! let catalog = Preset::Soma.catalog()?;
//! let solver = Solver::new(&catalog, Preset::Soma.dims(), SolverConfig::new())?;
//! if let Ok(solution) = solver.first_solution() {
//!     print!("{}", cubepack::grid::format_solution(solver.target(), &solution));
//! }
//! # Ok::<(), cubepack::Error>(())
//! ```

pub mod error;
pub mod geometry;
pub mod grid;
pub mod pieces;
pub mod placement;
pub mod solver;

pub use error::{Error, Result};
