//! Polycube Packing Solver
//!
//! Packs a set of polycube pieces into a box so that every cell is covered
//! exactly once. Pieces come from a bundled preset or a JSON file of piece
//! records; solutions are printed as z-slices or as JSON records.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use cubepack::grid::format_solution;
use cubepack::pieces::{Catalog, PieceShape, PlacedInstance, Preset};
use cubepack::solver::{SolveMode, SolveReport, Solver, SolverConfig, Strategy, DEFAULT_MARGIN};

/// Packs polycube pieces into a box.
#[derive(Parser)]
#[command(name = "cubepack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bundled piece set and box.
    #[arg(long, value_enum, default_value_t, global = true)]
    preset: Preset,

    /// JSON file of piece records, replacing the preset's pieces.
    #[arg(long, global = true)]
    pieces: Option<PathBuf>,

    /// Box size as X,Y,Z, replacing the preset's box.
    #[arg(long, value_delimiter = ',', global = true)]
    dims: Option<Vec<i32>>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the piece records as JSON.
    Pieces,
    /// Print the distinct orientation count of every piece.
    Orientations {
        /// Print every orientation as a JSON record instead.
        #[arg(long)]
        json: bool,
    },
    /// Search for packings.
    Solve(SolveArgs),
}

#[derive(clap::Args)]
struct SolveArgs {
    /// Enumerate every packing instead of stopping at the first.
    #[arg(long)]
    all: bool,

    /// Skip packings that are rotations of one already found.
    #[arg(long)]
    distinct: bool,

    /// Give up after this many milliseconds.
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Stop after this many packings.
    #[arg(long)]
    max_solutions: Option<usize>,

    #[arg(long, value_enum, default_value_t)]
    strategy: Strategy,

    /// Split the search across the rayon thread pool.
    #[arg(long)]
    parallel: bool,

    /// Print packings as JSON piece records.
    #[arg(long)]
    json: bool,

    /// Spare cells around the box in the occupancy grid.
    #[arg(long, default_value_t = DEFAULT_MARGIN)]
    margin: i32,
}

impl Default for SolveArgs {
    fn default() -> Self {
        Self {
            all: false,
            distinct: false,
            time_limit_ms: None,
            max_solutions: None,
            strategy: Strategy::default(),
            parallel: false,
            json: false,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl SolveArgs {
    fn config(&self) -> SolverConfig {
        let mode = if self.all {
            SolveMode::AllSolutions
        } else {
            SolveMode::FirstSolution
        };
        let mut config = SolverConfig::new()
            .with_mode(mode)
            .with_strategy(self.strategy)
            .with_distinct(self.distinct)
            .with_margin(self.margin);
        if let Some(ms) = self.time_limit_ms {
            config = config.with_time_limit(Duration::from_millis(ms));
        }
        if let Some(max) = self.max_solutions {
            config = config.with_max_solutions(max);
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let catalog = load_catalog(&cli)?;
    let dims = box_dims(&cli)?;

    match cli.command {
        Some(Command::Pieces) => {
            let shapes: Vec<&PieceShape> = catalog.list_piece_shapes().collect();
            println!("{}", serde_json::to_string_pretty(&shapes)?);
        }
        Some(Command::Orientations { json }) => print_orientations(&catalog, json)?,
        Some(Command::Solve(args)) => run_solver(&catalog, dims, &args)?,
        // default: first packing of the selected puzzle
        None => run_solver(&catalog, dims, &SolveArgs::default())?,
    }

    Ok(())
}

/// Builds the catalog from the pieces file if given, otherwise the preset.
fn load_catalog(cli: &Cli) -> Result<Catalog, Box<dyn std::error::Error>> {
    let Some(path) = &cli.pieces else {
        return Ok(cli.preset.catalog()?);
    };

    let text = fs::read_to_string(path)?;
    let shapes: Vec<PieceShape> = serde_json::from_str(&text)?;
    log::debug!("Read {} piece records from {}", shapes.len(), path.display());
    Ok(Catalog::from_shapes(shapes)?)
}

fn box_dims(cli: &Cli) -> Result<[i32; 3], String> {
    match &cli.dims {
        None => Ok(cli.preset.dims()),
        Some(dims) => <[i32; 3]>::try_from(dims.as_slice())
            .map_err(|_| format!("--dims takes exactly three values, got {}", dims.len())),
    }
}

fn print_orientations(catalog: &Catalog, json: bool) -> Result<(), serde_json::Error> {
    if json {
        let sets: Vec<&[PieceShape]> = catalog.orientation_sets().map(|set| set.members()).collect();
        println!("{}", serde_json::to_string_pretty(&sets)?);
        return Ok(());
    }

    for set in catalog.orientation_sets() {
        let name = catalog.name(set.id()).unwrap_or("-");
        println!("{:>3} {:<8} {:>2} orientations", set.id(), name, set.len());
    }
    Ok(())
}

/// Runs the search and prints every packing found.
fn run_solver(
    catalog: &Catalog,
    dims: [i32; 3],
    args: &SolveArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let solver = Solver::new(catalog, dims, args.config())?;
    let report = if args.parallel {
        solver.solve_parallel()
    } else {
        solver.solve()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&solution_records(&report))?);
    } else {
        for (i, solution) in report.solutions.iter().enumerate() {
            println!("Solution {}:", i + 1);
            println!("{}", format_solution(solver.target(), solution));
        }
    }

    eprintln!(
        "{:?}: {} solutions, {} nodes in {:?}",
        report.outcome,
        report.solutions.len(),
        report.stats.nodes,
        report.stats.elapsed
    );
    Ok(())
}

/// Each solution as piece records of absolute cells, in placement order.
fn solution_records(report: &SolveReport<'_>) -> Vec<Vec<PieceShape>> {
    report
        .solutions
        .iter()
        .map(|solution| solution.iter().map(PlacedInstance::to_record).collect())
        .collect()
}
