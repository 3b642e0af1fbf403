//! End-to-end searches over the seven Soma pieces in a 3x3x3 cube.

use cubepack::geometry::Cell;
use cubepack::grid::format_solution;
use cubepack::pieces::{Catalog, PlacedInstance, Preset};
use cubepack::solver::{SolveMode, SolverOutcome, Solver, SolverConfig, Strategy};

fn assert_exact_cover(catalog: &Catalog, solver: &Solver<'_>, solution: &[PlacedInstance<'_>]) {
    let mut ids: Vec<usize> = solution.iter().map(PlacedInstance::piece_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..catalog.len()).collect::<Vec<_>>());

    let mut cells: Vec<Cell> = solution.iter().flat_map(|placed| placed.cells()).collect();
    cells.sort_unstable();
    assert_eq!(cells, solver.target().cells().collect::<Vec<_>>());
}

#[test_log::test]
fn test_first_solution_for_both_strategies() {
    let catalog = Preset::Soma.catalog().unwrap();

    for strategy in [Strategy::CellFirst, Strategy::PieceOrder] {
        let config = SolverConfig::new().with_strategy(strategy);
        let solver = Solver::new(&catalog, Preset::Soma.dims(), config).unwrap();

        let solution = solver.first_solution().unwrap();
        assert_exact_cover(&catalog, &solver, &solution);

        let rendered = format_solution(solver.target(), &solution);
        assert_eq!(rendered.lines().count(), 4, "{rendered}");
        assert!(!rendered.contains('.'), "{rendered}");
    }
}

#[test_log::test]
fn test_all_solutions() {
    let catalog = Preset::Soma.catalog().unwrap();
    let config = SolverConfig::new().with_mode(SolveMode::AllSolutions);
    let solver = Solver::new(&catalog, Preset::Soma.dims(), config).unwrap();

    let report = solver.solve();
    assert_eq!(report.outcome, SolverOutcome::Solved);
    assert_eq!(report.solutions.len(), 11520);
    for solution in report.solutions.iter().step_by(997) {
        assert_exact_cover(&catalog, &solver, solution);
    }
}

#[test_log::test]
fn test_distinct_solutions_up_to_rotation() {
    let catalog = Preset::Soma.catalog().unwrap();
    let config = SolverConfig::new()
        .with_mode(SolveMode::AllSolutions)
        .with_distinct(true);
    let solver = Solver::new(&catalog, Preset::Soma.dims(), config).unwrap();

    assert_eq!(solver.solve().solutions.len(), 480);
    assert_eq!(solver.solve_parallel().solutions.len(), 480);
}

#[test_log::test]
fn test_parallel_finds_every_solution() {
    let catalog = Preset::Soma.catalog().unwrap();
    let config = SolverConfig::new().with_mode(SolveMode::AllSolutions);
    let solver = Solver::new(&catalog, Preset::Soma.dims(), config).unwrap();

    let report = solver.solve_parallel();
    assert_eq!(report.outcome, SolverOutcome::Solved);
    assert_eq!(report.solutions.len(), 11520);
}

#[test_log::test]
fn test_shipped_puzzle_cannot_be_packed() {
    let catalog = Preset::Standard.catalog().unwrap();
    assert_eq!(catalog.total_cells(), 63);

    let solver = Solver::new(&catalog, Preset::Standard.dims(), SolverConfig::new()).unwrap();
    assert_eq!(solver.first_solution(), Err(SolverOutcome::Exhausted));
}
