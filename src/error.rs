//! Error types for cubepack.

use thiserror::Error;

use crate::geometry::Cell;
use crate::pieces::PieceId;

/// Result type alias for cubepack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a catalog, addressing a volume or searching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Rotations are only defined for quarter, half and three-quarter turns.
    #[error("invalid rotation of {0} degrees, expected 90, 180 or 270")]
    InvalidRotation(i32),

    /// A cell or translated cell lies outside the allocated grid.
    #[error("cell {0} lies outside the grid")]
    OutOfBounds(Cell),

    /// A piece was defined without any cells.
    #[error("piece {0} has no cells")]
    EmptyShape(PieceId),

    /// A piece lists the same cell twice.
    #[error("piece {id} lists cell {cell} more than once")]
    DuplicateCell { id: PieceId, cell: Cell },

    /// Two catalog entries share an ID.
    #[error("piece id {0} is declared more than once")]
    DuplicatePieceId(PieceId),

    /// Catalog IDs must be exactly 0..count.
    #[error("piece id {id} is outside 0..{count}")]
    PieceIdOutOfRange { id: PieceId, count: usize },

    /// The target region needs at least one cell per axis and a non-negative margin.
    #[error("invalid target dimensions {dims:?} with margin {margin}")]
    InvalidDimensions { dims: [i32; 3], margin: i32 },

    /// The solver tracks remaining pieces in a 64-bit mask.
    #[error("catalog holds {0} pieces, the solver supports at most 64")]
    TooManyPieces(usize),

    /// The search stopped on request or at its deadline before it was conclusive.
    #[error("search cancelled before completion")]
    SolverCancelled,
}
