//! Occupancy grid for cube packing puzzles.
//!
//! The volume is a flat, x-major array over the target box plus a margin on
//! every side. Each cell holds the ID of the piece that owns it, or nothing.

use crate::error::{Error, Result};
use crate::geometry::{Cell, ROTATIONS};
use crate::pieces::{PieceId, PlacedInstance};

/// An inclusive axis-aligned box of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    min: Cell,
    max: Cell,
}

impl Bounds {
    /// The box spanning `min..=max`, or `None` if it would hold no cells.
    ///
    /// Also `None` if the size along an axis does not fit in an `i32`.
    pub fn new(min: Cell, max: Cell) -> Option<Self> {
        let spans = [(min.x, max.x), (min.y, max.y), (min.z, max.z)];
        spans
            .iter()
            .all(|&(low, high)| low <= high && high.checked_sub(low).is_some_and(|d| d < i32::MAX))
            .then_some(Self { min, max })
    }

    /// A box with `dims` cells per axis whose minimum corner is the origin.
    pub fn cuboid(dims: [i32; 3]) -> Result<Self> {
        Self::cuboid_at(dims, Cell::ORIGIN)
    }

    /// A box with `dims` cells per axis whose minimum corner is `min`.
    pub fn cuboid_at(dims: [i32; 3], min: Cell) -> Result<Self> {
        if dims.iter().any(|&d| d < 1) {
            return Err(Error::InvalidDimensions { dims, margin: 0 });
        }
        let invalid = || Error::InvalidDimensions { dims, margin: 0 };
        let [dx, dy, dz] = dims;
        let max = Cell::new(
            min.x.checked_add(dx - 1).ok_or_else(invalid)?,
            min.y.checked_add(dy - 1).ok_or_else(invalid)?,
            min.z.checked_add(dz - 1).ok_or_else(invalid)?,
        );
        Ok(Self { min, max })
    }

    #[inline]
    pub fn min(&self) -> Cell {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Cell {
        self.max
    }

    /// Number of cells along each axis.
    #[inline]
    pub fn dims(&self) -> [i32; 3] {
        let size = self.max - self.min;
        [size.x + 1, size.y + 1, size.z + 1]
    }

    pub fn cell_count(&self) -> usize {
        self.dims().iter().map(|&d| d as usize).product()
    }

    /// [`Bounds::cell_count`], or `None` if it overflows `usize`.
    pub fn checked_cell_count(&self) -> Option<usize> {
        self.dims()
            .iter()
            .try_fold(1usize, |count, &d| count.checked_mul(d as usize))
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        (self.min.x..=self.max.x).contains(&cell.x)
            && (self.min.y..=self.max.y).contains(&cell.y)
            && (self.min.z..=self.max.z).contains(&cell.z)
    }

    /// Converts a cell to its x-major linear index within the box.
    #[inline]
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let [_, dy, dz] = self.dims().map(|d| d as usize);
        let local = cell - self.min;
        let [x, y, z] = [local.x, local.y, local.z].map(|c| c as usize);
        Some((x * dy + y) * dz + z)
    }

    /// All cells in lexicographic (x, then y, then z) order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let Bounds { min, max } = *self;
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| Cell::new(x, y, z)))
        })
    }
}

/// The occupancy grid: the target region centered in a margin-padded box.
///
/// Invariant: every cell is owned by at most one placed piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    grid: Bounds,
    target: Bounds,
    owners: Vec<Option<PieceId>>,
}

impl Volume {
    /// Allocates an empty volume for a target of `dims` cells per axis with
    /// `margin` extra cells on every side.
    ///
    /// The target's minimum corner sits at `(margin, margin, margin)`.
    pub fn new(dims: [i32; 3], margin: i32) -> Result<Self> {
        let invalid = || Error::InvalidDimensions { dims, margin };
        if margin < 0 || dims.iter().any(|&d| d < 1) {
            return Err(invalid());
        }

        let padding = margin.checked_mul(2).ok_or_else(invalid)?;
        let [Some(px), Some(py), Some(pz)] = dims.map(|d| d.checked_add(padding)) else {
            return Err(invalid());
        };

        let target =
            Bounds::cuboid_at(dims, Cell::new(margin, margin, margin)).map_err(|_| invalid())?;
        let grid = Bounds::cuboid([px, py, pz]).map_err(|_| invalid())?;
        let count = grid.checked_cell_count().ok_or_else(invalid)?;

        Ok(Self {
            grid,
            target,
            owners: vec![None; count],
        })
    }

    /// The region that must be covered.
    #[inline]
    pub fn target(&self) -> &Bounds {
        &self.target
    }

    /// The whole allocated grid, margin included.
    #[inline]
    pub fn bounds(&self) -> &Bounds {
        &self.grid
    }

    /// Returns the owner of a cell.
    #[inline]
    pub fn get(&self, cell: Cell) -> Result<Option<PieceId>> {
        let index = self.grid.index(cell).ok_or(Error::OutOfBounds(cell))?;
        Ok(self.owners[index])
    }

    /// Overwrites the owner of a cell and returns the previous one.
    ///
    /// Does not check for conflicts; callers read before they write.
    #[inline]
    pub fn set(&mut self, cell: Cell, owner: Option<PieceId>) -> Result<Option<PieceId>> {
        let index = self.grid.index(cell).ok_or(Error::OutOfBounds(cell))?;
        Ok(std::mem::replace(&mut self.owners[index], owner))
    }

    /// Places an instance if every cell it covers is inside the grid and empty.
    ///
    /// Returns `false` without touching the volume on any conflict.
    #[must_use]
    pub fn try_place(&mut self, instance: &PlacedInstance<'_>) -> bool {
        // read pass: a rejected placement must not leave partial writes
        if !instance.cells().all(|cell| matches!(self.get(cell), Ok(None))) {
            return false;
        }

        let id = instance.piece_id();
        for cell in instance.cells() {
            match self.set(cell, Some(id)) {
                Ok(None) => {}
                previous => panic!(
                    "occupancy invariant broken: placing piece {id} at {cell} found {previous:?}"
                ),
            }
        }
        true
    }

    /// Clears every cell of a previously placed instance.
    ///
    /// Must mirror a successful [`Volume::try_place`] of the same instance.
    pub fn remove(&mut self, instance: &PlacedInstance<'_>) {
        let id = instance.piece_id();
        for cell in instance.cells() {
            match self.set(cell, None) {
                Ok(Some(owner)) if owner == id => {}
                previous => panic!(
                    "occupancy invariant broken: removing piece {id} from {cell} found {previous:?}"
                ),
            }
        }
    }

    /// The lexicographically smallest empty cell of the target region.
    pub fn first_empty(&self) -> Option<Cell> {
        self.target
            .cells()
            .find(|&cell| matches!(self.get(cell), Ok(None)))
    }

    /// True when every target cell is owned.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.first_empty().is_none()
    }

    /// Number of owned cells in the target region.
    pub fn filled(&self) -> usize {
        self.target
            .cells()
            .filter(|&cell| matches!(self.get(cell), Ok(Some(_))))
            .count()
    }
}

/// Converts a solution to a flat x-major grid over `bounds`.
///
/// Each cell contains a 1-based piece number, or 0 for empty.
pub fn solution_to_grid(bounds: &Bounds, solution: &[PlacedInstance<'_>]) -> Vec<u8> {
    let mut grid = vec![0u8; bounds.cell_count()];

    for placed in solution {
        let piece_number = piece_number(placed.piece_id());
        for cell in placed.cells() {
            if let Some(index) = bounds.index(cell) {
                grid[index] = piece_number;
            }
        }
    }

    grid
}

#[inline]
fn piece_number(id: PieceId) -> u8 {
    u8::try_from(id + 1).unwrap_or(u8::MAX)
}

/// Computes the canonical form of a solution under rotations of the box.
///
/// Only rotations that map the box onto itself are considered, so every
/// rotation of a cube counts but a 4x2x1 slab keeps just four of them.
pub fn canonical_key(bounds: &Bounds, solution: &[PlacedInstance<'_>]) -> Vec<u8> {
    let dims = bounds.dims();
    let far = Cell::new(dims[0] - 1, dims[1] - 1, dims[2] - 1);
    let local = Bounds {
        min: Cell::ORIGIN,
        max: far,
    };
    let mut smallest = solution_to_grid(bounds, solution);

    // try all rotations except identity (index 0)
    for rotation in &ROTATIONS[1..] {
        let (a, b) = (rotation.apply(Cell::ORIGIN), rotation.apply(far));
        let origin = a.min(b);
        // rotations that swap unequal axes do not map the box onto itself
        if a.max(b) - origin != far {
            continue;
        }

        let mut rotated = vec![0u8; smallest.len()];
        for placed in solution {
            let piece_number = piece_number(placed.piece_id());
            for cell in placed.cells().filter(|&cell| bounds.contains(cell)) {
                let moved = rotation.apply(cell - bounds.min()) - origin;
                if let Some(index) = local.index(moved) {
                    rotated[index] = piece_number;
                }
            }
        }

        if rotated < smallest {
            smallest = rotated;
        }
    }

    smallest
}

/// Formats a solution as a human-readable string.
///
/// Displays the z-slices of `bounds` side by side, rows from top (largest y)
/// to bottom, one character per cell: the 1-based piece number (letters past
/// 9) or '.' for empty.
pub fn format_solution(bounds: &Bounds, solution: &[PlacedInstance<'_>]) -> String {
    let grid = solution_to_grid(bounds, solution);
    let [dx, dy, dz] = bounds.dims().map(|d| d as usize);
    let width = dx.max(4);

    let mut output = String::new();
    let header: Vec<String> = (0..dz)
        .map(|z| format!("{:<width$}", format!("z={z}")))
        .collect();
    output.push_str(header.join("  ").trim_end());
    output.push('\n');

    for y in (0..dy).rev() {
        let slices: Vec<String> = (0..dz)
            .map(|z| {
                let row: String = (0..dx)
                    .map(|x| display_char(grid[(x * dy + y) * dz + z]))
                    .collect();
                format!("{row:<width$}")
            })
            .collect();
        output.push_str(slices.join("  ").trim_end());
        output.push('\n');
    }

    output
}

fn display_char(piece_number: u8) -> char {
    if piece_number == 0 {
        return '.';
    }
    char::from_digit(u32::from(piece_number), 36)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('#')
}
