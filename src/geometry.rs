//! Integer 3D cells and the rotation group of the cube.
//!
//! A cube has 24 proper orientations in 3D space. Every rotation here is an
//! exact coordinate permutation with sign flips, so rotating a piece never
//! drifts off the integer lattice.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A unit cube position.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// A displacement applied to every cell of a piece.
pub type Translation = Cell;

impl Cell {
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

impl From<(i32, i32, i32)> for Cell {
    #[inline]
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl Add for Cell {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Cell {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Cell {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A non-identity rotation angle about one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    /// 90 degrees.
    Quarter,
    /// 180 degrees.
    Half,
    /// 270 degrees.
    ThreeQuarter,
}

impl Turn {
    #[inline]
    pub const fn quarters(self) -> u8 {
        match self {
            Turn::Quarter => 1,
            Turn::Half => 2,
            Turn::ThreeQuarter => 3,
        }
    }

    #[inline]
    pub const fn degrees(self) -> i32 {
        self.quarters() as i32 * 90
    }
}

impl TryFrom<i32> for Turn {
    type Error = Error;

    fn try_from(degrees: i32) -> Result<Self> {
        match degrees {
            90 => Ok(Turn::Quarter),
            180 => Ok(Turn::Half),
            270 => Ok(Turn::ThreeQuarter),
            other => Err(Error::InvalidRotation(other)),
        }
    }
}

impl Axis {
    /// Rotates a cell a quarter turn counter-clockwise about this axis
    /// (right-handed, looking from the positive end toward the origin).
    #[inline]
    pub const fn quarter_turn(self, cell: Cell) -> Cell {
        let Cell { x, y, z } = cell;
        match self {
            Axis::X => Cell::new(x, -z, y),
            Axis::Y => Cell::new(z, y, -x),
            Axis::Z => Cell::new(-y, x, z),
        }
    }

    #[inline]
    pub fn turn(self, cell: Cell, turn: Turn) -> Cell {
        (0..turn.quarters()).fold(cell, |cell, _| self.quarter_turn(cell))
    }
}

/// Rotates one cell about an axis through the origin.
///
/// Only 90, 180 and 270 degrees are accepted; the identity is never asked for
/// because the unrotated shape already supplies it.
pub fn rotate(cell: Cell, axis: Axis, degrees: i32) -> Result<Cell> {
    let turn = Turn::try_from(degrees)?;
    Ok(axis.turn(cell, turn))
}

/// Rotates every cell of a set. Cardinality and content are preserved.
pub fn rotate_set(cells: &[Cell], axis: Axis, degrees: i32) -> Result<Vec<Cell>> {
    let turn = Turn::try_from(degrees)?;
    Ok(cells.iter().map(|&cell| axis.turn(cell, turn)).collect())
}

/// Translates cells so the minimum x, y and z are all zero, keeping their order.
///
/// Two sets that differ only by translation normalize to the same cells.
pub fn normalize(cells: &[Cell]) -> Vec<Cell> {
    let Some(min) = cells.iter().copied().reduce(Cell::min) else {
        return Vec::new();
    };
    cells.iter().map(|&cell| cell - min).collect()
}

/// Adds `offset` to every cell.
pub fn translate(cells: &[Cell], offset: Translation) -> Vec<Cell> {
    cells.iter().map(|&cell| cell + offset).collect()
}

/// Component-wise maximum of a set, or `None` for an empty set.
pub fn extent(cells: &[Cell]) -> Option<Cell> {
    cells.iter().copied().reduce(Cell::max)
}

/// One proper rotation of the cube: an optional face turn about X or Y,
/// followed by an optional spin about Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rotation {
    face: Option<(Axis, Turn)>,
    spin: Option<Turn>,
}

impl Rotation {
    pub const IDENTITY: Self = Self::new(None, None);

    const fn new(face: Option<(Axis, Turn)>, spin: Option<Turn>) -> Self {
        Self { face, spin }
    }

    #[inline]
    pub fn apply(self, cell: Cell) -> Cell {
        let cell = match self.face {
            Some((axis, turn)) => axis.turn(cell, turn),
            None => cell,
        };
        match self.spin {
            Some(turn) => Axis::Z.turn(cell, turn),
            None => cell,
        }
    }

    pub fn apply_all(self, cells: &[Cell]) -> Vec<Cell> {
        cells.iter().map(|&cell| self.apply(cell)).collect()
    }
}

const fn face(axis: Axis, turn: Turn) -> Option<(Axis, Turn)> {
    Some((axis, turn))
}

const Q: Option<Turn> = Some(Turn::Quarter);
const H: Option<Turn> = Some(Turn::Half);
const T: Option<Turn> = Some(Turn::ThreeQuarter);

/// All 24 proper rotations of a cube.
///
/// Each entry is a face turn followed by a Z spin. The spin fixes +Z, so the
/// face turn alone decides which side of the piece ends up facing +Z (6
/// choices) and the spin picks one of 4 rotations about it. No two entries
/// coincide:
/// - Rotations 0-3: no face turn, spins 0/90/180/270
/// - Rotations 4-15: X quarter, half and three-quarter turns, each with 4 spins
/// - Rotations 16-23: Y quarter and three-quarter turns, each with 4 spins
pub const ROTATIONS: [Rotation; 24] = [
    // no face turn, then spins
    Rotation::IDENTITY,
    Rotation::new(None, Q),
    Rotation::new(None, H),
    Rotation::new(None, T),
    // X quarter turn, then spins
    Rotation::new(face(Axis::X, Turn::Quarter), None),
    Rotation::new(face(Axis::X, Turn::Quarter), Q),
    Rotation::new(face(Axis::X, Turn::Quarter), H),
    Rotation::new(face(Axis::X, Turn::Quarter), T),
    // X half turn, then spins
    Rotation::new(face(Axis::X, Turn::Half), None),
    Rotation::new(face(Axis::X, Turn::Half), Q),
    Rotation::new(face(Axis::X, Turn::Half), H),
    Rotation::new(face(Axis::X, Turn::Half), T),
    // X three-quarter turn, then spins
    Rotation::new(face(Axis::X, Turn::ThreeQuarter), None),
    Rotation::new(face(Axis::X, Turn::ThreeQuarter), Q),
    Rotation::new(face(Axis::X, Turn::ThreeQuarter), H),
    Rotation::new(face(Axis::X, Turn::ThreeQuarter), T),
    // Y quarter turn, then spins
    Rotation::new(face(Axis::Y, Turn::Quarter), None),
    Rotation::new(face(Axis::Y, Turn::Quarter), Q),
    Rotation::new(face(Axis::Y, Turn::Quarter), H),
    Rotation::new(face(Axis::Y, Turn::Quarter), T),
    // Y three-quarter turn, then spins
    Rotation::new(face(Axis::Y, Turn::ThreeQuarter), None),
    Rotation::new(face(Axis::Y, Turn::ThreeQuarter), Q),
    Rotation::new(face(Axis::Y, Turn::ThreeQuarter), H),
    Rotation::new(face(Axis::Y, Turn::ThreeQuarter), T),
];

#[cfg(test)]
mod tests {
    use super::*;

    const AXES: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn cells(coords: &[(i32, i32, i32)]) -> Vec<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    fn sorted(mut cells: Vec<Cell>) -> Vec<Cell> {
        cells.sort();
        cells
    }

    #[test]
    fn test_rejects_non_quarter_angles() {
        for degrees in [0, 45, 360, -90, 91] {
            assert_eq!(
                rotate(Cell::new(1, 2, 3), Axis::X, degrees),
                Err(Error::InvalidRotation(degrees))
            );
        }
        assert!(rotate_set(&[Cell::ORIGIN], Axis::Y, 0).is_err());
    }

    #[test]
    fn test_quarter_turn_directions() {
        let unit_x = Cell::new(1, 0, 0);
        let unit_y = Cell::new(0, 1, 0);
        let unit_z = Cell::new(0, 0, 1);

        assert_eq!(rotate(unit_x, Axis::Z, 90), Ok(unit_y));
        assert_eq!(rotate(unit_y, Axis::X, 90), Ok(unit_z));
        assert_eq!(rotate(unit_z, Axis::Y, 90), Ok(unit_x));
        assert_eq!(rotate(unit_x, Axis::Z, 180), Ok(-unit_x));
        assert_eq!(rotate(unit_x, Axis::Z, 270), Ok(-unit_y));
    }

    #[test]
    fn test_four_quarter_turns_round_trip() {
        let piece = normalize(&cells(&[(0, 0, 0), (1, 0, 0), (1, 1, 0), (1, 1, 2), (3, 2, 1)]));

        for axis in AXES {
            let mut current = piece.clone();
            for _ in 0..4 {
                current = normalize(&rotate_set(&current, axis, 90).unwrap());
            }
            assert_eq!(current, piece, "drift after four quarter turns about {axis:?}");
        }
    }

    #[test]
    fn test_half_turn_equals_two_quarters() {
        let cell = Cell::new(3, -5, 7);
        for axis in AXES {
            let twice = rotate(rotate(cell, axis, 90).unwrap(), axis, 90).unwrap();
            assert_eq!(rotate(cell, axis, 180).unwrap(), twice);
        }
    }

    #[test]
    fn test_rotate_set_preserves_content() {
        let piece = cells(&[(0, 0, 0), (1, 0, 0), (2, 0, 0), (2, 1, 0)]);
        let rotated = rotate_set(&piece, Axis::Y, 270).unwrap();
        assert_eq!(rotated.len(), piece.len());

        let back = rotate_set(&rotated, Axis::Y, 90).unwrap();
        assert_eq!(sorted(back), sorted(piece));
    }

    #[test]
    fn test_normalize_moves_minimum_to_origin() {
        let normalized = normalize(&cells(&[(-2, 5, 1), (-1, 5, 1), (-2, 6, 3)]));
        assert_eq!(normalized, cells(&[(0, 0, 0), (1, 0, 0), (0, 1, 2)]));
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_translate_and_extent() {
        let piece = cells(&[(0, 0, 0), (2, 1, 0)]);
        let moved = translate(&piece, Cell::new(1, 1, 1));
        assert_eq!(moved, cells(&[(1, 1, 1), (3, 2, 1)]));
        assert_eq!(extent(&piece), Some(Cell::new(2, 1, 0)));
        assert_eq!(extent(&[]), None);
    }

    #[test]
    fn test_rotations_are_distinct() {
        // an asymmetric probe separates all 24 rotations
        let probe = cells(&[(1, 2, 3)]);
        let mut images: Vec<Vec<Cell>> = ROTATIONS.iter().map(|r| r.apply_all(&probe)).collect();
        images.sort();
        images.dedup();
        assert_eq!(images.len(), 24);
    }

    #[test]
    fn test_rotations_are_proper() {
        for (index, rotation) in ROTATIONS.iter().enumerate() {
            let a = rotation.apply(Cell::new(1, 0, 0));
            let b = rotation.apply(Cell::new(0, 1, 0));
            let c = rotation.apply(Cell::new(0, 0, 1));
            let determinant = a.x * (b.y * c.z - b.z * c.y) - a.y * (b.x * c.z - b.z * c.x)
                + a.z * (b.x * c.y - b.y * c.x);
            assert_eq!(determinant, 1, "rotation {index} is a reflection");
        }
    }

    #[test]
    fn test_cell_serializes_as_named_fields() {
        let json = serde_json::to_string(&Cell::new(1, -2, 3)).unwrap();
        assert_eq!(json, r#"{"x":1,"y":-2,"z":3}"#);
    }
}
