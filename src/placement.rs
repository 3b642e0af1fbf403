//! Enumeration of the translations that keep an oriented piece inside the
//! target box.
//!
//! This is pure geometry: occupancy is not consulted here, the solver
//! filters conflicts when it tries to place each candidate.

use crate::geometry::{Cell, Translation};
use crate::grid::Bounds;
use crate::pieces::PieceShape;

/// Lazy sequence of valid translations, in lexicographic order.
///
/// Calling [`placements`] again with the same inputs, or cloning before
/// consuming, replays the identical sequence.
#[derive(Debug, Clone)]
pub struct Placements {
    range: Option<Bounds>,
    next: Option<Translation>,
}

impl Placements {
    /// The box of all valid translations, or `None` if the piece cannot fit.
    #[inline]
    pub fn range(&self) -> Option<Bounds> {
        self.range
    }
}

impl Iterator for Placements {
    type Item = Translation;

    fn next(&mut self) -> Option<Translation> {
        let current = self.next?;
        let range = self.range?;
        let (min, max) = (range.min(), range.max());

        // advance z fastest, then y, then x
        let mut next = current;
        next.z += 1;
        if next.z > max.z {
            next.z = min.z;
            next.y += 1;
            if next.y > max.y {
                next.y = min.y;
                next.x += 1;
            }
        }
        self.next = (next.x <= max.x).then_some(next);

        Some(current)
    }
}

/// Every translation that puts all cells of `shape` inside `target`.
pub fn placements(shape: &PieceShape, target: &Bounds) -> Placements {
    let cells = shape.cells();
    let range = cells
        .iter()
        .copied()
        .reduce(Cell::min)
        .zip(cells.iter().copied().reduce(Cell::max))
        .and_then(|(low, high)| Bounds::new(target.min() - low, target.max() - high));

    Placements {
        range,
        next: range.map(|range| range.min()),
    }
}

/// The translations from [`placements`] whose translated shape contains `cell`.
///
/// Produced directly by anchoring each cell of the shape on `cell`, in shape
/// cell order, instead of scanning the whole range.
pub fn covering<'a>(
    shape: &'a PieceShape,
    target: &Bounds,
    cell: Cell,
) -> impl Iterator<Item = Translation> + 'a {
    let range = placements(shape, target).range();
    shape
        .cells()
        .iter()
        .map(move |&anchor| cell - anchor)
        .filter(move |&offset| range.is_some_and(|range| range.contains(offset)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceId;

    fn shape(id: PieceId, coords: &[(i32, i32, i32)]) -> PieceShape {
        PieceShape::new(id, coords.iter().copied().map(Cell::from)).unwrap()
    }

    fn bent() -> PieceShape {
        shape(0, &[(0, 0, 0), (1, 0, 0), (1, 1, 0), (1, 1, 1)])
    }

    fn fits(shape: &PieceShape, target: &Bounds, offset: Translation) -> bool {
        shape.translated(offset).into_iter().all(|cell| target.contains(cell))
    }

    #[test]
    fn test_monocube_reaches_every_cell() {
        let target = Bounds::cuboid_at([4, 4, 4], Cell::new(2, 2, 2)).unwrap();
        let offsets: Vec<Translation> = placements(&shape(0, &[(0, 0, 0)]), &target).collect();
        assert_eq!(offsets, target.cells().collect::<Vec<_>>());
    }

    #[test]
    fn test_bar_spanning_an_axis() {
        let target = Bounds::cuboid([4, 4, 4]).unwrap();
        let bar = shape(0, &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)]);
        let offsets: Vec<Translation> = placements(&bar, &target).collect();
        assert_eq!(offsets.len(), 16);
        assert!(offsets.iter().all(|offset| offset.x == 0));
    }

    #[test]
    fn test_oversized_piece_has_no_placements() {
        let target = Bounds::cuboid([3, 3, 3]).unwrap();
        let bar = shape(0, &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)]);
        assert_eq!(placements(&bar, &target).count(), 0);
        assert!(placements(&bar, &target).range().is_none());
        assert_eq!(covering(&bar, &target, Cell::ORIGIN).count(), 0);
    }

    #[test]
    fn test_placements_are_exactly_the_fitting_offsets() {
        let target = Bounds::cuboid_at([3, 2, 4], Cell::new(1, 1, 1)).unwrap();
        let piece = bent();
        let found: Vec<Translation> = placements(&piece, &target).collect();

        let search = Bounds::cuboid([8, 8, 8]).unwrap();
        let expected: Vec<Translation> = search
            .cells()
            .map(|cell| cell - Cell::new(2, 2, 2))
            .filter(|&offset| fits(&piece, &target, offset))
            .collect();

        assert_eq!(found, expected);
        assert_eq!(found.len(), 6);
    }

    #[test]
    fn test_placements_are_restartable() {
        let target = Bounds::cuboid([4, 3, 3]).unwrap();
        let piece = bent();
        let first: Vec<Translation> = placements(&piece, &target).collect();

        let partially_used = {
            let mut iter = placements(&piece, &target);
            iter.next();
            iter
        };
        let second: Vec<Translation> = placements(&piece, &target).collect();
        assert_eq!(first, second);
        assert_eq!(partially_used.count(), first.len() - 1);
    }

    #[test]
    fn test_covering_matches_filtered_placements() {
        let target = Bounds::cuboid([3, 3, 3]).unwrap();
        let piece = bent();

        for cell in target.cells() {
            let mut direct: Vec<Translation> = covering(&piece, &target, cell).collect();
            direct.sort();
            let filtered: Vec<Translation> = placements(&piece, &target)
                .filter(|&offset| piece.translated(offset).contains(&cell))
                .collect();
            assert_eq!(direct, filtered, "covering {cell}");
        }
    }
}
