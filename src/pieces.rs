//! Piece definitions, orientation sets and the validated piece catalog.
//!
//! Each piece is defined by one canonical set of unit cube positions,
//! normalized to start at the origin. The catalog derives every distinct
//! rotation of every piece once, up front, and is read-only afterwards.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::geometry::{normalize, translate, Cell, Translation, ROTATIONS};

/// Identifier of a piece; catalog IDs are exactly `0..len`.
pub type PieceId = usize;

/// A 3D coordinate as written in the static piece tables.
pub type Coord = (i32, i32, i32);

/// A static piece definition.
#[derive(Debug, Clone, Copy)]
pub struct PieceDefinition {
    pub id: PieceId,
    pub name: &'static str,
    pub cells: &'static [Coord],
}

/// One rigid orientation of a piece, normalized to the origin.
///
/// Serializes as `{"blockID": id, "parts": [{"x", "y", "z"}, ...]}` with the
/// cells in their stored order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceShape {
    #[serde(rename = "blockID")]
    id: PieceId,
    #[serde(rename = "parts")]
    cells: Vec<Cell>,
}

impl PieceShape {
    /// Creates a shape from raw cells, normalizing it to the origin.
    pub fn new(id: PieceId, cells: impl IntoIterator<Item = Cell>) -> Result<Self> {
        let cells: Vec<Cell> = cells.into_iter().collect();
        if cells.is_empty() {
            return Err(Error::EmptyShape(id));
        }

        let mut seen = FxHashSet::default();
        if let Some(&cell) = cells.iter().find(|cell| !seen.insert(**cell)) {
            return Err(Error::DuplicateCell { id, cell });
        }

        Ok(Self {
            id,
            cells: normalize(&cells),
        })
    }

    #[inline]
    pub fn id(&self) -> PieceId {
        self.id
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in sorted order, the identity of the shape as a set.
    pub fn cell_set(&self) -> Vec<Cell> {
        let mut cells = self.cells.clone();
        cells.sort_unstable();
        cells
    }

    /// True if both shapes cover the same cells, ignoring order and ID.
    pub fn same_cells(&self, other: &PieceShape) -> bool {
        self.len() == other.len() && self.cell_set() == other.cell_set()
    }

    /// The shape's cells moved by `offset`.
    pub fn translated(&self, offset: Translation) -> Vec<Cell> {
        translate(&self.cells, offset)
    }
}

/// An oriented piece committed at an offset within a volume.
///
/// Borrows its orientation from the catalog, so trying a candidate costs no
/// allocation. Serializes as the piece record of its absolute cells, the
/// same as [`PlacedInstance::to_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacedInstance<'a> {
    pub orientation: &'a PieceShape,
    pub offset: Translation,
}

impl<'a> PlacedInstance<'a> {
    #[inline]
    pub fn new(orientation: &'a PieceShape, offset: Translation) -> Self {
        Self {
            orientation,
            offset,
        }
    }

    #[inline]
    pub fn piece_id(&self) -> PieceId {
        self.orientation.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.orientation.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orientation.is_empty()
    }

    /// Absolute cells covered by this instance, in shape order.
    #[inline]
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let offset = self.offset;
        self.orientation.cells.iter().map(move |&cell| cell + offset)
    }

    /// The piece record of the absolute cells, for presentation.
    pub fn to_record(&self) -> PieceShape {
        PieceShape {
            id: self.orientation.id,
            cells: self.cells().collect(),
        }
    }
}

impl Serialize for PlacedInstance<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

/// The distinct rotations of one piece, in generation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientationSet {
    id: PieceId,
    members: Vec<PieceShape>,
}

impl OrientationSet {
    #[inline]
    pub fn id(&self) -> PieceId {
        self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[inline]
    pub fn members(&self) -> &[PieceShape] {
        &self.members
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PieceShape> {
        self.members.iter()
    }
}

impl<'a> IntoIterator for &'a OrientationSet {
    type Item = &'a PieceShape;
    type IntoIter = std::slice::Iter<'a, PieceShape>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Generates all distinct orientations of a piece.
///
/// Applies the 24 rotations in order, normalizes each result, and keeps it
/// only if no earlier member covers the same cells. The first member is
/// always the shape itself. Symmetric pieces yield fewer than 24 members;
/// the count always divides 24.
pub fn build_orientations(shape: &PieceShape) -> Result<OrientationSet> {
    if shape.is_empty() {
        return Err(Error::EmptyShape(shape.id));
    }

    let mut seen: FxHashSet<Vec<Cell>> = FxHashSet::default();
    let mut members = Vec::new();

    for rotation in &ROTATIONS {
        let oriented = PieceShape {
            id: shape.id,
            cells: normalize(&rotation.apply_all(&shape.cells)),
        };
        // symmetric pieces map onto themselves under some rotations
        if seen.insert(oriented.cell_set()) {
            members.push(oriented);
        }
    }

    Ok(OrientationSet {
        id: shape.id,
        members,
    })
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    name: Option<String>,
    shape: PieceShape,
    orientations: OrientationSet,
}

/// The validated, immutable set of pieces for one puzzle, with every
/// orientation precomputed.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Builds a catalog from static definitions.
    ///
    /// IDs must be unique and cover `0..definitions.len()` exactly.
    pub fn new(definitions: &[PieceDefinition]) -> Result<Self> {
        Self::build(definitions.iter().map(|definition| {
            (
                Some(definition.name.to_string()),
                definition.id,
                definition.cells.iter().copied().map(Cell::from).collect::<Vec<_>>(),
            )
        }))
    }

    /// Builds a catalog from piece records, as read from the wire format.
    pub fn from_shapes(shapes: impl IntoIterator<Item = PieceShape>) -> Result<Self> {
        Self::build(
            shapes
                .into_iter()
                .map(|shape| (None, shape.id, shape.cells)),
        )
    }

    fn build(pieces: impl Iterator<Item = (Option<String>, PieceId, Vec<Cell>)>) -> Result<Self> {
        let pieces: Vec<_> = pieces.collect();
        let count = pieces.len();

        let mut seen_ids = vec![false; count];
        for (_, id, _) in &pieces {
            let Some(seen) = seen_ids.get_mut(*id) else {
                return Err(Error::PieceIdOutOfRange { id: *id, count });
            };
            if *seen {
                return Err(Error::DuplicatePieceId(*id));
            }
            *seen = true;
        }

        let mut entries = pieces
            .into_iter()
            .map(|(name, id, cells)| {
                let shape = PieceShape::new(id, cells)?;
                let orientations = build_orientations(&shape)?;
                Ok(CatalogEntry {
                    name,
                    shape,
                    orientations,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.shape.id);

        let catalog = Self { entries };
        log::debug!(
            "Built catalog of {} pieces ({} cells), orientation counts {:?}",
            catalog.len(),
            catalog.total_cells(),
            catalog
                .entries
                .iter()
                .map(|entry| entry.orientations.len())
                .collect::<Vec<_>>()
        );
        Ok(catalog)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The canonical, unrotated shapes in ID order.
    pub fn list_piece_shapes(&self) -> impl Iterator<Item = &PieceShape> + '_ {
        self.entries.iter().map(|entry| &entry.shape)
    }

    pub fn piece(&self, id: PieceId) -> Option<&PieceShape> {
        self.entries.get(id).map(|entry| &entry.shape)
    }

    pub fn name(&self, id: PieceId) -> Option<&str> {
        self.entries.get(id).and_then(|entry| entry.name.as_deref())
    }

    pub fn orientations(&self, id: PieceId) -> Option<&OrientationSet> {
        self.entries.get(id).map(|entry| &entry.orientations)
    }

    /// Every piece's orientation set, in ID order.
    pub fn orientation_sets(&self) -> impl Iterator<Item = &OrientationSet> + '_ {
        self.entries.iter().map(|entry| &entry.orientations)
    }

    /// Total number of unit cubes across all pieces.
    pub fn total_cells(&self) -> usize {
        self.entries.iter().map(|entry| entry.shape.len()).sum()
    }
}

/// A bundled puzzle: a piece set and the box it must fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// The six-piece 4x4x4 puzzle.
    #[default]
    Standard,
    /// The seven Soma pieces in a 3x3x3 cube.
    Soma,
}

impl Preset {
    pub fn definitions(self) -> &'static [PieceDefinition] {
        match self {
            Preset::Standard => PUZZLE_PIECES,
            Preset::Soma => SOMA_PIECES,
        }
    }

    /// Target box size per axis.
    pub fn dims(self) -> [i32; 3] {
        match self {
            Preset::Standard => [4, 4, 4],
            Preset::Soma => [3, 3, 3],
        }
    }

    pub fn catalog(self) -> Result<Catalog> {
        Catalog::new(self.definitions())
    }
}

const BLOCK_0: &[Coord] = &[(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 2, 0), (0, 3, 0), (1, 3, 0)];

const BLOCK_1: &[Coord] = &[
    (1, 0, 0),
    (2, 0, 0),
    (3, 0, 0),
    (1, 1, 0),
    (1, 2, 0),
    (1, 3, 0),
    (2, 3, 0),
    (1, 0, 1),
    (0, 0, 1),
    (0, 0, 2),
    (0, 0, 3),
    (0, 1, 1),
];

const BLOCK_2: &[Coord] = &[
    (1, 0, 0),
    (2, 0, 0),
    (3, 0, 0),
    (0, 1, 0),
    (1, 1, 0),
    (3, 1, 0),
    (0, 2, 0),
    (0, 2, 1),
    (3, 2, 0),
    (0, 3, 0),
];

const BLOCK_3: &[Coord] = &[
    (0, 0, 0),
    (1, 0, 0),
    (2, 0, 0),
    (0, 0, 1),
    (0, 1, 1),
    (0, 2, 1),
    (0, 3, 1),
    (2, 1, 0),
    (3, 1, 0),
];

const BLOCK_4: &[Coord] = &[
    (0, 0, 0),
    (1, 0, 0),
    (2, 0, 0),
    (0, 1, 0),
    (2, 1, 0),
    (3, 1, 0),
    (0, 2, 0),
    (3, 2, 0),
    (3, 3, 0),
    (0, 1, 1),
    (0, 0, 2),
    (0, 1, 2),
    (0, 1, 3),
    (0, 2, 3),
    (0, 3, 3),
];

const BLOCK_5: &[Coord] = &[
    (0, 0, 0),
    (1, 0, 0),
    (2, 0, 0),
    (0, 1, 0),
    (0, 2, 0),
    (2, 0, 1),
    (0, 1, 1),
    (2, 1, 1),
    (2, 2, 1),
    (3, 2, 1),
    (2, 2, 2),
];

/// The six pieces of the 4x4x4 puzzle.
///
/// Cell counts are 6, 12, 10, 9, 15 and 11, so together they cover 63 of the
/// box's 64 cells and the puzzle as shipped has no solution.
pub const PUZZLE_PIECES: &[PieceDefinition] = &[
    PieceDefinition { id: 0, name: "hook", cells: BLOCK_0 },
    PieceDefinition { id: 1, name: "chair", cells: BLOCK_1 },
    PieceDefinition { id: 2, name: "frame", cells: BLOCK_2 },
    PieceDefinition { id: 3, name: "step", cells: BLOCK_3 },
    PieceDefinition { id: 4, name: "bracket", cells: BLOCK_4 },
    PieceDefinition { id: 5, name: "crane", cells: BLOCK_5 },
];

/// The same six pieces as first recorded, where the third piece reuses ID 1.
///
/// Loading this table fails with [`Error::DuplicatePieceId`].
pub const SOURCE_PIECES: &[PieceDefinition] = &[
    PieceDefinition { id: 0, name: "hook", cells: BLOCK_0 },
    PieceDefinition { id: 1, name: "chair", cells: BLOCK_1 },
    PieceDefinition { id: 1, name: "frame", cells: BLOCK_2 },
    PieceDefinition { id: 3, name: "step", cells: BLOCK_3 },
    PieceDefinition { id: 4, name: "bracket", cells: BLOCK_4 },
    PieceDefinition { id: 5, name: "crane", cells: BLOCK_5 },
];

/// The seven Soma cube pieces that fill a 3x3x3 cube.
pub const SOMA_PIECES: &[PieceDefinition] = &[
    // L-shaped piece (4 cubes)
    PieceDefinition {
        id: 0,
        name: "L",
        cells: &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (0, 1, 0)],
    },
    // T-shaped piece (4 cubes)
    PieceDefinition {
        id: 1,
        name: "T",
        cells: &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (1, 1, 0)],
    },
    // S-shaped piece (4 cubes)
    PieceDefinition {
        id: 2,
        name: "S",
        cells: &[(0, 0, 0), (1, 0, 0), (1, 1, 0), (2, 1, 0)],
    },
    // small L piece (3 cubes)
    PieceDefinition {
        id: 3,
        name: "V",
        cells: &[(0, 0, 0), (1, 0, 0), (0, 1, 0)],
    },
    // right screw (4 cubes)
    PieceDefinition {
        id: 4,
        name: "A",
        cells: &[(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 0, 1)],
    },
    // tripod corner (4 cubes)
    PieceDefinition {
        id: 5,
        name: "P",
        cells: &[(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 0, 1)],
    },
    // left screw (4 cubes)
    PieceDefinition {
        id: 6,
        name: "B",
        cells: &[(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 1, 1)],
    },
];
