use bit_set::BitSet;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Debug, Formatter};

use crate::{ConfigError, MAX_SLOT_LENGTH};

/// An identifier for a given slot, based on its index in the grid's `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A crossing between one slot and another, referencing the other slot's id and the location of
/// the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// An across or down entry in the input to `GridConfig::from_entries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridEntry {
    pub loc: GridCoord,
    pub len: usize,
    pub dir: Direction,
}

/// Coordinates of each cell in a run starting at `start`.
fn run_coords(
    start: GridCoord,
    direction: Direction,
    length: usize,
) -> impl Iterator<Item = GridCoord> {
    (0..length).map(move |cell_idx| match direction {
        Direction::Across => (start.0, start.1 + cell_idx),
        Direction::Down => (start.0 + cell_idx, start.1),
    })
}

/// A single slot-variable: one word-length run of cells. Slots compare equal when their start
/// cell, direction and length match.
#[derive(Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> {
        run_coords(self.start_cell, self.direction, self.length)
    }

    /// Ids of every slot crossing this one, in cell order.
    pub fn neighbors(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.crossings
            .iter()
            .flatten()
            .map(|crossing| crossing.other_slot_id)
    }
}

impl PartialEq for SlotConfig {
    fn eq(&self, other: &Self) -> bool {
        self.start_cell == other.start_cell
            && self.direction == other.direction
            && self.length == other.length
    }
}

impl Eq for SlotConfig {}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("start_cell", &self.start_cell)
            .field("direction", &self.direction)
            .field("length", &self.length)
            .field("crossings", &self.crossings)
            .finish()
    }
}

/// The static shape of a puzzle: which cells can hold letters, the slots derived from them, and
/// where those slots cross.
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    pub slot_configs: Vec<SlotConfig>,

    /// Indexed by `row * width + col`.
    fillable: BitSet,

    /// Keyed by `(lower slot id, higher slot id)`, holding the offset into each of those slots in
    /// the same order.
    overlaps: HashMap<(SlotId, SlotId), (usize, usize)>,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .field("overlaps", &format!("({} entries)", self.overlaps.len()))
            .finish()
    }
}

impl GridConfig {
    /// Build a grid from explicit slot entries. Every cell covered by an entry is fillable.
    pub fn from_entries(
        width: usize,
        height: usize,
        entries: &[GridEntry],
    ) -> Result<GridConfig, ConfigError> {
        let mut fillable = BitSet::with_capacity(width * height);

        for entry in entries {
            if entry.len == 0 {
                return Err(ConfigError::ZeroLengthSlot {
                    start: entry.loc,
                    direction: entry.dir,
                });
            }

            let in_bounds = run_coords(entry.loc, entry.dir, entry.len)
                .all(|(row, col)| row < height && col < width);
            if !in_bounds {
                return Err(ConfigError::SlotOutOfBounds {
                    start: entry.loc,
                    direction: entry.dir,
                    length: entry.len,
                });
            }

            for (row, col) in run_coords(entry.loc, entry.dir, entry.len) {
                fillable.insert(row * width + col);
            }
        }

        GridConfig::build(width, height, fillable, entries)
    }

    /// Build a grid from a row-major fillable-cell matrix, deriving a slot from every run of two
    /// or more fillable cells in each row (across) and column (down).
    pub fn from_fillable(
        width: usize,
        height: usize,
        fillable: Vec<bool>,
    ) -> Result<GridConfig, ConfigError> {
        if fillable.len() != width * height {
            return Err(ConfigError::DimensionMismatch {
                width,
                height,
                actual: fillable.len(),
            });
        }

        let is_fillable = |row: usize, col: usize| fillable[row * width + col];
        let mut entries: Vec<GridEntry> = vec![];

        for row in 0..height {
            let mut run_start: Option<usize> = None;
            for col in 0..=width {
                if col < width && is_fillable(row, col) {
                    run_start.get_or_insert(col);
                } else if let Some(start_col) = run_start.take() {
                    if col - start_col > 1 {
                        entries.push(GridEntry {
                            loc: (row, start_col),
                            len: col - start_col,
                            dir: Direction::Across,
                        });
                    }
                }
            }
        }

        for col in 0..width {
            let mut run_start: Option<usize> = None;
            for row in 0..=height {
                if row < height && is_fillable(row, col) {
                    run_start.get_or_insert(row);
                } else if let Some(start_row) = run_start.take() {
                    if row - start_row > 1 {
                        entries.push(GridEntry {
                            loc: (start_row, col),
                            len: row - start_row,
                            dir: Direction::Down,
                        });
                    }
                }
            }
        }

        let fillable_cells: BitSet = fillable
            .iter()
            .enumerate()
            .filter_map(|(idx, &cell)| cell.then_some(idx))
            .collect();

        GridConfig::build(width, height, fillable_cells, &entries)
    }

    /// Build a grid from a string template, with `_` or `.` representing fillable cells and `#` or
    /// `█` representing blocks. Blank lines are ignored and each line is trimmed.
    pub fn from_template_string(template: &str) -> Result<GridConfig, ConfigError> {
        let rows: Vec<Vec<char>> = template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect())
            .collect();

        let width = rows.first().ok_or(ConfigError::EmptyTemplate)?.len();
        let mut fillable: Vec<bool> = Vec::with_capacity(width * rows.len());

        for (row, line) in rows.iter().enumerate() {
            if line.len() != width {
                return Err(ConfigError::RaggedRow {
                    row,
                    expected: width,
                    actual: line.len(),
                });
            }

            for (col, &glyph) in line.iter().enumerate() {
                fillable.push(match glyph {
                    '_' | '.' => true,
                    '#' | '█' => false,
                    _ => return Err(ConfigError::InvalidCell { row, col, glyph }),
                });
            }
        }

        GridConfig::from_fillable(width, rows.len(), fillable)
    }

    fn build(
        width: usize,
        height: usize,
        fillable: BitSet,
        entries: &[GridEntry],
    ) -> Result<GridConfig, ConfigError> {
        // Build a map from cell location to entries involved, which we can then use to calculate
        // crossings.
        let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> =
            HashMap::new();

        for (entry_idx, entry) in entries.iter().enumerate() {
            for (cell_idx, loc) in run_coords(entry.loc, entry.dir, entry.len).enumerate() {
                let cell_entries = entries_by_loc.entry(loc).or_default();

                if cell_entries
                    .iter()
                    .any(|&(other_idx, _)| entries[other_idx].dir == entry.dir)
                {
                    return Err(ConfigError::ConflictingSlots {
                        cell: loc,
                        direction: entry.dir,
                    });
                }
                cell_entries.push((entry_idx, cell_idx));
            }
        }

        let mut slot_configs: Vec<SlotConfig> = Vec::with_capacity(entries.len());
        let mut overlaps: HashMap<(SlotId, SlotId), (usize, usize)> = HashMap::new();

        for (entry_idx, entry) in entries.iter().enumerate() {
            let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> =
                run_coords(entry.loc, entry.dir, entry.len)
                    .map(|loc| {
                        // At most one other entry can share a cell, since entries facing the
                        // same way can't overlap.
                        entries_by_loc[&loc]
                            .iter()
                            .find(|&&(other_idx, _)| other_idx != entry_idx)
                            .map(|&(other_slot_id, other_slot_cell)| Crossing {
                                other_slot_id,
                                other_slot_cell,
                            })
                    })
                    .collect();

            for (cell_idx, crossing) in crossings.iter().enumerate() {
                if let Some(crossing) = crossing {
                    if entry_idx < crossing.other_slot_id {
                        overlaps.insert(
                            (entry_idx, crossing.other_slot_id),
                            (cell_idx, crossing.other_slot_cell),
                        );
                    }
                }
            }

            slot_configs.push(SlotConfig {
                id: entry_idx,
                start_cell: entry.loc,
                direction: entry.dir,
                length: entry.len,
                crossings,
            });
        }

        for (&(first, second), &(first_cell, second_cell)) in &overlaps {
            if first_cell >= slot_configs[first].length || second_cell >= slot_configs[second].length
            {
                return Err(ConfigError::OverlapOutOfBounds { first, second });
            }
        }

        Ok(GridConfig {
            width,
            height,
            slot_configs,
            fillable,
            overlaps,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn is_fillable(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.fillable.contains(row * self.width + col)
    }

    /// The pair of offsets `(offset into x, offset into y)` at which the words in `x` and `y` must
    /// share a letter, or `None` if the slots don't cross.
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<(usize, usize)> {
        if x < y {
            self.overlaps.get(&(x, y)).copied()
        } else {
            self.overlaps
                .get(&(y, x))
                .map(|&(y_cell, x_cell)| (x_cell, y_cell))
        }
    }

    /// Ids of every slot crossing the given one.
    pub fn neighbors(&self, slot_id: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        self.slot_configs[slot_id].neighbors()
    }

    /// Every ordered pair of distinct crossing slots, sorted by the first and then the second id.
    pub fn arcs(&self) -> Vec<(SlotId, SlotId)> {
        let mut arcs: Vec<(SlotId, SlotId)> = (0..self.slot_count())
            .flat_map(|x| self.neighbors(x).map(move |y| (x, y)))
            .collect();
        arcs.sort_unstable();
        arcs
    }

    /// Look up the slot starting at the given cell and facing the given direction.
    pub fn find_slot(&self, start_cell: GridCoord, direction: Direction) -> Option<SlotId> {
        self.slot_configs
            .iter()
            .find(|slot| slot.start_cell == start_cell && slot.direction == direction)
            .map(|slot| slot.id)
    }
}

#[cfg(test)]
mod tests {
    use super::Direction::{Across, Down};
    use super::{GridConfig, GridEntry};
    use crate::ConfigError;

    /// #...###
    /// #....##
    /// .......
    /// .......
    /// .......
    /// ##....#
    /// ###...#
    fn seven_by_seven() -> GridConfig {
        GridConfig::from_template_string(
            "
            #...###
            #....##
            .......
            .......
            .......
            ##....#
            ###...#
            ",
        )
        .unwrap()
    }

    #[test]
    fn test_slots_from_template() {
        let config = seven_by_seven();

        let slots: Vec<_> = config
            .slot_configs
            .iter()
            .map(|slot| (slot.start_cell, slot.length, slot.direction))
            .collect();

        assert_eq!(
            slots,
            vec![
                ((0, 1), 3, Across),
                ((1, 1), 4, Across),
                ((2, 0), 7, Across),
                ((3, 0), 7, Across),
                ((4, 0), 7, Across),
                ((5, 2), 4, Across),
                ((6, 3), 3, Across),
                ((2, 0), 3, Down),
                ((0, 1), 5, Down),
                ((0, 2), 6, Down),
                ((0, 3), 7, Down),
                ((1, 4), 6, Down),
                ((2, 5), 5, Down),
                ((2, 6), 3, Down),
            ]
        );
    }

    #[test]
    fn test_overlaps() {
        let config = seven_by_seven();

        let across = config.find_slot((2, 0), Across).unwrap();
        let down = config.find_slot((0, 1), Down).unwrap();
        assert_eq!((across, down), (2, 8));

        assert_eq!(config.overlap(across, down), Some((1, 2)));
        assert_eq!(config.overlap(down, across), Some((2, 1)));

        // Parallel slots never cross, and a slot doesn't overlap itself.
        assert_eq!(config.overlap(0, 1), None);
        assert_eq!(config.overlap(across, across), None);

        // The top across entry only crosses the three down entries in columns 1 through 3.
        let neighbors: Vec<_> = config.neighbors(0).collect();
        assert_eq!(neighbors, vec![8, 9, 10]);
    }

    #[test]
    fn test_overlap_offsets_are_in_bounds() {
        let config = seven_by_seven();

        for (x, y) in config.arcs() {
            let (x_cell, y_cell) = config.overlap(x, y).unwrap();
            assert!(x_cell < config.slot_configs[x].length);
            assert!(y_cell < config.slot_configs[y].length);
        }
    }

    #[test]
    fn test_arcs_are_symmetric() {
        let config = seven_by_seven();
        let arcs = config.arcs();

        assert!(!arcs.is_empty());
        for &(x, y) in &arcs {
            assert_ne!(x, y);
            assert!(arcs.contains(&(y, x)));
        }
    }

    #[test]
    fn test_single_cells_are_not_slots() {
        let config = GridConfig::from_template_string(
            "
            _#_
            #_#
            ",
        )
        .unwrap();

        assert_eq!(config.slot_count(), 0);
        assert!(config.is_fillable(0, 0));
        assert!(!config.is_fillable(0, 1));
        assert!(config.is_fillable(1, 1));
    }

    #[test]
    fn test_template_errors() {
        assert_eq!(
            GridConfig::from_template_string("\n   \n").unwrap_err(),
            ConfigError::EmptyTemplate
        );
        assert_eq!(
            GridConfig::from_template_string("___\n__").unwrap_err(),
            ConfigError::RaggedRow { row: 1, expected: 3, actual: 2 }
        );
        assert_eq!(
            GridConfig::from_template_string("_x_").unwrap_err(),
            ConfigError::InvalidCell { row: 0, col: 1, glyph: 'x' }
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        assert_eq!(
            GridConfig::from_fillable(3, 2, vec![true; 5]).unwrap_err(),
            ConfigError::DimensionMismatch { width: 3, height: 2, actual: 5 }
        );
    }

    #[test]
    fn test_entries() {
        let config = GridConfig::from_entries(
            3,
            3,
            &[
                GridEntry { loc: (1, 0), len: 3, dir: Across },
                GridEntry { loc: (0, 1), len: 3, dir: Down },
            ],
        )
        .unwrap();

        assert_eq!(config.overlap(0, 1), Some((1, 1)));
        assert!(config.is_fillable(1, 2));
        assert!(!config.is_fillable(0, 0));
        assert_eq!(config.slot_configs[1].cell_coords().collect::<Vec<_>>(), vec![(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_entry_errors() {
        assert_eq!(
            GridConfig::from_entries(3, 3, &[GridEntry { loc: (0, 0), len: 0, dir: Across }])
                .unwrap_err(),
            ConfigError::ZeroLengthSlot { start: (0, 0), direction: Across }
        );
        assert_eq!(
            GridConfig::from_entries(3, 3, &[GridEntry { loc: (1, 1), len: 3, dir: Down }])
                .unwrap_err(),
            ConfigError::SlotOutOfBounds { start: (1, 1), direction: Down, length: 3 }
        );
        assert_eq!(
            GridConfig::from_entries(
                4,
                1,
                &[
                    GridEntry { loc: (0, 0), len: 3, dir: Across },
                    GridEntry { loc: (0, 2), len: 2, dir: Across },
                ]
            )
            .unwrap_err(),
            ConfigError::ConflictingSlots { cell: (0, 2), direction: Across }
        );
    }

    #[test]
    fn test_slot_equality_ignores_id() {
        let config = seven_by_seven();
        let mut copy = config.slot_configs[3].clone();
        copy.id = 99;

        assert_eq!(copy, config.slot_configs[3]);
        assert_ne!(config.slot_configs[2], config.slot_configs[3]);
    }
}
