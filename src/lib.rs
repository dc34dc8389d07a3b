pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod grid_config;
pub mod validation;
pub mod word_list;

use log::debug;
use thiserror::Error;

use crate::arc_consistency::{
    enforce_node_consistency, establish_arc_consistency, ArcConsistencyFailure,
};
use crate::backtracking_search::{find_fill, Assignment, FillFailure, FillOptions, FillSuccess};
use crate::domains::DomainStore;
use crate::grid_config::{Direction, GridConfig, GridCoord};
use crate::word_list::WordList;

/// Should we re-validate every assignment before handing it back? This can be enabled with
/// `--features check_invariants` when debugging or making risky algorithm changes.
pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// Ways that a grid or vocabulary can be malformed. These are reported when the model is built,
/// before any solving happens, and are distinct from a puzzle simply having no fill.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid is {width}x{height} but {actual} cells were supplied")]
    DimensionMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },
    #[error("template has no rows")]
    EmptyTemplate,
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unrecognized cell {glyph:?} at row {row}, column {col}")]
    InvalidCell { row: usize, col: usize, glyph: char },
    #[error("{direction} slot at {start:?} has zero length")]
    ZeroLengthSlot { start: GridCoord, direction: Direction },
    #[error("{direction} slot at {start:?} with length {length} extends outside the grid")]
    SlotOutOfBounds {
        start: GridCoord,
        direction: Direction,
        length: usize,
    },
    #[error("cell {cell:?} is covered by more than one {direction} slot")]
    ConflictingSlots { cell: GridCoord, direction: Direction },
    #[error("overlap between slots {first} and {second} points outside one of the words")]
    OverlapOutOfBounds { first: usize, second: usize },
    #[error("vocabulary contains no words")]
    EmptyVocabulary,
}

/// Fill the grid using the default options.
pub fn solve(config: &GridConfig, word_list: &WordList) -> Result<FillSuccess, FillFailure> {
    solve_with_options(config, word_list, &FillOptions::default())
}

/// Seed the domains, make them node- and arc-consistent, and then search for a complete
/// assignment. If either consistency pass leaves a slot without options we report failure
/// without searching.
pub fn solve_with_options(
    config: &GridConfig,
    word_list: &WordList,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let mut domains = DomainStore::initialize(config.slot_count(), word_list);

    let removed = enforce_node_consistency(config, word_list, &mut domains);
    debug!(
        "node consistency removed {} options across {} slots",
        removed,
        config.slot_count()
    );

    if let Some(slot_id) = (0..config.slot_count()).find(|&slot_id| domains.is_empty(slot_id)) {
        debug!(
            "slot {} has no words of length {}",
            slot_id,
            config.slot_configs[slot_id].length
        );
        return Err(FillFailure::HardFailure);
    }

    match establish_arc_consistency(config, word_list, &mut domains, None) {
        Ok(success) => debug!(
            "arc consistency made {} revisions, eliminating {} options",
            success.revisions, success.eliminations
        ),
        Err(ArcConsistencyFailure { slot_id }) => {
            debug!("arc consistency emptied slot {}", slot_id);
            return Err(FillFailure::HardFailure);
        }
    }

    find_fill(config, word_list, domains, options)
}

/// Turn the given grid config and assignment into a rendered string, with `█` for blocks and a
/// space for any fillable cell that hasn't been assigned a letter.
pub fn render_grid(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> String {
    let mut letters: Vec<Vec<Option<char>>> = vec![vec![None; config.width]; config.height];

    for (slot_id, word_id) in assignment.iter() {
        let word = &word_list.words[word_id];
        for (cell_idx, (row, col)) in config.slot_configs[slot_id].cell_coords().enumerate() {
            letters[row][col] = word.glyphs.get(cell_idx).copied();
        }
    }

    letters
        .iter()
        .enumerate()
        .map(|(row, line)| {
            line.iter()
                .enumerate()
                .map(|(col, letter)| {
                    if config.is_fillable(row, col) {
                        letter.unwrap_or(' ')
                    } else {
                        '█'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use crate::backtracking_search::{Assignment, FillFailure, FillOptions};
    use crate::grid_config::GridConfig;
    use crate::validation::check_assignment;
    use crate::word_list::WordList;
    use crate::{render_grid, solve, solve_with_options};

    fn crossing_config() -> GridConfig {
        GridConfig::from_template_string(
            "
            #_#
            ___
            #_#
            ",
        )
        .unwrap()
    }

    #[test]
    fn test_solve_two_crossing_slots() {
        let config = crossing_config();
        let word_list = WordList::new(["cat", "dog", "tar", "rat"]).unwrap();

        let result = solve(&config, &word_list).expect("Failed to find a fill");

        assert!(result.assignment.is_complete());
        check_assignment(&config, &word_list, &result.assignment).unwrap();

        // Both slots tie on every heuristic, so the lowest slot id (the across entry) goes first
        // and takes the alphabetically first word; the down entry can't reuse it.
        assert_eq!(result.assignment.word(&word_list, 0), Some("cat"));
        assert_eq!(result.assignment.word(&word_list, 1), Some("rat"));
    }

    #[test]
    fn test_solve_fails_when_crossing_letters_never_agree() {
        let config = crossing_config();
        let word_list = WordList::new(["cat", "dog"]).unwrap();

        assert_eq!(solve(&config, &word_list).unwrap_err(), FillFailure::HardFailure);
    }

    #[test]
    fn test_solve_fails_for_missing_length() {
        let config = GridConfig::from_template_string("_____").unwrap();
        let word_list = WordList::new(["ab", "abcd", "abcdef"]).unwrap();

        assert_eq!(solve(&config, &word_list).unwrap_err(), FillFailure::HardFailure);
    }

    #[test]
    fn test_solve_without_inference_matches() {
        let config = crossing_config();
        let word_list = WordList::new(["cat", "dog", "tar", "rat"]).unwrap();

        let with_inference = solve(&config, &word_list).unwrap();
        let without_inference = solve_with_options(
            &config,
            &word_list,
            &FillOptions { inference: false, ..FillOptions::default() },
        )
        .unwrap();

        assert_eq!(with_inference.assignment, without_inference.assignment);
    }

    #[test]
    fn test_render_grid() {
        let config = crossing_config();
        let word_list = WordList::new(["cat", "dog", "tar", "rat"]).unwrap();
        let result = solve(&config, &word_list).unwrap();

        assert_eq!(render_grid(&config, &word_list, &result.assignment), "█r█\ncat\n█t█");
    }

    #[test]
    fn test_render_partial_grid() {
        let config = crossing_config();
        let word_list = WordList::new(["cat"]).unwrap();
        let mut assignment = Assignment::new(config.slot_count());
        assignment.assign(0, 0);

        assert_eq!(render_grid(&config, &word_list, &assignment), "█ █\ncat\n█ █");
    }
}
