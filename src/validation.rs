use bit_set::BitSet;
use thiserror::Error;

use crate::backtracking_search::Assignment;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// Why a word can't go in a slot given the rest of an assignment.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    #[error("word {word_id} is already used elsewhere in the grid")]
    DuplicateWord { slot_id: SlotId, word_id: WordId },
    #[error("slot {slot_id} needs {expected} letters but word {word_id} has {actual}")]
    LengthMismatch {
        slot_id: SlotId,
        word_id: WordId,
        expected: usize,
        actual: usize,
    },
    #[error("word {word_id} in slot {slot_id} disagrees with slot {other_slot_id} at their crossing")]
    OverlapMismatch {
        slot_id: SlotId,
        word_id: WordId,
        other_slot_id: SlotId,
    },
}

/// Check whether `word_id` can be placed in `slot_id` alongside the words already assigned: it
/// must not be used by another slot, must be the right length, and must agree with every assigned
/// crossing slot.
pub fn check_choice(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
    slot_id: SlotId,
    word_id: WordId,
) -> Result<(), Conflict> {
    if assignment.is_word_used(word_id) && assignment.get(slot_id) != Some(word_id) {
        return Err(Conflict::DuplicateWord { slot_id, word_id });
    }

    let slot_config = &config.slot_configs[slot_id];
    let word = &word_list[word_id];
    if word.length() != slot_config.length {
        return Err(Conflict::LengthMismatch {
            slot_id,
            word_id,
            expected: slot_config.length,
            actual: word.length(),
        });
    }

    for (cell_idx, crossing) in slot_config.crossings.iter().enumerate() {
        let Some(crossing) = crossing else {
            continue;
        };
        let Some(other_word_id) = assignment.get(crossing.other_slot_id) else {
            continue;
        };

        let other_glyph = word_list[other_word_id].glyphs.get(crossing.other_slot_cell);
        if word.glyphs.get(cell_idx) != other_glyph {
            return Err(Conflict::OverlapMismatch {
                slot_id,
                word_id,
                other_slot_id: crossing.other_slot_id,
            });
        }
    }

    Ok(())
}

/// Check a whole assignment, complete or not, reporting the first conflict found in slot order.
pub fn check_assignment(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
) -> Result<(), Conflict> {
    let mut seen = BitSet::with_capacity(word_list.len());

    for (slot_id, word_id) in assignment.iter() {
        if !seen.insert(word_id) {
            return Err(Conflict::DuplicateWord { slot_id, word_id });
        }

        let slot_config = &config.slot_configs[slot_id];
        let word = &word_list[word_id];
        if word.length() != slot_config.length {
            return Err(Conflict::LengthMismatch {
                slot_id,
                word_id,
                expected: slot_config.length,
                actual: word.length(),
            });
        }

        for other_slot_id in config.neighbors(slot_id) {
            let Some(other_word_id) = assignment.get(other_slot_id) else {
                continue;
            };
            let Some((cell, other_cell)) = config.overlap(slot_id, other_slot_id) else {
                continue;
            };

            if word.glyphs.get(cell) != word_list[other_word_id].glyphs.get(other_cell) {
                return Err(Conflict::OverlapMismatch {
                    slot_id,
                    word_id,
                    other_slot_id,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_assignment, check_choice, Conflict};
    use crate::backtracking_search::Assignment;
    use crate::grid_config::GridConfig;
    use crate::word_list::WordList;

    fn setup() -> (GridConfig, WordList) {
        let config = GridConfig::from_template_string("#_#\n___\n#_#").unwrap();
        let word_list = WordList::new(["cat", "dog", "ox", "rat"]).unwrap();
        (config, word_list)
    }

    #[test]
    fn test_check_choice() {
        let (config, word_list) = setup();
        let cat = word_list.find("cat").unwrap();
        let dog = word_list.find("dog").unwrap();
        let ox = word_list.find("ox").unwrap();
        let rat = word_list.find("rat").unwrap();

        let mut assignment = Assignment::new(config.slot_count());
        assert_eq!(check_choice(&config, &word_list, &assignment, 0, cat), Ok(()));

        assignment.assign(0, cat);
        assert_eq!(
            check_choice(&config, &word_list, &assignment, 1, cat),
            Err(Conflict::DuplicateWord { slot_id: 1, word_id: cat })
        );
        assert_eq!(
            check_choice(&config, &word_list, &assignment, 1, ox),
            Err(Conflict::LengthMismatch { slot_id: 1, word_id: ox, expected: 3, actual: 2 })
        );
        assert_eq!(
            check_choice(&config, &word_list, &assignment, 1, dog),
            Err(Conflict::OverlapMismatch { slot_id: 1, word_id: dog, other_slot_id: 0 })
        );
        assert_eq!(check_choice(&config, &word_list, &assignment, 1, rat), Ok(()));

        // A slot's own word doesn't count as a duplicate of itself.
        assert_eq!(check_choice(&config, &word_list, &assignment, 0, cat), Ok(()));
    }

    #[test]
    fn test_check_assignment() {
        let (config, word_list) = setup();
        let cat = word_list.find("cat").unwrap();
        let dog = word_list.find("dog").unwrap();
        let rat = word_list.find("rat").unwrap();

        let mut assignment = Assignment::new(config.slot_count());
        assignment.assign(0, cat);
        assignment.assign(1, rat);
        assert_eq!(check_assignment(&config, &word_list, &assignment), Ok(()));

        assignment.unassign(1);
        assignment.assign(1, dog);
        assert_eq!(
            check_assignment(&config, &word_list, &assignment),
            Err(Conflict::OverlapMismatch { slot_id: 0, word_id: cat, other_slot_id: 1 })
        );
    }
}
