//! Backtracking search over partial assignments. Slots are chosen by minimum remaining values with
//! the number of unfilled crossing slots as a tie-break, and each slot's options are tried in
//! least-constraining-value order. The search is iterative: each level of the search tree is a
//! `Frame` on an explicit stack, so deep grids don't grow the call stack.

use bit_set::BitSet;
use instant::{Duration, Instant};
use log::{debug, trace};
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::arc_consistency::{establish_arc_consistency, ArcConsistencyResult};
use crate::domains::{DomainSnapshot, DomainStore};
use crate::grid_config::{GridConfig, SlotId};
use crate::validation::{check_assignment, check_choice};
use crate::word_list::{WordId, WordList};
use crate::{CHECK_INVARIANTS, MAX_SLOT_LENGTH};

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A partial mapping from slots to words. Entries are added and removed one at a time as the
/// search makes and undoes decisions, and the order they were made in is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    used_words: BitSet,
    choices: Vec<Choice>,
}

impl Assignment {
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words: vec![None; slot_count],
            used_words: BitSet::new(),
            choices: Vec::with_capacity(slot_count),
        }
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    /// The string assigned to a slot, if any.
    pub fn word<'a>(&self, word_list: &'a WordList, slot_id: SlotId) -> Option<&'a str> {
        self.get(slot_id)
            .map(|word_id| word_list[word_id].string.as_str())
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    pub fn is_word_used(&self, word_id: WordId) -> bool {
        self.used_words.contains(word_id)
    }

    /// Record a word for an unassigned slot. Checking the word against the rest of the assignment
    /// is up to the caller (see `validation::check_choice`).
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        assert!(
            self.words[slot_id].is_none(),
            "Slot {} is already assigned",
            slot_id
        );
        self.words[slot_id] = Some(word_id);
        self.used_words.insert(word_id);
        self.choices.push(Choice { slot_id, word_id });
    }

    /// Undo the assignment for a slot, returning the word it held.
    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        let word_id = self.words[slot_id].take()?;

        if !self.words.contains(&Some(word_id)) {
            self.used_words.remove(word_id);
        }
        if let Some(idx) = self.choices.iter().rposition(|choice| choice.slot_id == slot_id) {
            self.choices.remove(idx);
        }

        Some(word_id)
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.choices.len() == self.words.len()
    }

    /// Assigned slots and their words, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    /// Assigned slots and their words, in the order the choices were made.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }
}

/// Knobs for a single fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOptions {
    /// After each trial choice, restrict the slot to that word and re-establish arc consistency
    /// for its unfilled crossings, rejecting the choice if any of them runs out of options.
    pub inference: bool,

    /// Give up with `FillFailure::Timeout` if this moment passes before the fill is found. Checked
    /// each time a slot is selected.
    pub deadline: Option<Instant>,
}

impl Default for FillOptions {
    fn default() -> FillOptions {
        FillOptions {
            inference: true,
            deadline: None,
        }
    }
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// How many times a slot was selected for filling.
    pub states: u64,

    /// How many slots ran out of options, forcing an earlier choice to be undone.
    pub backtracks: u64,

    pub duration: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillFailure {
    /// Every combination of options has been ruled out; the grid has no fill.
    HardFailure,
    Timeout,
}

/// How many of the slots crossing this one are still unfilled?
fn unassigned_degree(config: &GridConfig, assignment: &Assignment, slot_id: SlotId) -> usize {
    config
        .neighbors(slot_id)
        .filter(|&other_slot_id| !assignment.is_assigned(other_slot_id))
        .count()
}

/// Choose the unfilled slot with the fewest remaining options, preferring the one that crosses the
/// most unfilled slots when there's a tie and then the lowest slot id. Returns `None` once every
/// slot is filled.
pub fn select_unassigned_slot(
    config: &GridConfig,
    domains: &DomainStore,
    assignment: &Assignment,
) -> Option<SlotId> {
    (0..config.slot_count())
        .filter(|&slot_id| !assignment.is_assigned(slot_id))
        .min_by_key(|&slot_id| {
            (
                domains.option_count(slot_id),
                Reverse(unassigned_degree(config, assignment, slot_id)),
                slot_id,
            )
        })
}

/// Return the options for a slot, ordered by how many options they would rule out for the
/// unfilled slots crossing it, fewest first. Ties go to the lower word id.
pub fn order_domain_values(
    config: &GridConfig,
    word_list: &WordList,
    domains: &DomainStore,
    assignment: &Assignment,
    slot_id: SlotId,
) -> Vec<WordId> {
    // For each unfilled crossing: which of our cells it crosses, how many options it has, and how
    // many of those put each glyph in the shared cell.
    let crossing_glyph_counts: SmallVec<[(usize, usize, HashMap<char, usize>); MAX_SLOT_LENGTH]> =
        config.slot_configs[slot_id]
            .crossings
            .iter()
            .enumerate()
            .filter_map(|(cell_idx, crossing)| {
                let crossing = crossing.as_ref()?;
                if assignment.is_assigned(crossing.other_slot_id) {
                    return None;
                }

                let other_domain = domains.get(crossing.other_slot_id);
                let mut glyph_counts: HashMap<char, usize> = HashMap::new();
                for other_word_id in other_domain.iter() {
                    if let Some(&glyph) =
                        word_list[other_word_id].glyphs.get(crossing.other_slot_cell)
                    {
                        *glyph_counts.entry(glyph).or_default() += 1;
                    }
                }

                Some((cell_idx, other_domain.len(), glyph_counts))
            })
            .collect();

    let mut options: Vec<WordId> = domains.get(slot_id).iter().collect();

    options.sort_by_cached_key(|&word_id| {
        let glyphs = &word_list[word_id].glyphs;

        let ruled_out: usize = crossing_glyph_counts
            .iter()
            .map(|(cell_idx, option_count, glyph_counts)| {
                let compatible = glyphs
                    .get(*cell_idx)
                    .and_then(|glyph| glyph_counts.get(glyph))
                    .copied()
                    .unwrap_or(0);
                option_count - compatible
            })
            .sum();

        (ruled_out, word_id)
    });

    options
}

/// Restrict `slot_id` to `word_id` and propagate the effects to its unfilled crossings.
fn maintain_arc_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
    assignment: &Assignment,
    slot_id: SlotId,
    word_id: WordId,
) -> ArcConsistencyResult {
    domains.set(slot_id, BitSet::from_iter([word_id]));

    let arcs: Vec<(SlotId, SlotId)> = config
        .neighbors(slot_id)
        .filter(|&other_slot_id| !assignment.is_assigned(other_slot_id))
        .map(|other_slot_id| (other_slot_id, slot_id))
        .collect();

    establish_arc_consistency(config, word_list, domains, Some(&arcs))
}

/// One level of the search: the slot being filled, its options in the order they'll be tried,
/// and the domains as they were before the current trial narrowed them.
struct Frame {
    slot_id: SlotId,
    options: Vec<WordId>,
    next_option_idx: usize,
    saved_domains: Option<DomainSnapshot>,
}

/// Search for a complete assignment, starting from domains that have already been made node- and
/// arc-consistent.
pub fn find_fill(
    config: &GridConfig,
    word_list: &WordList,
    mut domains: DomainStore,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let mut statistics = Statistics::default();
    let mut assignment = Assignment::new(config.slot_count());
    let mut stack: Vec<Frame> = Vec::with_capacity(config.slot_count());

    'slot_selection: loop {
        if let Some(deadline) = options.deadline {
            if Instant::now() >= deadline {
                debug!("fill timed out after {} states", statistics.states);
                return Err(FillFailure::Timeout);
            }
        }

        let Some(slot_id) = select_unassigned_slot(config, &domains, &assignment) else {
            break 'slot_selection;
        };
        statistics.states += 1;

        let slot_options = order_domain_values(config, word_list, &domains, &assignment, slot_id);
        trace!(
            "selected slot {} with {} options at depth {}",
            slot_id,
            slot_options.len(),
            stack.len()
        );
        stack.push(Frame {
            slot_id,
            options: slot_options,
            next_option_idx: 0,
            saved_domains: None,
        });

        // Move the top frame on to its next viable option. If it has none left, drop it and move
        // the frame below it on instead, and so on.
        while let Some(frame) = stack.last_mut() {
            // Undo this frame's previous trial, if there was one.
            if assignment.unassign(frame.slot_id).is_some() {
                if let Some(saved_domains) = frame.saved_domains.take() {
                    domains.restore(saved_domains);
                }
            }

            while frame.next_option_idx < frame.options.len() {
                let word_id = frame.options[frame.next_option_idx];
                frame.next_option_idx += 1;

                if let Err(conflict) =
                    check_choice(config, word_list, &assignment, frame.slot_id, word_id)
                {
                    trace!("rejected {}: {}", word_list[word_id].string, conflict);
                    continue;
                }

                assignment.assign(frame.slot_id, word_id);

                if options.inference {
                    let saved_domains = domains.snapshot();

                    if let Err(failure) = maintain_arc_consistency(
                        config,
                        word_list,
                        &mut domains,
                        &assignment,
                        frame.slot_id,
                        word_id,
                    ) {
                        trace!(
                            "rejected {}: slot {} ran out of options",
                            word_list[word_id].string,
                            failure.slot_id
                        );
                        domains.restore(saved_domains);
                        assignment.unassign(frame.slot_id);
                        continue;
                    }

                    frame.saved_domains = Some(saved_domains);
                }

                continue 'slot_selection;
            }

            trace!("exhausted slot {}, backtracking", frame.slot_id);
            stack.pop();
            statistics.backtracks += 1;
        }

        statistics.duration = start.elapsed();
        debug!(
            "no fill exists; gave up after {} states and {} backtracks",
            statistics.states, statistics.backtracks
        );
        return Err(FillFailure::HardFailure);
    }

    statistics.duration = start.elapsed();
    debug!(
        "found fill after {} states and {} backtracks in {:?}",
        statistics.states, statistics.backtracks, statistics.duration
    );

    if CHECK_INVARIANTS {
        if let Err(conflict) = check_assignment(config, word_list, &assignment) {
            panic!("Search produced an invalid fill: {}", conflict);
        }
    }

    Ok(FillSuccess {
        statistics,
        assignment,
    })
}
