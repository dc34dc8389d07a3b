//! Node consistency and an implementation of the AC-3 algorithm for the crossing constraints.
//! For our purposes, a grid is arc-consistent when every option left for a slot puts a letter in
//! each crossed cell that at least one option of the crossing slot also puts there.
//!
//! Word reuse isn't handled here; the search checks it for each choice.

use log::trace;
use std::collections::{HashSet, VecDeque};

use crate::domains::DomainStore;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// Remove every option whose length doesn't match its slot, returning how many were removed.
pub fn enforce_node_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
) -> usize {
    let mut removed = 0;

    for slot_config in &config.slot_configs {
        let doomed: Vec<WordId> = domains
            .get(slot_config.id)
            .iter()
            .filter(|&word_id| word_list[word_id].length() != slot_config.length)
            .collect();

        for word_id in doomed {
            domains.remove(slot_config.id, word_id);
            removed += 1;
        }
    }

    removed
}

/// Make `x` arc-consistent with `y` by removing every option for `x` whose letter at the crossing
/// doesn't appear at the same cell in any option for `y`. Returns whether anything was removed;
/// slots that don't cross are left alone.
pub fn revise(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
    x: SlotId,
    y: SlotId,
) -> bool {
    let Some((x_cell, y_cell)) = config.overlap(x, y) else {
        return false;
    };

    let supported_glyphs: HashSet<char> = domains
        .get(y)
        .iter()
        .filter_map(|word_id| word_list[word_id].glyphs.get(y_cell).copied())
        .collect();

    // A word too short to reach the crossing has no support at all.
    let doomed: Vec<WordId> = domains
        .get(x)
        .iter()
        .filter(|&word_id| {
            word_list[word_id]
                .glyphs
                .get(x_cell)
                .map_or(true, |glyph| !supported_glyphs.contains(glyph))
        })
        .collect();

    for &word_id in &doomed {
        domains.remove(x, word_id);
    }

    !doomed.is_empty()
}

/// FIFO worklist of arcs still to be revised. An arc that's already waiting isn't added twice.
#[derive(Debug)]
struct ConsistencyQueue {
    queue: VecDeque<(SlotId, SlotId)>,
    queued: HashSet<(SlotId, SlotId)>,
}

impl ConsistencyQueue {
    fn with_initial_queue<Items>(items: Items) -> ConsistencyQueue
    where
        Items: IntoIterator<Item = (SlotId, SlotId)>,
    {
        let mut queue = ConsistencyQueue {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<(SlotId, SlotId)> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: (SlotId, SlotId)) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arc revisions removed at least one option.
    pub revisions: usize,

    /// How many options were removed in total.
    pub eliminations: usize,
}

/// Result from a failed call to `establish_arc_consistency`, naming the slot that ran out of
/// options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Revise arcs until no more eliminations are possible, starting from `arcs` or, if that's `None`,
/// from every ordered pair of crossing slots. Whenever a slot loses options, every arc pointing
/// into it (other than from the slot that caused the loss) is queued again. Gives up as soon as
/// any slot is left with no options; domains may already have been narrowed by then.
pub fn establish_arc_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
    arcs: Option<&[(SlotId, SlotId)]>,
) -> ArcConsistencyResult {
    let mut queue = match arcs {
        Some(arcs) => ConsistencyQueue::with_initial_queue(arcs.iter().copied()),
        None => ConsistencyQueue::with_initial_queue(config.arcs()),
    };

    let mut success = ArcConsistencySuccess {
        revisions: 0,
        eliminations: 0,
    };

    while let Some((x, y)) = queue.pop_front() {
        let before = domains.option_count(x);
        if !revise(config, word_list, domains, x, y) {
            continue;
        }

        let after = domains.option_count(x);
        success.revisions += 1;
        success.eliminations += before - after;
        trace!("revised {} against {}: {} -> {} options", x, y, before, after);

        if after == 0 {
            return Err(ArcConsistencyFailure { slot_id: x });
        }

        for z in config.neighbors(x).filter(|&z| z != y) {
            queue.enqueue((z, x));
        }
    }

    Ok(success)
}
