//! Per-slot candidate sets. Each domain is a bitset over `WordId`s, so copying and restoring the
//! whole store during search stays cheap.

use bit_set::BitSet;

use crate::grid_config::SlotId;
use crate::word_list::{WordId, WordList};

/// A copy of every domain, taken before a trial assignment so it can be undone.
#[derive(Debug, Clone)]
pub struct DomainSnapshot(Vec<BitSet>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStore {
    domains: Vec<BitSet>,
}

impl DomainStore {
    /// Give every slot its own copy of the full vocabulary.
    pub fn initialize(slot_count: usize, word_list: &WordList) -> DomainStore {
        let full: BitSet = (0..word_list.len()).collect();

        DomainStore {
            domains: vec![full; slot_count],
        }
    }

    pub fn slot_count(&self) -> usize {
        self.domains.len()
    }

    pub fn get(&self, slot_id: SlotId) -> &BitSet {
        let slot_count = self.domains.len();
        self.domains.get(slot_id).unwrap_or_else(|| {
            panic!("No domain for slot {} (store has {} slots)", slot_id, slot_count)
        })
    }

    /// Replace a slot's domain. The new domain must be a subset of the current one.
    pub fn set(&mut self, slot_id: SlotId, domain: BitSet) {
        let current = self.get_mut(slot_id);
        debug_assert!(domain.is_subset(current), "Domain for slot {} grew", slot_id);
        *current = domain;
    }

    /// Remove a word from a slot's domain, returning whether it was present.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.get_mut(slot_id).remove(word_id)
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.get(slot_id).contains(word_id)
    }

    /// How many options are still available for this slot?
    pub fn option_count(&self, slot_id: SlotId) -> usize {
        self.get(slot_id).len()
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.get(slot_id).is_empty()
    }

    pub fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot(self.domains.clone())
    }

    pub fn restore(&mut self, snapshot: DomainSnapshot) {
        assert_eq!(
            snapshot.0.len(),
            self.domains.len(),
            "Snapshot was taken from a different store"
        );
        self.domains = snapshot.0;
    }

    fn get_mut(&mut self, slot_id: SlotId) -> &mut BitSet {
        let slot_count = self.domains.len();
        self.domains.get_mut(slot_id).unwrap_or_else(|| {
            panic!("No domain for slot {} (store has {} slots)", slot_id, slot_count)
        })
    }
}

#[cfg(test)]
mod tests {
    use bit_set::BitSet;

    use super::DomainStore;
    use crate::word_list::WordList;

    fn word_list() -> WordList {
        WordList::new(["cat", "dog", "tar", "rat"]).unwrap()
    }

    #[test]
    fn test_initialize_copies_vocabulary() {
        let mut domains = DomainStore::initialize(2, &word_list());

        assert_eq!(domains.slot_count(), 2);
        assert_eq!(domains.option_count(0), 4);

        assert!(domains.remove(0, 1));
        assert!(!domains.remove(0, 1));

        assert_eq!(domains.option_count(0), 3);
        assert_eq!(domains.option_count(1), 4);
        assert!(domains.contains(1, 1));
        assert!(!domains.contains(0, 1));
    }

    #[test]
    fn test_set_and_restore() {
        let mut domains = DomainStore::initialize(2, &word_list());
        let snapshot = domains.snapshot();

        domains.set(1, BitSet::from_iter([2]));
        assert_eq!(domains.get(1).iter().collect::<Vec<_>>(), vec![2]);

        domains.set(1, BitSet::new());
        assert!(domains.is_empty(1));

        domains.restore(snapshot);
        assert_eq!(domains.option_count(1), 4);
    }

    #[test]
    #[should_panic(expected = "No domain for slot 5")]
    fn test_unknown_slot_panics() {
        let mut domains = DomainStore::initialize(2, &word_list());
        domains.remove(5, 0);
    }
}
