use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::ops::Index;

use crate::{ConfigError, MAX_SLOT_LENGTH};

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// A word that can be chosen for a slot. Its length is measured in chars, so every glyph lines up
/// with one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    pub fn length(&self) -> usize {
        self.glyphs.len()
    }
}

/// The vocabulary available to a fill. Words are unique and sorted, so a `WordId` always refers to
/// the same word for a given input no matter what order it was supplied in.
#[derive(Debug, Clone)]
pub struct WordList {
    pub words: Vec<Word>,
}

impl WordList {
    /// Build a word list from the given strings, trimming each one and dropping blanks and
    /// duplicates. Case is left alone.
    pub fn new<I, S>(words: I) -> Result<WordList, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_string())
            .filter(|word| !word.is_empty())
            .collect();

        if unique.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }

        Ok(WordList {
            words: unique
                .into_iter()
                .map(|string| Word {
                    glyphs: string.chars().collect(),
                    string,
                })
                .collect(),
        })
    }

    /// Parse the contents of a word-list file: one word per line, upper-cased.
    pub fn parse(contents: &str) -> Result<WordList, ConfigError> {
        WordList::new(contents.lines().map(str::to_uppercase))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn find(&self, word: &str) -> Option<WordId> {
        self.words
            .binary_search_by(|candidate| candidate.string.as_str().cmp(word))
            .ok()
    }
}

impl Index<WordId> for WordList {
    type Output = Word;

    fn index(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }
}
