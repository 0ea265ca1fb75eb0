//! Inverted index over a frozen record store.

use super::tokenize::{Token, Tokenizer};
use crate::record::{IndexRecord, Ordinal};
use ahash::AHashMap;
use serde::Serialize;

/// Record field a token was found in. Each field has its own weight class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Page,
    Text,
}

impl Field {
    pub const ALL: [Self; 3] = [Self::Title, Self::Page, Self::Text];

    fn of(self, record: &IndexRecord) -> &str {
        match self {
            Self::Title => &record.title,
            Self::Page => &record.page,
            Self::Text => &record.text,
        }
    }
}

/// Occurrence counts of one token in each field of one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldCounts {
    pub title: u32,
    pub page: u32,
    pub text: u32,
}

impl FieldCounts {
    pub const fn get(&self, field: Field) -> u32 {
        match field {
            Field::Title => self.title,
            Field::Page => self.page,
            Field::Text => self.text,
        }
    }

    fn bump(&mut self, field: Field) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Page => &mut self.page,
            Field::Text => &mut self.text,
        };
        *slot = slot.saturating_add(1);
    }
}

/// One record's entry in a token's posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingEntry {
    pub ordinal: Ordinal,
    pub counts: FieldCounts,
}

/// All records containing one token, sorted by ascending ordinal.
///
/// Each ordinal appears at most once; repeated occurrences only raise the counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Posting {
    entries: Vec<PostingEntry>,
}

impl Posting {
    pub fn entries(&self) -> &[PostingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, ordinal: Ordinal) -> bool {
        self.find(ordinal).is_some()
    }

    /// Binary search by ordinal.
    pub fn find(&self, ordinal: Ordinal) -> Option<&PostingEntry> {
        self.entries
            .binary_search_by_key(&ordinal, |entry| entry.ordinal)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    fn record(&mut self, ordinal: Ordinal, field: Field) {
        // Records are indexed in ordinal order, so only the tail can belong to `ordinal`.
        match self.entries.last_mut() {
            Some(entry) if entry.ordinal == ordinal => entry.counts.bump(field),
            _ => {
                let mut counts = FieldCounts::default();
                counts.bump(field);
                self.entries.push(PostingEntry { ordinal, counts });
            }
        }
    }
}

/// Token → posting map. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    terms: AHashMap<Token, Posting>,
}

impl InvertedIndex {
    /// Tokenize every record field and build the postings in one pass.
    ///
    /// Runs in O(total tokens). Records must be given in ordinal order.
    pub fn build<'a>(
        tokenizer: &Tokenizer,
        records: impl IntoIterator<Item = (Ordinal, &'a IndexRecord)>,
    ) -> Self {
        let mut terms: AHashMap<Token, Posting> = AHashMap::new();

        for (ordinal, record) in records {
            for field in Field::ALL {
                for token in tokenizer.tokenize(field.of(record)) {
                    terms.entry(token).or_default().record(ordinal, field);
                }
            }
        }

        terms.shrink_to_fit();
        Self { terms }
    }

    pub fn posting(&self, token: &str) -> Option<&Posting> {
        self.terms.get(token)
    }

    /// Number of distinct tokens.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Total (token, record) pairs across all postings.
    pub fn entry_count(&self) -> usize {
        self.terms.values().map(Posting::len).sum()
    }

    /// Iterate tokens in arbitrary order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.terms.keys()
    }
}
