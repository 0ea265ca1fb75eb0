//! Index construction from raw documentation entries.
//!
//! [`IndexBuilder`] validates the raw entries, freezes them into a
//! [`RecordStore`], and builds the [`InvertedIndex`] with the same
//! [`Tokenizer`] that later answers queries. The result is a [`SearchIndex`]
//! snapshot that is never mutated; a new documentation build means a new snapshot.

use crate::config::SearchConfig;
use crate::error::BuildError;
use crate::record::{IndexRecord, Ordinal, RawEntry, RecordStore};
use crate::search::{
    FieldWeights, InvertedIndex, MatchMode, QueryEngine, SearchHit, SearchOptions, SearchResults,
    Tokenizer, TokenizerConfig,
};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// What to do when two raw entries share a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail the build with [`BuildError::DuplicateLocation`].
    #[default]
    Reject,
    /// Fold later duplicates into the first record with that location,
    /// appending their non-empty text.
    Merge,
}

/// Shared, immutable handle to a built index. Cheap to clone across threads.
pub type IndexHandle = Arc<SearchIndex>;

/// Assembles a [`SearchIndex`] from raw entries.
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    tokenizer: TokenizerConfig,
    weights: FieldWeights,
    duplicates: DuplicatePolicy,
    match_mode: MatchMode,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preconfigured from a loaded [`SearchConfig`].
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            tokenizer: config.tokenizer.clone(),
            weights: config.weights,
            duplicates: config.duplicate_locations,
            match_mode: config.match_mode,
        }
    }

    pub fn tokenizer(mut self, config: TokenizerConfig) -> Self {
        self.tokenizer = config;
        self
    }

    pub const fn weights(mut self, weights: FieldWeights) -> Self {
        self.weights = weights;
        self
    }

    pub const fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub const fn match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Validate and freeze raw entries into a record store.
    ///
    /// Each record's ordinal is its position in `entries`. Under
    /// [`DuplicatePolicy::Merge`], ordinals are positions among the surviving
    /// (first-seen) locations.
    pub fn build_store(
        &self,
        entries: impl IntoIterator<Item = RawEntry>,
    ) -> Result<RecordStore, BuildError> {
        let records: Vec<IndexRecord> = entries.into_iter().map(IndexRecord::from).collect();
        check_record_count(records.len())?;

        let records = match self.duplicates {
            DuplicatePolicy::Reject => {
                reject_duplicates(&records)?;
                records
            }
            DuplicatePolicy::Merge => merge_duplicates(records),
        };

        Ok(RecordStore::from_records(records))
    }

    /// Build the record store and its inverted index.
    pub fn build(&self, entries: impl IntoIterator<Item = RawEntry>) -> Result<SearchIndex, BuildError> {
        let start = std::time::Instant::now();

        self.weights.validate()?;
        let store = self.build_store(entries)?;
        let tokenizer = Tokenizer::new(self.tokenizer.clone());
        let index = InvertedIndex::build(&tokenizer, store.iter());

        let built = SearchIndex {
            store,
            index,
            tokenizer,
            weights: self.weights,
            match_mode: self.match_mode,
        };

        tracing::info!(
            "Built search index: {} unique terms, {} records, {} term-record pairs in {:?}",
            built.index.term_count(),
            built.store.len(),
            built.index.entry_count(),
            start.elapsed()
        );

        Ok(built)
    }
}

/// Every record needs an [`Ordinal`].
fn check_record_count(count: usize) -> Result<(), BuildError> {
    if Ordinal::try_from(count).is_err() {
        return Err(BuildError::TooManyRecords { count });
    }
    Ok(())
}

fn reject_duplicates(records: &[IndexRecord]) -> Result<(), BuildError> {
    let mut seen: AHashMap<&str, Ordinal> = AHashMap::with_capacity(records.len());

    for (ordinal, record) in (0..).zip(records) {
        if let Some(&first) = seen.get(record.location.as_str()) {
            tracing::error!(
                location = %record.location,
                first,
                second = ordinal,
                "Duplicate location in documentation records"
            );
            return Err(BuildError::DuplicateLocation {
                location: record.location.clone(),
                first,
                second: ordinal,
            });
        }
        seen.insert(record.location.as_str(), ordinal);
    }

    Ok(())
}

fn merge_duplicates(records: Vec<IndexRecord>) -> Vec<IndexRecord> {
    let mut merged: Vec<IndexRecord> = Vec::with_capacity(records.len());
    let mut positions: AHashMap<String, usize> = AHashMap::with_capacity(records.len());
    let mut folded = 0usize;

    for record in records {
        match positions.entry(record.location.clone()) {
            Entry::Occupied(slot) => {
                let target = &mut merged[*slot.get()];
                tracing::debug!(location = %record.location, "Merging duplicate location");
                if !record.text.is_empty() {
                    if !target.text.is_empty() {
                        target.text.push('\n');
                    }
                    target.text.push_str(&record.text);
                }
                folded += 1;
            }
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(record);
            }
        }
    }

    if folded > 0 {
        tracing::warn!(
            "Merged {} duplicate-location entries into {} records",
            folded,
            merged.len()
        );
    }

    merged
}

/// Summary of a built index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub records: usize,
    pub terms: usize,
    pub postings: usize,
    pub fingerprint: u64,
}

/// A frozen record store together with its inverted index and query settings.
#[derive(Debug)]
pub struct SearchIndex {
    store: RecordStore,
    index: InvertedIndex,
    tokenizer: Tokenizer,
    weights: FieldWeights,
    match_mode: MatchMode,
}

impl SearchIndex {
    pub const fn store(&self) -> &RecordStore {
        &self.store
    }

    pub const fn inverted_index(&self) -> &InvertedIndex {
        &self.index
    }

    pub const fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub const fn default_match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub const fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.store, &self.index, &self.tokenizer, &self.weights)
    }

    /// Ranked hits for `query` using the configured match mode; `limit` 0 means no cap.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit<'_>> {
        self.search_with(
            query,
            SearchOptions {
                limit,
                mode: self.match_mode,
            },
        )
        .hits
    }

    pub fn search_with(&self, query: &str, options: SearchOptions) -> SearchResults<'_> {
        self.engine().search_with(query, options)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            records: self.store.len(),
            terms: self.index.term_count(),
            postings: self.index.entry_count(),
            fingerprint: self.store.fingerprint(),
        }
    }

    pub const fn fingerprint(&self) -> u64 {
        self.store.fingerprint()
    }
}

/// Build an index with default settings.
pub fn build_index(entries: impl IntoIterator<Item = RawEntry>) -> Result<IndexHandle, BuildError> {
    IndexBuilder::new().build(entries).map(Arc::new)
}

/// Query a built index. Never fails; no match yields an empty list.
pub fn query<'a>(handle: &'a IndexHandle, text: &str, limit: usize) -> Vec<SearchHit<'a>> {
    handle.search(text, limit)
}
