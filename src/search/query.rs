//! Query evaluation against a built index.
//!
//! Only the query string is tokenized per call; the record fields were tokenized
//! once at build time. Cost is proportional to the number of query tokens plus the
//! size of their postings, independent of the total corpus size.

use super::index::{InvertedIndex, Posting};
use super::scoring::FieldWeights;
use super::tokenize::{Token, Tokenizer};
use crate::record::{Category, RecordStore, Ordinal};
use ahash::AHashMap;
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How candidates are selected from the postings of multiple query tokens.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

/// Per-call search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    /// Maximum number of hits; 0 means no cap.
    pub limit: usize,
    pub mode: MatchMode,
}

impl SearchOptions {
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            mode: MatchMode::Any,
        }
    }
}

/// One ranked result, borrowing from the index it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit<'a> {
    pub ordinal: Ordinal,
    pub location: &'a str,
    pub page: &'a str,
    pub title: &'a str,
    pub category: Category,
    pub score: f64,
}

/// Ranked hits plus the number of candidates before truncation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults<'a> {
    pub hits: Vec<SearchHit<'a>>,
    pub total: usize,
}

impl SearchResults<'_> {
    const fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
        }
    }
}

/// Read-only view over the parts of an index needed to answer queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    store: &'a RecordStore,
    index: &'a InvertedIndex,
    tokenizer: &'a Tokenizer,
    weights: &'a FieldWeights,
}

impl<'a> QueryEngine<'a> {
    pub const fn new(
        store: &'a RecordStore,
        index: &'a InvertedIndex,
        tokenizer: &'a Tokenizer,
        weights: &'a FieldWeights,
    ) -> Self {
        Self {
            store,
            index,
            tokenizer,
            weights,
        }
    }

    /// Union search returning at most `limit` hits (0 means no cap).
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit<'a>> {
        self.search_with(query, SearchOptions::with_limit(limit)).hits
    }

    /// Search with explicit options, also reporting the untruncated candidate count.
    pub fn search_with(&self, query: &str, options: SearchOptions) -> SearchResults<'a> {
        let tokens = self.query_tokens(query);
        if tokens.is_empty() {
            return SearchResults::empty();
        }

        let postings: Vec<&Posting> = tokens
            .iter()
            .filter_map(|token| self.index.posting(token.as_str()))
            .collect();

        let mut scored = match options.mode {
            MatchMode::Any => self.score_union(&postings),
            MatchMode::All if postings.len() == tokens.len() => self.score_intersection(&postings),
            MatchMode::All => Vec::new(),
        };

        for (ordinal, score) in &mut scored {
            if let Some(record) = self.store.get(*ordinal) {
                *score += self.weights.category_bonus(record.category);
            }
        }

        let total = scored.len();
        rank(&mut scored, options.limit);

        tracing::trace!(
            query,
            tokens = tokens.len(),
            matched_tokens = postings.len(),
            total,
            returned = scored.len(),
            "Evaluated query"
        );

        let hits = scored
            .into_iter()
            .filter_map(|(ordinal, score)| {
                self.store.get(ordinal).map(|record| SearchHit {
                    ordinal,
                    location: &record.location,
                    page: &record.page,
                    title: &record.title,
                    category: record.category,
                    score,
                })
            })
            .collect();

        SearchResults { hits, total }
    }

    /// Distinct query tokens, in a fixed order so score sums are reproducible.
    fn query_tokens(&self, query: &str) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.tokenizer.tokenize(query).collect();
        tokens.sort_unstable();
        tokens.dedup();
        tokens
    }

    fn score_union(&self, postings: &[&Posting]) -> Vec<(Ordinal, f64)> {
        let capacity = postings.iter().map(|p| p.len()).max().unwrap_or(0);
        let mut scores: AHashMap<Ordinal, f64> = AHashMap::with_capacity(capacity);

        for posting in postings {
            for entry in posting.entries() {
                *scores.entry(entry.ordinal).or_insert(0.0) +=
                    self.weights.token_score(&entry.counts);
            }
        }

        scores.into_iter().collect()
    }

    /// Walk the shortest posting and look up the others by binary search.
    fn score_intersection(&self, postings: &[&Posting]) -> Vec<(Ordinal, f64)> {
        let Some((shortest_idx, shortest)) = postings
            .iter()
            .enumerate()
            .min_by_key(|(_, posting)| posting.len())
        else {
            return Vec::new();
        };

        shortest
            .entries()
            .iter()
            .filter_map(|candidate| {
                let mut score = 0.0;
                for (idx, posting) in postings.iter().enumerate() {
                    let entry = if idx == shortest_idx {
                        candidate
                    } else {
                        posting.find(candidate.ordinal)?
                    };
                    score += self.weights.token_score(&entry.counts);
                }
                Some((candidate.ordinal, score))
            })
            .collect()
    }
}

/// Highest score first; equal scores in document order.
fn rank_order(a: &(Ordinal, f64), b: &(Ordinal, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Sort candidates and keep the top `limit` (all of them when `limit` is 0).
fn rank(scored: &mut Vec<(Ordinal, f64)>, limit: usize) {
    if limit > 0 && limit < scored.len() {
        scored.select_nth_unstable_by(limit - 1, rank_order);
        scored.truncate(limit);
    }
    // Ordinals are unique, so the order is total and an unstable sort is deterministic.
    scored.sort_unstable_by(rank_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{IndexRecord, RawEntry};
    use assert2::check;
    use rstest::rstest;

    struct Fixture {
        store: RecordStore,
        index: InvertedIndex,
        tokenizer: Tokenizer,
        weights: FieldWeights,
    }

    impl Fixture {
        fn new(entries: Vec<RawEntry>) -> Self {
            let records: Vec<IndexRecord> = entries.into_iter().map(Into::into).collect();
            let store = RecordStore::from_records(records);
            let tokenizer = Tokenizer::default();
            let index = InvertedIndex::build(&tokenizer, store.iter());
            Self {
                store,
                index,
                tokenizer,
                weights: FieldWeights::default(),
            }
        }

        fn engine(&self) -> QueryEngine<'_> {
            QueryEngine::new(&self.store, &self.index, &self.tokenizer, &self.weights)
        }
    }

    fn locations<'a>(hits: &[SearchHit<'a>]) -> Vec<&'a str> {
        hits.iter().map(|hit| hit.location).collect()
    }

    fn corpus() -> Fixture {
        Fixture::new(vec![
            RawEntry::new("/", "Home", "Home", "Getting started with solvers", Category::Page),
            RawEntry::new("/#Solvers", "Home", "Solvers", "", Category::Section),
            RawEntry::new(
                "/api#solve",
                "API",
                "solve",
                "Run the solver on a problem and return the solution",
                Category::Function,
            ),
            RawEntry::new("/api#Problem", "API", "Problem", "A problem to solve", Category::Type),
            RawEntry::new("/api", "API", "API", "Reference for solve and Problem", Category::Page),
        ])
    }

    #[test]
    fn test_union_collects_every_matching_record() {
        let fixture = corpus();
        let hits = fixture.engine().search("solve problem", 0);
        check!(
            locations(&hits) == ["/api#Problem", "/api#solve", "/api"],
            "hits: {:?}",
            hits
        );
    }

    #[test]
    fn test_scores_follow_field_weights() {
        let fixture = corpus();
        let hits = fixture.engine().search("problem", 0);
        // Problem: title 10 + text 1; solve: text 1; API page: text 1 + page bonus.
        let scores: Vec<f64> = hits.iter().map(|h| h.score).collect();
        check!(scores == [11.0, 1.5, 1.0]);
        check!(locations(&hits) == ["/api#Problem", "/api", "/api#solve"]);
    }

    #[test]
    fn test_intersection_requires_every_token() {
        let fixture = corpus();
        let engine = fixture.engine();
        let options = SearchOptions {
            limit: 0,
            mode: MatchMode::All,
        };

        let results = engine.search_with("solve problem", options);
        check!(locations(&results.hits) == ["/api#Problem", "/api#solve", "/api"]);

        let results = engine.search_with("solution problem", options);
        check!(locations(&results.hits) == ["/api#solve"]);

        let results = engine.search_with("problem zzz", options);
        check!(results.hits.is_empty());
        check!(results.total == 0);
    }

    #[test]
    fn test_missing_token_does_not_abort_union() {
        let fixture = corpus();
        let hits = fixture.engine().search("zzz solvers", 0);
        check!(locations(&hits) == ["/#Solvers", "/"]);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("!!! ...")]
    #[case("a")]
    fn test_queries_without_tokens_are_empty(#[case] query: &str) {
        let fixture = corpus();
        for limit in [0, 1, 10] {
            check!(fixture.engine().search(query, limit).is_empty());
        }
    }

    #[test]
    fn test_repeated_query_tokens_count_once() {
        let fixture = corpus();
        let once = fixture.engine().search("problem", 0);
        let twice = fixture.engine().search("problem Problem PROBLEM", 0);
        check!(once == twice);
    }

    #[test]
    fn test_limit_truncates_and_reports_total() {
        let fixture = corpus();
        let results = fixture.engine().search_with("problem", SearchOptions::with_limit(2));
        check!(results.total == 3);
        check!(locations(&results.hits) == ["/api#Problem", "/api"]);
    }

    #[test]
    fn test_ties_break_by_ordinal() {
        let fixture = Fixture::new(
            (0..50)
                .map(|i| {
                    RawEntry::new(format!("/e{i}"), "Page", format!("Entry {i}"), "tie", Category::Section)
                })
                .collect(),
        );
        let hits = fixture.engine().search("tie", 7);
        let ordinals: Vec<Ordinal> = hits.iter().map(|h| h.ordinal).collect();
        check!(ordinals == [0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_page_bonus_only_breaks_ties() {
        let fixture = Fixture::new(vec![
            RawEntry::new("/s", "P", "Overview", "widget", Category::Section),
            RawEntry::new("/p", "P", "Landing", "widget", Category::Page),
            RawEntry::new("/t", "P", "Widget", "", Category::Type),
        ]);
        let hits = fixture.engine().search("widget", 0);
        check!(locations(&hits) == ["/t", "/p", "/s"]);
    }

    #[rstest]
    #[case(vec![(3, 1.0), (1, 2.0), (2, 1.0), (0, 5.0)], 0, vec![0, 1, 2, 3])]
    #[case(vec![(3, 1.0), (1, 2.0), (2, 1.0), (0, 5.0)], 2, vec![0, 1])]
    #[case(vec![(3, 1.0), (1, 2.0), (2, 1.0), (0, 5.0)], 3, vec![0, 1, 2])]
    #[case(vec![(3, 1.0), (1, 2.0)], 10, vec![1, 3])]
    #[case(vec![], 5, vec![])]
    fn test_rank(
        #[case] mut scored: Vec<(Ordinal, f64)>,
        #[case] limit: usize,
        #[case] expected: Vec<Ordinal>,
    ) {
        rank(&mut scored, limit);
        let ordinals: Vec<Ordinal> = scored.iter().map(|(o, _)| *o).collect();
        check!(ordinals == expected);
    }
}
