//! Full-text search over documentation records.
//!
//! This module provides the shared tokenizer, the inverted index built from a
//! record store, field-weighted scoring, and query evaluation.

// Module declarations
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use index::{Field, FieldCounts, InvertedIndex, Posting, PostingEntry};
pub use query::{MatchMode, QueryEngine, SearchHit, SearchOptions, SearchResults};
pub use scoring::FieldWeights;
pub use tokenize::{DEFAULT_MIN_TOKEN_LENGTH, Token, Tokenizer, TokenizerConfig, Tokens};
