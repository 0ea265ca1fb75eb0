//! Search index construction and querying for static documentation sites.
//!
//! A documentation generator emits one [`RawEntry`] per addressable piece of
//! documentation. [`IndexBuilder`] validates them into a [`RecordStore`] and
//! builds an inverted index once; [`SearchIndex::search`] then answers ranked
//! free-text queries against that immutable snapshot.

pub mod artifact;
pub mod builder;
pub mod config;
pub mod error;
pub mod record;
pub mod search;
pub mod server;
pub mod tools;
pub mod tracing;
pub mod worker;

pub use builder::{
    DuplicatePolicy, IndexBuilder, IndexHandle, IndexStats, SearchIndex, build_index, query,
};
pub use config::SearchConfig;
pub use error::{ArtifactError, BuildError, ConfigError, InvalidWeights, LoadError, Result};
pub use record::{Category, IndexRecord, Ordinal, RawEntry, RecordStore};
pub use search::{
    FieldWeights, MatchMode, SearchHit, SearchOptions, SearchResults, Tokenizer, TokenizerConfig,
};
pub use server::{DocSearchServer, ServerContext};
pub use worker::{IndexState, Snapshot};
