//! Ranked search over the installed index.

use crate::builder::SearchIndex;
use crate::search::{MatchMode, SearchOptions, SearchResults};
use crate::server::ServerContext;
use lru::LruCache;
use rmcp::schemars;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Free-text query; tokens are matched case-insensitively
    pub query: String,
    /// Maximum number of results to return (default from config, 0 for all)
    #[serde(default)]
    pub limit: Option<usize>,
    /// `any` ranks records matching at least one token, `all` requires every token
    #[serde(default)]
    pub mode: Option<MatchMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    limit: usize,
    mode: MatchMode,
}

struct CacheState {
    fingerprint: u64,
    entries: LruCache<CacheKey, Arc<str>>,
}

/// Recently formatted search responses for the current index snapshot.
///
/// Entries are only valid for the snapshot they were produced from, so the
/// whole cache is dropped as soon as a lookup sees a different fingerprint.
pub struct QueryCache {
    state: Option<Mutex<CacheState>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("enabled", &self.state.is_some())
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    /// A cache holding up to `capacity` responses; 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        let state = NonZeroUsize::new(capacity).map(|capacity| {
            Mutex::new(CacheState {
                fingerprint: 0,
                entries: LruCache::new(capacity),
            })
        });
        Self { state }
    }

    async fn get(&self, fingerprint: u64, key: &CacheKey) -> Option<Arc<str>> {
        let mut state = self.state.as_ref()?.lock().await;
        if state.fingerprint != fingerprint {
            if !state.entries.is_empty() {
                tracing::debug!("Index changed, dropping {} cached responses", state.entries.len());
            }
            state.entries.clear();
            state.fingerprint = fingerprint;
            return None;
        }
        state.entries.get(key).cloned()
    }

    async fn put(&self, fingerprint: u64, key: CacheKey, response: Arc<str>) {
        let Some(state) = &self.state else { return };
        let mut state = state.lock().await;
        if state.fingerprint == fingerprint {
            state.entries.put(key, response);
        }
    }

    pub async fn len(&self) -> usize {
        match &self.state {
            Some(state) => state.lock().await.entries.len(),
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Execute a search against the current index.
pub async fn handle_search(
    context: &ServerContext,
    request: SearchRequest,
) -> Result<String, String> {
    let Some(index) = context.state().current().await else {
        return Err("No index loaded. Use load_index with the path to a search index \
                    artifact (e.g. search_index.js) first."
            .to_string());
    };

    let options = SearchOptions {
        limit: request.limit.unwrap_or(context.default_limit()),
        mode: request.mode.unwrap_or(index.default_match_mode()),
    };
    let key = CacheKey {
        query: request.query,
        limit: options.limit,
        mode: options.mode,
    };

    let fingerprint = index.fingerprint();
    if let Some(cached) = context.cache().get(fingerprint, &key).await {
        tracing::debug!("Query cache hit for '{}'", key.query);
        return Ok(cached.to_string());
    }

    let results = index.search_with(&key.query, options);
    let response: Arc<str> = if results.hits.is_empty() {
        format_no_results(&index, &key.query, options.mode).into()
    } else {
        format_search_results(&results, &key.query).into()
    };

    context
        .cache()
        .put(fingerprint, key, Arc::clone(&response))
        .await;
    Ok(response.to_string())
}

/// Format search results into a readable string output.
fn format_search_results(results: &SearchResults<'_>, query: &str) -> String {
    let mut output = if results.total > results.hits.len() {
        format!(
            "Search results for '{}' (showing {} of {}):\n\n",
            query,
            results.hits.len(),
            results.total
        )
    } else {
        format!("Search results for '{}':\n\n", query)
    };

    let max_score = results.hits.first().map_or(1.0, |hit| hit.score);

    for (idx, hit) in results.hits.iter().enumerate() {
        let relevance = ((hit.score / max_score) * 100.0).round() as u8;
        output.push_str(&format!(
            "{}. {} ({}) - score: {:.1}, relevance: {}%\n",
            idx + 1,
            hit.title,
            hit.category,
            hit.score,
            relevance
        ));
        output.push_str(&format!("   page: {}\n", hit.page));
        if hit.location.is_empty() {
            output.push_str("   location: (page root)\n");
        } else {
            output.push_str(&format!("   location: {}\n", hit.location));
        }
        output.push('\n');
    }

    output
}

fn format_no_results(index: &SearchIndex, query: &str, mode: MatchMode) -> String {
    let mut msg = format!("No results found for '{}'.\n\n", query);

    let tokens: Vec<_> = index.tokenizer().tokenize(query).collect();
    if tokens.is_empty() {
        let min = index.tokenizer().config().min_token_length;
        msg.push_str(&format!(
            "The query has no searchable words (words shorter than {} characters and punctuation are ignored).\n",
            min
        ));
        return msg;
    }

    msg.push_str("Search tips:\n");
    msg.push_str("• Try a shorter or more general term\n");
    msg.push_str("• Search for names as they appear in titles, e.g. 'solution'\n");
    if mode == MatchMode::All && tokens.len() > 1 {
        msg.push_str("• Every word must match in 'all' mode; try mode 'any'\n");
    }

    msg
}
