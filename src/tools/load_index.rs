//! Loading a documentation search artifact into the server.

use crate::builder::IndexStats;
use crate::server::{ServerContext, expand_tilde};
use rmcp::schemars;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct LoadIndexRequest {
    /// Path to a search index artifact (`search_index.js` or a JSON record array)
    pub path: String,
}

/// Build an index from the artifact at `request.path` and make it current.
///
/// The previous index keeps answering queries until the new one is built; if
/// the build fails it stays installed.
pub async fn handle_load_index(
    context: &ServerContext,
    request: LoadIndexRequest,
) -> Result<String, String> {
    let expanded = expand_tilde(&request.path);
    let path = PathBuf::from(expanded.as_ref());
    let path = std::fs::canonicalize(&path).unwrap_or(path);

    let previous = context.state().current().await.map(|index| index.fingerprint());

    let index = context
        .state()
        .load(&path)
        .await
        .map_err(|e| format!("Failed to load index from {}: {}", path.display(), e))?;

    let changed = previous != Some(index.fingerprint());
    Ok(format_response(&path, &index.stats(), changed))
}

pub(crate) fn format_stats(output: &mut String, stats: &IndexStats) {
    output.push_str(&format!("  Records:   {}\n", stats.records));
    output.push_str(&format!("  Terms:     {}\n", stats.terms));
    output.push_str(&format!("  Postings:  {}\n", stats.postings));
    output.push_str(&format!("  Fingerprint: {:016x}\n", stats.fingerprint));
}

fn format_response(path: &Path, stats: &IndexStats, changed: bool) -> String {
    let mut response = format!("Index loaded: {}\n\n", path.display());
    format_stats(&mut response, stats);
    if !changed {
        response.push_str("\n(Contents unchanged from the previously loaded index)\n");
    }
    response
}
