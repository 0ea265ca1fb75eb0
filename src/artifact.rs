//! Reading and writing the persisted record artifact.
//!
//! Documentation generators emit the record set as a small JavaScript file:
//!
//! ```text
//! var documenterSearchIndex = {"docs":
//! [{"location":"","page":"Home","title":"Home","text":"...","category":"page"}, ...]
//! }
//! ```
//!
//! [`parse`] accepts that form, a bare JSON object with a `docs` array, or a bare
//! JSON array of entries.

use crate::builder::{IndexBuilder, SearchIndex};
use crate::error::ArtifactError;
use crate::record::{IndexRecord, RawEntry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Variable name used when emitting the JavaScript form.
pub const INDEX_VARIABLE: &str = "documenterSearchIndex";

#[derive(Deserialize)]
struct Wrapped {
    docs: Option<Vec<RawEntry>>,
}

#[derive(Serialize)]
struct WrappedRef<'a> {
    docs: &'a [IndexRecord],
}

/// Parse artifact text into raw entries, in file order.
pub fn parse(content: &str) -> Result<Vec<RawEntry>, ArtifactError> {
    // Anything before the JSON payload is the `var x =` assignment.
    let start = content
        .find(['{', '['])
        .ok_or(ArtifactError::MissingRecords)?;
    let payload = &content[start..];

    // Stream a single value so a trailing `;` or newline is ignored.
    let entries = if payload.starts_with('[') {
        first_value::<Vec<RawEntry>>(payload)?
    } else {
        first_value::<Wrapped>(payload)?
            .docs
            .ok_or(ArtifactError::MissingRecords)?
    };

    tracing::debug!("Parsed {} raw entries from artifact", entries.len());
    Ok(entries)
}

fn first_value<'de, T: Deserialize<'de>>(payload: &'de str) -> Result<T, ArtifactError> {
    serde_json::Deserializer::from_str(payload)
        .into_iter::<T>()
        .next()
        .ok_or(ArtifactError::MissingRecords)?
        .map_err(ArtifactError::from)
}

/// Read and parse an artifact file.
pub fn load(path: &Path) -> Result<Vec<RawEntry>, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Read an artifact file and build an index from it.
pub fn load_index(path: &Path, builder: &IndexBuilder) -> Result<SearchIndex, ArtifactError> {
    let entries = load(path)?;
    tracing::info!("Loading {} entries from {}", entries.len(), path.display());
    Ok(builder.build(entries)?)
}

/// Emit records in the JavaScript form understood by [`parse`].
pub fn to_js(records: &[IndexRecord]) -> Result<String, ArtifactError> {
    let body = serde_json::to_string(&WrappedRef { docs: records })?;
    Ok(format!("var {INDEX_VARIABLE} = {body}\n"))
}

/// Emit records as a bare JSON array.
pub fn to_json(records: &[IndexRecord]) -> Result<String, ArtifactError> {
    Ok(serde_json::to_string(records)?)
}
