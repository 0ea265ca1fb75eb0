//! Index records and the frozen record store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::Xxh3;

/// A record's stable position in its store, assigned at build time.
pub type Ordinal = u32;

/// Semantic kind of a documentation entry.
///
/// Drives result grouping and the label shown next to a hit. Unknown values in
/// an artifact deserialize as [`Category::Other`] so a newer generator never
/// breaks an older engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Page,
    Section,
    Type,
    Function,
    Method,
    Module,
    Macro,
    Constant,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    pub const ALL: [Self; 9] = [
        Self::Page,
        Self::Section,
        Self::Type,
        Self::Function,
        Self::Method,
        Self::Module,
        Self::Macro,
        Self::Constant,
        Self::Other,
    ];

    /// The lowercase tag used in the persisted artifact.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Section => "section",
            Self::Type => "type",
            Self::Function => "function",
            Self::Method => "method",
            Self::Module => "module",
            Self::Macro => "macro",
            Self::Constant => "constant",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse: anything outside the known set becomes [`Category::Other`].
impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .unwrap_or(Self::Other))
    }
}

/// One entry as emitted by the documentation generator, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub location: String,
    pub page: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub category: Category,
}

impl RawEntry {
    pub fn new(
        location: impl Into<String>,
        page: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            location: location.into(),
            page: page.into(),
            title: title.into(),
            text: text.into(),
            category,
        }
    }
}

/// An indexed documentation entry (a page, a section, or a named symbol).
///
/// Records are only reachable through a [`RecordStore`], which hands out shared
/// references, so a record never changes after the store is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRecord {
    /// Canonical URL/path plus optional in-page anchor. Unique per store.
    pub location: String,
    /// Title of the containing page.
    pub page: String,
    /// Title of this specific entry.
    pub title: String,
    /// Free-text body or snippet, possibly empty, of unspecified length.
    pub text: String,
    pub category: Category,
}

impl From<RawEntry> for IndexRecord {
    fn from(raw: RawEntry) -> Self {
        Self {
            location: raw.location,
            page: raw.page,
            title: raw.title,
            text: raw.text,
            category: raw.category,
        }
    }
}

/// Immutable, ordered collection of records for one documentation build.
///
/// Records are stored in document order; a record's ordinal is its index here.
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<IndexRecord>,
    fingerprint: u64,
}

impl RecordStore {
    /// Freeze a validated record list. Callers guarantee unique locations.
    pub(crate) fn from_records(records: Vec<IndexRecord>) -> Self {
        let fingerprint = fingerprint(&records);
        Self {
            records,
            fingerprint,
        }
    }

    pub fn get(&self, ordinal: Ordinal) -> Option<&IndexRecord> {
        self.records.get(ordinal as usize)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records together with their ordinals, in document order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (Ordinal, &IndexRecord)> + '_ {
        // `IndexBuilder::build_store` rejects more than `Ordinal::MAX` records.
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| (idx as Ordinal, record))
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// 64-bit xxh3 digest of every record in ordinal order.
    ///
    /// Two builds with identical content share a fingerprint, so consumers can
    /// tell whether results came from the snapshot they are currently showing.
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

fn fingerprint(records: &[IndexRecord]) -> u64 {
    let mut hasher = Xxh3::new();
    for record in records {
        for field in [
            record.location.as_str(),
            record.page.as_str(),
            record.title.as_str(),
            record.text.as_str(),
            record.category.as_str(),
        ] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("page", Category::Page)]
    #[case("function", Category::Function)]
    #[case("Macro", Category::Macro)]
    #[case(" constant ", Category::Constant)]
    #[case("keyword", Category::Other)]
    #[case("", Category::Other)]
    fn test_category_from_str(#[case] input: &str, #[case] expected: Category) {
        check!(input.parse::<Category>() == Ok(expected));
    }

    #[test]
    fn test_unknown_category_deserializes_as_other() {
        let entry: RawEntry = serde_json::from_str(
            r#"{"location":"/x","page":"P","title":"T","text":"","category":"keyword"}"#,
        )
        .unwrap();
        check!(entry.category == Category::Other);
    }

    #[test]
    fn test_missing_text_and_category_default() {
        let entry: RawEntry =
            serde_json::from_str(r#"{"location":"/x","page":"P","title":"T"}"#).unwrap();
        check!(entry.text.is_empty());
        check!(entry.category == Category::Other);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Section).unwrap();
        check!(json == "\"section\"");
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = RecordStore::from_records(vec![
            RawEntry::new("/a", "Home", "Home", "hello", Category::Page).into(),
        ]);
        let b = RecordStore::from_records(vec![
            RawEntry::new("/a", "Home", "Home", "hello", Category::Page).into(),
        ]);
        let c = RecordStore::from_records(vec![
            RawEntry::new("/a", "Home", "Home", "hello!", Category::Page).into(),
        ]);
        check!(a.fingerprint() == b.fingerprint());
        check!(a.fingerprint() != c.fingerprint());
    }

    #[test]
    fn test_fingerprint_separates_fields() {
        // Field boundaries are length-prefixed, so shifting text between fields changes the digest.
        let a = RecordStore::from_records(vec![
            RawEntry::new("/ab", "c", "T", "", Category::Page).into(),
        ]);
        let b = RecordStore::from_records(vec![
            RawEntry::new("/a", "bc", "T", "", Category::Page).into(),
        ]);
        check!(a.fingerprint() != b.fingerprint());
    }
}
