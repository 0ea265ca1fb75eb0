//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `scenario`: the two-record "Foo.bar" corpus used by the ranking tests
//! - `strategies`: proptest strategies for corpora with unique locations
//! - `artifact_dir`: a temp directory holding a Documenter-style `search_index.js`
//! - `server_context`: a fresh [`ServerContext`] with default configuration

use docsearch::record::{Category, RawEntry};
use docsearch::{SearchConfig, ServerContext};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Documenter.jl output for a small package, including the duplicate empty
/// locations real generators emit for a page's introductory paragraphs.
pub const DOCUMENTER_INDEX: &str = r##"var documenterSearchIndex = {"docs":
[{"location":"","page":"Home","title":"Home","text":"CurrentModule = GeometricSolutions","category":"page"},{"location":"#GeometricSolutions","page":"Home","title":"GeometricSolutions","text":"","category":"section"},{"location":"","page":"Home","title":"Home","text":"Documentation for GeometricSolutions.","category":"page"},{"location":"","page":"Home","title":"Home","text":"Modules = [GeometricSolutions]","category":"page"},{"location":"#GeometricSolutions.EnsembleSolution","page":"Home","title":"GeometricSolutions.EnsembleSolution","text":"EnsembleSolution: Collection of all solutions of an EnsembleProblem.\n\n\n\n\n\n","category":"type"},{"location":"#GeometricSolutions.GeometricSolution","page":"Home","title":"GeometricSolutions.GeometricSolution","text":"GeometricSolution: Solution of a geometric differential equation.\n\n\n\n\n\n","category":"type"},{"location":"#GeometricSolutions.DataSeries","page":"Home","title":"GeometricSolutions.DataSeries","text":"Holds the data series of a solution, one entry per time step.\n\n\n\n\n\n","category":"type"},{"location":"#GeometricSolutions.nsave","page":"Home","title":"GeometricSolutions.nsave","text":"nsave(sol) returns the save interval of the solution.\n\n\n\n\n\n","category":"function"}]
}
"##;

/// The two-record corpus: a page whose text mentions Foo, and a function titled Foo.bar.
#[fixture]
pub fn scenario() -> Vec<RawEntry> {
    vec![
        RawEntry::new("/a", "Home", "Home", "Documentation for Foo", Category::Page),
        RawEntry::new("/a#Foo.bar", "Home", "Foo.bar", "bar does baz", Category::Function),
    ]
}

/// Proptest strategies for generated corpora and queries.
#[allow(dead_code)] // Used by index_test only
pub mod strategies {
    use docsearch::record::{Category, RawEntry};
    use proptest::prelude::*;

    const WORDS: &[&str] = &[
        "solution", "ensemble", "geometric", "series", "integrator", "problem", "tableau",
        "method", "step", "vector", "field", "energy", "symplectic", "runge", "kutta", "data",
    ];

    /// A vocabulary word, so generated records share tokens.
    pub fn arb_word() -> impl Strategy<Value = String> {
        prop::sample::select(WORDS).prop_map(str::to_string)
    }

    /// Vocabulary words mixed with arbitrary printable Unicode.
    pub fn arb_text() -> impl Strategy<Value = String> {
        prop::collection::vec(prop_oneof![3 => arb_word(), 1 => "\\PC{0,12}"], 0..8)
            .prop_map(|words| words.join(" "))
    }

    pub fn arb_category() -> impl Strategy<Value = Category> {
        prop::sample::select(Category::ALL.to_vec())
    }

    /// Between `min` and `max` entries whose locations are unique by construction.
    pub fn arb_entries(min: usize, max: usize) -> impl Strategy<Value = Vec<RawEntry>> {
        prop::collection::vec((arb_word(), arb_text(), arb_text(), arb_category()), min..=max)
            .prop_map(|rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(i, (page, title, text, category))| {
                        RawEntry::new(format!("{page}/#{i}"), page, title, text, category)
                    })
                    .collect()
            })
    }
}

/// A temporary directory containing artifact files.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct ArtifactDir {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl ArtifactDir {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes `content` to `name` and returns the full path.
    ///
    /// # Panics
    /// Panics if the write fails.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(name);
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", name, e));
        full_path
    }

    /// Path of the Documenter-style artifact written by [`artifact_dir`].
    pub fn documenter_index(&self) -> PathBuf {
        self.root.join("search_index.js")
    }
}

impl Default for ArtifactDir {
    fn default() -> Self {
        Self::new()
    }
}

#[fixture]
pub fn artifact_dir() -> ArtifactDir {
    let dir = ArtifactDir::new();
    dir.create_file("search_index.js", DOCUMENTER_INDEX);
    dir
}

/// A server context configured to merge duplicate locations, as needed by
/// real Documenter output.
#[fixture]
pub fn server_context() -> ServerContext {
    docsearch::tracing::init();
    let config = SearchConfig::from_toml_str("duplicate_locations = \"merge\"\n")
        .expect("valid test config");
    ServerContext::new(&config)
}
