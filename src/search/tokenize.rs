//! Text normalization shared by indexing and querying.
//!
//! A query can only find a record if both sides were normalized the same way, so
//! the builder and the query engine hold the very same [`Tokenizer`] instance.

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::VecDeque;
use std::fmt;

/// Default minimum token length, in characters.
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 2;

/// Common English stop words, dropped when [`TokenizerConfig::stop_words`] is on.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

/// A normalized search term: case-folded, punctuation-free, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Normalization options. Every option applies to indexed fields and queries alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Fragments with fewer characters than this are discarded.
    pub min_token_length: usize,
    /// Also emit CamelCase sub-words: "GeometricSolution" yields
    /// "geometricsolution", "geometric", "solution".
    pub split_compound: bool,
    /// Drop common English stop words.
    pub stop_words: bool,
    /// Apply English Snowball stemming.
    pub stemming: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            split_compound: false,
            stop_words: false,
            stemming: false,
        }
    }
}

/// Splits free text into [`Token`]s.
///
/// The default rule lower-cases the input, splits on runs of non-alphanumeric
/// characters and drops fragments shorter than `min_token_length`. Tokenizing is
/// pure: the same input always yields the same sequence, in text order.
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        let stemmer = config
            .stemming
            .then(|| Stemmer::create(Algorithm::English));
        Self { config, stemmer }
    }

    pub const fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Lazily tokenize `text`.
    ///
    /// The returned iterator borrows both the tokenizer and the text. Calling this
    /// again with the same text restarts the sequence from the beginning.
    pub fn tokenize<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens {
            tokenizer: self,
            fragments: text.split(is_separator as fn(char) -> bool),
            pending: VecDeque::new(),
        }
    }

    /// Normalize one alphanumeric fragment, queueing the resulting tokens.
    fn expand(&self, fragment: &str, out: &mut VecDeque<Token>) {
        self.push_lowered(fragment, out);

        if self.config.split_compound {
            let subwords = camel_case_subwords(fragment);
            if subwords.len() > 1 {
                for subword in subwords {
                    self.push_lowered(subword, out);
                }
            }
        }
    }

    /// Lower-case `word` and split it again: case mapping can introduce
    /// non-alphanumeric code points ("İ" lowers to "i" + U+0307).
    fn push_lowered(&self, word: &str, out: &mut VecDeque<Token>) {
        let lowered = word.to_lowercase();
        for piece in lowered.split(is_separator).filter(|piece| !piece.is_empty()) {
            self.push_normalized(piece.to_string(), out);
        }
    }

    fn push_normalized(&self, word: String, out: &mut VecDeque<Token>) {
        if word.chars().count() < self.config.min_token_length {
            return;
        }

        if self.config.stop_words && STOP_WORDS.contains(&word.as_str()) {
            return;
        }

        let word = match &self.stemmer {
            Some(stemmer) => stemmer.stem(&word).into_owned(),
            None => word,
        };

        if !word.is_empty() {
            out.push_back(Token(word));
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Clone for Tokenizer {
    fn clone(&self) -> Self {
        Self::new(self.config.clone())
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Lazy token sequence produced by [`Tokenizer::tokenize`].
pub struct Tokens<'a> {
    tokenizer: &'a Tokenizer,
    fragments: std::str::Split<'a, fn(char) -> bool>,
    /// Tokens derived from the current fragment but not yet yielded.
    pending: VecDeque<Token>,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }

            let fragment = self.fragments.next()?;
            if !fragment.is_empty() {
                self.tokenizer.expand(fragment, &mut self.pending);
            }
        }
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}

fn is_separator(c: char) -> bool {
    !c.is_alphanumeric()
}

/// Split an alphanumeric fragment at lowercase → uppercase transitions.
///
/// "HttpServer" → ["Http", "Server"]; "parseJSON" → ["parse", "JSON"];
/// "Vec2d" → ["Vec2d"].
fn camel_case_subwords(fragment: &str) -> Vec<&str> {
    let mut subwords = vec![];
    let mut start = 0;
    let mut last_lower = false;

    for (i, c) in fragment.char_indices() {
        let is_upper = c.is_uppercase();
        if is_upper && last_lower {
            subwords.push(&fragment[start..i]);
            start = i;
        }
        last_lower = c.is_lowercase();
    }
    subwords.push(&fragment[start..]);

    subwords
}
