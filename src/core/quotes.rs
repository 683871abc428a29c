use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;

use super::LoadError;

/// A single quotation with its author
///
/// Serialized with capitalized field names (`{"Author": ..., "Text": ...}`),
/// which is the wire format clients of the HTTP API expect.
///
/// Two quotes with the same `text` are the same quote as far as allocation
/// tracking is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Quote {
    pub author: String,
    pub text: String,
}

impl Quote {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Quote {
            author: author.into(),
            text: text.into(),
        }
    }

    /// Parse one `author<TAB>text` line
    ///
    /// Splits on the first tab only, so the text may itself contain tabs.
    /// Returns `None` for lines without a tab or with an empty text.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (author, text) = line.split_once('\t')?;
        if text.is_empty() {
            return None;
        }
        Some(Quote::new(author, text))
    }
}

/// Immutable, ordered collection of quotes
///
/// Built once at startup and never mutated afterwards, so it can be shared
/// between request handlers without any locking. A `QuoteStore` is never
/// empty: every constructor rejects an empty corpus.
///
/// # Example
///
/// ```
/// use quotecrab::QuoteStore;
///
/// let store = QuoteStore::parse("A\tQ1\nmalformed\nB\tQ2").unwrap();
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.get(1).unwrap().text, "Q2");
/// ```
#[derive(Debug, Clone)]
pub struct QuoteStore {
    quotes: Vec<Quote>,
}

impl QuoteStore {
    /// Build a store from already parsed quotes
    pub fn new(quotes: Vec<Quote>) -> Result<Self, LoadError> {
        if quotes.is_empty() {
            return Err(LoadError::Empty { path: None });
        }
        Ok(QuoteStore { quotes })
    }

    /// Load quotes from a tab-separated file
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be opened or read, and
    /// [`LoadError::Empty`] if it contains no usable lines.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let quotes = Self::read_quotes(BufReader::new(file)).map_err(io_err)?;

        tracing::debug!("Loaded {} quotes from {}", quotes.len(), path.display());

        if quotes.is_empty() {
            return Err(LoadError::Empty {
                path: Some(PathBuf::from(path)),
            });
        }
        Ok(QuoteStore { quotes })
    }

    /// Load quotes from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LoadError> {
        let quotes = Self::read_quotes(reader).map_err(|source| LoadError::Io {
            path: PathBuf::from("<reader>"),
            source,
        })?;
        Self::new(quotes)
    }

    /// Parse quotes from an in-memory string
    pub fn parse(content: &str) -> Result<Self, LoadError> {
        Self::new(content.lines().filter_map(Quote::parse_line).collect())
    }

    fn read_quotes<R: BufRead>(reader: R) -> std::io::Result<Vec<Quote>> {
        let mut quotes = Vec::new();
        for (index, line) in reader.split(b'\n').enumerate() {
            // Malformed lines are skipped, I/O errors are not
            let line = line?;
            let Ok(line) = std::str::from_utf8(&line) else {
                tracing::debug!("Skipping line {} with invalid UTF-8", index + 1);
                continue;
            };
            if let Some(quote) = Quote::parse_line(line) {
                quotes.push(quote);
            }
        }
        Ok(quotes)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Always `false`; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Quote> {
        self.quotes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Quote> {
        self.quotes.iter()
    }

    pub fn as_slice(&self) -> &[Quote] {
        &self.quotes
    }

    /// Pick a quote uniformly at random using the thread-local RNG
    pub fn random_quote(&self) -> &Quote {
        self.random_quote_with(&mut rand::thread_rng())
    }

    /// Pick a quote uniformly at random using the given RNG
    pub fn random_quote_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &Quote {
        // Non-empty by construction
        let index = rng.gen_range(0..self.quotes.len());
        &self.quotes[index]
    }

    /// Pick uniformly among the quotes accepted by `eligible`
    ///
    /// Returns `None` when no quote passes the filter.
    pub fn choose_where<R, F>(&self, rng: &mut R, mut eligible: F) -> Option<&Quote>
    where
        R: Rng + ?Sized,
        F: FnMut(&Quote) -> bool,
    {
        let candidates: Vec<&Quote> = self.quotes.iter().filter(|q| eligible(q)).collect();
        candidates.choose(rng).copied()
    }
}

impl<'a> IntoIterator for &'a QuoteStore {
    type Item = &'a Quote;
    type IntoIter = std::slice::Iter<'a, Quote>;

    fn into_iter(self) -> Self::IntoIter {
        self.quotes.iter()
    }
}
