//! Core components of the quote service
//!
//! - [`quotes`]: the immutable quote corpus and its file format
//! - [`allocation`]: per-client "no repeats in a day" bookkeeping

pub mod allocation;
pub mod quotes;

pub use allocation::{AllocationTable, ClientRecord, ClientState};
pub use quotes::{Quote, QuoteStore};

use std::path::PathBuf;

/// Errors that can occur while loading the quote corpus
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read quotes from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable quotes found{}", describe_source(.path))]
    Empty { path: Option<PathBuf> },
}

/// Every quote has already been issued to the client since the last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no more quotes for today")]
pub struct Exhausted;

fn describe_source(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}
