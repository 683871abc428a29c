//! # QuoteCrab
//!
//! A small HTTP quote server with a per-client "no repeats in a day" policy.
//!
//! ## How It Works
//!
//! Quotes are loaded once at startup from a tab-separated file
//! (`author<TAB>text`, one per line) into an immutable [`QuoteStore`].
//!
//! Requests to `/random?clientId=<id>` are served by the
//! [`AllocationTracker`], which remembers the quote texts already issued to
//! each client and picks uniformly among the rest. When a client has seen
//! every quote it gets `429 Too Many Requests` until the next local midnight,
//! when [`DailyReset`] clears all history.
//!
//! ```text
//!        ┌─────────────┐
//!        │    HTTP     │
//!        │  Transport  │
//!        └──────┬──────┘
//!               │ X-API-Key
//!        ┌──────▼──────┐      ┌─────────────┐
//!        │ Allocation  │◄─────┤ DailyReset  │
//!        │   Tracker   │      │   (tokio)   │
//!        └──────┬──────┘      └─────────────┘
//!               │
//!        ┌──────▼──────┐
//!        │ QuoteStore  │
//!        └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! API_KEY=s3cret quotecrab --quotes-file ./misc/author-quote.txt
//!
//! curl -H 'X-API-Key: s3cret' 'http://localhost:8080/random?clientId=alice'
//! ```
//!
//! ## Library Usage
//!
//! ```
//! use quotecrab::{AllocationTracker, QuoteStore};
//! use std::sync::Arc;
//!
//! let quotes = Arc::new(QuoteStore::parse("A\tQ1\nB\tQ2").unwrap());
//! let tracker = AllocationTracker::new(quotes);
//!
//! let first = tracker.issue_for_client("alice").unwrap();
//! let second = tracker.issue_for_client("alice").unwrap();
//! assert_ne!(first.text, second.text);
//! assert!(tracker.issue_for_client("alice").is_err());
//!
//! tracker.reset_all();
//! assert!(tracker.issue_for_client("alice").is_ok());
//! ```

pub mod auth;
pub mod config;
pub mod core;
pub mod metrics;
pub mod scheduler;
pub mod tracker;
pub mod transport;


pub use auth::ApiKeyGate;
pub use crate::core::{
    AllocationTable, ClientRecord, ClientState, Exhausted, LoadError, Quote, QuoteStore,
};
pub use metrics::Metrics;
pub use scheduler::DailyReset;
pub use tracker::AllocationTracker;
pub use transport::AppState;
