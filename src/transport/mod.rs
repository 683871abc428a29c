//! Transport layer for the quote server
//!
//! Transports accept client connections, run requests through the access
//! gate and translate them into allocation tracker calls. All transports
//! share one [`AppState`], so every client sees the same allocation history.
//!
//! # Available Transports
//!
//! - [`http`]: REST API with JSON responses

pub mod http;


use crate::auth::ApiKeyGate;
use crate::metrics::Metrics;
use crate::tracker::AllocationTracker;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// State shared by every request handler
pub struct AppState {
    pub tracker: AllocationTracker,
    pub gate: ApiKeyGate,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(tracker: AllocationTracker, gate: ApiKeyGate, metrics: Arc<Metrics>) -> Self {
        AppState {
            tracker,
            gate,
            metrics,
        }
    }
}

/// Common interface for all transport implementations
///
/// Each transport is responsible for:
/// - Accepting client connections
/// - Rejecting requests that fail the access gate
/// - Forwarding requests to the allocation tracker
/// - Sending responses back to clients
#[async_trait]
pub trait Transport {
    /// Start the transport server
    ///
    /// Runs until an error occurs or the process receives a shutdown signal.
    async fn start(self, state: Arc<AppState>) -> Result<()>;
}
