use crate::core::{AllocationTable, ClientState, Exhausted, Quote, QuoteStore};
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;

/// Shared handle to the allocation tracker
///
/// Cloning is cheap; every clone refers to the same quote store and the same
/// allocation table. All table access, including the lazy creation of a
/// client record, happens under a single lock, so two simultaneous first
/// requests for one client cannot each create their own record.
#[derive(Clone)]
pub struct AllocationTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    quotes: Arc<QuoteStore>,
    table: Mutex<AllocationTable>,
}

impl AllocationTracker {
    pub fn new(quotes: Arc<QuoteStore>) -> Self {
        AllocationTracker {
            inner: Arc::new(TrackerInner {
                quotes,
                table: Mutex::new(AllocationTable::new()),
            }),
        }
    }

    /// The quote corpus this tracker allocates from
    pub fn quotes(&self) -> &QuoteStore {
        &self.inner.quotes
    }

    /// Issue a quote `client_id` has not seen since the last reset
    pub fn issue_for_client(&self, client_id: &str) -> Result<Quote, Exhausted> {
        self.issue_for_client_with(client_id, &mut rand::thread_rng())
    }

    /// Same as [`issue_for_client`](Self::issue_for_client) with a caller-supplied RNG
    pub fn issue_for_client_with<R: Rng + ?Sized>(
        &self,
        client_id: &str,
        rng: &mut R,
    ) -> Result<Quote, Exhausted> {
        let mut table = self.inner.table.lock();
        table
            .issue(client_id, &self.inner.quotes, rng)
            .map(Quote::clone)
    }

    /// Pick any quote, ignoring and leaving untouched all client history
    pub fn issue_any(&self) -> Quote {
        self.inner.quotes.random_quote().clone()
    }

    /// Clear every client's history; returns the number of records cleared
    pub fn reset_all(&self) -> usize {
        self.inner.table.lock().reset_all()
    }

    pub fn client_state(&self, client_id: &str) -> ClientState {
        self.inner
            .table
            .lock()
            .state(client_id, &self.inner.quotes)
    }

    pub fn used_today(&self, client_id: &str) -> usize {
        self.inner.table.lock().used_today(client_id)
    }

    pub fn client_count(&self) -> usize {
        self.inner.table.lock().client_count()
    }
}
