use rand::Rng;

#[cfg(feature = "ahash")]
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
#[cfg(not(feature = "ahash"))]
use std::collections::{HashMap, HashSet};

use super::{Exhausted, Quote, QuoteStore};

const DEFAULT_CAPACITY: usize = 64;

/// Allocation state of a single client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// At least one quote has not been issued to the client today
    HasRemaining,
    /// Every quote in the store has been issued to the client today
    Exhausted,
}

/// Quotes issued to one client since the last reset
#[derive(Debug, Default)]
pub struct ClientRecord {
    used_today: HashSet<String>,
}

impl ClientRecord {
    pub fn used_today(&self) -> usize {
        self.used_today.len()
    }

    pub fn has_used(&self, text: &str) -> bool {
        self.used_today.contains(text)
    }
}

/// Per-client record of the quotes issued "today"
///
/// This is the single-threaded core of the allocation policy. It owns no
/// lock; callers that share it across tasks wrap it in one (see
/// `AllocationTracker`). Records are created lazily and are only ever
/// cleared, never removed, so the key set grows with the number of distinct
/// client identifiers seen during the life of the process.
///
/// # Example
///
/// ```
/// use quotecrab::{AllocationTable, QuoteStore};
///
/// let quotes = QuoteStore::parse("A\tQ1\nB\tQ2").unwrap();
/// let mut table = AllocationTable::new();
/// let mut rng = rand::thread_rng();
///
/// let first = table.issue("c1", &quotes, &mut rng).unwrap().clone();
/// let second = table.issue("c1", &quotes, &mut rng).unwrap().clone();
/// assert_ne!(first.text, second.text);
/// assert!(table.issue("c1", &quotes, &mut rng).is_err());
///
/// table.reset_all();
/// assert!(table.issue("c1", &quotes, &mut rng).is_ok());
/// ```
#[derive(Debug)]
pub struct AllocationTable {
    clients: HashMap<String, ClientRecord>,
}

impl AllocationTable {
    pub fn new() -> Self {
        AllocationTable {
            clients: HashMap::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Issue a quote the client has not received since the last reset
    ///
    /// The eligible subset is recomputed from the store on every call and a
    /// quote is drawn from it uniformly at random. The record for `client_id`
    /// is created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Exhausted`] when every quote has already been issued to
    /// this client today. The record is still created in that case.
    pub fn issue<'q, R: Rng + ?Sized>(
        &mut self,
        client_id: &str,
        quotes: &'q QuoteStore,
        rng: &mut R,
    ) -> Result<&'q Quote, Exhausted> {
        let record = self.record_mut(client_id);

        let quote = quotes
            .choose_where(rng, |q| !record.used_today.contains(&q.text))
            .ok_or(Exhausted)?;

        record.used_today.insert(quote.text.clone());
        Ok(quote)
    }

    /// Clear every client's history in place
    ///
    /// Returns the number of client records that were cleared.
    pub fn reset_all(&mut self) -> usize {
        for record in self.clients.values_mut() {
            record.used_today.clear();
        }
        self.clients.len()
    }

    /// Current state of `client_id` against `quotes`
    ///
    /// A client that has never been seen has everything remaining.
    pub fn state(&self, client_id: &str, quotes: &QuoteStore) -> ClientState {
        match self.clients.get(client_id) {
            Some(record) if quotes.iter().all(|q| record.has_used(&q.text)) => {
                ClientState::Exhausted
            }
            _ => ClientState::HasRemaining,
        }
    }

    pub fn get(&self, client_id: &str) -> Option<&ClientRecord> {
        self.clients.get(client_id)
    }

    /// Number of quotes issued to `client_id` since the last reset
    pub fn used_today(&self, client_id: &str) -> usize {
        self.clients
            .get(client_id)
            .map(ClientRecord::used_today)
            .unwrap_or(0)
    }

    /// Number of client records ever created
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    fn record_mut(&mut self, client_id: &str) -> &mut ClientRecord {
        self.clients.entry(client_id.to_owned()).or_default()
    }
}

impl Default for AllocationTable {
    fn default() -> Self {
        Self::new()
    }
}
