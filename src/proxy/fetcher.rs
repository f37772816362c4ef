//! Coalescing Fetcher Module
//!
//! Ensures at most one in-flight origin fetch per cache key. Concurrent
//! callers for the same key attach to the single pending fetch and all
//! receive its outcome, eliminating the cache-stampede race of a naive
//! check-then-fetch.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, Mutex, RwLock};
use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::error::FetchError;
use crate::origin::{OriginClient, OriginResponse};

/// Outcome of a single fetch episode, broadcast to every coalesced waiter.
pub type FetchOutcome = Result<OriginResponse, FetchError>;

/// Shared handle a waiter attaches to. The value stays `None` until the
/// episode publishes its outcome.
type PendingHandle = watch::Receiver<Option<FetchOutcome>>;

// == Coalescing Fetcher ==
/// Deduplicates concurrent origin fetches per cache key.
///
/// The fetch itself runs in a detached task (the "episode") so that a
/// waiter whose inbound connection is aborted cannot cancel the shared
/// fetch: the episode always completes and attempts to populate the cache
/// for remaining waiters and future requests. The registry lock is held
/// only for map mutation, never across the network call.
pub struct CoalescingFetcher {
    /// Outbound client shared with the episode tasks
    client: Arc<OriginClient>,
    /// Cache the episode populates on success
    store: Arc<RwLock<CacheStore>>,
    /// In-flight registry: one pending handle per key currently being fetched
    in_flight: Arc<Mutex<HashMap<CacheKey, PendingHandle>>>,
}

impl CoalescingFetcher {
    // == Constructor ==
    /// Creates a fetcher over the given client and cache store.
    pub fn new(client: Arc<OriginClient>, store: Arc<RwLock<CacheStore>>) -> Self {
        Self {
            client,
            store,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // == Fetch ==
    /// Fetches `path_and_query` from the origin, coalescing with any fetch
    /// already in flight for `key`.
    ///
    /// Exactly one `OriginClient::fetch` call is made per key per episode,
    /// no matter how many callers arrive while it is pending. Successful
    /// 2xx responses are stored into the cache by the episode before the
    /// outcome is published; an oversized entry is served without caching.
    pub async fn fetch(&self, key: &CacheKey, path_and_query: &str) -> FetchOutcome {
        let mut rx = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(rx) = in_flight.get(key) {
                debug!(key = %key, "joining in-flight fetch");
                rx.clone()
            } else {
                let (tx, rx) = watch::channel(None);
                in_flight.insert(key.clone(), rx.clone());
                self.spawn_episode(key.clone(), path_and_query.to_string(), tx);
                rx
            }
        };

        let result = match rx.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => match outcome.as_ref() {
                Some(outcome) => outcome.clone(),
                // Unreachable: wait_for only returns on Some
                None => Err(FetchError::OriginUnreachable(
                    "fetch episode published no outcome".to_string(),
                )),
            },
            // Episode task died without publishing
            Err(_) => Err(FetchError::OriginUnreachable(
                "fetch episode terminated unexpectedly".to_string(),
            )),
        };
        result
    }

    // == Episode ==
    /// Spawns the detached task that performs the actual origin fetch.
    ///
    /// Ordering is load-bearing: the registry entry is removed before the
    /// outcome is published, so once any waiter unblocks, a new request for
    /// the key starts a fresh episode (a failure is never re-served).
    fn spawn_episode(
        &self,
        key: CacheKey,
        path_and_query: String,
        tx: watch::Sender<Option<FetchOutcome>>,
    ) {
        let client = Arc::clone(&self.client);
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);

        tokio::spawn(async move {
            let outcome = client.fetch(&path_and_query).await;

            in_flight.lock().await.remove(&key);

            if let Ok(response) = &outcome {
                if response.is_success() {
                    let entry = CacheEntry::new(
                        response.status,
                        response.content_type.clone(),
                        response.body.clone(),
                    );
                    let mut store = store.write().await;
                    if let Err(rejected) = store.put(key.clone(), entry) {
                        debug!(key = %key, %rejected, "response served uncached");
                    }
                }
            }

            // Waiters may all be gone; a dropped receiver set is fine
            let _ = tx.send(Some(outcome));
        });
    }

    // == In-Flight Count ==
    /// Returns the number of keys with a fetch currently in flight.
    pub async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}
