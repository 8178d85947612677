//! Turns query edits into geocoding + forecast lookups and owns the view state.
//!
//! Every lookup claims a generation number. Only the lookup holding the current
//! generation may write to [`SearchState`]; starting a new lookup or calling
//! [`SearchController::cancel_pending`] advances the generation and fires the
//! previous lookup's [`CancellationToken`]. A late response from a superseded
//! lookup is therefore dropped even if its source ignored the token.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    error::LookupError,
    model::{ForecastData, SearchState},
    provider::WeatherSource,
    storage::{KeyValueStore, LAST_QUERY_KEY},
};

/// Queries shorter than this never reach the network.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug)]
struct Pending {
    generation: u64,
    token: CancellationToken,
}

impl Pending {
    /// Cancel whatever is in flight and hand out a fresh generation.
    fn advance(&mut self) -> (u64, CancellationToken) {
        self.token.cancel();
        self.generation += 1;
        self.token = CancellationToken::new();
        (self.generation, self.token.clone())
    }
}

#[derive(Debug)]
struct Inner {
    source: Arc<dyn WeatherSource>,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<SearchState>,
    pending: Mutex<Pending>,
    /// Generation of the last query written to `store`.
    persisted: Mutex<u64>,
}

/// Cheap to clone; all clones share one state and one in-flight lookup.
#[derive(Debug, Clone)]
pub struct SearchController {
    inner: Arc<Inner>,
}

impl SearchController {
    /// Seeds the query text from `store`; nothing is fetched until [`start`](Self::start).
    pub fn new(source: Arc<dyn WeatherSource>, store: Arc<dyn KeyValueStore>) -> Self {
        let seed = match store.get(LAST_QUERY_KEY) {
            Ok(saved) => saved.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read saved query, starting empty");
                String::new()
            }
        };

        let (state, _) = watch::channel(SearchState::with_query(seed));

        Self {
            inner: Arc::new(Inner {
                source,
                store,
                state,
                pending: Mutex::new(Pending {
                    generation: 0,
                    token: CancellationToken::new(),
                }),
                persisted: Mutex::new(0),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    /// Claim the initial lookup for the seeded query.
    pub fn start(&self) -> Lookup {
        let query = self.inner.state.borrow().query_text.clone();
        self.begin(&query)
    }

    pub async fn resolve_and_fetch(&self, query: &str) {
        self.begin(query).run().await;
    }

    pub async fn on_query_change(&self, new_text: &str) {
        if let Some(lookup) = self.commit_query(new_text) {
            lookup.run().await;
        }
    }

    /// Synchronous half of [`on_query_change`](Self::on_query_change).
    ///
    /// Records `new_text` and claims the newest generation. Returns `None` when
    /// the text did not change. Callers that spawn lookups onto a runtime
    /// should call this on their event loop and spawn [`Lookup::run`], so that
    /// edits claim generations in the order they were typed. The text is
    /// saved by [`Lookup::run`] on a blocking thread, never on the caller's.
    pub fn commit_query(&self, new_text: &str) -> Option<Lookup> {
        let changed = self.inner.state.send_if_modified(|state| {
            if state.query_text == new_text {
                false
            } else {
                state.query_text = new_text.to_string();
                true
            }
        });

        if !changed {
            return None;
        }

        let mut lookup = self.begin(new_text);
        lookup.persist = true;
        Some(lookup)
    }

    /// Cancel the previous lookup and claim a new one for `query`.
    pub fn begin(&self, query: &str) -> Lookup {
        let (generation, token) = self.lock_pending().advance();
        tracing::trace!(generation, query, "lookup claimed");

        Lookup {
            controller: self.clone(),
            query: query.to_string(),
            generation,
            token,
            persist: false,
        }
    }

    /// Cancel the in-flight lookup, if any. The cancelled lookup never writes
    /// to the state again; the loading flag is cleared here on its behalf.
    pub fn cancel_pending(&self) {
        let mut pending = self.lock_pending();
        let (generation, _) = pending.advance();

        let was_loading = self
            .inner
            .state
            .send_if_modified(|state| std::mem::replace(&mut state.is_loading, false));

        if was_loading {
            tracing::debug!(generation, "pending lookup cancelled");
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Pending> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `update` only if `generation` is still the newest claim.
    fn apply(&self, generation: u64, update: impl FnOnce(&mut SearchState)) -> bool {
        let pending = self.lock_pending();
        if pending.generation != generation {
            return false;
        }

        self.inner.state.send_modify(update);
        true
    }

    /// Save `query` unless a newer generation has already been saved.
    async fn persist(&self, generation: u64, query: String) {
        let inner = Arc::clone(&self.inner);
        let saved = tokio::task::spawn_blocking(move || {
            let mut persisted = inner
                .persisted
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *persisted > generation {
                return Ok(());
            }

            inner.store.set(LAST_QUERY_KEY, &query)?;
            *persisted = generation;
            Ok::<_, anyhow::Error>(())
        })
        .await;

        match saved {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "could not persist query"),
            Err(err) => tracing::warn!(error = %err, "query persistence task failed"),
        }
    }
}

/// A claimed request pair that has not started I/O yet.
#[derive(Debug)]
#[must_use = "a lookup does nothing until `run` is awaited"]
pub struct Lookup {
    controller: SearchController,
    query: String,
    generation: u64,
    token: CancellationToken,
    persist: bool,
}

impl Lookup {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn run(self) {
        let Lookup {
            controller,
            query,
            generation,
            token,
            persist,
        } = self;

        if persist {
            controller.persist(generation, query.clone()).await;
        }

        if query.chars().count() < MIN_QUERY_CHARS {
            controller.apply(generation, |state| {
                state.forecast = None;
                state.is_loading = false;
            });
            return;
        }

        controller.apply(generation, |state| {
            state.is_loading = true;
            state.error_text = None;
            state.forecast = None;
        });
        let _loading = LoadingGuard {
            controller: &controller,
            generation,
        };

        match fetch(&controller, &query, generation, &token).await {
            Ok(forecast) => {
                tracing::info!(query = %query, days = forecast.len(), "forecast loaded");
                controller.apply(generation, |state| {
                    state.error_text = None;
                    state.forecast = Some(forecast);
                });
            }
            Err(err) if err.is_cancelled() => {
                tracing::debug!(query = %query, generation, "lookup superseded");
            }
            Err(err) => {
                tracing::warn!(query = %query, error = %err, "lookup failed");
                controller.apply(generation, |state| {
                    state.error_text = err.user_message().map(str::to_string);
                    state.forecast = None;
                    state.resolved_place_name.clear();
                });
            }
        }
    }
}

async fn fetch(
    controller: &SearchController,
    query: &str,
    generation: u64,
    token: &CancellationToken,
) -> Result<ForecastData, LookupError> {
    let source = &controller.inner.source;

    let place = source.geocode(query, token).await?;
    tracing::debug!(
        place = %place.place_name,
        country = place.country_code.as_deref().unwrap_or("-"),
        latitude = place.latitude,
        longitude = place.longitude,
        "location resolved"
    );

    let place_name = place.place_name.clone();
    if !controller.apply(generation, |state| state.resolved_place_name = place_name) {
        return Err(LookupError::Cancelled);
    }

    source.forecast(&place, token).await
}

/// Clears `is_loading` when the lookup ends, however it ends (including the
/// future being dropped), unless a newer lookup has taken over.
struct LoadingGuard<'a> {
    controller: &'a SearchController,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.controller
            .apply(self.generation, |state| state.is_loading = false);
    }
}
