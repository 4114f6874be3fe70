//! Episode repository — loads a user's episodes and publishes them as state
//!
//! `EpisodeRepository::fetch`:
//! - No user: clears the list without querying
//! - Otherwise queries the store, newest first, and normalizes every row
//! - A failed query clears the list, sets a sticky error and notifies once
//!
//! Every fetch takes a generation stamp when it is requested (`begin`), not
//! when its task happens to run. Only the most recently requested fetch may
//! publish; earlier ones that finish late are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use sweatsmart_core::{Episode, EpisodeStore, Notification, Notifier};
use tokio::sync::watch;
use uuid::Uuid;

pub const LOAD_ERROR: &str = "Failed to load episodes";

/// Snapshot published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeState {
    pub episodes: Vec<Episode>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for EpisodeState {
    fn default() -> Self {
        Self {
            episodes: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// No user; list cleared without a query.
    Cleared,
    Loaded(usize),
    Failed,
    /// A later fetch started before this one finished.
    Superseded,
}

/// A started fetch: the user it targets and its place in the request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    user_id: Option<Uuid>,
}

impl FetchTicket {
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

pub struct EpisodeRepository {
    store: Arc<dyn EpisodeStore>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<EpisodeState>,
    generation: AtomicU64,
    // Held while a ticket is issued, so `last_user` always names the newest ticket's user.
    last_user: Mutex<Option<Uuid>>,
}

impl EpisodeRepository {
    pub fn new(store: Arc<dyn EpisodeStore>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(EpisodeState::default());
        Self {
            store,
            notifier,
            state,
            generation: AtomicU64::new(0),
            last_user: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<EpisodeState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> EpisodeState {
        self.state.borrow().clone()
    }

    /// Record a request for `user_id` and make it the latest one.
    ///
    /// Call this at the point the request is made; the returned ticket can
    /// then be run later, on any task, with [`fetch_with_ticket`](Self::fetch_with_ticket).
    pub fn begin(&self, user_id: Option<Uuid>) -> FetchTicket {
        let mut last = self.last_user.lock().unwrap_or_else(PoisonError::into_inner);
        *last = user_id;
        self.issue(user_id)
    }

    /// Fetch again for whichever user was last requested.
    pub async fn refetch(&self) -> FetchOutcome {
        let ticket = {
            let last = self.last_user.lock().unwrap_or_else(PoisonError::into_inner);
            self.issue(*last)
        };
        self.fetch_with_ticket(ticket).await
    }

    pub async fn fetch(&self, user_id: Option<Uuid>) -> FetchOutcome {
        let ticket = self.begin(user_id);
        self.fetch_with_ticket(ticket).await
    }

    pub async fn fetch_with_ticket(&self, ticket: FetchTicket) -> FetchOutcome {
        let Some(user_id) = ticket.user_id else {
            if !self.publish(ticket, |s| {
                s.episodes.clear();
                s.loading = false;
                s.error = None;
            }) {
                return FetchOutcome::Superseded;
            }
            return FetchOutcome::Cleared;
        };

        if !self.publish(ticket, |s| {
            s.loading = true;
            s.error = None;
        }) {
            tracing::debug!(%user_id, "Skipping superseded episode fetch");
            return FetchOutcome::Superseded;
        }

        tracing::info!(%user_id, "Fetching episodes");
        let result = self.store.fetch_rows(user_id).await;

        match result {
            Ok(rows) => {
                let episodes: Vec<Episode> = rows.into_iter().map(Episode::from).collect();
                let count = episodes.len();

                if !self.publish(ticket, |s| {
                    s.episodes = episodes;
                    s.loading = false;
                }) {
                    tracing::debug!(%user_id, "Discarding superseded episode fetch");
                    return FetchOutcome::Superseded;
                }

                tracing::info!(%user_id, count, "Episodes loaded");
                FetchOutcome::Loaded(count)
            }
            Err(e) => {
                if !self.publish(ticket, |s| {
                    s.episodes.clear();
                    s.loading = false;
                    s.error = Some(LOAD_ERROR.to_string());
                }) {
                    tracing::debug!(%user_id, error = %e, "Discarding superseded failed fetch");
                    return FetchOutcome::Superseded;
                }

                tracing::error!(%user_id, error = %e, "Failed to fetch episodes");
                self.notifier.notify(Notification::destructive(
                    "Error loading episodes",
                    "Please refresh the page to try again.",
                ));
                FetchOutcome::Failed
            }
        }
    }

    // Caller holds the `last_user` lock.
    fn issue(&self, user_id: Option<Uuid>) -> FetchTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        FetchTicket {
            generation,
            user_id,
        }
    }

    // Apply `update` only if `ticket` is still the latest fetch.
    fn publish(&self, ticket: FetchTicket, update: impl FnOnce(&mut EpisodeState)) -> bool {
        self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != ticket.generation {
                return false;
            }
            update(s);
            true
        })
    }
}
