//! Binds the episode repository to the signed-in identity.
//!
//! Each identity value, including the one present at bind time, starts a
//! fresh fetch. The fetch is registered with the repository as soon as the
//! change is seen and then runs on its own task, so completions may arrive
//! in any order without an older identity winning.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::subsystems::episodes::EpisodeRepository;

/// Runs until every identity sender is dropped.
pub fn bind_identity(
    repo: Arc<EpisodeRepository>,
    mut identity: watch::Receiver<Option<Uuid>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let user = *identity.borrow_and_update();
            tracing::debug!(user = ?user, "Identity changed, refreshing episodes");

            let ticket = repo.begin(user);
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.fetch_with_ticket(ticket).await;
            });

            if identity.changed().await.is_err() {
                tracing::debug!("Identity source closed");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row_for, FakeStore, RecordingNotifier};
    use serde_json::json;
    use std::time::Duration;

    fn bound_repo(store: FakeStore) -> (Arc<EpisodeRepository>, Arc<FakeStore>) {
        let store = Arc::new(store);
        let repo = Arc::new(EpisodeRepository::new(
            store.clone(),
            Arc::new(RecordingNotifier::default()),
        ));
        (repo, store)
    }

    #[tokio::test]
    async fn test_binding_follows_login_and_logout() {
        let user = Uuid::new_v4();
        let (repo, store) = bound_repo(
            FakeStore::default().with_rows(user, vec![row_for(user, 10, json!(["heat"]))]),
        );
        let mut state = repo.subscribe();

        let (identity_tx, identity_rx) = watch::channel(None);
        let binding = bind_identity(repo.clone(), identity_rx);

        state.wait_for(|s| !s.loading).await.unwrap();
        assert!(repo.snapshot().episodes.is_empty());
        assert_eq!(store.calls(), 0);

        identity_tx.send(Some(user)).unwrap();
        state
            .wait_for(|s| !s.loading && s.episodes.len() == 1)
            .await
            .unwrap();
        assert_eq!(store.calls(), 1);

        identity_tx.send(None).unwrap();
        state.wait_for(|s| s.episodes.is_empty()).await.unwrap();

        drop(identity_tx);
        binding.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rapid_login_logout_ends_signed_out() {
        let user = Uuid::new_v4();
        let (repo, _) = bound_repo(
            FakeStore::default().with_rows(user, vec![row_for(user, 10, json!(["heat"]))]),
        );

        let (identity_tx, identity_rx) = watch::channel(None);
        let binding = bind_identity(repo.clone(), identity_rx);

        for _ in 0..50 {
            identity_tx.send(Some(user)).unwrap();
            tokio::task::yield_now().await;
            identity_tx.send(None).unwrap();
        }

        // give every spawned fetch time to land
        tokio::time::sleep(Duration::from_millis(100)).await;

        let state = repo.snapshot();
        assert!(state.episodes.is_empty());
        assert!(!state.loading);
        assert!(state.error.is_none());

        drop(identity_tx);
        binding.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_logout_wins_over_slow_login_query() {
        let user = Uuid::new_v4();
        let store = FakeStore::default().with_rows(user, vec![row_for(user, 10, json!(["heat"]))]);
        let gate = store.gate(user);
        let (repo, store) = bound_repo(store);
        let mut state = repo.subscribe();

        let (identity_tx, identity_rx) = watch::channel(Some(user));
        let binding = bind_identity(repo.clone(), identity_rx);

        while store.calls() == 0 {
            tokio::task::yield_now().await;
        }
        identity_tx.send(None).unwrap();
        state
            .wait_for(|s| !s.loading && s.episodes.is_empty())
            .await
            .unwrap();

        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(repo.snapshot().episodes.is_empty());
        assert_eq!(store.calls(), 1);

        drop(identity_tx);
        binding.await.unwrap();
    }
}
