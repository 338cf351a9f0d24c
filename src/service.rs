// Repository query service.
// Couples the GitHub client to a tagged query cache and owns the repos tag.

use tokio::sync::watch;

use crate::github::{GitHubClient, Repository};
use crate::query::{EntrySnapshot, QueryCache, QueryKey, QueryState, Tag};

/// Invalidation tag attached to every cached repository list.
pub const REPOS_TAG: &str = "repos";

/// Cached access to repository lists, keyed by owner login.
pub struct RepoService {
    client: GitHubClient,
    cache: QueryCache<Vec<Repository>>,
}

impl RepoService {
    pub fn new(client: GitHubClient) -> Self {
        Self {
            client,
            cache: QueryCache::new(),
        }
    }

    /// Repositories for `owner`, served from cache while the entry is fresh.
    pub async fn repos(&self, owner: &str) -> QueryState<Vec<Repository>> {
        let key = QueryKey::from(owner);
        self.cache
            .fetch(&key, &[Tag::new(REPOS_TAG)], || self.client.user_repos(owner))
            .await
    }

    /// Request `owner`'s list again even when a fresh entry exists.
    pub async fn refetch_repos(&self, owner: &str) -> QueryState<Vec<Repository>> {
        let key = QueryKey::from(owner);
        self.cache
            .refetch(&key, &[Tag::new(REPOS_TAG)], || self.client.user_repos(owner))
            .await
    }

    /// Mark every cached repository list stale. Returns how many entries
    /// were marked.
    pub fn invalidate_repos(&self) -> usize {
        self.cache.invalidate(&[Tag::new(REPOS_TAG)])
    }

    /// Observe state transitions for `owner`'s list.
    pub fn subscribe(&self, owner: &str) -> watch::Receiver<QueryState<Vec<Repository>>> {
        self.cache.subscribe(&QueryKey::from(owner))
    }

    /// Point-in-time view of `owner`'s cache entry.
    pub fn snapshot(&self, owner: &str) -> Option<EntrySnapshot<Vec<Repository>>> {
        self.cache.snapshot(&QueryKey::from(owner))
    }

    /// Connectivity came back, so everything cached is suspect: mark it all
    /// stale and re-run the queries that still have live subscribers.
    pub async fn handle_reconnect(&self) {
        self.cache.mark_all_stale();
        let keys = self.cache.subscribed_keys();
        tracing::info!(queries = keys.len(), "reconnected, refreshing subscribed queries");
        for key in keys {
            let state = self.repos(key.as_str()).await;
            if let Some(err) = state.error() {
                tracing::warn!(key = %key, error = %err, "refresh after reconnect failed");
            }
        }
    }

    /// The underlying cache, for state inspection.
    pub fn cache(&self) -> &QueryCache<Vec<Repository>> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::error::SurgeError;
    use crate::store::AppStore;

    use super::*;

    // Nothing listens on port 9 (discard), so requests fail fast without
    // leaving the machine.
    fn offline_service(store: &AppStore) -> RepoService {
        let client = GitHubClient::new(store.auth.watch())
            .unwrap()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(500));
        RepoService::new(client)
    }

    #[tokio::test]
    async fn test_unreachable_host_surfaces_a_network_error() {
        let store = AppStore::new();
        let service = offline_service(&store);

        let state = service.repos("acme").await;
        assert!(matches!(state, QueryState::Error(SurgeError::Network(_))));

        let snapshot = service.snapshot("acme").unwrap();
        assert!(snapshot.state.is_error());
        assert!(snapshot.tags.contains(&Tag::new(REPOS_TAG)));
    }

    #[tokio::test]
    async fn test_invalidate_repos_marks_every_owner() {
        let store = AppStore::new();
        let service = offline_service(&store);

        service.repos("acme").await;
        service.repos("globex").await;

        assert_eq!(service.invalidate_repos(), 2);
        assert!(service.snapshot("acme").unwrap().stale);
        assert!(service.snapshot("globex").unwrap().stale);
    }

    #[tokio::test]
    async fn test_subscribe_creates_an_idle_entry() {
        let store = AppStore::new();
        let service = offline_service(&store);

        let rx = service.subscribe("acme");
        assert!(rx.borrow().is_idle());
        assert_eq!(service.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_refreshes_only_subscribed_keys() {
        let store = AppStore::new();
        let service = offline_service(&store);

        service.repos("acme").await;
        service.repos("globex").await;
        let _rx = service.subscribe("acme");

        store.config.set_online(false);
        store.config.set_online(true);
        service.handle_reconnect().await;

        // The subscribed key was re-run (and unmarked in the process); the
        // other one only carries the stale mark.
        assert!(!service.snapshot("acme").unwrap().stale);
        assert!(service.snapshot("globex").unwrap().stale);
    }
}
