//! Live tests against the real GitHub API.
//!
//! These hit api.github.com and are ignored by default:
//!
//! ```sh
//! cargo test --test live -- --ignored
//! ```
//!
//! Set `GITHUB_TOKEN` to run authenticated and avoid the low anonymous
//! rate limit.

use surge::store::{AppStore, AuthToken};
use surge::{GitHubClient, QueryState, RepoService, SurgeError};

fn live_service() -> RepoService {
    let store = AppStore::new();
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        store.auth.set_token(AuthToken::bearer(token));
    }
    let client = GitHubClient::new(store.auth.watch()).expect("client should build");
    RepoService::new(client)
}

#[tokio::test]
#[ignore]
async fn fetch_real_repository_list() {
    let service = live_service();

    let state = service.repos("rust-lang").await;
    let repos = state.data().expect("expected a repository list").clone();
    assert!(!repos.is_empty(), "rust-lang should have public repositories");
    eprintln!("[live] fetched {} repositories", repos.len());

    for repo in repos.iter().take(3) {
        assert!(!repo.name.is_empty());
        assert!(repo.html_url.starts_with("https://"));
    }

    // Second resolution of the same key must be a cache hit.
    let again = service.repos("rust-lang").await;
    assert_eq!(again.data().map(|r| r.len()), Some(repos.len()));
}

#[tokio::test]
#[ignore]
async fn unknown_owner_is_an_http_error() {
    let service = live_service();

    let state = service
        .repos("this-owner-should-not-exist-60ab12cd34ef")
        .await;
    match state {
        QueryState::Error(SurgeError::Http { status }) => {
            eprintln!("[live] got expected HTTP error: {}", status);
            assert_eq!(status.as_u16(), 404);
        }
        QueryState::Error(SurgeError::RateLimited { reset_at }) => {
            eprintln!("[live] skipped, rate limited until {}", reset_at);
        }
        other => panic!("expected an HTTP error state, got {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn refetch_issues_a_second_request() {
    let service = live_service();

    let first = service.repos("rust-lang").await;
    assert!(first.is_success());

    let second = service.refetch_repos("rust-lang").await;
    assert!(second.is_success());
    eprintln!(
        "[live] refetch settled with {} repositories",
        second.data().map(|r| r.len()).unwrap_or(0)
    );
}
