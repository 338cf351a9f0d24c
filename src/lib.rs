// Cached data-fetching layer for the GitHub REST API.
// An auth-aware dispatcher reads credentials from an observable store, a
// tagged query cache coalesces requests and serves fresh entries without
// refetching, and a guarded history models leave confirmation.

pub mod error;
pub mod github;
pub mod nav;
pub mod query;
pub mod service;
pub mod store;

pub use error::{Result, SurgeError};
pub use github::{GitHubClient, License, RateLimit, Repository};
pub use nav::{BlockerState, History, NavResult};
pub use query::{EntrySnapshot, QueryCache, QueryKey, QueryState, Tag};
pub use service::{REPOS_TAG, RepoService};
pub use store::{AppStore, AuthState, AuthToken, ConfigState};
