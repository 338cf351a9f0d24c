// GitHub API endpoint functions.
// Provides typed methods for fetching data from the GitHub REST API.

use crate::error::Result;

use super::client::GitHubClient;
use super::types::Repository;

impl GitHubClient {
    /// List public repositories for a user or organization.
    ///
    /// Decoding is strict: a 2xx body that does not match the repository
    /// shape is a decode failure, never an empty list.
    pub async fn user_repos(&self, owner: &str) -> Result<Vec<Repository>> {
        let response = self.get(&format!("/users/{}/repos", owner)).await?;
        let body = response.text().await?;
        let repos: Vec<Repository> = serde_json::from_str(&body)?;

        tracing::debug!(owner = %owner, count = repos.len(), "decoded repository list");
        Ok(repos)
    }
}
