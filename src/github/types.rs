// GitHub API response types.
// Defines structs for deserializing GitHub REST API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GitHub repository, limited to the fields consumers render.
///
/// Nullable API fields stay `Option`; a body missing a required field is a
/// decode failure rather than a silently defaulted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub pushed_at: Option<DateTime<Utc>>,
    pub license: Option<License>,
    pub private: bool,
}

impl Repository {
    /// Human-friendly name with dashes spelled as spaces.
    pub fn display_name(&self) -> String {
        self.name.replace('-', " ")
    }
}

/// Repository license metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub spdx_id: Option<String>,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}
