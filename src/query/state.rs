// Query identity and per-entry lifecycle.
// Keys address cache entries, tags group them for invalidation, and
// QueryState is the four-phase lifecycle consumers observe.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::SurgeError;

/// Identity of one logical request. Callers that fetch the same resource
/// must derive the same key for caching to take effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QueryKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for QueryKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Invalidation label. Entries sharing a tag are marked stale together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a cache entry as observed by consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QueryState<T> {
    /// No request has been made for this key yet.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request finished with a decoded value.
    Success(T),
    /// The last request failed; the error is kept for display.
    Error(SurgeError),
}

impl<T> QueryState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, QueryState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryState::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryState::Error(_))
    }

    /// Whether a request has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, QueryState::Success(_) | QueryState::Error(_))
    }

    /// The decoded value, if the last request succeeded.
    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    /// The failure, if the last request errored.
    pub fn error(&self) -> Option<&SurgeError> {
        match self {
            QueryState::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Point-in-time view of one cache entry.
#[derive(Debug, Clone)]
pub struct EntrySnapshot<T> {
    pub key: QueryKey,
    pub state: QueryState<T>,
    pub tags: HashSet<Tag>,
    /// A stale entry keeps serving its state but is no longer a cache hit.
    pub stale: bool,
    pub updated_at: DateTime<Utc>,
}
