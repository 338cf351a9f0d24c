// Query layer module.
// Tagged caching of request results with per-key observation.

pub mod cache;
pub mod state;

pub use cache::QueryCache;
pub use state::{EntrySnapshot, QueryKey, QueryState, Tag};
