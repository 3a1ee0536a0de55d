//! Generic cached-fetch layer
//!
//! Every remote resource is described by a [`Query`]: a [`CacheKey`], a
//! fetch operation and [`QueryOptions`]. The [`QueryClient`] caches results
//! per key, deduplicates concurrent requests and threads cancellation
//! through; a [`QueryObserver`] keeps one query fresh in the background.

mod client;
mod key;
mod observer;
mod options;
mod state;

pub use client::{Query, QueryClient};
pub use key::{CacheKey, ProjectId};
pub use observer::QueryObserver;
pub use options::{QueryOptions, Select};
pub use state::{QueryState, QueryStatus};
