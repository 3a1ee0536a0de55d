//! Tasking Manager data-access client
//!
//! Fetches and caches the project resources the Tasking Manager UI displays:
//! the project search, project details and summary, contributions, latest
//! activity, tasks, priority areas and the contribution timeline.
//!
//! # Example
//!
//! ```rust,no_run
//! use tasking_client::{
//!     ApiClient, ClientConfig, FilterState, ProjectQueries, QueryClient, RequestContext,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiClient::new(ClientConfig::from_env())?;
//! let queries = ProjectQueries::new(api, QueryClient::new());
//! let ctx = RequestContext::anonymous().with_locale("en");
//!
//! // Stale projects of team 5, browsing by mapping
//! let filters = FilterState::new().with("team", 5).with("stale", true);
//! let page = queries
//!     .projects(&ctx, filters, Some("mapping".into()), &CancellationToken::new())
//!     .await?;
//!
//! // Contributors of project 42
//! let contributors = queries
//!     .project_contributions(&ctx, 42, &CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod projects;
pub mod query;
pub mod remap;
pub mod types;

pub use client::ApiClient;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ClientConfig;
pub use context::RequestContext;
pub use error::{ClientError, Result};
pub use projects::{ProjectQueries, ACTIVITIES_REFETCH_INTERVAL};
pub use query::{
    CacheKey, ProjectId, Query, QueryClient, QueryObserver, QueryOptions, QueryState,
    QueryStatus, Select,
};
pub use remap::{remap, BackendQuery, FilterState, FilterValue, TranslationTable, PROJECT_FILTERS};
pub use types::*;
