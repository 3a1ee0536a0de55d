//! Project resource fetchers
//!
//! One query per endpoint. Each builds its parameters, issues a single
//! cancellable GET through [`ApiClient`] and registers the result in the
//! [`QueryClient`] under the resource's [`CacheKey`].
//!
//! | key | path |
//! |---|---|
//! | `["projects", filters, action]` | `projects/` |
//! | `["project", id]` | `projects/{id}/` |
//! | `["project-summary", id]` | `projects/{id}/queries/summary/` |
//! | `["project-contributions", id]` | `projects/{id}/contributions/` |
//! | `["project-activities", id]` | `projects/{id}/activities/latest/` |
//! | `["project-tasks", id]` | `projects/{id}/tasks/` |
//! | `["project-priority-area", id]` | `projects/{id}/queries/priority-areas/` |
//! | `["project-timeline", id]` | `projects/{id}/contributions/queries/day/` |

use crate::client::ApiClient;
use crate::clock::{Clock, SystemClock};
use crate::context::RequestContext;
use crate::error::Result;
use crate::query::{CacheKey, ProjectId, Query, QueryClient, QueryOptions, QueryState, Select};
use crate::remap::{remap, BackendQuery, FilterState, ACTION_PARAM, PROJECT_FILTERS};
use crate::types::{
    ActivityList, ContributionList, ContributionTimeline, PriorityAreaList, Project,
    ProjectSearchResults, ProjectSummary, TaskList,
};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Polling period of the latest-activity feed
pub const ACTIVITIES_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

const CONTRIBUTIONS_SELECT: Select = Select::path(&["userContributions"]);
const TIMELINE_SELECT: Select = Select::path(&["stats"]);

/// Relative API path of the resource behind `key`
pub fn resource_path(key: &CacheKey) -> String {
    match key {
        CacheKey::Projects { .. } => "projects/".to_string(),
        CacheKey::Project(id) => format!("projects/{}/", id),
        CacheKey::ProjectSummary(id) => format!("projects/{}/queries/summary/", id),
        CacheKey::ProjectContributions(id) => format!("projects/{}/contributions/", id),
        CacheKey::ProjectActivities(id) => format!("projects/{}/activities/latest/", id),
        CacheKey::ProjectTasks(id) => format!("projects/{}/tasks/", id),
        CacheKey::ProjectPriorityAreas(id) => format!("projects/{}/queries/priority-areas/", id),
        CacheKey::ProjectTimeline(id) => format!("projects/{}/contributions/queries/day/", id),
    }
}

/// Query parameters of the project search.
///
/// `action` comes from the route (browsing `/explore` by mapping or
/// validation) and only applies when the filters do not set one.
pub fn projects_params(filters: &FilterState, action: Option<&str>, today: NaiveDate) -> BackendQuery {
    let mut params = remap(filters, &PROJECT_FILTERS, today);
    if !params.contains_key(ACTION_PARAM) {
        if let Some(action) = action.filter(|a| !a.is_empty()) {
            params.insert(ACTION_PARAM, action);
        }
    }
    params
}

/// Fetchers for every project resource
#[derive(Debug, Clone)]
pub struct ProjectQueries {
    api: ApiClient,
    client: QueryClient,
    clock: Arc<dyn Clock>,
}

impl ProjectQueries {
    pub fn new(api: ApiClient, client: QueryClient) -> Self {
        Self {
            api,
            client,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the calendar used for the stale filter cutoff
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn query_client(&self) -> &QueryClient {
        &self.client
    }

    /// Parameters the search request would carry today
    pub fn projects_params(&self, filters: &FilterState, action: Option<&str>) -> BackendQuery {
        projects_params(filters, action, self.clock.today())
    }

    // ==================== Query descriptors ====================

    /// Project search. Keeps the previous page visible while a new filter
    /// set loads.
    pub fn projects_query(
        &self,
        ctx: &RequestContext,
        filters: FilterState,
        action: Option<String>,
    ) -> Query {
        let key = CacheKey::Projects {
            filters: filters.clone(),
            action: action.clone(),
        };
        let api = self.api.clone();
        let ctx = ctx.clone();
        let clock = self.clock.clone();

        Query::new(key, move |cancel| {
            // Computed per request so the stale cutoff follows the calendar
            let params = projects_params(&filters, action.as_deref(), clock.today()).to_query_pairs();
            let api = api.clone();
            let ctx = ctx.clone();
            async move { api.get("projects/", &params, &ctx, &cancel).await }
        })
        .with_options(QueryOptions::default().keep_previous_data(true))
    }

    pub fn project_query(&self, ctx: &RequestContext, id: ProjectId) -> Query {
        self.detail_query(ctx, CacheKey::Project(id), QueryOptions::default())
    }

    pub fn project_summary_query(&self, ctx: &RequestContext, id: ProjectId) -> Query {
        self.detail_query(ctx, CacheKey::ProjectSummary(id), QueryOptions::default())
    }

    /// Contributors of a project, delivered as the `userContributions` array
    pub fn project_contributions_query(&self, ctx: &RequestContext, id: ProjectId) -> Query {
        self.project_contributions_query_with(ctx, id, |_| {})
    }

    /// Same as [`Self::project_contributions_query`] with caller overrides
    /// applied on top of the defaults (e.g. `enabled = false` to defer).
    pub fn project_contributions_query_with(
        &self,
        ctx: &RequestContext,
        id: ProjectId,
        configure: impl FnOnce(&mut QueryOptions),
    ) -> Query {
        let mut options = QueryOptions::default().select(CONTRIBUTIONS_SELECT);
        configure(&mut options);
        self.detail_query(ctx, CacheKey::ProjectContributions(id), options)
    }

    /// Latest activity, polled every minute even while unfocused and
    /// refetched on focus. Failures escalate.
    pub fn project_activities_query(&self, ctx: &RequestContext, id: ProjectId) -> Query {
        let options = QueryOptions::default()
            .refetch_interval(ACTIVITIES_REFETCH_INTERVAL)
            .refetch_interval_in_background(true)
            .refetch_on_window_focus(true)
            .use_error_boundary(true);
        self.detail_query(ctx, CacheKey::ProjectActivities(id), options)
    }

    /// Task grid. Failures escalate.
    pub fn project_tasks_query(&self, ctx: &RequestContext, id: ProjectId) -> Query {
        let options = QueryOptions::default().use_error_boundary(true);
        self.detail_query(ctx, CacheKey::ProjectTasks(id), options)
    }

    pub fn priority_areas_query(&self, ctx: &RequestContext, id: ProjectId) -> Query {
        self.detail_query(ctx, CacheKey::ProjectPriorityAreas(id), QueryOptions::default())
    }

    /// Daily contribution stats, delivered as the `stats` array
    pub fn project_timeline_query(&self, ctx: &RequestContext, id: ProjectId) -> Query {
        let options = QueryOptions::default().select(TIMELINE_SELECT);
        self.detail_query(ctx, CacheKey::ProjectTimeline(id), options)
    }

    fn detail_query(&self, ctx: &RequestContext, key: CacheKey, options: QueryOptions) -> Query {
        let path = resource_path(&key);
        let api = self.api.clone();
        let ctx = ctx.clone();

        Query::new(key, move |cancel| {
            let api = api.clone();
            let ctx = ctx.clone();
            let path = path.clone();
            async move { api.get(&path, &[], &ctx, &cancel).await }
        })
        .with_options(options)
    }

    // ==================== One-shot fetches ====================

    pub async fn projects(
        &self,
        ctx: &RequestContext,
        filters: FilterState,
        action: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<QueryState<ProjectSearchResults>> {
        let query = self.projects_query(ctx, filters, action);
        self.client.fetch(&query, cancel).await
    }

    pub async fn project(
        &self,
        ctx: &RequestContext,
        id: ProjectId,
        cancel: &CancellationToken,
    ) -> Result<QueryState<Project>> {
        self.client.fetch(&self.project_query(ctx, id), cancel).await
    }

    pub async fn project_summary(
        &self,
        ctx: &RequestContext,
        id: ProjectId,
        cancel: &CancellationToken,
    ) -> Result<QueryState<ProjectSummary>> {
        self.client
            .fetch(&self.project_summary_query(ctx, id), cancel)
            .await
    }

    pub async fn project_contributions(
        &self,
        ctx: &RequestContext,
        id: ProjectId,
        cancel: &CancellationToken,
    ) -> Result<QueryState<ContributionList>> {
        self.client
            .fetch(&self.project_contributions_query(ctx, id), cancel)
            .await
    }

    pub async fn project_activities(
        &self,
        ctx: &RequestContext,
        id: ProjectId,
        cancel: &CancellationToken,
    ) -> Result<QueryState<ActivityList>> {
        self.client
            .fetch(&self.project_activities_query(ctx, id), cancel)
            .await
    }

    pub async fn project_tasks(
        &self,
        ctx: &RequestContext,
        id: ProjectId,
        cancel: &CancellationToken,
    ) -> Result<QueryState<TaskList>> {
        self.client
            .fetch(&self.project_tasks_query(ctx, id), cancel)
            .await
    }

    pub async fn priority_areas(
        &self,
        ctx: &RequestContext,
        id: ProjectId,
        cancel: &CancellationToken,
    ) -> Result<QueryState<PriorityAreaList>> {
        self.client
            .fetch(&self.priority_areas_query(ctx, id), cancel)
            .await
    }

    pub async fn project_timeline(
        &self,
        ctx: &RequestContext,
        id: ProjectId,
        cancel: &CancellationToken,
    ) -> Result<QueryState<ContributionTimeline>> {
        self.client
            .fetch(&self.project_timeline_query(ctx, id), cancel)
            .await
    }
}
