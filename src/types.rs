//! Resource payloads
//!
//! Every response is delivered as server-defined JSON. The selected
//! contributions and timeline arrays also have typed views, opt-in through
//! [`QueryState::decode`](crate::QueryState::decode).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Project detail (`projects/{id}/`)
pub type Project = Value;

/// Project search page (`projects/`)
pub type ProjectSearchResults = Value;

/// Summary card data (`projects/{id}/queries/summary/`)
pub type ProjectSummary = Value;

/// Latest task activity (`projects/{id}/activities/latest/`)
pub type ActivityList = Value;

/// Task grid as GeoJSON (`projects/{id}/tasks/`)
pub type TaskList = Value;

/// Priority area geometries (`projects/{id}/queries/priority-areas/`)
pub type PriorityAreaList = Value;

/// The `userContributions` array of `projects/{id}/contributions/`
pub type ContributionList = Value;

/// The `stats` array of `projects/{id}/contributions/queries/day/`
pub type ContributionTimeline = Value;

/// One contributor's totals on a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContribution {
    pub username: String,
    /// BEGINNER, INTERMEDIATE or ADVANCED
    pub mapping_level: String,
    pub picture_url: Option<String>,
    pub mapped: u32,
    pub validated: u32,
    pub total: u32,
    pub mapped_tasks: Vec<u64>,
    pub validated_tasks: Vec<u64>,
    #[serde(default)]
    pub name: Option<String>,
    /// ISO-8601 registration timestamp
    #[serde(default)]
    pub date_registered: Option<String>,
    /// Fields this struct does not name
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One day of the contribution timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyContributionStat {
    pub date: NaiveDate,
    pub mapped: u32,
    pub validated: u32,
    pub cumulative_mapped: u32,
    pub cumulative_validated: u32,
    pub total_tasks: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
