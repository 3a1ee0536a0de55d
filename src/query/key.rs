//! Cache key definitions
//!
//! One variant per remote resource. Two fetches share cached data and an
//! in-flight request exactly when their keys are equal.

use crate::remap::FilterState;
use serde_json::{json, Value};
use std::fmt;

/// Numeric project identifier
pub type ProjectId = u64;

/// Cache key for one resource fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Project search page for a filter set and optional action
    Projects {
        filters: FilterState,
        action: Option<String>,
    },
    Project(ProjectId),
    ProjectSummary(ProjectId),
    ProjectContributions(ProjectId),
    ProjectActivities(ProjectId),
    ProjectTasks(ProjectId),
    ProjectPriorityAreas(ProjectId),
    ProjectTimeline(ProjectId),
}

impl CacheKey {
    /// Resource name, the first element of the key tuple
    pub fn resource(&self) -> &'static str {
        match self {
            CacheKey::Projects { .. } => "projects",
            CacheKey::Project(_) => "project",
            CacheKey::ProjectSummary(_) => "project-summary",
            CacheKey::ProjectContributions(_) => "project-contributions",
            CacheKey::ProjectActivities(_) => "project-activities",
            CacheKey::ProjectTasks(_) => "project-tasks",
            CacheKey::ProjectPriorityAreas(_) => "project-priority-area",
            CacheKey::ProjectTimeline(_) => "project-timeline",
        }
    }

    /// Project this key belongs to; `None` for the search list
    pub fn project_id(&self) -> Option<ProjectId> {
        match self {
            CacheKey::Projects { .. } => None,
            CacheKey::Project(id)
            | CacheKey::ProjectSummary(id)
            | CacheKey::ProjectContributions(id)
            | CacheKey::ProjectActivities(id)
            | CacheKey::ProjectTasks(id)
            | CacheKey::ProjectPriorityAreas(id)
            | CacheKey::ProjectTimeline(id) => Some(*id),
        }
    }

    /// Key as a JSON tuple, e.g. `["project", 42]`
    pub fn to_json(&self) -> Value {
        match self {
            CacheKey::Projects { filters, action } => json!([self.resource(), filters, action]),
            _ => json!([self.resource(), self.project_id()]),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_key_display() {
        assert_eq!(CacheKey::Project(42).to_string(), r#"["project",42]"#);
        assert_eq!(
            CacheKey::ProjectPriorityAreas(7).to_string(),
            r#"["project-priority-area",7]"#
        );
    }

    #[test]
    fn test_projects_key_display() {
        let key = CacheKey::Projects {
            filters: FilterState::new().with("page", 2),
            action: Some("mapping".into()),
        };
        assert_eq!(key.to_string(), r#"["projects",{"page":2},"mapping"]"#);
        assert_eq!(key.project_id(), None);
    }

    #[test]
    fn test_keys_differ_by_resource() {
        assert_ne!(CacheKey::Project(1), CacheKey::ProjectTasks(1));
        assert_ne!(CacheKey::ProjectTasks(1), CacheKey::ProjectTasks(2));
    }

    #[test]
    fn test_projects_key_equality_ignores_insertion_order() {
        let a = CacheKey::Projects {
            filters: FilterState::new().with("team", 1).with("text", "flood"),
            action: None,
        };
        let b = CacheKey::Projects {
            filters: FilterState::new().with("text", "flood").with("team", 1),
            action: None,
        };
        assert_eq!(a, b);

        let c = CacheKey::Projects {
            filters: FilterState::new().with("text", "flood").with("team", 1),
            action: Some("validation".into()),
        };
        assert_ne!(a, c);
    }
}
