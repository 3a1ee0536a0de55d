//! Static API payloads shared by the integration tests

#![allow(dead_code)]

use chrono::{Months, Utc};
use serde_json::{json, Value};
use tasking_client::{ApiClient, ClientConfig, ProjectQueries, QueryClient};
use wiremock::MockServer;

/// Timestamp `months` months ago, ISO-8601
pub fn past_months(months: u32) -> String {
    let now = Utc::now();
    now.checked_sub_months(Months::new(months))
        .unwrap_or(now)
        .to_rfc3339()
}

/// Queries pointed at a mock server's `/api/v2/` root
pub fn queries_for(server: &MockServer) -> ProjectQueries {
    let api = ApiClient::new(ClientConfig {
        base_url: format!("{}/api/v2/", server.uri()),
        timeout_secs: 10,
        ..Default::default()
    })
    .expect("valid test config");
    ProjectQueries::new(api, QueryClient::new())
}

/// `projects/{id}/contributions/` with five contributors
pub fn project_contributions() -> Value {
    json!({
        "userContributions": [
            {
                "username": "test",
                "mappingLevel": "ADVANCED",
                "pictureUrl": null,
                "mapped": 3,
                "validated": 2,
                "total": 5,
                "mappedTasks": [1, 3],
                "validatedTasks": [5, 7],
                "name": "Test",
                "dateRegistered": past_months(0)
            },
            {
                "username": "test_1",
                "mappingLevel": "BEGINNER",
                "pictureUrl": null,
                "mapped": 5,
                "validated": 2,
                "total": 7,
                "mappedTasks": [5, 36, 99, 115, 142],
                "validatedTasks": [2, 3],
                "name": "User to test",
                "dateRegistered": past_months(2)
            },
            {
                "username": "user_3",
                "mappingLevel": "INTERMEDIATE",
                "pictureUrl": null,
                "mapped": 4,
                "validated": 0,
                "total": 4,
                "mappedTasks": [2, 69, 122, 56],
                "validatedTasks": [6],
                "name": "User 3",
                "dateRegistered": past_months(4)
            },
            {
                "username": "user_4",
                "mappingLevel": "INTERMEDIATE",
                "pictureUrl": null,
                "mapped": 0,
                "validated": 1,
                "total": 1,
                "mappedTasks": [],
                "validatedTasks": [99],
                "name": "User 4",
                "dateRegistered": past_months(7)
            },
            {
                "username": "user_5",
                "mappingLevel": "BEGINNER",
                "pictureUrl": null,
                "mapped": 1,
                "validated": 0,
                "total": 1,
                "mappedTasks": [7],
                "validatedTasks": [],
                "name": "User 5",
                "dateRegistered": past_months(15)
            }
        ]
    })
}

/// `projects/{id}/contributions/queries/day/` with three days
pub fn project_contributions_by_day() -> Value {
    json!({
        "stats": [
            {
                "date": "2020-05-19",
                "mapped": 1,
                "validated": 0,
                "cumulative_mapped": 1,
                "cumulative_validated": 0,
                "total_tasks": 16
            },
            {
                "date": "2020-06-01",
                "mapped": 1,
                "validated": 1,
                "cumulative_mapped": 2,
                "cumulative_validated": 1,
                "total_tasks": 16
            },
            {
                "date": "2020-06-26",
                "mapped": 3,
                "validated": 2,
                "cumulative_mapped": 5,
                "cumulative_validated": 3,
                "total_tasks": 16
            }
        ]
    })
}

/// `projects/{id}/`
pub fn project(id: u64) -> Value {
    json!({
        "projectId": id,
        "status": "PUBLISHED",
        "projectPriority": "HIGH",
        "difficulty": "EASY",
        "mappingTypes": ["BUILDINGS", "ROADS"],
        "percentMapped": 40,
        "percentValidated": 10,
        "projectInfo": {
            "locale": "en",
            "name": "Flood response mapping",
            "shortDescription": "Map buildings in the flood area"
        }
    })
}

/// `projects/{id}/queries/summary/`
pub fn project_summary(id: u64) -> Value {
    json!({
        "projectId": id,
        "name": "Flood response mapping",
        "organisationName": "HOT",
        "percentMapped": 40,
        "percentValidated": 10,
        "status": "PUBLISHED"
    })
}

/// `projects/{id}/activities/latest/`
pub fn activities() -> Value {
    json!({
        "activity": [
            {
                "taskId": 1,
                "taskStatus": "MAPPED",
                "actionDate": "2020-06-26T12:00:00",
                "actionBy": "test"
            },
            {
                "taskId": 2,
                "taskStatus": "LOCKED_FOR_MAPPING",
                "actionDate": "2020-06-26T12:05:00",
                "actionBy": "user_3"
            }
        ]
    })
}

/// `projects/{id}/tasks/`
pub fn tasks() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]]]
                },
                "properties": {"taskId": 1, "taskStatus": "MAPPED"}
            }
        ]
    })
}

/// `projects/{id}/queries/priority-areas/`
pub fn priority_areas() -> Value {
    json!([
        {
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [0.0, 0.5], [0.5, 0.5], [0.0, 0.0]]]
        }
    ])
}

/// One page of `projects/`
pub fn project_search_page(page: u64) -> Value {
    json!({
        "mapResults": {"type": "FeatureCollection", "features": []},
        "results": [
            {"projectId": page * 10 + 1, "name": "Flood response mapping"},
            {"projectId": page * 10 + 2, "name": "School mapping"}
        ],
        "pagination": {"hasNext": true, "hasPrev": page > 1, "page": page, "pages": 5, "perPage": 2, "total": 10}
    })
}
