//! Observer behavior: polling, focus, key switching and escalation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tasking_client::{CacheKey, ClientError, FilterState, Query, QueryClient, QueryOptions};

fn counting_query(key: CacheKey, calls: Arc<AtomicUsize>, delay: Duration, body: Value) -> Query {
    Query::new(key, move |_cancel| {
        let calls = calls.clone();
        let body = body.clone();
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(delay).await;
            let mut body = body;
            body["fetch"] = json!(n);
            Ok(body)
        }
    })
}

fn page_key(page: i64) -> CacheKey {
    CacheKey::Projects {
        filters: FilterState::new().with("page", page),
        action: None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_polls_on_interval() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let query = counting_query(
        CacheKey::ProjectActivities(1),
        calls.clone(),
        Duration::from_millis(5),
        json!({"activity": []}),
    )
    .with_options(QueryOptions::default().refetch_interval(Duration::from_millis(50)));

    let mut observer = client.observe(query);
    for expected in 1..=3 {
        let state = observer.settled().await.unwrap();
        assert!(state.is_success());
        assert_eq!(state.data.unwrap()["fetch"], json!(expected));
    }
    assert!(calls.load(Ordering::SeqCst) >= 3);
}

#[tokio::test(start_paused = true)]
async fn test_unfocused_polling_needs_background_flag() {
    let client = QueryClient::new();
    client.set_focused(false);

    let foreground_calls = Arc::new(AtomicUsize::new(0));
    let foreground = counting_query(
        CacheKey::ProjectActivities(1),
        foreground_calls.clone(),
        Duration::from_millis(1),
        json!({}),
    )
    .with_options(QueryOptions::default().refetch_interval(Duration::from_millis(50)));

    let background_calls = Arc::new(AtomicUsize::new(0));
    let background = counting_query(
        CacheKey::ProjectActivities(2),
        background_calls.clone(),
        Duration::from_millis(1),
        json!({}),
    )
    .with_options(
        QueryOptions::default()
            .refetch_interval(Duration::from_millis(50))
            .refetch_interval_in_background(true),
    );

    let _foreground = client.observe(foreground);
    let _background = client.observe(background);
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Initial fetch only
    assert_eq!(foreground_calls.load(Ordering::SeqCst), 1);
    assert!(background_calls.load(Ordering::SeqCst) >= 5);
}

#[tokio::test(start_paused = true)]
async fn test_refetch_on_regained_focus() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let query = counting_query(
        CacheKey::ProjectActivities(3),
        calls.clone(),
        Duration::from_millis(1),
        json!({}),
    )
    .with_options(QueryOptions::default().refetch_on_window_focus(true));

    let mut observer = client.observe(query);
    observer.settled().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    client.set_focused(false);
    client.set_focused(true);
    let state = observer.settled().await.unwrap();
    assert_eq!(state.data.unwrap()["fetch"], json!(2));
}

#[tokio::test(start_paused = true)]
async fn test_focus_ignored_without_flag() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let query = counting_query(
        CacheKey::Project(3),
        calls.clone(),
        Duration::from_millis(1),
        json!({}),
    );

    let mut observer = client.observe(query);
    observer.settled().await.unwrap();

    client.set_focused(false);
    client.set_focused(true);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_keeps_previous_data_while_next_key_loads() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let options = QueryOptions::default().keep_previous_data(true);

    let first = counting_query(page_key(1), calls.clone(), Duration::ZERO, json!({"page": 1}))
        .with_options(options.clone());
    let mut observer = client.observe(first);
    let state = observer.settled().await.unwrap();
    assert_eq!(state.data.as_ref().unwrap()["page"], json!(1));

    let second = counting_query(
        page_key(2),
        calls.clone(),
        Duration::from_millis(100),
        json!({"page": 2}),
    )
    .with_options(options);
    observer.set_query(second);

    let loading = observer.changed().await.unwrap();
    assert!(loading.is_fetching);
    assert!(loading.is_previous_data);
    assert!(loading.is_success());
    assert_eq!(loading.data.unwrap()["page"], json!(1));
    assert_eq!(observer.key(), page_key(2));

    let loaded = observer.settled().await.unwrap();
    assert!(!loaded.is_previous_data);
    assert_eq!(loaded.data.unwrap()["page"], json!(2));
}

#[tokio::test]
async fn test_switch_without_keep_previous_starts_empty() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let first = counting_query(CacheKey::Project(1), calls.clone(), Duration::ZERO, json!({}));
    let mut observer = client.observe(first);
    observer.settled().await.unwrap();

    let second = counting_query(
        CacheKey::Project(2),
        calls.clone(),
        Duration::from_millis(50),
        json!({}),
    );
    observer.set_query(second);

    let loading = observer.changed().await.unwrap();
    assert!(loading.is_loading());
    assert!(loading.data.is_none());
    assert!(!loading.is_previous_data);
}

#[tokio::test]
async fn test_switch_aborts_superseded_request() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let slow = counting_query(
        CacheKey::ProjectActivities(10),
        calls.clone(),
        Duration::from_secs(30),
        json!({"activity": []}),
    );
    let mut observer = client.observe(slow);
    let state = observer.changed().await.unwrap();
    assert!(state.is_fetching);

    let fast = counting_query(
        CacheKey::ProjectActivities(11),
        calls.clone(),
        Duration::ZERO,
        json!({"activity": []}),
    );
    observer.set_query(fast);

    let state = observer.settled().await.unwrap();
    assert!(state.is_success());
    assert_eq!(observer.key(), CacheKey::ProjectActivities(11));
    assert!(!client.is_fetching(&CacheKey::ProjectActivities(10)));
    assert!(client
        .get_query_data(&CacheKey::ProjectActivities(10))
        .is_none());
}

#[tokio::test]
async fn test_error_boundary_escalates_from_observer() {
    let client = QueryClient::new();
    let query = Query::new(CacheKey::ProjectTasks(4), |_| async {
        Err(ClientError::Status {
            status: 503,
            message: "unavailable".into(),
        })
    })
    .with_options(QueryOptions::default().use_error_boundary(true));

    let mut observer = client.observe(query);
    match observer.settled().await {
        Err(ClientError::Escalated { key, source }) => {
            assert_eq!(key, r#"["project-tasks",4]"#);
            assert_eq!(source.status(), Some(503));
        }
        other => panic!("expected escalation, got {other:?}"),
    }
    // Plain state access still shows the failure inline
    assert!(observer.state().is_error());
}

#[tokio::test]
async fn test_inline_error_without_boundary() {
    let client = QueryClient::new();
    let query = Query::new(CacheKey::ProjectSummary(4), |_| async {
        Err(ClientError::NotFound("projects/4/queries/summary/".into()))
    });

    let mut observer = client.observe(query);
    let state = observer.settled().await.unwrap();
    assert!(state.is_error());
    assert_eq!(state.error.unwrap().status(), Some(404));
}

#[tokio::test(start_paused = true)]
async fn test_manual_refetch() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let query = counting_query(
        CacheKey::ProjectTimeline(5),
        calls.clone(),
        Duration::from_millis(1),
        json!({"stats": []}),
    );

    let mut observer = client.observe(query);
    observer.settled().await.unwrap();
    observer.refetch();
    let state = observer.settled().await.unwrap();
    assert_eq!(state.data.unwrap()["fetch"], json!(2));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_query_waits_for_enable() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let disabled = counting_query(
        CacheKey::ProjectContributions(6),
        calls.clone(),
        Duration::from_millis(1),
        json!({"userContributions": []}),
    )
    .with_options(QueryOptions::default().enabled(false));

    let mut observer = client.observe(disabled.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(observer.state().is_loading());

    observer.set_query(disabled.with_options(QueryOptions::default()));
    let state = observer.settled().await.unwrap();
    assert!(state.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_polling() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let query = counting_query(
        CacheKey::ProjectActivities(7),
        calls.clone(),
        Duration::from_millis(1),
        json!({}),
    )
    .with_options(
        QueryOptions::default()
            .refetch_interval(Duration::from_millis(50))
            .refetch_interval_in_background(true),
    );

    let mut observer = client.observe(query);
    observer.settled().await.unwrap();
    drop(observer);

    let after_drop = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_drop);
}
