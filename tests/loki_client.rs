//! LokiClient against an in-process HTTP stub

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use loki_exporter::client::{LogSource, LokiClient, QueryError, QueryWindow};
use loki_exporter::types::PageCursor;

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn window(limit: usize) -> QueryWindow {
    QueryWindow {
        start: Utc.timestamp_nanos(1_000),
        end: Utc.timestamp_nanos(9_000),
        cursor: Some(Utc.timestamp_nanos(2_500)),
        limit,
    }
}

#[tokio::test]
async fn test_query_parameters_and_ordering() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route(
            "/loki/api/v1/query_range",
            get(
                |State(seen): State<Seen>, Query(params): Query<HashMap<String, String>>| async move {
                    seen.lock().push(params);
                    r#"{"status":"success","data":{"resultType":"streams","result":[
                        {"stream":{"app":"a"},"values":[["3000","a-3000"],["5000","a-5000"]]},
                        {"stream":{"app":"b"},"values":[["4000","b-4000"]]}
                    ]}}"#
                },
            ),
        )
        .with_state(seen.clone());
    let base = serve(app).await;

    let client = LokiClient::new(&base, r#"{app=~"a|b"} |= "" "#, Duration::from_secs(5)).unwrap();
    let page = client.query(&window(3)).await.unwrap();

    let lines: Vec<&str> = page.entries.iter().map(|e| e.line.as_str()).collect();
    assert_eq!(lines, vec!["a-3000", "b-4000", "a-5000"]);
    assert_eq!(page.returned, 3);
    assert_eq!(page.cursor, PageCursor::At(Utc.timestamp_nanos(5_000)));

    let seen = seen.lock();
    let params = &seen[0];
    assert_eq!(params["query"], r#"{app=~"a|b"} |= "" "#);
    assert_eq!(params["start"], "2500");
    assert_eq!(params["end"], "9000");
    assert_eq!(params["limit"], "3");
    assert_eq!(params["direction"], "forward");
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let app = Router::new().route(
        "/loki/api/v1/query_range",
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, "too many outstanding requests") }),
    );
    let base = serve(app).await;

    let client = LokiClient::new(&base, "{}", Duration::from_secs(5)).unwrap();
    let err = client.query(&window(10)).await.unwrap_err();

    match err {
        QueryError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "too many outstanding requests");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unparseable_body_is_surfaced_as_entry() {
    let app = Router::new().route(
        "/loki/api/v1/query_range",
        get(|| async { "upstream proxy says hello" }),
    );
    let base = serve(app).await;

    let client = LokiClient::new(&base, "{}", Duration::from_secs(5)).unwrap();
    let page = client.query(&window(10)).await.unwrap();

    assert_eq!(page.cursor, PageCursor::Malformed);
    assert_eq!(
        page.entries[0].line,
        "[ERROR: Failed to parse Loki response] upstream proxy says hello"
    );
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let app = Router::new().route(
        "/loki/api/v1/query_range",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    );
    let base = serve(app).await;

    let client = LokiClient::new(&base, "{}", Duration::from_millis(200)).unwrap();
    let err = client.query(&window(10)).await.unwrap_err();

    assert!(matches!(err, QueryError::Timeout(d) if d == Duration::from_millis(200)));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = LokiClient::new(&format!("http://{}", addr), "{}", Duration::from_secs(2)).unwrap();
    let err = client.query(&window(10)).await.unwrap_err();

    assert!(matches!(err, QueryError::Http(_)));
}
