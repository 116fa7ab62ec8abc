//! Integration tests for paginated searches using mocked HTTP responses
//!
//! These tests verify the query flow without making real API calls.
//! They use wiremock to simulate Web of Science responses.

mod common;

use common::{
    SEARCH_PATH, TEST_API_KEY, count_only_page, create_mock_client, first_page, later_page,
    query_path,
};
use indicatif::ProgressBar;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wos_client_rs::{OutputFormat, Record, TimeSpan, WosError};

fn uids(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| match record {
            Record::Ris(ris) => ris.uid.clone(),
            Record::Json(value) => value["UID"].as_str().unwrap_or_default().to_string(),
            Record::Xml(_) => panic!("unexpected XML record"),
        })
        .collect()
}

/// Test that a search larger than one page is fetched through the query id
#[tokio::test]
async fn test_query_paginates_through_query_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("usrQuery", "TS=water"))
        .and(query_param("firstRecord", "1"))
        .and(query_param("count", "100"))
        .and(header("X-ApiKey", TEST_API_KEY))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page(7, 250, 100)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(query_path("7")))
        .and(query_param("firstRecord", "101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(later_page(101, 100)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(query_path("7")))
        .and(query_param("firstRecord", "201"))
        .respond_with(ResponseTemplate::new(200).set_body_json(later_page(201, 50)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Json);
    let records = client
        .query("TS=water", None, &[])
        .await
        .expect("Paginated query should succeed");

    assert_eq!(records.len(), 250);

    let expected: Vec<String> = (1..=250).map(|i| format!("WOS:{i:015}")).collect();
    assert_eq!(uids(&records), expected);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].url.path(), SEARCH_PATH);
    assert!(requests[1..].iter().all(|r| r.url.path() == query_path("7")));
}

/// Test that a search fitting in one page needs a single request
#[tokio::test]
async fn test_query_single_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page(3, 40, 40)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(query_path("3")))
        .respond_with(ResponseTemplate::new(200).set_body_json(later_page(41, 1)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Ris);
    let records = client.query("TS=water", None, &[]).await.unwrap();

    assert_eq!(records.len(), 40);
    let first = records[0].as_ris().expect("RIS format yields RIS records");
    assert_eq!(first.title, "Record 1");
    assert_eq!(first.authors, vec!["Author, N1"]);
    assert_eq!(first.document_type, "Journal Article");
}

/// Test that the total exactly equal to the page size needs a single request
#[tokio::test]
async fn test_query_total_equal_to_page_size() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page(4, 100, 100)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Json);
    let records = client.query("TS=water", None, &[]).await.unwrap();

    assert_eq!(records.len(), 100);
}

/// Test that overrides and the time span reach every request
#[tokio::test]
async fn test_query_overrides_and_time_span() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("count", "2"))
        .and(query_param("databaseId", "WOK"))
        .and(query_param("publishTimeSpan", "2018-06-01+2018-12-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page(9, 3, 2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(query_path("9")))
        .and(query_param("firstRecord", "3"))
        .and(query_param("count", "2"))
        .and(query_param("databaseId", "WOK"))
        .respond_with(ResponseTemplate::new(200).set_body_json(later_page(3, 1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Json);
    let span = TimeSpan::new("2018-06-01", "2018-12-31").unwrap();
    let records = client
        .query(
            "TS=water",
            Some(&span),
            &[("count", "2"), ("databaseId", "WOK")],
        )
        .await
        .unwrap();

    assert_eq!(
        uids(&records),
        vec!["WOS:000000000000001", "WOS:000000000000002", "WOS:000000000000003"]
    );
}

/// Test that records_found sends a zero page size and reads the total
#[tokio::test]
async fn test_records_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("count", "0"))
        .and(query_param("usrQuery", "TS=catchment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(count_only_page(11, 1234)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Ris);
    let found = client
        .records_found("TS=catchment", None, &[])
        .await
        .expect("Count query should succeed");

    assert_eq!(found, 1234);
}

/// Test that a rejected search fails without partial results
#[tokio::test]
async fn test_query_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("x-req-reqpersec-remaining", "1")
                .set_body_string("Invalid query syntax"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Json);
    let result = client.query("TS=(", None, &[]).await;

    match result {
        Err(WosError::QueryError {
            status,
            headers,
            body,
            params,
        }) => {
            assert_eq!(status, 400);
            assert_eq!(body, "Invalid query syntax");
            assert!(
                headers
                    .iter()
                    .any(|(name, value)| name == "x-req-reqpersec-remaining" && value == "1")
            );
            assert!(params.contains(&("usrQuery".to_string(), "TS=(".to_string())));
        }
        other => panic!("Expected QueryError, got {other:?}"),
    }
}

/// Test that a failing later page aborts the whole search
#[tokio::test]
async fn test_query_error_on_later_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page(5, 150, 100)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(query_path("5")))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Json);
    let err = client.query("TS=water", None, &[]).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
}

/// Test that a malformed page is skipped while pagination continues
#[tokio::test]
async fn test_query_skips_malformed_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page(6, 250, 100)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(query_path("6")))
        .and(query_param("firstRecord", "101"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"Unexpected": true})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(query_path("6")))
        .and(query_param("firstRecord", "201"))
        .respond_with(ResponseTemplate::new(200).set_body_json(later_page(201, 50)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Ris);
    let records = client.query("TS=water", None, &[]).await.unwrap();

    assert_eq!(records.len(), 150);
    assert_eq!(records[100].as_ris().unwrap().uid, "WOS:000000000000201");
}

/// Test that a first response without result metadata is an error
#[tokio::test]
async fn test_query_missing_result_info() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(later_page(1, 5)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Json);
    let result = client.query("TS=water", None, &[]).await;

    assert!(matches!(result, Err(WosError::MalformedResponse { .. })));
}

/// Test that an offset at the top of the integer range ends paging after one request
#[tokio::test]
async fn test_query_offset_at_integer_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page(13, 5, 5)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server, OutputFormat::Json);
    let first_record = (usize::MAX - 10).to_string();
    let records = client
        .query("TS=water", None, &[("firstRecord", first_record.as_str())])
        .await
        .expect("Query should stop without paging");

    assert_eq!(records.len(), 5);
}

/// Test that the progress bar counts every request of a paginated search
#[tokio::test]
async fn test_query_progress() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page(14, 250, 100)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(query_path("14")))
        .respond_with(ResponseTemplate::new(200).set_body_json(later_page(101, 100)))
        .mount(&mock_server)
        .await;

    let progress = ProgressBar::hidden();
    let client = create_mock_client(&mock_server, OutputFormat::Json)
        .with_progress(progress.clone());
    client.query("TS=water", None, &[]).await.unwrap();

    assert_eq!(progress.length(), Some(3));
    assert_eq!(progress.position(), 3);

    // starting further in leaves fewer pages
    let progress = ProgressBar::hidden();
    let client = create_mock_client(&mock_server, OutputFormat::Json)
        .with_progress(progress.clone());
    client
        .query("TS=water", None, &[("firstRecord", "101")])
        .await
        .unwrap();

    assert_eq!(progress.length(), Some(2));
    assert_eq!(progress.position(), 2);
}

/// Test that a search without matches leaves the progress bar untouched
#[tokio::test]
async fn test_query_without_matches_skips_progress() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(count_only_page(15, 0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let progress = ProgressBar::hidden();
    let client = create_mock_client(&mock_server, OutputFormat::Ris)
        .with_progress(progress.clone());
    let records = client.query("TS=nothing", None, &[]).await.unwrap();

    assert!(records.is_empty());
    assert_eq!(progress.position(), 0);
    assert_eq!(progress.length(), None);
}
