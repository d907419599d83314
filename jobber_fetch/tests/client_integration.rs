use std::time::Duration;

use jobber_fetch::{Client, Error, SearchQuery};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

#[tokio::test]
async fn get_html_success() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("search_page.html");

    Mock::given(method("GET"))
        .and(path("/nx/search/jobs/"))
        .and(query_param("q", "azure functions"))
        .and(query_param("sort", "recency"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .mount(&mock_server)
        .await;

    let client = Client::new(&mock_server.uri(), "/nx/search/jobs/").unwrap();
    let query = SearchQuery::parse("q=azure%20functions&sort=recency");
    let html = client.get_html(&query).await.unwrap();

    assert!(html.contains("job-tile-title-link"));
}

#[tokio::test]
async fn get_html_sends_configured_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nx/search/jobs/"))
        .and(wiremock::matchers::header("x-requested-with", "jobber"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::new(&mock_server.uri(), "/nx/search/jobs/")
        .unwrap()
        .with_header("x-requested-with", "jobber")
        .with_header("accept-encoding", "br");
    let result = client.get_html(&SearchQuery::parse("q=rust")).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn get_html_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nx/search/jobs/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;

    let client = Client::new(&mock_server.uri(), "/nx/search/jobs/").unwrap();
    let result = client.get_html(&SearchQuery::parse("q=azure")).await;

    match result {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "Service Unavailable");
        }
        other => panic!("expected HttpStatus error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn get_html_forbidden() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("challenge"))
        .mount(&mock_server)
        .await;

    let client = Client::new(&mock_server.uri(), "/nx/search/jobs/").unwrap();
    let result = client.get_html(&SearchQuery::parse("q=azure")).await;

    assert!(matches!(result, Err(Error::HttpStatus { status: 403, .. })));
}

#[tokio::test]
async fn get_html_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = Client::with_timeout(
        &mock_server.uri(),
        "/nx/search/jobs/",
        Duration::from_millis(100),
    )
    .unwrap();
    let result = client.get_html(&SearchQuery::parse("q=azure")).await;

    assert!(matches!(result, Err(Error::Timeout)));
}

#[tokio::test]
async fn get_html_connection_refused() {
    // Nothing listens on the discard port.
    let client = Client::new("http://127.0.0.1:9", "/nx/search/jobs/").unwrap();
    let result = client.get_html(&SearchQuery::parse("q=azure")).await;

    assert!(matches!(result, Err(Error::RequestFailed)));
}
