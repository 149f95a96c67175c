use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use sec_edgar_client::config::UserAgent;
use sec_edgar_client::error::NetworkError;
use sec_edgar_client::http::{HttpClient, RetryPolicy};
use sec_edgar_client::rate_limit::RateLimiter;

const AGENT: &str = "Jane Doe (jane@example.com)";

fn build_client(policy: RetryPolicy, rate: f64) -> HttpClient {
    HttpClient::builder(UserAgent::parse(AGENT).unwrap())
        .retry_policy(policy)
        .rate_limiter(Arc::new(RateLimiter::new(rate).unwrap()))
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

#[tokio::test]
async fn test_success_sends_identity_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/company_tickers.json"))
        .and(header("user-agent", AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(RetryPolicy::default(), 100.0);
    let body = client
        .get_bytes(&format!("{}/files/company_tickers.json", server.uri()))
        .await
        .unwrap();

    assert_eq!(body, b"{}");
}

/// Answers with `statuses` in order and records when each request arrived.
#[derive(Clone)]
struct Scripted {
    statuses: Vec<u16>,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Scripted {
    fn new(statuses: &[u16]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            arrivals: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn gaps(&self) -> Vec<Duration> {
        let arrivals = self.arrivals.lock().unwrap();
        arrivals.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

impl Respond for Scripted {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut arrivals = self.arrivals.lock().unwrap();
        let status = self.statuses.get(arrivals.len()).copied().unwrap_or(200);
        arrivals.push(Instant::now());
        ResponseTemplate::new(status).set_body_string("ok")
    }
}

#[tokio::test]
async fn test_transient_failures_are_retried_with_backoff() {
    let server = MockServer::start().await;
    let responder = Scripted::new(&[503, 503, 200]);

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(responder.clone())
        .mount(&server)
        .await;

    let base = Duration::from_millis(200);
    let client = build_client(RetryPolicy::new(3, base), 1000.0);

    let response = client
        .get(&format!("{}/flaky", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(request_count(&server).await, 3);

    // Backoff doubles: 1x then 2x the base delay.
    let gaps = responder.gaps();
    assert_eq!(gaps.len(), 2);
    assert!(gaps[0] >= base && gaps[0] < base * 2, "first retry after {:?}", gaps[0]);
    assert!(gaps[1] >= base * 2, "second retry after {:?}", gaps[1]);
    assert!(gaps[1] > gaps[0]);
}

#[tokio::test]
async fn test_retries_exhausted_after_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let client = build_client(RetryPolicy::new(3, Duration::from_millis(5)), 1000.0);
    let err = client
        .get(&format!("{}/down", server.uri()))
        .await
        .unwrap_err();

    match err {
        NetworkError::RetriesExhausted {
            attempts, status, ..
        } => {
            assert_eq!(attempts, 4);
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(RetryPolicy::new(3, Duration::from_millis(5)), 1000.0);
    let err = client
        .get(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, NetworkError::Status { .. }));
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_every_attempt_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    // No backoff, so only the limiter spaces the three attempts.
    let client = build_client(RetryPolicy::new(2, Duration::ZERO), 10.0);
    let start = Instant::now();

    let err = client
        .get(&format!("{}/busy", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(start.elapsed() >= Duration::from_millis(195));
}

#[tokio::test]
async fn test_clients_sharing_a_limiter_share_the_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let limiter = Arc::new(RateLimiter::new(10.0).unwrap());
    let agent = UserAgent::parse(AGENT).unwrap();
    let first = HttpClient::builder(agent.clone())
        .rate_limiter(limiter.clone())
        .build()
        .unwrap();
    let second = HttpClient::builder(agent)
        .rate_limiter(limiter)
        .build()
        .unwrap();

    let start = Instant::now();
    let url = format!("{}/a", server.uri());
    for _ in 0..2 {
        assert_ok!(first.get(&url).await);
        assert_ok!(second.get(&url).await);
    }

    assert!(start.elapsed() >= Duration::from_millis(295));
}

#[tokio::test]
async fn test_get_with_extra_headers_and_head() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("x-trace", "abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(RetryPolicy::no_retries(), 1000.0);
    let url = format!("{}/doc", server.uri());

    let mut headers = HeaderMap::new();
    headers.insert("x-trace", HeaderValue::from_static("abc"));
    assert_ok!(
        client
            .get_with(&url, headers, Some(Duration::from_secs(1)))
            .await
    );
    assert_ok!(client.head(&url).await);
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let client = build_client(RetryPolicy::no_retries(), 1000.0);

    let err = client.get("http://127.0.0.1:1/unreachable").await.unwrap_err();

    assert!(matches!(err, NetworkError::Transport { .. }));
    assert_eq!(err.status(), None);
}
