use crate::config::AppConfig;
use crate::fetcher::traits::AnalyticsSource;
use crate::fetcher::validate_terms;
use crate::model::{CompareError, ComparisonResult};

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEARCH_PATH: &str = "analytics/search";

/// Error body shape of the analytics API; `detail` is a string for
/// handled failures and a list for request validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

pub struct HttpAnalyticsSource {
    client: Client,
    base_url: String,
}

impl HttpAnalyticsSource {
    pub fn new(base_url: &str, timeout: Duration, user_agent: Option<&str>) -> Result<Self, CompareError> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder
            .build()
            .map_err(|e| CompareError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CompareError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_seconds),
            config.user_agent.as_deref(),
        )
    }

    fn build_url(&self) -> String {
        format!("{}/{}", self.base_url, SEARCH_PATH)
    }
}

#[async_trait::async_trait]
impl AnalyticsSource for HttpAnalyticsSource {
    async fn fetch(&self, term1: &str, term2: &str) -> Result<ComparisonResult, CompareError> {
        let (term1, term2) = validate_terms(term1, term2)?;
        let url = self.build_url();
        info!("Performing search for '{}' vs '{}'", term1, term2);

        let response = self
            .client
            .get(&url)
            .query(&[("search_term_1", term1), ("search_term_2", term2)])
            .send()
            .await
            .map_err(|e| CompareError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| CompareError::Transport(e.to_string()))?;
            let err = upstream_error(status, &body);
            warn!("❌ Analytics API responded [{}]: {}", status, err.message());
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| CompareError::Transport(e.to_string()))?;
        debug!("Analytics API responded [{}] with {} bytes", status, body.len());

        let result: ComparisonResult =
            serde_json::from_str(&body).map_err(|e| CompareError::Schema(e.to_string()))?;
        result.validate()?;
        Ok(result)
    }
}

fn upstream_error(status: StatusCode, body: &str) -> CompareError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| d.as_str().map(str::to_string))
        .filter(|d| !d.trim().is_empty());

    CompareError::Upstream {
        status: status.as_u16(),
        message: detail.unwrap_or_else(|| format!("request failed with status {}", status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn analytics_json(term: &str, total_results: u64) -> serde_json::Value {
        json!({
            "search_term": term,
            "total_results": total_results,
            "videos_analyzed": 1,
            "total_view_count": 1500,
            "average_view_count": 1500.0,
            "total_like_count": 12,
            "average_like_count": 12.0,
            "popularity_over_time": [
                { "release_date": "2024-01-01T00:00:00Z", "view_count": 1500 }
            ]
        })
    }

    fn source(server: &MockServer) -> HttpAnalyticsSource {
        HttpAnalyticsSource::new(&server.uri(), Duration::from_secs(5), None).unwrap()
    }

    #[tokio::test]
    async fn fetch_sends_both_terms_and_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/analytics/search"))
            .and(query_param("search_term_1", "cats"))
            .and(query_param("search_term_2", "dogs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "search_term_1": analytics_json("cats", 120),
                "search_term_2": analytics_json("dogs", 95),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = source(&server).fetch(" cats ", "dogs").await.unwrap();
        assert_eq!(result.term_a.total_results, 120);
        assert_eq!(result.term_b.search_term, "dogs");
    }

    #[tokio::test]
    async fn detail_message_becomes_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/analytics/search"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "quota exceeded" })))
            .mount(&server)
            .await;

        let err = source(&server).fetch("cats", "dogs").await.unwrap_err();
        assert_eq!(
            err,
            CompareError::Upstream { status: 500, message: "quota exceeded".into() }
        );
    }

    #[tokio::test]
    async fn error_without_detail_gets_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [{ "loc": ["query", "search_term_2"], "msg": "field required" }]
            })))
            .mount(&server)
            .await;

        let err = source(&server).fetch("cats", "dogs").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.message().contains("422"));
    }

    #[tokio::test]
    async fn malformed_body_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Hello World" })))
            .mount(&server)
            .await;

        let err = source(&server).fetch("cats", "dogs").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let source = HttpAnalyticsSource::new(&uri, Duration::from_secs(2), None).unwrap();
        let err = source.fetch("cats", "dogs").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn truncated_error_body_is_transport_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            // Promises 100 bytes, sends a few, then hangs up.
            let _ = socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\n{\"detail\"")
                .await;
            let _ = socket.shutdown().await;
        });

        let source = HttpAnalyticsSource::new(&uri, Duration::from_secs(5), None).unwrap();
        let err = source.fetch("cats", "dogs").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn blank_term_never_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = source(&server).fetch("   ", "dogs").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
