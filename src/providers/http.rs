use crate::core::loader::{LoadFailure, MetricsSource, parse_document};
use crate::core::metrics::MetricsDocument;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Fetches the metrics document over HTTP with a single GET.
pub struct HttpMetricsSource {
    url: String,
}

impl HttpMetricsSource {
    pub fn new(url: &str) -> Self {
        HttpMetricsSource {
            url: url.to_string(),
        }
    }

    fn unavailable(&self, reason: String) -> LoadFailure {
        LoadFailure::Unavailable {
            location: self.url.clone(),
            reason,
        }
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    #[instrument(name = "HttpMetricsLoad", skip(self), fields(url = %self.url))]
    async fn load(&self) -> Result<MetricsDocument, LoadFailure> {
        debug!("Requesting metrics document from {}", self.url);

        let client = reqwest::Client::builder()
            .user_agent(concat!("rrdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| self.unavailable(format!("Client error: {e}")))?;
        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.unavailable(format!("Request error: {e}")))?;

        debug!(response = ?response, "Received metrics response");

        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(format!("HTTP error: {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(format!("Failed to read response body: {e}")))?;

        parse_document(&self.url, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::fixtures::SAMPLE_JSON;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DATA_PATH: &str = "/data/dashboard_data.json";

    async fn create_mock_server(status: u16, body: &str, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(DATA_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_load() {
        let mock_server = create_mock_server(200, SAMPLE_JSON, 1).await;
        let source = HttpMetricsSource::new(&format!("{}{DATA_PATH}", mock_server.uri()));

        let doc = source.load().await.unwrap();

        assert_eq!(doc.metadata.generated_date, "2025-07-15 09:30:00");
        assert_eq!(doc.fund2.metrics.risk_metrics.unique_tenants, 142.0);
    }

    #[tokio::test]
    async fn test_repeated_loads_fetch_again() {
        let mock_server = create_mock_server(200, SAMPLE_JSON, 2).await;
        let source = HttpMetricsSource::new(&format!("{}{DATA_PATH}", mock_server.uri()));

        source.load().await.unwrap();
        source.load().await.unwrap();
        // `expect(2)` is verified when the server drops
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mock_server = create_mock_server(500, "", 1).await;
        let url = format!("{}{DATA_PATH}", mock_server.uri());
        let source = HttpMetricsSource::new(&url);

        let err = source.load().await.unwrap_err();

        assert_eq!(
            err,
            LoadFailure::Unavailable {
                location: url,
                reason: "HTTP error: 500 Internal Server Error".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock_server = create_mock_server(200, r#"{"fund2": {}}"#, 1).await;
        let source = HttpMetricsSource::new(&format!("{}{DATA_PATH}", mock_server.uri()));

        let err = source.load().await.unwrap_err();

        assert!(matches!(err, LoadFailure::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let mock_server = MockServer::start().await;
        let url = format!("{}{DATA_PATH}", mock_server.uri());
        drop(mock_server);
        let source = HttpMetricsSource::new(&url);

        let err = source.load().await.unwrap_err();

        assert!(matches!(err, LoadFailure::Unavailable { .. }));
        assert!(err.reason().starts_with("Request error"));
    }
}
