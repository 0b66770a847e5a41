use std::time::Duration;

use async_trait::async_trait;

use crate::domain::entities::record::ResponsePage;
use crate::platform::timer::sleep;
use crate::usecase::ports::source::{FetchError, RecordSource};
use crate::usecase::services::request_builder::RequestDescriptor;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(4);

/// Fetches pages from the remote data endpoint.
#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl HttpRecordSource {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(timeout);
        #[cfg(target_arch = "wasm32")]
        let _ = timeout;
        let client = builder
            .build()
            .map_err(|err| FetchError::Network(format!("client initialization failed: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
        })
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.retry_base_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }

    async fn fetch_once(&self, request: &RequestDescriptor) -> Result<ResponsePage, FetchError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, request.path))
            .query(&request.params)
            .send()
            .await
            .map_err(|err| network_error(&err))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "could not read error body".to_string());
            return Err(FetchError::Server {
                status: status.as_u16(),
                message: truncate(&message, 200).to_owned(),
            });
        }

        let body = response.text().await.map_err(|err| network_error(&err))?;
        serde_json::from_str::<ResponsePage>(&body).map_err(|err| {
            FetchError::Decode(format!("{err} (body: {})", truncate(&body, 200)))
        })
    }
}

#[async_trait(?Send)]
impl RecordSource for HttpRecordSource {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponsePage, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(request).await {
                Ok(page) => return Ok(page),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_delay(attempt);
                    tracing::warn!(
                        error = %err,
                        "data request retry {attempt}/{} after {delay:?}",
                        self.max_retries
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn network_error(err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Network("request timed out".to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

/// Truncates a string to the given maximum length at a char boundary.
fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::field::FieldId;
    use crate::domain::entities::query::{QuerySignature, SortDirection};
    use crate::usecase::services::request_builder::RequestBuilder;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_body() -> serde_json::Value {
        serde_json::json!({
            "data": [
                { "ark": "ark:/1", "original_identifier": "MS-1", "project": "astro", "path": "/a" },
                { "ark": "ark:/2", "original_identifier": "MS-2", "project": "astro", "path": "/b" }
            ],
            "totalResults": 47,
            "totalPages": 5
        })
    }

    fn source(server: &MockServer) -> HttpRecordSource {
        HttpRecordSource::new(&server.uri(), Duration::from_secs(5))
            .expect("client should build")
            .with_retries(2, Duration::from_millis(1))
    }

    fn astro_request() -> RequestDescriptor {
        RequestBuilder::default().build(
            &QuerySignature::default()
                .with_filter(FieldId::Project, "astro")
                .with_sort(FieldId::Ark, SortDirection::Desc)
                .with_page(0, 10),
        )
    }

    #[tokio::test]
    async fn sends_signature_params_and_decodes_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(query_param("project", "astro"))
            .and(query_param("sortBy", "ark"))
            .and(query_param("order", "desc"))
            .and(query_param("page", "0"))
            .and(query_param("pageSize", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body()))
            .expect(1)
            .mount(&server)
            .await;

        let page = source(&server)
            .fetch(&astro_request())
            .await
            .expect("fetch should succeed");

        assert_eq!(page.total_results, 47);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[1].original_identifier, "MS-2");
    }

    #[tokio::test]
    async fn retries_transient_status_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body()))
            .expect(1)
            .mount(&server)
            .await;

        let page = source(&server)
            .fetch(&astro_request())
            .await
            .expect("fetch should succeed after retry");

        assert_eq!(page.total_results, 47);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad sortBy"))
            .expect(1)
            .mount(&server)
            .await;

        let result = source(&server).fetch(&astro_request()).await;

        assert_eq!(
            result,
            Err(FetchError::Server {
                status: 400,
                message: "bad sortBy".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn gives_up_after_retry_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .expect(3)
            .mount(&server)
            .await;

        let err = source(&server)
            .fetch(&astro_request())
            .await
            .expect_err("fetch should fail");

        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let result = source(&server).fetch(&astro_request()).await;

        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let source = HttpRecordSource::new("http://127.0.0.1:9", Duration::from_secs(2))
            .expect("client should build")
            .with_retries(0, Duration::from_millis(1));

        let result = source.fetch(&astro_request()).await;

        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn slow_response_times_out_as_network_error_and_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(2)
            .mount(&server)
            .await;
        let source = HttpRecordSource::new(&server.uri(), Duration::from_millis(200))
            .expect("client should build")
            .with_retries(1, Duration::from_millis(1));

        let result = source.fetch(&astro_request()).await;

        assert_eq!(
            result,
            Err(FetchError::Network("request timed out".to_string()))
        );
    }

    #[test]
    fn retry_delay_doubles_and_caps() {
        let source = HttpRecordSource::new("http://localhost", DEFAULT_TIMEOUT)
            .expect("client should build");

        assert_eq!(source.retry_delay(1), Duration::from_millis(250));
        assert_eq!(source.retry_delay(2), Duration::from_millis(500));
        assert_eq!(source.retry_delay(3), Duration::from_secs(1));
        assert_eq!(source.retry_delay(10), MAX_RETRY_DELAY);
        assert_eq!(source.base_url(), "http://localhost");
    }
}
