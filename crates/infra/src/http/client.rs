use std::time::Duration;

use async_trait::async_trait;
use bootnotes_core::{ApiClient, ApiClientError};
use bootnotes_domain::{ApiResponse, BootNotesError, ClientConfig};
use reqwest::{Client as ReqwestClient, Url};
use tracing::debug;

use crate::errors::{error_for_status, error_for_transport};

/// [`ApiClient`] issuing `GET {base_url}/{key}` requests.
///
/// The client performs exactly one request per call. Retries belong to the
/// executor wrapping it.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: ReqwestClient,
    base_url: Url,
}

impl HttpApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `BootNotesError::Config` if the base URL cannot carry a path or
    /// the underlying client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, BootNotesError> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            BootNotesError::Config(format!("invalid client base_url '{}': {err}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BootNotesError::Config(format!(
                "client base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = ReqwestClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .no_proxy()
            .build()
            .map_err(|err| BootNotesError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL for `key`, appended as a single encoded path segment.
    ///
    /// # Errors
    /// Returns a `BadRequest` error for keys a URL path cannot carry
    /// verbatim: the dot segments `.` and `..` are removed by URL
    /// normalization and tabs or line breaks are stripped.
    fn url_for(&self, key: Option<&str>) -> Result<Url, ApiClientError> {
        let mut url = self.base_url.clone();
        let Some(key) = key else {
            return Ok(url);
        };
        if matches!(key, "." | "..") || key.contains(['\t', '\n', '\r']) {
            return Err(ApiClientError::bad_request(format!(
                "key {key:?} cannot be sent as a URL path segment"
            )));
        }
        // cannot_be_a_base was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(key);
        }
        Ok(url)
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get_response(&self, key: Option<&str>) -> Result<ApiResponse, ApiClientError> {
        let url = self.url_for(key)?;
        debug!(%url, "sending HTTP request");

        let response = self.client.get(url.clone()).send().await.map_err(|err| {
            debug!(%url, error = %err, "HTTP request failed");
            error_for_transport(&err)
        })?;

        let status = response.status();
        debug!(%url, %status, "received HTTP response");

        let body = response.text().await.map_err(|err| error_for_transport(&err))?;
        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }
        Ok(ApiResponse::new(body))
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use bootnotes_core::ApiErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(base_url: String) -> HttpApiClient {
        HttpApiClient::new(&ClientConfig { base_url, timeout_ms: 1_000, ..Default::default() })
            .expect("http client")
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = HttpApiClient::new(&ClientConfig {
            base_url: "not a url".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(BootNotesError::Config(_))));

        let result = HttpApiClient::new(&ClientConfig {
            base_url: "mailto:ops@example.com".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(BootNotesError::Config(_))));
    }

    #[test]
    fn builds_key_urls() {
        let client = client_for("http://localhost:8080/api/".into());
        let url = |key: Option<&str>| client.url_for(key).map(|url| url.to_string());

        assert_eq!(url(Some("abc")).unwrap(), "http://localhost:8080/api/abc");
        assert_eq!(url(Some("a b/c")).unwrap(), "http://localhost:8080/api/a%20b%2Fc");
        assert_eq!(url(Some("%2E%2E")).unwrap(), "http://localhost:8080/api/%252E%252E");
        assert_eq!(url(Some("...")).unwrap(), "http://localhost:8080/api/...");
        assert_eq!(url(None).unwrap(), "http://localhost:8080/api/");
    }

    #[test]
    fn rejects_keys_a_path_cannot_carry() {
        let client = client_for("http://localhost:8080/api/".into());

        for key in [".", "..", "a\tb", "line\nbreak", "\r"] {
            let err = client.url_for(Some(key)).unwrap_err();
            assert_eq!(err.kind, ApiErrorKind::BadRequest, "key {key:?}");
        }
        assert_ne!(client.url_for(Some("..")).ok(), client.url_for(None).ok());
    }

    #[tokio::test]
    async fn dot_key_is_not_sent_as_absent_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Body for key: null"))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let err = client.get_response(Some("..")).await.unwrap_err();

        assert_eq!(err.kind, ApiErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Body for key: abc"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let response = client.get_response(Some("abc")).await.expect("response");

        assert_eq!(response.body, "Body for key: abc");
    }

    #[tokio::test]
    async fn missing_key_requests_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Body for key: null"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let response = client.get_response(None).await.expect("response");

        assert_eq!(response.body, "Body for key: null");
    }

    #[tokio::test]
    async fn maps_error_statuses_without_retrying() {
        let cases = [
            (504, ApiErrorKind::GatewayTimeout),
            (400, ApiErrorKind::BadRequest),
            (404, ApiErrorKind::NotFound),
            (500, ApiErrorKind::Upstream),
        ];

        for (code, kind) in cases {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(code).set_body_string("nope"))
                .expect(1)
                .mount(&server)
                .await;

            let client = client_for(server.uri());
            let err = client.get_response(Some("k")).await.unwrap_err();

            assert_eq!(err.kind, kind, "status {code}");
            assert!(err.message.ends_with("nope"));
        }
    }

    #[tokio::test]
    async fn connection_failure_is_upstream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED

        let client = client_for(format!("http://{addr}"));
        let err = client.get_response(Some("k")).await.unwrap_err();

        assert_eq!(err.kind, ApiErrorKind::Upstream);
    }
}
