use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::base::{
    BillingApi, Environment, FetchError, ListFilters, Page, Resource, ResourceKind,
};
use crate::models::{Mandate, Subscription};

/// Pinned provider API version sent with every request.
pub const API_VERSION: &str = "2015-07-06";
pub const API_VERSION_HEADER: &str = "gocardless-version";

/// The `error` member GoCardless wraps failures in.
#[derive(Deserialize, Debug, Default)]
struct ProviderError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
    code: Option<u16>,
}

impl ProviderError {
    /// Reads any non-null `error` member; non-object values become the message.
    fn from_document(document: &Value) -> Option<Self> {
        match document.get("error")? {
            Value::Null => None,
            Value::String(message) => Some(ProviderError {
                message: Some(message.clone()),
                ..Default::default()
            }),
            raw => Some(ProviderError::deserialize(raw).unwrap_or_else(|_| ProviderError {
                message: Some(raw.to_string()),
                ..Default::default()
            })),
        }
    }

    fn error_type(&self) -> String {
        self.error_type.clone().unwrap_or_else(|| "unknown".to_string())
    }

    fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "no message provided".to_string())
    }
}

/// Authenticated client for the GoCardless REST API.
///
/// Built once at startup and shared by every scrape. Holds no per-cycle state.
#[derive(Clone)]
pub struct GoCardlessClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for GoCardlessClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoCardlessClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GoCardlessClient {
    /// Creates a client for the given environment's API host.
    pub fn new(
        environment: Environment,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Self::with_base_url(environment.base_url(), token, timeout)
    }

    /// Creates a client against an explicit base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(API_VERSION_HEADER),
            HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Creating GoCardless client for '{}'", base_url);

        Ok(Self {
            http,
            base_url,
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists a single page of `R` records matching `filters`.
    pub async fn fetch<R: Resource>(&self, filters: &ListFilters) -> Result<Page<R>, FetchError> {
        let kind = R::KIND;
        let url = format!("{}/{}", self.base_url, kind.as_str());

        debug!(
            resource = kind.as_str(),
            status = filters.status.as_str(),
            limit = filters.limit,
            "Sending GoCardless list request to: {}",
            url
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&filters.as_query())
            .send()
            .await
            .map_err(|e| transport_error(kind, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(kind, e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|document| ProviderError::from_document(&document))
                .map(|error| error.message())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            return Err(FetchError::Status {
                resource: kind,
                status: status.as_u16(),
                message,
            });
        }

        let items = parse_list(kind, &body)?;
        Ok(Page {
            items,
            limit: filters.limit,
        })
    }
}

fn transport_error(resource: ResourceKind, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout { resource }
    } else {
        FetchError::Transport { resource, source }
    }
}

/// Decodes a successful list response, treating an embedded `error` as failure.
fn parse_list<R: Resource>(kind: ResourceKind, body: &str) -> Result<Vec<R>, FetchError> {
    let decode = |message: String| FetchError::Decode {
        resource: kind,
        message,
    };

    let mut document: Value =
        serde_json::from_str(body).map_err(|e| decode(format!("invalid JSON: {}", e)))?;

    if let Some(error) = ProviderError::from_document(&document) {
        debug!(
            resource = kind.as_str(),
            code = error.code,
            "provider returned an error payload"
        );
        return Err(FetchError::Provider {
            resource: kind,
            error_type: error.error_type(),
            message: error.message(),
        });
    }

    let records = document
        .get_mut(kind.as_str())
        .map(Value::take)
        .ok_or_else(|| decode(format!("missing '{}' collection", kind)))?;

    serde_json::from_value(records).map_err(|e| decode(e.to_string()))
}

#[async_trait]
impl BillingApi for GoCardlessClient {
    async fn subscriptions(&self, filters: &ListFilters) -> Result<Page<Subscription>, FetchError> {
        self.fetch::<Subscription>(filters).await
    }

    async fn mandates(&self, filters: &ListFilters) -> Result<Page<Mandate>, FetchError> {
        self.fetch::<Mandate>(filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use tokio::net::TcpListener;

    const TOKEN: &str = "sandbox_test_token";

    fn client_for(server: &Server) -> GoCardlessClient {
        GoCardlessClient::with_base_url(server.url(), TOKEN, Duration::from_secs(5)).unwrap()
    }

    fn active_query(limit: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("status".into(), "active".into()),
            Matcher::UrlEncoded("limit".into(), limit.into()),
        ])
    }

    /// A list request carries auth, version and accept headers and returns typed records.
    #[tokio::test]
    async fn test_fetch_subscriptions_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/subscriptions")
            .match_query(active_query("500"))
            .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
            .match_header(API_VERSION_HEADER, API_VERSION)
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"subscriptions": [
                    {"id": "SB1", "name": "gold", "status": "active", "links": {"mandate": "MD1"}},
                    {"id": "SB2", "name": "silver", "status": "active", "links": {"mandate": "MD2"}}
                ], "meta": {"cursors": {"before": null, "after": null}, "limit": 500}}"#,
            )
            .create_async()
            .await;

        let page = client_for(&server)
            .fetch::<Subscription>(&ListFilters::active(500))
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].plan_name(), "gold");
        assert_eq!(page.items[1].mandate_id(), Some("MD2"));
        assert!(!page.is_truncated());
    }

    #[tokio::test]
    async fn test_fetch_mandates_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/mandates")
            .match_query(active_query("2"))
            .with_status(200)
            .with_body(
                r#"{"mandates": [
                    {"id": "MD1", "status": "active", "links": {"customer": "CU1"}},
                    {"id": "MD2", "status": "active", "links": {"customer": "CU2"}}
                ]}"#,
            )
            .create_async()
            .await;

        let page = client_for(&server)
            .mandates(&ListFilters::active(2))
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(page.items[1].customer_id(), Some("CU2"));
        assert!(page.is_truncated());
    }

    /// A 2xx body that carries an `error` object is a failure, not an empty list.
    #[tokio::test]
    async fn test_error_payload_is_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/subscriptions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"error": {"type": "invalid_api_usage", "message": "Rate limit exceeded", "code": 429}}"#,
            )
            .create_async()
            .await;

        let result = client_for(&server)
            .subscriptions(&ListFilters::active(500))
            .await;

        match result {
            Err(FetchError::Provider {
                resource,
                error_type,
                message,
            }) => {
                assert_eq!(resource, ResourceKind::Subscriptions);
                assert_eq!(error_type, "invalid_api_usage");
                assert_eq!(message, "Rate limit exceeded");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    /// Any non-null `error` member fails the page, even next to an empty collection.
    #[tokio::test]
    async fn test_string_error_member_is_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/subscriptions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error": "rate_limited", "subscriptions": []}"#)
            .create_async()
            .await;

        let result = client_for(&server)
            .subscriptions(&ListFilters::active(500))
            .await;

        match result {
            Err(FetchError::Provider {
                resource,
                error_type,
                message,
            }) => {
                assert_eq!(resource, ResourceKind::Subscriptions);
                assert_eq!(error_type, "unknown");
                assert_eq!(message, "rate_limited");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_null_error_member_is_ignored() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/mandates")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error": null, "mandates": []}"#)
            .create_async()
            .await;

        let page = client_for(&server)
            .mandates(&ListFilters::active(500))
            .await
            .unwrap();

        assert!(page.items.is_empty());
    }

    /// A provider that accepts the connection but never answers hits the request timeout.
    #[tokio::test]
    async fn test_stalled_provider_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept_loop = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = GoCardlessClient::with_base_url(
            format!("http://{}", addr),
            TOKEN,
            Duration::from_millis(100),
        )
        .unwrap();
        let err = client
            .subscriptions(&ListFilters::active(500))
            .await
            .unwrap_err();

        accept_loop.abort();
        assert!(
            matches!(
                err,
                FetchError::Timeout {
                    resource: ResourceKind::Subscriptions
                }
            ),
            "expected timeout, got {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/mandates")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(
                r#"{"error": {"type": "invalid_api_usage", "message": "Invalid token", "code": 401}}"#,
            )
            .create_async()
            .await;

        let err = client_for(&server)
            .mandates(&ListFilters::active(500))
            .await
            .unwrap_err();

        match err {
            FetchError::Status {
                status, message, ..
            } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid token");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/subscriptions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = client_for(&server)
            .subscriptions(&ListFilters::active(500))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }));
        assert_eq!(err.resource(), ResourceKind::Subscriptions);
    }

    #[tokio::test]
    async fn test_missing_collection_is_decode_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/mandates")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"meta": {"limit": 500}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .mandates(&ListFilters::active(500))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = GoCardlessClient::new(Environment::Sandbox, TOKEN, Duration::from_secs(1))
            .unwrap();
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains(TOKEN));
        assert!(rendered.contains("api-sandbox.gocardless.com"));
    }
}
