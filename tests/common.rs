#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use axum::Router;
use figment::providers::{Format, Yaml};
use figment::Figment;
use gocardless_exporter::config::{Config, from_figment};
use gocardless_exporter::routes::create_router;
use gocardless_exporter::startup::build_state;
use mockito::{Matcher, Mock, ServerGuard};
use tower::ServiceExt;

pub const TOKEN: &str = "sandbox_integration_token";

pub fn test_config(api_base_url: &str, page_limit: u32) -> Config {
    let yaml = format!(
        "environment: sandbox\ntoken: {}\napi_base_url: {}\npage_limit: {}\nrequest_timeout_ms: 2000\n",
        TOKEN, api_base_url, page_limit
    );
    from_figment(Figment::new().merge(Yaml::string(&yaml))).expect("test config should load")
}

pub fn build_app(config: Config) -> Router {
    let state = build_state(Arc::new(config)).expect("state should build");
    create_router(state)
}

pub async fn get(app: &Router, path: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request");
    app.clone()
        .oneshot(request)
        .await
        .expect("request should succeed")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Scrapes `/metrics` and returns the exposition text.
pub async fn scrape(app: &Router) -> String {
    body_text(get(app, "/metrics").await).await
}

/// Sample lines (no comments) of the membership gauges.
pub fn membership_samples(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| {
            line.starts_with("gocardless_members_count")
                || line.starts_with("gocardless_subscriptions_")
        })
        .collect()
}

pub fn subscriptions_body(records: &[(&str, &str, &str)]) -> String {
    let items: Vec<String> = records
        .iter()
        .map(|(id, plan, mandate)| {
            format!(
                r#"{{"id": "{}", "name": "{}", "status": "active", "links": {{"mandate": "{}"}}}}"#,
                id, plan, mandate
            )
        })
        .collect();
    format!(r#"{{"subscriptions": [{}], "meta": {{"limit": 500}}}}"#, items.join(","))
}

pub fn mandates_body(records: &[(&str, &str)]) -> String {
    let items: Vec<String> = records
        .iter()
        .map(|(id, customer)| {
            format!(
                r#"{{"id": "{}", "status": "active", "links": {{"customer": "{}"}}}}"#,
                id, customer
            )
        })
        .collect();
    format!(r#"{{"mandates": [{}], "meta": {{"limit": 500}}}}"#, items.join(","))
}

pub async fn mock_list(
    server: &mut ServerGuard,
    resource: &str,
    status: usize,
    body: String,
) -> Mock {
    server
        .mock("GET", format!("/{}", resource).as_str())
        .match_query(Matcher::UrlEncoded("status".into(), "active".into()))
        .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}
