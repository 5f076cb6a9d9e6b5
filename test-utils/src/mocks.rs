//! Mock Vault server for tests.
//!
//! Wraps a wiremock [`MockServer`] and mounts the handful of endpoints the
//! client core talks to.

use crate::fixtures;
use serde_json::Value;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Name of the header the client sends the token in.
pub const TOKEN_HEADER: &str = "x-vault-token";

/// A running mock Vault.
pub struct MockVault {
    server: MockServer,
}

impl MockVault {
    /// Start a server on a random local port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Address to put in the client configuration.
    #[must_use]
    pub fn addr(&self) -> String {
        self.server.uri()
    }

    /// The underlying server for ad hoc mocks.
    #[must_use]
    pub const fn server(&self) -> &MockServer {
        &self.server
    }

    /// Answer `lookup-self` for `token` with its record.
    pub async fn mount_lookup_self(&self, token: &str, accessor: &str, policies: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/v1/auth/token/lookup-self"))
            .and(header(TOKEN_HEADER, token))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(fixtures::token_lookup_body(token, accessor, policies)),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer `lookup-self` for `token` with 403.
    pub async fn mount_lookup_self_forbidden(&self, token: &str) {
        Mock::given(method("GET"))
            .and(path("/v1/auth/token/lookup-self"))
            .and(header(TOKEN_HEADER, token))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(fixtures::error_body(&["permission denied"])),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer a login POST at `/v1/auth/<login_path>` whose body contains
    /// `expected_body`.
    pub async fn mount_login(&self, login_path: &str, expected_body: Value, response: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/v1/auth/{login_path}")))
            .and(body_partial_json(expected_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// Answer a list call at `/v1/<list_path>` with `keys`.
    pub async fn mount_list(&self, list_path: &str, keys: &[&str]) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/{list_path}")))
            .and(query_param("list", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::list_body(keys)))
            .mount(&self.server)
            .await;
    }

    /// Answer `method_name` at `/v1/<request_path>` with `status` and a
    /// JSON body.
    pub async fn mount_json(&self, method_name: &str, request_path: &str, status: u16, body: Value) {
        Mock::given(method(method_name))
            .and(path(format!("/v1/{request_path}")))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer `method_name` at `/v1/<request_path>` with `status` and a raw
    /// body.
    pub async fn mount_raw(&self, method_name: &str, request_path: &str, status: u16, body: &str) {
        Mock::given(method(method_name))
            .and(path(format!("/v1/{request_path}")))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_raw(body.as_bytes().to_vec(), "application/json"),
            )
            .mount(&self.server)
            .await;
    }

    /// All requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Token header of every request to `request_path`, in arrival order.
    /// Requests without the header yield `None`.
    pub async fn tokens_seen(&self, request_path: &str) -> Vec<Option<String>> {
        let wanted = format!("/v1/{request_path}");
        self.requests()
            .await
            .iter()
            .filter(|r| r.url.path() == wanted)
            .map(|r| {
                r.headers
                    .get(TOKEN_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from)
            })
            .collect()
    }
}
