//! HTTP transport for the Vault API.
//!
//! Every call goes through [`HttpTransport::dispatch`], which attaches the
//! token, serializes the body, and turns the reply into either a
//! [`VaultResponse`] or a classified [`VaultError`].

use crate::{
    config::{VaultConfig, build_http_client},
    error::{VaultError, VaultResult, classify},
    path::SEPARATOR,
    response::{VaultResponse, value_to_list},
    token::Token,
};
use reqwest::{Client, Method, StatusCode, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{Span, debug, field, instrument, warn};
use url::Url;

/// Header carrying the token id.
pub const TOKEN_HEADER: &str = "X-Vault-Token";
/// Header carrying the enterprise namespace.
pub const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Query or body parameters for a call.
pub type Params = BTreeMap<String, String>;

/// Shared slot holding the token used for authorization.
pub(crate) type TokenSlot = Arc<RwLock<Option<Arc<Token>>>>;

/// Which token a single call is authorized with.
#[derive(Debug, Clone, Copy)]
enum Credential<'a> {
    /// Whatever the session holds at dispatch time.
    Active,
    /// A specific token id, bypassing the session.
    Explicit(&'a str),
    /// No token header at all.
    Anonymous,
}

#[derive(Debug)]
enum Body {
    Empty,
    Json(serde_json::Value),
    Raw(String),
}

/// HTTP transport with a shared, swappable active token.
///
/// Cheap to clone; clones share the connection pool and the token slot.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base: Url,
    namespace: Option<String>,
    active: TokenSlot,
}

impl HttpTransport {
    /// Create a transport for `config`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unusable configuration, `Http` when the
    /// client cannot be built.
    pub fn new(config: &VaultConfig) -> VaultResult<Self> {
        config.validate()?;
        let http = build_http_client(config).map_err(VaultError::Http)?;

        Ok(Self {
            http,
            base: config.api_base()?,
            namespace: config.namespace.clone(),
            active: Arc::new(RwLock::new(None)),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    pub(crate) async fn current_token(&self) -> Option<Arc<Token>> {
        self.active.read().await.clone()
    }

    pub(crate) async fn replace_token(&self, token: Option<Arc<Token>>) -> Option<Arc<Token>> {
        let mut slot = self.active.write().await;
        std::mem::replace(&mut *slot, token)
    }

    /// Install `token` only while `expected` is still the active token.
    pub(crate) async fn replace_token_if(&self, expected: &Arc<Token>, token: Arc<Token>) -> bool {
        let mut slot = self.active.write().await;
        match &*slot {
            Some(current) if Arc::ptr_eq(current, expected) => {
                *slot = Some(token);
                true
            }
            _ => false,
        }
    }

    /// GET `path` with optional query parameters.
    ///
    /// # Errors
    ///
    /// Any classified [`VaultError`].
    pub async fn get(&self, path: &str, params: Option<&Params>) -> VaultResult<VaultResponse> {
        let query = query_pairs(params);
        self.dispatch(Method::GET, path, &query, Body::Empty, Credential::Active)
            .await
    }

    /// GET `path` authorized with `token_id` instead of the active token.
    ///
    /// # Errors
    ///
    /// Any classified [`VaultError`].
    pub async fn get_as(&self, path: &str, token_id: &str) -> VaultResult<VaultResponse> {
        self.dispatch(Method::GET, path, &[], Body::Empty, Credential::Explicit(token_id))
            .await
    }

    /// List the entries under `path`.
    ///
    /// Sends `list=true` and deserializes `data.keys`. A 404 means there is
    /// nothing under the path and yields an empty list.
    ///
    /// # Errors
    ///
    /// Any classified [`VaultError`] other than not-found; `Parse` when the
    /// keys are not a list of `T`.
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> VaultResult<Vec<T>> {
        let response = match self
            .dispatch(Method::GET, path, &[("list", "true")], Body::Empty, Credential::Active)
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                debug!(path, "List target not found, returning empty list");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        match response.data_package_opt().and_then(|d| d.get("keys")) {
            Some(keys) if !keys.is_null() => value_to_list(keys),
            _ => Ok(Vec::new()),
        }
    }

    /// [`HttpTransport::list`] for plain string keys.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::list`].
    pub async fn list_keys(&self, path: &str) -> VaultResult<Vec<String>> {
        self.list(path).await
    }

    /// POST `body` serialized as JSON.
    ///
    /// # Errors
    ///
    /// `Parse` if `body` cannot be serialized, otherwise any classified
    /// [`VaultError`].
    pub async fn post<B>(&self, path: &str, body: Option<&B>) -> VaultResult<VaultResponse>
    where
        B: Serialize + ?Sized,
    {
        let body = json_body(path, body)?;
        self.dispatch(Method::POST, path, &[], body, Credential::Active)
            .await
    }

    /// POST an already serialized JSON document.
    ///
    /// # Errors
    ///
    /// Any classified [`VaultError`].
    pub async fn post_raw(&self, path: &str, body: &str) -> VaultResult<VaultResponse> {
        self.dispatch(
            Method::POST,
            path,
            &[],
            Body::Raw(body.to_string()),
            Credential::Active,
        )
        .await
    }

    /// POST without any token header. Used by login calls.
    ///
    /// # Errors
    ///
    /// `Parse` if `body` cannot be serialized, otherwise any classified
    /// [`VaultError`].
    pub async fn post_anonymous<B>(&self, path: &str, body: Option<&B>) -> VaultResult<VaultResponse>
    where
        B: Serialize + ?Sized,
    {
        let body = json_body(path, body)?;
        self.dispatch(Method::POST, path, &[], body, Credential::Anonymous)
            .await
    }

    /// DELETE `path`.
    ///
    /// # Errors
    ///
    /// Any classified [`VaultError`].
    pub async fn delete(&self, path: &str) -> VaultResult<VaultResponse> {
        self.dispatch(Method::DELETE, path, &[], Body::Empty, Credential::Active)
            .await
    }

    /// Resolve a logical path under the API base.
    ///
    /// Each segment is percent-encoded on its own, so `#`, `?` or `:` in a
    /// name stay part of that name. Dot segments are refused.
    fn url_for(&self, path: &str) -> VaultResult<Url> {
        let relative = path.trim_start_matches(SEPARATOR);
        if relative.split(SEPARATOR).any(|s| s == "." || s == "..") {
            return Err(VaultError::invalid_argument(format!(
                "request path {path} contains a dot segment"
            )));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                VaultError::invalid_argument(format!("base URL {} cannot take a path", self.base))
            })?
            .pop_if_empty()
            .extend(relative.split(SEPARATOR));
        Ok(url)
    }

    #[instrument(
        name = "vault.request",
        skip_all,
        fields(method = %method, path = %path, accessor = field::Empty, status = field::Empty)
    )]
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Body,
        credential: Credential<'_>,
    ) -> VaultResult<VaultResponse> {
        let url = self.url_for(path)?;
        let mut request = self.http.request(method, url);

        // One snapshot per call: a concurrent swap never mixes tokens.
        match credential {
            Credential::Active => {
                if let Some(token) = self.current_token().await {
                    Span::current().record("accessor", token.accessor());
                    request = request.header(TOKEN_HEADER, token.id());
                }
            }
            Credential::Explicit(id) => request = request.header(TOKEN_HEADER, id),
            Credential::Anonymous => {}
        }

        if let Some(ns) = &self.namespace {
            request = request.header(NAMESPACE_HEADER, ns);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            Body::Raw(text) => request.header(CONTENT_TYPE, "application/json").body(text),
        };

        let response = request.send().await.map_err(|e| {
            warn!(path, error = %e, "Vault request failed before a response");
            VaultError::from_send(&e)
        })?;

        let status = response.status();
        Span::current().record("status", status.as_u16());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| VaultError::from_send(&e))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            let err = classify(status, path, &text);
            warn!(path, status = status.as_u16(), error = %err, "Vault request rejected");
            return Err(err);
        }

        if status == StatusCode::NO_CONTENT {
            debug!(path, "Vault request succeeded without content");
            return Ok(VaultResponse::empty(path, status.as_u16()));
        }

        let parsed = VaultResponse::from_body(path, status.as_u16(), &bytes)?;
        for warning in parsed.warnings() {
            debug!(path, warning = %warning, "Vault returned a warning");
        }
        Ok(parsed)
    }
}

fn query_pairs(params: Option<&Params>) -> Vec<(&str, &str)> {
    params
        .map(|p| p.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
        .unwrap_or_default()
}

fn json_body<B: Serialize + ?Sized>(path: &str, body: Option<&B>) -> VaultResult<Body> {
    body.map_or(Ok(Body::Empty), |b| {
        serde_json::to_value(b)
            .map(Body::Json)
            .map_err(|e| VaultError::parse(format!("request body for {path}"), e))
    })
}
