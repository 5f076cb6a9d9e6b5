//! Login connectors.
//!
//! A [`LoginMethod`] knows how to turn one kind of credential into a
//! [`LoginResponse`]. [`LoginConnector`] drives a method through the
//! connect state machine and installs the resulting token in a
//! [`TokenSession`]:
//!
//! ```text
//! NotConnected -> Connecting -> Connected
//!                            \-> Failed
//! ```
//!
//! `Connected` and `Failed` end one attempt; calling
//! [`LoginConnector::connect`] again starts a new one.

use crate::{
    error::{VaultError, VaultResult},
    path::SEPARATOR,
    response::{AUTH_MEMBER, null_as_default},
    session::{LOOKUP_SELF_PATH, TokenSession},
    token::Token,
    transport::HttpTransport,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, instrument, warn};

/// Result of a successful authentication exchange.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    /// Token id issued to the caller
    pub client_token: String,
    /// Accessor of the issued token
    #[serde(default)]
    pub accessor: String,
    /// Token policies
    #[serde(default, deserialize_with = "null_as_default")]
    pub policies: Vec<String>,
    /// Policies granted through the identity entity
    #[serde(default, deserialize_with = "null_as_default")]
    pub identity_policies: Vec<String>,
    /// Whether the token can be renewed
    #[serde(default)]
    pub renewable: bool,
    /// Identity entity of the caller
    #[serde(default)]
    pub entity_id: String,
    /// Metadata attached by the auth engine
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, String>,
    /// TTL of the issued token in seconds
    #[serde(default)]
    pub lease_duration: u64,
    /// Whether the issued token has no parent
    #[serde(default)]
    pub orphan: bool,
    #[serde(skip)]
    validated: Option<Token>,
}

impl LoginResponse {
    /// Build a response from a token record that was read directly.
    ///
    /// The record is kept and becomes the session token unchanged.
    #[must_use]
    pub fn from_token(token: Token) -> Self {
        Self {
            client_token: token.id().to_string(),
            accessor: token.accessor().to_string(),
            policies: token.policies().iter().cloned().collect(),
            identity_policies: token.identity_policies().iter().cloned().collect(),
            renewable: token.is_renewable(),
            entity_id: token.entity_id().to_string(),
            metadata: token.metadata().clone(),
            lease_duration: token.ttl(),
            orphan: token.is_orphan(),
            validated: Some(token),
        }
    }

    /// The token to install in a session.
    #[must_use]
    pub fn to_token(&self) -> Token {
        self.validated.clone().unwrap_or_else(|| Token::from(self))
    }
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("client_token", &"[REDACTED]")
            .field("accessor", &self.accessor)
            .field("policies", &self.policies)
            .field("identity_policies", &self.identity_policies)
            .field("renewable", &self.renewable)
            .field("entity_id", &self.entity_id)
            .field("lease_duration", &self.lease_duration)
            .finish_non_exhaustive()
    }
}

/// One kind of credential that can be exchanged for a token.
#[async_trait]
pub trait LoginMethod: Send + Sync {
    /// Short name used in logs.
    fn kind(&self) -> &'static str;

    /// Credential specific request body. Empty when nothing is posted.
    fn build_login_parameters(&self) -> Map<String, Value>;

    /// Sub-path under `auth/` to post to. Empty when no exchange is needed.
    fn authentication_mount_path(&self) -> String;

    /// Run the exchange and return its result.
    ///
    /// The default posts [`LoginMethod::build_login_parameters`] without a
    /// token to `auth/<mount path>` and reads the `auth` member.
    async fn perform_connection(&self, transport: &HttpTransport) -> VaultResult<LoginResponse> {
        let mount_path = self.authentication_mount_path();
        if mount_path.is_empty() {
            return Err(VaultError::invalid_argument(format!(
                "{} login has no authentication mount path",
                self.kind()
            )));
        }
        let path = format!("auth/{mount_path}");
        let params = self.build_login_parameters();
        transport
            .post_anonymous(&path, Some(&params))
            .await?
            .typed_member(AUTH_MEMBER)
    }
}

/// Connect state of a [`LoginConnector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No attempt made yet, or reset.
    NotConnected,
    /// An attempt is in flight.
    Connecting,
    /// The last attempt produced a token.
    Connected,
    /// The last attempt was refused or errored.
    Failed,
}

/// Drives a [`LoginMethod`] through one connect attempt at a time.
#[derive(Debug)]
pub struct LoginConnector<M> {
    method: M,
    state: ConnectionState,
    last_response: Option<LoginResponse>,
}

impl<M: LoginMethod> LoginConnector<M> {
    /// Create a connector in `NotConnected`.
    pub const fn new(method: M) -> Self {
        Self {
            method,
            state: ConnectionState::NotConnected,
            last_response: None,
        }
    }

    /// Current state.
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// The credential this connector uses.
    pub const fn method(&self) -> &M {
        &self.method
    }

    /// Result of the last successful attempt.
    pub const fn last_response(&self) -> Option<&LoginResponse> {
        self.last_response.as_ref()
    }

    /// Forget the last attempt.
    pub fn reset(&mut self) {
        self.state = ConnectionState::NotConnected;
        self.last_response = None;
    }

    /// Run one connect attempt and install the token in `session`.
    ///
    /// Returns `Ok(true)` when connected and `Ok(false)` when the backend
    /// refused the credential (403). Nothing is retried. The session is
    /// only touched on success, with a single token swap; if the future is
    /// dropped mid-attempt the session keeps its previous token and the
    /// connector stays in `Connecting` until the next attempt or
    /// [`LoginConnector::reset`].
    ///
    /// # Errors
    ///
    /// Any error other than forbidden; the state is `Failed` afterwards.
    #[instrument(skip_all, fields(kind = self.method.kind()))]
    pub async fn connect(&mut self, session: &TokenSession) -> VaultResult<bool> {
        self.state = ConnectionState::Connecting;
        self.last_response = None;

        match self.method.perform_connection(session.transport()).await {
            Ok(response) => {
                session.set_active_token(response.to_token()).await;
                info!(
                    accessor = %response.accessor,
                    renewable = response.renewable,
                    "Login succeeded"
                );
                self.last_response = Some(response);
                self.state = ConnectionState::Connected;
                Ok(true)
            }
            Err(e) if e.is_forbidden() => {
                warn!(error = %e, "Login refused");
                self.state = ConnectionState::Failed;
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.state = ConnectionState::Failed;
                Err(e)
            }
        }
    }
}

fn mount_path(mount: &str, rest: &str) -> String {
    format!("{}{SEPARATOR}{rest}", mount.trim_matches(SEPARATOR))
}

/// An existing token, validated by reading its own record.
#[derive(Debug, Clone)]
pub struct TokenLogin {
    token: SecretString,
}

impl TokenLogin {
    /// Validate `token` on connect.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }

    /// Use a token already held as a secret.
    #[must_use]
    pub const fn from_secret(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl LoginMethod for TokenLogin {
    fn kind(&self) -> &'static str {
        "token"
    }

    fn build_login_parameters(&self) -> Map<String, Value> {
        Map::new()
    }

    fn authentication_mount_path(&self) -> String {
        String::new()
    }

    async fn perform_connection(&self, transport: &HttpTransport) -> VaultResult<LoginResponse> {
        let token: Token = transport
            .get_as(LOOKUP_SELF_PATH, self.token.expose_secret())
            .await?
            .typed()?;
        Ok(LoginResponse::from_token(token))
    }
}

/// AppRole credentials.
#[derive(Debug, Clone)]
pub struct AppRoleLogin {
    mount: String,
    role_id: String,
    secret_id: SecretString,
}

impl AppRoleLogin {
    /// Log in with `role_id`/`secret_id` at the default `approle` mount.
    #[must_use]
    pub fn new(role_id: impl Into<String>, secret_id: impl Into<String>) -> Self {
        Self {
            mount: "approle".to_string(),
            role_id: role_id.into(),
            secret_id: SecretString::from(secret_id.into()),
        }
    }

    /// Use a non-default mount.
    #[must_use]
    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }
}

#[async_trait]
impl LoginMethod for AppRoleLogin {
    fn kind(&self) -> &'static str {
        "approle"
    }

    fn build_login_parameters(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("role_id".to_string(), Value::String(self.role_id.clone()));
        params.insert(
            "secret_id".to_string(),
            Value::String(self.secret_id.expose_secret().to_string()),
        );
        params
    }

    fn authentication_mount_path(&self) -> String {
        mount_path(&self.mount, "login")
    }
}

fn password_parameters(password: &SecretString) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert(
        "password".to_string(),
        Value::String(password.expose_secret().to_string()),
    );
    params
}

/// Username and password against a `userpass` engine.
#[derive(Debug, Clone)]
pub struct UserPassLogin {
    mount: String,
    username: String,
    password: SecretString,
}

impl UserPassLogin {
    /// Log in as `username` at the default `userpass` mount.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mount: "userpass".to_string(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Use a non-default mount.
    #[must_use]
    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }
}

#[async_trait]
impl LoginMethod for UserPassLogin {
    fn kind(&self) -> &'static str {
        "userpass"
    }

    fn build_login_parameters(&self) -> Map<String, Value> {
        password_parameters(&self.password)
    }

    fn authentication_mount_path(&self) -> String {
        mount_path(&self.mount, &format!("login/{}", self.username))
    }
}

/// Directory credentials against an `ldap` engine.
#[derive(Debug, Clone)]
pub struct LdapLogin {
    mount: String,
    username: String,
    password: SecretString,
}

impl LdapLogin {
    /// Log in as `username` at the default `ldap` mount.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mount: "ldap".to_string(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Use a non-default mount.
    #[must_use]
    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }
}

#[async_trait]
impl LoginMethod for LdapLogin {
    fn kind(&self) -> &'static str {
        "ldap"
    }

    fn build_login_parameters(&self) -> Map<String, Value> {
        password_parameters(&self.password)
    }

    fn authentication_mount_path(&self) -> String {
        mount_path(&self.mount, &format!("login/{}", self.username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_login_has_no_exchange() {
        let login = TokenLogin::new("s.abc");
        assert!(login.build_login_parameters().is_empty());
        assert!(login.authentication_mount_path().is_empty());
    }

    #[test]
    fn test_approle_parameters() {
        let login = AppRoleLogin::new("role-1", "secret-1").with_mount("/team-approle/");
        let params = login.build_login_parameters();
        assert_eq!(params["role_id"], "role-1");
        assert_eq!(params["secret_id"], "secret-1");
        assert_eq!(login.authentication_mount_path(), "team-approle/login");
    }

    #[test]
    fn test_userpass_and_ldap_paths() {
        let userpass = UserPassLogin::new("alice", "pw");
        assert_eq!(userpass.authentication_mount_path(), "userpass/login/alice");
        assert_eq!(userpass.build_login_parameters()["password"], "pw");

        let ldap = LdapLogin::new("bob", "pw").with_mount("corp-ldap");
        assert_eq!(ldap.authentication_mount_path(), "corp-ldap/login/bob");
    }

    #[test]
    fn test_secrets_not_in_debug() {
        let approle = format!("{:?}", AppRoleLogin::new("role-1", "very-secret"));
        assert!(!approle.contains("very-secret"));
        let token = format!("{:?}", TokenLogin::new("s.hidden"));
        assert!(!token.contains("s.hidden"));
    }

    #[test]
    fn test_login_response_to_token() {
        let response: LoginResponse = serde_json::from_value(json!({
            "client_token": "s.issued",
            "accessor": "acc-1",
            "policies": ["default", "app"],
            "identity_policies": null,
            "metadata": {"role_name": "app"},
            "lease_duration": 3600,
            "renewable": true,
            "entity_id": "ent-1",
            "token_type": "service",
            "orphan": true
        }))
        .unwrap();

        let token = response.to_token();
        assert_eq!(token.id(), "s.issued");
        assert_eq!(token.accessor(), "acc-1");
        assert!(token.policies().contains("app"));
        assert!(token.identity_policies().is_empty());
        assert_eq!(token.metadata()["role_name"], "app");
        assert!(token.is_renewable());
        assert!(token.is_orphan());
        assert_eq!(token.ttl(), 3600);
        assert!(!format!("{response:?}").contains("s.issued"));
    }

    struct Unmounted;

    #[async_trait]
    impl LoginMethod for Unmounted {
        fn kind(&self) -> &'static str {
            "unmounted"
        }

        fn build_login_parameters(&self) -> Map<String, Value> {
            Map::new()
        }

        fn authentication_mount_path(&self) -> String {
            String::new()
        }
    }

    #[test]
    fn test_default_exchange_requires_mount_path() {
        let transport =
            HttpTransport::new(&crate::config::VaultConfig::default()).unwrap();
        let result = tokio_test::block_on(Unmounted.perform_connection(&transport));
        assert!(matches!(result, Err(VaultError::InvalidArgument(_))));
    }

    #[test]
    fn test_connector_starts_not_connected() {
        let mut connector = LoginConnector::new(TokenLogin::new("s.abc"));
        assert_eq!(connector.state(), ConnectionState::NotConnected);
        assert!(connector.last_response().is_none());
        connector.reset();
        assert_eq!(connector.state(), ConnectionState::NotConnected);
    }
}
