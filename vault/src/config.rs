//! Vault client configuration.

use crate::error::{VaultError, VaultResult};
use reqwest::{Client, ClientBuilder};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Vault client configuration.
///
/// Passed explicitly to whatever builds the transport; nothing here is
/// read from global state unless [`VaultConfig::from_env`] is called.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address, without the `/v1` prefix
    pub addr: String,
    /// Enterprise namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,
    /// Token to validate on connect
    pub token: Option<SecretString>,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Pool idle timeout
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
    /// User agent string
    pub user_agent: String,
    /// Skip TLS certificate verification (local dev servers only)
    pub accept_invalid_certs: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            addr: "http://127.0.0.1:8200".to_string(),
            namespace: None,
            token: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: concat!("vault-core/", env!("CARGO_PKG_VERSION")).to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl VaultConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Build a configuration from the standard `VAULT_*` variables.
    ///
    /// Reads `VAULT_ADDR`, `VAULT_NAMESPACE`, `VAULT_TOKEN`,
    /// `VAULT_SKIP_VERIFY` and `VAULT_CLIENT_TIMEOUT` (seconds). Unset
    /// variables keep their defaults.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `VAULT_CLIENT_TIMEOUT` is not a number or the
    /// resulting configuration fails [`VaultConfig::validate`].
    pub fn from_env() -> VaultResult<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("VAULT_ADDR") {
            config.addr = addr;
        }
        config.namespace = std::env::var("VAULT_NAMESPACE").ok().filter(|s| !s.is_empty());
        config.token = std::env::var("VAULT_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .map(SecretString::from);
        if let Ok(skip) = std::env::var("VAULT_SKIP_VERIFY") {
            config.accept_invalid_certs = matches!(skip.as_str(), "1" | "true" | "TRUE" | "True");
        }
        if let Ok(secs) = std::env::var("VAULT_CLIENT_TIMEOUT") {
            let secs: u64 = secs.parse().map_err(|_| {
                VaultError::invalid_argument(format!("VAULT_CLIENT_TIMEOUT is not a number: {secs}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the namespace header.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the token validated on connect.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Set user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Accept self-signed certificates.
    #[must_use]
    pub const fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Base URL all request paths are joined onto (`<addr>/v1/`).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `addr` is not an http(s) URL.
    pub fn api_base(&self) -> VaultResult<Url> {
        let mut url = Url::parse(&self.addr)
            .map_err(|e| VaultError::invalid_argument(format!("invalid Vault address {}: {e}", self.addr)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(VaultError::invalid_argument(format!(
                "Vault address must use http or https: {}",
                self.addr
            )));
        }
        let base = format!("{}/v1/", url.path().trim_end_matches('/'));
        url.set_path(&base);
        Ok(url)
    }

    /// Check the configuration for values that cannot work.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on a bad address or a zero timeout.
    pub fn validate(&self) -> VaultResult<()> {
        self.api_base()?;
        if self.timeout.is_zero() {
            return Err(VaultError::invalid_argument("timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Build the HTTP client for `config`.
///
/// # Errors
///
/// Returns an error if the client cannot be built (e.g., TLS
/// initialization fails).
pub fn build_http_client(config: &VaultConfig) -> Result<Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .use_rustls_tls()
        .build()
}
