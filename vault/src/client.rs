//! Vault client facade tying configuration, transport and session together.

use crate::{
    config::VaultConfig,
    error::VaultResult,
    login::{LoginConnector, LoginMethod, TokenLogin},
    session::TokenSession,
    transport::HttpTransport,
};
use tracing::instrument;

/// Entry point for callers: one transport, one session.
#[derive(Debug, Clone)]
pub struct VaultClient {
    config: VaultConfig,
    session: TokenSession,
}

impl VaultClient {
    /// Create a new Vault client. No token is active until a connect
    /// succeeds.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unusable configuration, `Http` when the
    /// HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            config,
            session: TokenSession::new(transport),
        })
    }

    /// Configuration the client was built from.
    #[must_use]
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Transport for issuing calls.
    #[must_use]
    pub const fn transport(&self) -> &HttpTransport {
        self.session.transport()
    }

    /// Session holding the active token.
    #[must_use]
    pub const fn session(&self) -> &TokenSession {
        &self.session
    }

    /// Authenticate with `method` and make the resulting token active.
    ///
    /// Returns `Ok(false)` when the backend refused the credential.
    ///
    /// # Errors
    ///
    /// Any error other than a refused credential.
    pub async fn connect<M: LoginMethod>(&self, method: M) -> VaultResult<bool> {
        LoginConnector::new(method).connect(&self.session).await
    }

    /// Validate the token from the configuration, if there is one.
    ///
    /// Returns `Ok(false)` when no token is configured or it was refused.
    ///
    /// # Errors
    ///
    /// Any error other than a refused credential.
    #[instrument(skip(self))]
    pub async fn connect_with_configured_token(&self) -> VaultResult<bool> {
        match &self.config.token {
            Some(token) => self.connect(TokenLogin::from_secret(token.clone())).await,
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_client_has_no_token() {
        let client = VaultClient::new(VaultConfig::default()).unwrap();
        assert!(client.session().active_token().await.is_none());
        assert_eq!(client.transport().base_url().as_str(), "http://127.0.0.1:8200/v1/");
    }

    #[tokio::test]
    async fn test_no_configured_token() {
        let client = VaultClient::new(VaultConfig::default()).unwrap();
        assert!(!client.connect_with_configured_token().await.unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(VaultClient::new(VaultConfig::new("nope")).is_err());
    }
}
