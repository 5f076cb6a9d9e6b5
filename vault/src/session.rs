//! Active token ownership.
//!
//! The session is the only writer of the transport's token slot. Swaps
//! replace one `Arc<Token>` under a write lock, so a call sees either the
//! old token or the new one, never a mix.

use crate::{
    error::{VaultError, VaultResult},
    token::Token,
    transport::HttpTransport,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, instrument};

/// Path returning the record of the calling token.
pub const LOOKUP_SELF_PATH: &str = "auth/token/lookup-self";
/// Path extending the TTL of the calling token.
pub const RENEW_SELF_PATH: &str = "auth/token/renew-self";

/// Owner of the token that authorizes outbound calls.
#[derive(Debug, Clone)]
pub struct TokenSession {
    transport: HttpTransport,
}

impl TokenSession {
    /// Create a session over `transport`. Starts without a token.
    #[must_use]
    pub const fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Transport whose auth header this session controls.
    #[must_use]
    pub const fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Make `token` the active token and return the one it replaced.
    ///
    /// Calls dispatched after this returns use the new token; calls
    /// already in flight keep the one they started with.
    pub async fn set_active_token(&self, token: Token) -> Option<Arc<Token>> {
        let token = Arc::new(token);
        info!(accessor = token.accessor(), "Active token replaced");
        self.transport.replace_token(Some(token)).await
    }

    /// Snapshot of the active token.
    pub async fn active_token(&self) -> Option<Arc<Token>> {
        self.transport.current_token().await
    }

    /// Drop the active token; later calls go out unauthenticated.
    pub async fn clear(&self) -> Option<Arc<Token>> {
        self.transport.replace_token(None).await
    }

    /// Read the active token's record from the backend without storing it.
    ///
    /// # Errors
    ///
    /// `NoActiveToken` without a token, otherwise any transport error.
    pub async fn lookup_self(&self) -> VaultResult<Token> {
        let current = self.active_token().await.ok_or(VaultError::NoActiveToken)?;
        self.transport
            .get_as(LOOKUP_SELF_PATH, current.id())
            .await?
            .typed()
    }

    /// Re-read the active token and update its mutable fields.
    ///
    /// Id, accessor and creation time are preserved. If another caller
    /// swapped the token while the lookup was in flight, the newer token
    /// is left in place and the refreshed copy is only returned.
    ///
    /// # Errors
    ///
    /// `NoActiveToken` without a token, otherwise any transport error. The
    /// session is unchanged on error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> VaultResult<Arc<Token>> {
        let current = self.active_token().await.ok_or(VaultError::NoActiveToken)?;
        let fresh: Token = self
            .transport
            .get_as(LOOKUP_SELF_PATH, current.id())
            .await?
            .typed()?;

        let mut updated = Token::clone(&current);
        updated.refresh_from(fresh);
        let updated = Arc::new(updated);

        if self
            .transport
            .replace_token_if(&current, Arc::clone(&updated))
            .await
        {
            debug!(accessor = updated.accessor(), ttl = updated.ttl(), "Active token refreshed");
        } else {
            debug!("Active token replaced during refresh; keeping the newer token");
        }
        Ok(updated)
    }

    /// Extend the active token's TTL, then refresh it.
    ///
    /// # Errors
    ///
    /// `NoActiveToken` without a token, otherwise any transport error.
    pub async fn renew_self(&self, increment: Option<Duration>) -> VaultResult<Arc<Token>> {
        if self.active_token().await.is_none() {
            return Err(VaultError::NoActiveToken);
        }
        let body = increment.map(|i| json!({ "increment": format!("{}s", i.as_secs()) }));
        self.transport.post(RENEW_SELF_PATH, body.as_ref()).await?;
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultConfig;

    fn session() -> TokenSession {
        let transport = HttpTransport::new(&VaultConfig::default()).unwrap();
        TokenSession::new(transport)
    }

    #[tokio::test]
    async fn test_set_and_clear() {
        let session = session();
        assert!(session.active_token().await.is_none());

        assert!(session.set_active_token(Token::from_id("first")).await.is_none());
        let previous = session.set_active_token(Token::from_id("second")).await;
        assert_eq!(previous.unwrap().id(), "first");
        assert_eq!(session.active_token().await.unwrap().id(), "second");

        assert!(session.clear().await.is_some());
        assert!(session.active_token().await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_token() {
        let session = session();
        assert!(matches!(session.refresh().await, Err(VaultError::NoActiveToken)));
        assert!(matches!(session.lookup_self().await, Err(VaultError::NoActiveToken)));
        assert!(matches!(session.renew_self(None).await, Err(VaultError::NoActiveToken)));
    }

    #[tokio::test]
    async fn test_clones_share_the_slot() {
        let session = session();
        let other = session.clone();
        other.set_active_token(Token::from_id("shared")).await;
        assert_eq!(session.active_token().await.unwrap().id(), "shared");
    }
}
