//! User-managed bearer token.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AuthScheme, Authenticator};
use crate::error::Result;
use crate::request::PendingRequest;
use crate::validation::validate_credential;

/// Sends `Authorization: Bearer <token>` with a token the caller manages.
///
/// The token can be replaced at runtime with [`set_token`](Self::set_token);
/// requests already authenticated keep the old value.
#[derive(Debug)]
pub struct BearerTokenAuthenticator {
    token: RwLock<String>,
}

impl BearerTokenAuthenticator {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        validate_credential("bearer_token", &token)?;
        Ok(Self {
            token: RwLock::new(token),
        })
    }

    /// Replace the token used by subsequent requests.
    pub async fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        validate_credential("bearer_token", &token)?;
        *self.token.write().await = token;
        Ok(())
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::BearerToken
    }

    async fn authenticate(&self, request: PendingRequest) -> Result<PendingRequest> {
        let value = format!("Bearer {}", self.token.read().await);
        request.with_sensitive_header(reqwest::header::AUTHORIZATION.as_str(), &value)
    }
}
