//! HTTP basic authentication.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{AuthScheme, Authenticator};
use crate::error::Result;
use crate::request::PendingRequest;
use crate::validation::validate_credential;

/// Sends `Authorization: Basic base64(username:password)`.
#[derive(Clone)]
pub struct BasicAuthenticator {
    username: String,
    password: String,
}

impl BasicAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let auth = Self {
            username: username.into(),
            password: password.into(),
        };
        auth.validate()?;
        Ok(auth)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn header_value(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {encoded}")
    }
}

impl std::fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::Basic
    }

    fn validate(&self) -> Result<()> {
        validate_credential("username", &self.username)?;
        validate_credential("password", &self.password)
    }

    async fn authenticate(&self, request: PendingRequest) -> Result<PendingRequest> {
        request.with_sensitive_header(reqwest::header::AUTHORIZATION.as_str(), &self.header_value())
    }
}
