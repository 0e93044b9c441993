//! Static API key in a header or query argument.

use async_trait::async_trait;

use super::{AuthScheme, Authenticator};
use crate::error::Result;
use crate::request::PendingRequest;
use crate::validation::{require_non_empty, validate_credential};

/// Where an API key is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyPlacement {
    /// Header name, e.g. `X-Watson-Authorization-Token`.
    Header(String),
    /// Query argument name, e.g. `api_key`.
    Query(String),
}

#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    key: String,
    placement: ApiKeyPlacement,
}

impl ApiKeyAuthenticator {
    pub fn new(key: impl Into<String>, placement: ApiKeyPlacement) -> Result<Self> {
        let auth = Self {
            key: key.into(),
            placement,
        };
        auth.validate()?;
        Ok(auth)
    }

    pub fn header(key: impl Into<String>, header: impl Into<String>) -> Result<Self> {
        Self::new(key, ApiKeyPlacement::Header(header.into()))
    }

    pub fn query(key: impl Into<String>, argument: impl Into<String>) -> Result<Self> {
        Self::new(key, ApiKeyPlacement::Query(argument.into()))
    }

    pub fn placement(&self) -> &ApiKeyPlacement {
        &self.placement
    }
}

impl std::fmt::Debug for ApiKeyAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuthenticator")
            .field("key", &"<redacted>")
            .field("placement", &self.placement)
            .finish()
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::ApiKey
    }

    fn validate(&self) -> Result<()> {
        validate_credential("apikey", &self.key)?;
        match &self.placement {
            ApiKeyPlacement::Header(name) => require_non_empty("header", name),
            ApiKeyPlacement::Query(name) => require_non_empty("query", name),
        }
    }

    async fn authenticate(&self, request: PendingRequest) -> Result<PendingRequest> {
        match &self.placement {
            ApiKeyPlacement::Header(name) => request.with_sensitive_header(name, &self.key),
            ApiKeyPlacement::Query(name) => Ok(request.with_argument(name, self.key.as_str())),
        }
    }
}
