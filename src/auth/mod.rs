//! Request authentication.
//!
//! An [`Authenticator`] decorates a built [`PendingRequest`] with credentials
//! before it is sent. Static schemes (basic, bearer, API key) never do I/O;
//! token schemes ([`IamAuthenticator`], [`CloudPakAuthenticator`]) fetch and
//! cache tokens through a [`TokenManager`].

mod api_key;
mod basic;
mod bearer;
mod cloud_pak;
mod credential;
mod iam;
mod token_manager;

use async_trait::async_trait;

pub use api_key::{ApiKeyAuthenticator, ApiKeyPlacement};
pub use basic::BasicAuthenticator;
pub use bearer::BearerTokenAuthenticator;
pub use cloud_pak::{CloudPakAuthenticator, CloudPakSecret, CloudPakTokenSource};
pub use credential::Credential;
pub use iam::{IamAuthenticator, IamTokenResponse, IamTokenSource, IamTokenSourceBuilder};
pub use token_manager::{TokenAuthenticator, TokenManager, TokenSource};

use crate::error::Result;
use crate::request::PendingRequest;

/// Authentication scheme, mostly for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    NoAuth,
    Basic,
    BearerToken,
    ApiKey,
    Iam,
    CloudPak,
}

impl AuthScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthScheme::NoAuth => "noauth",
            AuthScheme::Basic => "basic",
            AuthScheme::BearerToken => "bearertoken",
            AuthScheme::ApiKey => "apikey",
            AuthScheme::Iam => "iam",
            AuthScheme::CloudPak => "cp4d",
        }
    }
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adds credentials to an outgoing request.
///
/// `authenticate` may perform I/O (token exchange) and may be called
/// concurrently from many tasks. It must not touch the request body.
#[async_trait]
pub trait Authenticator: Send + Sync + std::fmt::Debug {
    fn scheme(&self) -> AuthScheme;

    /// Check configuration without doing any I/O.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn authenticate(&self, request: PendingRequest) -> Result<PendingRequest>;
}

/// Blanket impl for `Arc<T>`.
#[async_trait]
impl<T: Authenticator + ?Sized> Authenticator for std::sync::Arc<T> {
    fn scheme(&self) -> AuthScheme {
        (**self).scheme()
    }

    fn validate(&self) -> Result<()> {
        (**self).validate()
    }

    async fn authenticate(&self, request: PendingRequest) -> Result<PendingRequest> {
        (**self).authenticate(request).await
    }
}

/// Sends requests unchanged. For services behind a gateway that handles auth.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthAuthenticator;

#[async_trait]
impl Authenticator for NoAuthAuthenticator {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::NoAuth
    }

    async fn authenticate(&self, request: PendingRequest) -> Result<PendingRequest> {
        Ok(request)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::request::{HttpMethod, PendingRequest, RequestBuilder};

    pub fn request() -> PendingRequest {
        RequestBuilder::new(HttpMethod::Get, "https://api.example.com", "/v1/things")
            .with_argument("version", "2020-04-01")
            .build()
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_auth_leaves_request_untouched() {
        let before = test_support::request();
        let after = NoAuthAuthenticator.authenticate(before.clone()).await.unwrap();
        assert_eq!(before.headers(), after.headers());
        assert_eq!(before.full_url(), after.full_url());
    }

    #[tokio::test]
    async fn test_arc_delegates() {
        let auth: std::sync::Arc<dyn Authenticator> =
            std::sync::Arc::new(BasicAuthenticator::new("user", "pass").unwrap());
        assert_eq!(auth.scheme(), AuthScheme::Basic);
        let request = auth.authenticate(test_support::request()).await.unwrap();
        assert!(request.header("authorization").is_some());
    }
}
