//! Cloud Pak for Data token exchange.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{AuthScheme, Credential, TokenAuthenticator, TokenSource};
use crate::config::{CLOUD_PAK_AUTHORIZE_PATH, REQUEST_TIMEOUT};
use crate::error::{Error, Result};
use crate::response::{RawResponse, service_error};
use crate::validation::{validate_credential, validate_service_url};

/// Bearer-token authenticator for Cloud Pak for Data.
pub type CloudPakAuthenticator = TokenAuthenticator<CloudPakTokenSource>;

impl TokenAuthenticator<CloudPakTokenSource> {
    pub fn cloud_pak(
        url: impl Into<String>,
        username: impl Into<String>,
        secret: CloudPakSecret,
    ) -> Result<Self> {
        Ok(Self::new(CloudPakTokenSource::new(url, username, secret)?))
    }
}

/// Secret presented with the username.
#[derive(Clone, PartialEq, Eq)]
pub enum CloudPakSecret {
    Password(String),
    ApiKey(String),
}

impl std::fmt::Debug for CloudPakSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudPakSecret::Password(_) => f.write_str("Password(<redacted>)"),
            CloudPakSecret::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

/// Fetches tokens from `{url}/v1/authorize`.
#[derive(Debug, Clone)]
pub struct CloudPakTokenSource {
    authorize_url: String,
    username: String,
    secret: CloudPakSecret,
    client: reqwest::Client,
}

impl CloudPakTokenSource {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        secret: CloudPakSecret,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Self::with_client(url, username, secret, client)
    }

    pub fn with_client(
        url: impl Into<String>,
        username: impl Into<String>,
        secret: CloudPakSecret,
        client: reqwest::Client,
    ) -> Result<Self> {
        let url = url.into();
        let base = url.trim_end_matches('/');
        let authorize_url = if base.ends_with(CLOUD_PAK_AUTHORIZE_PATH) {
            base.to_string()
        } else {
            format!("{base}{CLOUD_PAK_AUTHORIZE_PATH}")
        };
        let source = Self {
            authorize_url,
            username: username.into(),
            secret,
            client,
        };
        source.validate()?;
        Ok(source)
    }

    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }
}

#[async_trait]
impl TokenSource for CloudPakTokenSource {
    async fn fetch(&self) -> Result<Credential> {
        debug!(url = %self.authorize_url, "Requesting Cloud Pak token");

        let body = match &self.secret {
            CloudPakSecret::Password(password) => {
                json!({ "username": self.username, "password": password })
            }
            CloudPakSecret::ApiKey(api_key) => {
                json!({ "username": self.username, "api_key": api_key })
            }
        };

        let response = self
            .client
            .post(&self.authorize_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Error::authentication(format!("Cloud Pak token request failed: {e}"), None)
            })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| {
            Error::authentication(format!("Cloud Pak token request failed: {e}"), None)
        })?;

        let raw = RawResponse::new(status, headers, bytes);
        if !raw.is_success() {
            let error = service_error(raw);
            warn!(status, message = %error.message, "Cloud Pak token request rejected");
            return Err(Error::authentication(
                format!("Cloud Pak token request returned {error}"),
                Some(status),
            ));
        }

        let parsed: AuthorizeResponse = serde_json::from_slice(&raw.body).map_err(|e| {
            Error::authentication(
                format!("Failed to parse Cloud Pak token response: {e}"),
                Some(status),
            )
        })?;
        credential_from_jwt(parsed.token)
    }

    fn name(&self) -> &str {
        "cp4d"
    }

    fn scheme(&self) -> AuthScheme {
        AuthScheme::CloudPak
    }

    fn validate(&self) -> Result<()> {
        validate_service_url("url", &self.authorize_url)?;
        validate_credential("username", &self.username)?;
        match &self.secret {
            CloudPakSecret::Password(password) => validate_credential("password", password),
            CloudPakSecret::ApiKey(api_key) => validate_credential("apikey", api_key),
        }
    }
}

/// Derive expiry from the token's `exp`/`iat` claims.
fn credential_from_jwt(token: String) -> Result<Credential> {
    let claims = token
        .split('.')
        .nth(1)
        .and_then(|payload| URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok())
        .and_then(|bytes| serde_json::from_slice::<JwtClaims>(&bytes).ok())
        .ok_or_else(|| {
            Error::authentication("Cloud Pak token is not a JWT with an exp claim", None)
        })?;

    let lifetime = claims.iat.map(|iat| claims.exp - iat).unwrap_or(0);
    Ok(Credential::expiring(token, claims.exp, lifetime))
}

#[cfg(test)]
pub(crate) fn test_jwt(iat: i64, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "iat": iat, "exp": exp, "sub": "admin" }).to_string());
    format!("{header}.{payload}.signature")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_expiry() {
        let now = chrono::Utc::now().timestamp();
        let credential = credential_from_jwt(test_jwt(now, now + 1000)).unwrap();
        assert_eq!(credential.expires_at(), Some(now + 1000));
        assert_eq!(credential.refresh_at(), Some(now + 800));
    }

    #[test]
    fn test_non_jwt_token_rejected() {
        let err = credential_from_jwt("opaque-token".into()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Authentication);
    }

    #[test]
    fn test_authorize_url() {
        let source = CloudPakTokenSource::new(
            "https://cpd.example.com/icp4d-api/",
            "admin",
            CloudPakSecret::Password("pw".into()),
        )
        .unwrap();
        assert_eq!(
            source.authorize_url(),
            "https://cpd.example.com/icp4d-api/v1/authorize"
        );
    }

    #[test]
    fn test_validation() {
        assert!(
            CloudPakTokenSource::new("", "admin", CloudPakSecret::ApiKey("k".into())).is_err()
        );
        assert!(
            CloudPakTokenSource::new(
                "https://cpd.example.com",
                "admin",
                CloudPakSecret::ApiKey("".into())
            )
            .is_err()
        );
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = CloudPakSecret::Password("hunter2".into());
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
