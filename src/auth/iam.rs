//! IBM Cloud IAM token exchange.
//!
//! Trades an IBM Cloud API key for a short-lived bearer token at
//! `{iam_url}/identity/token`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{AuthScheme, Credential, TokenAuthenticator, TokenSource};
use crate::config::{DEFAULT_IAM_URL, IAM_GRANT_TYPE, IAM_TOKEN_PATH, REQUEST_TIMEOUT};
use crate::error::{Error, Result};
use crate::response::{RawResponse, service_error};
use crate::validation::{validate_credential, validate_service_url};

/// Bearer-token authenticator for IBM Cloud IAM.
pub type IamAuthenticator = TokenAuthenticator<IamTokenSource>;

impl TokenAuthenticator<IamTokenSource> {
    /// IAM authenticator for `apikey` against the public IAM endpoint.
    pub fn iam(apikey: impl Into<String>) -> Result<Self> {
        Ok(Self::new(IamTokenSource::builder(apikey).build()?))
    }
}

/// Token response from the IAM identity service.
#[derive(Debug, Clone, Deserialize)]
pub struct IamTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: i64,
    /// Unix timestamp.
    pub expiration: i64,
}

impl IamTokenResponse {
    pub fn into_credential(self) -> Credential {
        Credential::expiring(self.access_token, self.expiration, self.expires_in)
    }
}

/// Fetches tokens from IAM with an API key.
#[derive(Clone)]
pub struct IamTokenSource {
    apikey: String,
    token_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    scope: Option<String>,
    client: reqwest::Client,
}

impl IamTokenSource {
    pub fn builder(apikey: impl Into<String>) -> IamTokenSourceBuilder {
        IamTokenSourceBuilder {
            apikey: apikey.into(),
            url: DEFAULT_IAM_URL.to_string(),
            client_id: None,
            client_secret: None,
            scope: None,
            client: None,
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

impl std::fmt::Debug for IamTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamTokenSource")
            .field("apikey", &"<redacted>")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .finish()
    }
}

#[async_trait]
impl TokenSource for IamTokenSource {
    async fn fetch(&self) -> Result<Credential> {
        debug!(url = %self.token_url, "Requesting IAM token");

        let mut form = vec![
            ("grant_type", IAM_GRANT_TYPE),
            ("apikey", self.apikey.as_str()),
            ("response_type", "cloud_iam"),
        ];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }

        let mut request = self
            .client
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form);
        if let (Some(id), Some(secret)) = (&self.client_id, &self.client_secret) {
            request = request.basic_auth(id, Some(secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::authentication(format!("IAM token request failed: {e}"), None))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::authentication(format!("IAM token request failed: {e}"), None))?;

        let raw = RawResponse::new(status, headers, body);
        if !raw.is_success() {
            let error = service_error(raw);
            warn!(status, message = %error.message, "IAM token request rejected");
            return Err(Error::authentication(
                format!("IAM token request returned {}", error),
                Some(status),
            ));
        }

        let token: IamTokenResponse = serde_json::from_slice(&raw.body).map_err(|e| {
            Error::authentication(format!("Failed to parse IAM token response: {e}"), Some(status))
        })?;
        Ok(token.into_credential())
    }

    fn name(&self) -> &str {
        "iam"
    }

    fn scheme(&self) -> AuthScheme {
        AuthScheme::Iam
    }

    fn validate(&self) -> Result<()> {
        validate_credential("apikey", &self.apikey)?;
        validate_service_url("iam_url", &self.token_url)?;
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => {
                validate_credential("client_id", id)?;
                validate_credential("client_secret", secret)
            }
            (None, None) => Ok(()),
            _ => Err(Error::invalid(
                "client_id",
                "client_id and client_secret must be supplied together",
            )),
        }
    }
}

/// Builder for [`IamTokenSource`].
#[derive(Debug)]
pub struct IamTokenSourceBuilder {
    apikey: String,
    url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    scope: Option<String>,
    client: Option<reqwest::Client>,
}

impl IamTokenSourceBuilder {
    /// IAM base URL (`https://iam.cloud.ibm.com`) or the full token URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Client credentials sent as basic auth on the token request.
    pub fn client_credentials(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self.client_secret = Some(secret.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Reuse an existing HTTP client for token requests.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<IamTokenSource> {
        let client = match self.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?,
        };
        let source = IamTokenSource {
            apikey: self.apikey,
            token_url: token_url(&self.url),
            client_id: self.client_id,
            client_secret: self.client_secret,
            scope: self.scope,
            client,
        };
        source.validate()?;
        Ok(source)
    }
}

fn token_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(IAM_TOKEN_PATH) {
        base.to_string()
    } else {
        format!("{base}{IAM_TOKEN_PATH}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url() {
        assert_eq!(
            token_url("https://iam.cloud.ibm.com"),
            "https://iam.cloud.ibm.com/identity/token"
        );
        assert_eq!(
            token_url("https://iam.test/identity/token/"),
            "https://iam.test/identity/token"
        );
    }

    #[test]
    fn test_default_url() {
        let source = IamTokenSource::builder("key").build().unwrap();
        assert_eq!(source.token_url(), "https://iam.cloud.ibm.com/identity/token");
        assert_eq!(source.scheme(), AuthScheme::Iam);
    }

    #[test]
    fn test_client_credentials_must_be_paired() {
        let mut builder = IamTokenSource::builder("key");
        builder.client_id = Some("bx".into());
        assert!(matches!(
            builder.build(),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_rejects_placeholder_apikey() {
        assert!(IamTokenSource::builder("{apikey}").build().is_err());
        assert!(IamTokenSource::builder("").build().is_err());
    }

    #[test]
    fn test_token_response_refresh_window() {
        let now = chrono::Utc::now().timestamp();
        let token: IamTokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "eyJ...",
            "refresh_token": "not-used",
            "token_type": "Bearer",
            "expires_in": 3600,
            "expiration": now + 3600,
        }))
        .unwrap();
        let credential = token.into_credential();
        assert_eq!(credential.refresh_at(), Some(now + 3600 - 720));
        assert!(!credential.needs_refresh());
    }

    #[test]
    fn test_debug_hides_apikey() {
        let source = IamTokenSource::builder("very-secret").build().unwrap();
        assert!(!format!("{source:?}").contains("very-secret"));
    }
}
