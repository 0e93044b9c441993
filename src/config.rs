//! SDK constants and file-based service configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::auth::{
    ApiKeyAuthenticator, ApiKeyPlacement, Authenticator, BasicAuthenticator,
    BearerTokenAuthenticator, CloudPakSecret, CloudPakTokenSource, IamTokenSource,
    NoAuthAuthenticator, TokenAuthenticator,
};
use crate::error::{Error, Result};
use crate::validation::validate_service_url;

// ── Constants ────────────────────────────────────────────────────────

/// Name reported in `User-Agent`.
pub const SDK_NAME: &str = "watson-apis-rust-sdk";

/// TCP connect timeout for the default transport.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-request timeout for the default transport.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A token this close to expiry is treated as expired.
pub const EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// Fraction of a token's lifetime left when a refresh becomes due.
pub const REFRESH_WINDOW_FRACTION: f64 = 0.2;

/// Public IBM Cloud IAM endpoint.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

pub const IAM_TOKEN_PATH: &str = "/identity/token";

pub const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

pub const CLOUD_PAK_AUTHORIZE_PATH: &str = "/v1/authorize";

// ── File configuration ───────────────────────────────────────────────

/// Service settings loaded from TOML.
///
/// ```toml
/// [services.assistant]
/// url = "https://api.us-south.assistant.watson.cloud.ibm.com"
/// version = "2020-04-01"
///
/// [services.assistant.auth]
/// type = "iam"
/// apikey = "..."
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SdkConfig {
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSettings>,
}

impl SdkConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SdkConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        for (name, settings) in &config.services {
            settings
                .validate()
                .map_err(|e| Error::Config(format!("[services.{name}]: {e}")))?;
        }
        Ok(config)
    }

    /// Settings for one service.
    pub fn service(&self, name: &str) -> Result<&ServiceSettings> {
        self.services
            .get(name)
            .ok_or_else(|| Error::Config(format!("no [services.{name}] section")))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    pub url: String,
    /// API version date sent as the `version` query argument.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub disable_ssl_verification: bool,
    /// Headers added to every request of this service.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl ServiceSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        validate_service_url("url", &self.url)?;
        if self.timeout_secs == Some(0) {
            return Err(Error::invalid("timeout_secs", "must be greater than zero"));
        }
        self.auth.validate()
    }
}

/// Authentication settings, tagged by `type`.
#[derive(Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthSettings {
    #[default]
    None,
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
    ApiKey {
        apikey: String,
        #[serde(default)]
        header: Option<String>,
        #[serde(default)]
        query: Option<String>,
    },
    Iam {
        apikey: String,
        #[serde(default = "default_iam_url")]
        url: String,
        #[serde(default)]
        client_id: Option<String>,
        #[serde(default)]
        client_secret: Option<String>,
        #[serde(default)]
        scope: Option<String>,
    },
    CloudPak {
        url: String,
        username: String,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        apikey: Option<String>,
    },
}

fn default_iam_url() -> String {
    DEFAULT_IAM_URL.to_string()
}

impl AuthSettings {
    pub fn type_name(&self) -> &'static str {
        match self {
            AuthSettings::None => "none",
            AuthSettings::Bearer { .. } => "bearer",
            AuthSettings::Basic { .. } => "basic",
            AuthSettings::ApiKey { .. } => "api_key",
            AuthSettings::Iam { .. } => "iam",
            AuthSettings::CloudPak { .. } => "cloud_pak",
        }
    }

    /// Check the settings without building anything.
    pub fn validate(&self) -> Result<()> {
        match self {
            AuthSettings::ApiKey { header, query, .. } => {
                api_key_placement(header.as_deref(), query.as_deref()).map(|_| ())
            }
            AuthSettings::CloudPak {
                password, apikey, ..
            } => cloud_pak_secret(password.as_deref(), apikey.as_deref()).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Construct the authenticator these settings describe.
    pub fn build_authenticator(&self) -> Result<Arc<dyn Authenticator>> {
        let auth: Arc<dyn Authenticator> = match self {
            AuthSettings::None => Arc::new(NoAuthAuthenticator),
            AuthSettings::Bearer { token } => Arc::new(BearerTokenAuthenticator::new(token)?),
            AuthSettings::Basic { username, password } => {
                Arc::new(BasicAuthenticator::new(username, password)?)
            }
            AuthSettings::ApiKey {
                apikey,
                header,
                query,
            } => Arc::new(ApiKeyAuthenticator::new(
                apikey,
                api_key_placement(header.as_deref(), query.as_deref())?,
            )?),
            AuthSettings::Iam {
                apikey,
                url,
                client_id,
                client_secret,
                scope,
            } => {
                let mut builder = IamTokenSource::builder(apikey).url(url);
                if let (Some(id), Some(secret)) = (client_id, client_secret) {
                    builder = builder.client_credentials(id, secret);
                } else if client_id.is_some() || client_secret.is_some() {
                    return Err(Error::invalid(
                        "client_id",
                        "client_id and client_secret must be supplied together",
                    ));
                }
                if let Some(scope) = scope {
                    builder = builder.scope(scope);
                }
                Arc::new(TokenAuthenticator::new(builder.build()?))
            }
            AuthSettings::CloudPak {
                url,
                username,
                password,
                apikey,
            } => {
                let secret = cloud_pak_secret(password.as_deref(), apikey.as_deref())?;
                Arc::new(TokenAuthenticator::new(CloudPakTokenSource::new(
                    url, username, secret,
                )?))
            }
        };
        Ok(auth)
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("type", &self.type_name())
            .finish_non_exhaustive()
    }
}

fn api_key_placement(header: Option<&str>, query: Option<&str>) -> Result<ApiKeyPlacement> {
    match (header, query) {
        (Some(header), None) => Ok(ApiKeyPlacement::Header(header.to_string())),
        (None, Some(query)) => Ok(ApiKeyPlacement::Query(query.to_string())),
        _ => Err(Error::invalid(
            "auth",
            "api_key auth needs exactly one of `header` or `query`",
        )),
    }
}

fn cloud_pak_secret(password: Option<&str>, apikey: Option<&str>) -> Result<CloudPakSecret> {
    match (password, apikey) {
        (Some(password), None) => Ok(CloudPakSecret::Password(password.to_string())),
        (None, Some(apikey)) => Ok(CloudPakSecret::ApiKey(apikey.to_string())),
        _ => Err(Error::invalid(
            "auth",
            "cloud_pak auth needs exactly one of `password` or `apikey`",
        )),
    }
}
