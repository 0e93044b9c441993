//! The shared call pipeline every facade delegates to.
//!
//! `BaseService::invoke` runs one call through
//! build → authenticate → send → map, inside a `watson_call` tracing span.

use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, debug, debug_span, warn};

use crate::auth::Authenticator;
use crate::config::ServiceSettings;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::request::RequestBuilder;
use crate::response::{self, ResultKind, ServiceResponse};
use crate::transport::headers::{SDK_ANALYTICS_HEADER, sdk_analytics};
use crate::transport::{ReqwestTransport, Transport};
use crate::validation::validate_service_url;

/// Where a call is in the pipeline. Phases only move forward; `Failed` is
/// reachable from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Building,
    Authenticating,
    Sending,
    Mapping,
    Succeeded,
    Failed,
}

impl CallPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CallPhase::Building => "building",
            CallPhase::Authenticating => "authenticating",
            CallPhase::Sending => "sending",
            CallPhase::Mapping => "mapping",
            CallPhase::Succeeded => "succeeded",
            CallPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection details and collaborators shared by one service's operations.
///
/// Cheap to clone; clones share the authenticator and transport.
#[derive(Debug, Clone)]
pub struct BaseService {
    service_name: String,
    service_version: String,
    service_url: String,
    authenticator: Arc<dyn Authenticator>,
    transport: Arc<dyn Transport>,
    default_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl BaseService {
    /// `service_name` and `service_version` feed the SDK analytics header
    /// (e.g. `conversation`, `V2`).
    pub fn builder(
        service_name: impl Into<String>,
        service_version: impl Into<String>,
    ) -> BaseServiceBuilder {
        BaseServiceBuilder::new(service_name, service_version)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Point the service at a different URL (e.g. another region).
    pub fn set_service_url(&mut self, url: &str) -> Result<()> {
        validate_service_url("service_url", url)?;
        self.service_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Return a copy that adds `name: value` to every request.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Start a request for `endpoint` with the service URL, default headers,
    /// analytics header and timeout applied.
    pub fn request(&self, endpoint: &Endpoint) -> RequestBuilder {
        let mut builder = RequestBuilder::new(endpoint.method, &self.service_url, endpoint.path)
            .with_operation(endpoint.operation_id)
            .with_header(
                SDK_ANALYTICS_HEADER,
                &sdk_analytics(
                    &self.service_name,
                    &self.service_version,
                    endpoint.operation_id,
                ),
            )
            .with_headers(
                self.default_headers
                    .iter()
                    .map(|(n, v)| (n.as_str(), v.as_str())),
            );
        if let Some(timeout) = self.timeout {
            builder = builder.with_timeout(timeout);
        }
        builder
    }

    /// Run `endpoint`: `configure` fills in arguments and body (and checks
    /// required arguments), then the request is authenticated, sent and
    /// mapped. Any error is tagged with the endpoint's operation id.
    pub async fn invoke<K, F>(
        &self,
        endpoint: &Endpoint,
        configure: F,
    ) -> Result<ServiceResponse<K::Output>>
    where
        K: ResultKind,
        F: FnOnce(RequestBuilder) -> Result<RequestBuilder>,
    {
        let request = configure(self.request(endpoint))
            .and_then(|req| require_path_params(endpoint, req))
            .map_err(|e| e.in_operation(endpoint.operation_id))?;
        self.send::<K>(request).await
    }

    /// Authenticate, send and map a prepared request.
    pub async fn send<K: ResultKind>(
        &self,
        mut request: RequestBuilder,
    ) -> Result<ServiceResponse<K::Output>> {
        let operation = request.operation().unwrap_or("request").to_string();
        if let Some(accept) = K::ACCEPT
            && request.header("Accept").is_none()
        {
            request = request.with_header("Accept", accept);
        }

        let span = debug_span!(
            "watson_call",
            service = %self.service_name,
            operation = %operation,
            request_id = %uuid::Uuid::new_v4(),
        );

        async move {
            let mut phase = CallPhase::Building;
            let result = self.run::<K>(request, &mut phase).await;
            match &result {
                Ok(response) => {
                    debug!(phase = %CallPhase::Succeeded, status = response.status, "Call succeeded");
                }
                Err(e) => {
                    warn!(phase = %CallPhase::Failed, failed_in = %phase, error = %e, "Call failed");
                }
            }
            result.map_err(|e| e.in_operation(&operation))
        }
        .instrument(span)
        .await
    }

    async fn run<K: ResultKind>(
        &self,
        request: RequestBuilder,
        phase: &mut CallPhase,
    ) -> Result<ServiceResponse<K::Output>> {
        let pending = request.build()?;

        advance(phase, CallPhase::Authenticating);
        let pending = self.authenticator.authenticate(pending).await?;

        advance(phase, CallPhase::Sending);
        let raw = self.transport.send(pending).await?;

        advance(phase, CallPhase::Mapping);
        response::map::<K>(raw)
    }
}

/// Every `{placeholder}` of the endpoint must have been filled in.
fn require_path_params(endpoint: &Endpoint, request: RequestBuilder) -> Result<RequestBuilder> {
    if request.has_deferred_error() {
        return Ok(request);
    }
    for name in endpoint.path_params() {
        if request.path().contains(&format!("{{{name}}}")) {
            return Err(Error::missing(name));
        }
    }
    Ok(request)
}

fn advance(phase: &mut CallPhase, next: CallPhase) {
    debug!(from = %phase, to = %next, "Call phase");
    *phase = next;
}

/// Builder for [`BaseService`].
#[derive(Debug)]
pub struct BaseServiceBuilder {
    service_name: String,
    service_version: String,
    service_url: Option<String>,
    authenticator: Option<Arc<dyn Authenticator>>,
    transport: Option<Arc<dyn Transport>>,
    default_headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    disable_ssl_verification: bool,
}

impl BaseServiceBuilder {
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            service_url: None,
            authenticator: None,
            transport: None,
            default_headers: Vec::new(),
            timeout: None,
            disable_ssl_verification: false,
        }
    }

    pub fn service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Use a custom transport instead of the default reqwest one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Per-request timeout for every call of this service.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Only honoured by the default transport.
    pub fn disable_ssl_verification(mut self, disable: bool) -> Self {
        self.disable_ssl_verification = disable;
        self
    }

    /// Apply file settings: URL, headers, timeout, TLS and authenticator.
    pub fn settings(mut self, settings: &ServiceSettings) -> Result<Self> {
        self.service_url = Some(settings.url.clone());
        for (name, value) in &settings.headers {
            self.default_headers.push((name.clone(), value.clone()));
        }
        if let Some(timeout) = settings.timeout() {
            self.timeout = Some(timeout);
        }
        self.disable_ssl_verification = settings.disable_ssl_verification;
        self.authenticator = Some(settings.auth.build_authenticator()?);
        Ok(self)
    }

    pub fn build(self) -> Result<BaseService> {
        let url = self
            .service_url
            .ok_or_else(|| Error::missing("service_url"))?;
        validate_service_url("service_url", &url)?;

        let authenticator = self
            .authenticator
            .ok_or_else(|| Error::missing("authenticator"))?;
        authenticator.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::builder()
                    .disable_ssl_verification(self.disable_ssl_verification)
                    .build()?,
            ),
        };

        debug!(
            service = %self.service_name,
            url = %url,
            auth = %authenticator.scheme(),
            "Service configured"
        );

        let mut service = BaseService {
            service_name: self.service_name,
            service_version: self.service_version,
            service_url: url.trim_end_matches('/').to_string(),
            authenticator,
            transport,
            default_headers: Vec::new(),
            timeout: self.timeout,
        };
        for (name, value) in &self.default_headers {
            service = service.with_default_header(name, value);
        }
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::header::HeaderMap;
    use serde::Deserialize;

    use super::*;
    use crate::auth::{AuthScheme, BasicAuthenticator, NoAuthAuthenticator};
    use crate::error::ErrorKind;
    use crate::request::PendingRequest;
    use crate::response::{Json, RawResponse};

    #[derive(Debug)]
    struct ScriptedTransport {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<PendingRequest>>,
    }

    impl ScriptedTransport {
        fn new(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: PendingRequest) -> Result<RawResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(RawResponse::new(
                self.status,
                HeaderMap::new(),
                Bytes::from_static(self.body.as_bytes()),
            ))
        }
    }

    #[derive(Debug, Deserialize)]
    struct Session {
        session_id: String,
    }

    const CREATE_SESSION: Endpoint =
        Endpoint::post("create_session", "/v2/assistants/{assistant_id}/sessions");

    fn service(transport: Arc<ScriptedTransport>) -> BaseService {
        BaseService::builder("conversation", "V2")
            .service_url("https://api.example.com/")
            .authenticator(Arc::new(BasicAuthenticator::new("u", "p").unwrap()))
            .transport(transport)
            .header("X-Watson-Learning-Opt-Out", "true")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let transport = ScriptedTransport::new(201, r#"{"session_id":"abc"}"#);
        let svc = service(Arc::clone(&transport));

        let response = svc
            .invoke::<Json<Session>, _>(&CREATE_SESSION, |req| {
                Ok(req.with_path_param("assistant_id", "a1").with_argument("version", "2020-04-01"))
            })
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.result.session_id, "abc");

        let seen = transport.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(
            request.full_url().as_str(),
            "https://api.example.com/v2/assistants/a1/sessions?version=2020-04-01"
        );
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.header("x-watson-learning-opt-out"), Some("true"));
        assert!(request.header("authorization").unwrap().starts_with("Basic "));
        assert!(
            request
                .header(SDK_ANALYTICS_HEADER)
                .unwrap()
                .contains("operation_id=create_session")
        );
    }

    #[tokio::test]
    async fn test_configure_error_skips_transport_and_names_operation() {
        let transport = ScriptedTransport::new(200, "{}");
        let svc = service(Arc::clone(&transport));

        let err = svc
            .invoke::<Json<Session>, _>(&CREATE_SESSION, |_| Err(Error::missing("assistant_id")))
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Some("create_session"));
        assert!(matches!(err.root(), Error::MissingArgument { name } if name == "assistant_id"));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unfilled_path_param_is_missing_argument() {
        let transport = ScriptedTransport::new(201, r#"{"session_id":"abc"}"#);
        let svc = service(Arc::clone(&transport));

        let err = svc
            .invoke::<Json<Session>, _>(&CREATE_SESSION, |req| {
                Ok(req.with_argument("version", "2020-04-01"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err.root(), Error::MissingArgument { name } if name == "assistant_id"));
        assert_eq!(err.operation(), Some("create_session"));

        let err = svc
            .invoke::<Json<Session>, _>(&CREATE_SESSION, |req| {
                Ok(req.with_path_param("assistant_id", ".."))
            })
            .await
            .unwrap_err();
        assert!(matches!(err.root(), Error::InvalidArgument { name, .. } if name == "assistant_id"));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_error_is_tagged() {
        let transport = ScriptedTransport::new(404, r#"{"error":"Resource not found","code":404}"#);
        let svc = service(transport);

        let err = svc
            .invoke::<Json<Session>, _>(&CREATE_SESSION, |req| {
                Ok(req.with_path_param("assistant_id", "missing"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.operation(), Some("create_session"));
        assert_eq!(err.service_error().unwrap().message, "Resource not found");
    }

    #[test]
    fn test_builder_requires_url_and_authenticator() {
        let err = BaseService::builder("conversation", "V2")
            .authenticator(Arc::new(NoAuthAuthenticator))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingArgument { ref name } if name == "service_url"));

        let err = BaseService::builder("conversation", "V2")
            .service_url("https://api.example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingArgument { ref name } if name == "authenticator"));
    }

    #[test]
    fn test_set_service_url() {
        let mut svc = service(ScriptedTransport::new(200, "{}"));
        svc.set_service_url("https://api.eu-de.example.com/").unwrap();
        assert_eq!(svc.service_url(), "https://api.eu-de.example.com");
        assert!(svc.set_service_url("not a url").is_err());
        assert_eq!(svc.authenticator().scheme(), AuthScheme::Basic);
    }

    #[test]
    fn test_builder_from_settings() {
        let config = crate::config::SdkConfig::from_toml_str(
            r#"
[services.assistant]
url = "https://api.example.com"
timeout_secs = 5

[services.assistant.headers]
X-Custom = "1"

[services.assistant.auth]
type = "bearer"
token = "t0k"
"#,
        )
        .unwrap();
        let svc = BaseService::builder("conversation", "V2")
            .settings(config.service("assistant").unwrap())
            .unwrap()
            .transport(ScriptedTransport::new(200, "{}"))
            .build()
            .unwrap();
        assert_eq!(svc.authenticator().scheme(), AuthScheme::BearerToken);
        let request = svc.request(&CREATE_SESSION);
        assert_eq!(request.header("x-custom"), Some("1"));
    }
}
