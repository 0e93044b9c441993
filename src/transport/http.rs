//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use super::Transport;
use crate::config::{CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use crate::error::{Error, Result};
use crate::request::{FormPart, MultipartForm, PendingRequest, RequestBody};
use crate::response::RawResponse;

/// HTTP transport over a pooled `reqwest::Client`.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with default timeouts.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Wrap an existing client (custom TLS, proxies, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            default_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PendingRequest) -> Result<RawResponse> {
        let parts = request.into_parts();
        let timeout = parts.timeout.unwrap_or(self.default_timeout);

        debug!(method = %parts.method, url = %parts.url, "Sending request");

        let mut builder = self
            .client
            .request(parts.method.to_reqwest(), parts.url)
            .headers(parts.headers)
            .timeout(timeout);

        builder = match parts.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Bytes {
                content,
                content_type,
            } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(content),
            RequestBody::Multipart(form) => builder.multipart(to_reqwest_form(form)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_send_error(e, timeout))?;

        debug!(status, len = body.len(), "Received response");
        Ok(RawResponse::new(status, headers, body))
    }
}

fn map_send_error(error: reqwest::Error, timeout: Duration) -> Error {
    if error.is_timeout() {
        warn!(timeout_ms = timeout.as_millis() as u64, "Request timed out");
        Error::Timeout {
            after: Some(timeout),
        }
    } else {
        warn!("Request failed: {}", error);
        Error::Network(error)
    }
}

fn to_reqwest_form(form: MultipartForm) -> Result<Form> {
    let mut out = Form::new();
    for part in form.parts() {
        out = match part {
            FormPart::Text { name, value } => out.text(name.clone(), value.clone()),
            FormPart::File(file) => {
                let data = reqwest::Body::from(file.data.clone());
                let body = Part::stream_with_length(data, file.data.len() as u64)
                    .file_name(file.filename.clone())
                    .mime_str(&file.content_type)
                    .map_err(|e| {
                        Error::invalid(
                            file.name.as_str(),
                            format!("invalid content type '{}': {e}", file.content_type),
                        )
                    })?;
                out.part(file.name.clone(), body)
            }
        };
    }
    Ok(out)
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    request_timeout: Duration,
    user_agent: String,
    disable_ssl_verification: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            user_agent: super::headers::user_agent(),
            disable_ssl_verification: false,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Default per-request timeout; a request's own timeout takes precedence.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Accept any TLS certificate. Only for private deployments with
    /// self-signed certificates.
    pub fn disable_ssl_verification(mut self, disable: bool) -> Self {
        self.disable_ssl_verification = disable;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport> {
        if self.disable_ssl_verification {
            warn!("TLS certificate verification is disabled");
        }
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent)
            .danger_accept_invalid_certs(self.disable_ssl_verification)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(ReqwestTransport {
            client,
            default_timeout: self.request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FilePart;

    #[test]
    fn test_form_conversion_rejects_bad_mime() {
        let form = MultipartForm::new().file(
            FilePart::new("images_file", "a.png", vec![1u8]).with_content_type("not a mime"),
        );
        assert!(matches!(
            to_reqwest_form(form),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_form_conversion_accepts_text_and_files() {
        let form = MultipartForm::new()
            .text("version", "2019-04-30")
            .file(FilePart::zip("cat_positive_examples", "cats.zip", vec![1u8, 2]));
        assert!(to_reqwest_form(form).is_ok());
    }

    #[test]
    fn test_builder_defaults() {
        let transport = ReqwestTransport::builder()
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(transport.default_timeout, Duration::from_secs(5));
    }
}
