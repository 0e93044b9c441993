//! Request construction.
//!
//! [`RequestBuilder`] is an immutable value: every `with_*` call consumes the
//! builder and returns a new one, so a partially built request can be cloned
//! and branched without aliasing. [`RequestBuilder::build`] produces the
//! [`PendingRequest`] that authenticators decorate and transports consume.
//!
//! Query arguments and headers are last-write-wins maps. The body is set at
//! most once; choosing a second body representation is reported as
//! [`Error::InvalidRequestState`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

/// Content type used for file parts without an explicit one.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// MARK: - Query values

/// A value that can be sent as a query argument.
pub trait QueryValue {
    fn to_query_value(&self) -> String;
}

impl QueryValue for str {
    fn to_query_value(&self) -> String {
        self.to_string()
    }
}

impl QueryValue for String {
    fn to_query_value(&self) -> String {
        self.clone()
    }
}

impl<T: QueryValue + ?Sized> QueryValue for &T {
    fn to_query_value(&self) -> String {
        (**self).to_query_value()
    }
}

macro_rules! display_query_value {
    ($($t:ty),*) => {
        $(impl QueryValue for $t {
            fn to_query_value(&self) -> String {
                self.to_string()
            }
        })*
    };
}

display_query_value!(bool, i32, i64, u16, u32, u64, usize, f32, f64);

impl QueryValue for NaiveDate {
    fn to_query_value(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl QueryValue for DateTime<Utc> {
    fn to_query_value(&self) -> String {
        self.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

/// Lists are sent comma-separated, as Watson expects for `classifier_ids` etc.
impl<T: QueryValue> QueryValue for [T] {
    fn to_query_value(&self) -> String {
        self.iter()
            .map(QueryValue::to_query_value)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl<T: QueryValue> QueryValue for Vec<T> {
    fn to_query_value(&self) -> String {
        self.as_slice().to_query_value()
    }
}

// MARK: - Multipart

/// A named file inside a multipart form.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name (e.g. `images_file`).
    pub name: String,
    /// File name sent in the `Content-Disposition` header.
    pub filename: String,
    /// MIME type of the file.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl FilePart {
    /// Create a file part with the default `application/octet-stream` type.
    pub fn new(name: impl Into<String>, filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            content_type: OCTET_STREAM.to_string(),
            data: data.into(),
        }
    }

    /// Set the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Rename the form field, keeping file name, type and contents.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// A zipped example set (`application/zip`).
    pub fn zip(name: impl Into<String>, filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::new(name, filename, data).with_content_type("application/zip")
    }

    /// Read a file from disk into a part.
    ///
    /// The file is read once and closed before this returns; the content type
    /// is guessed from the extension.
    pub async fn from_path(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::invalid("path", format!("{} has no file name", path.display())))?
            .to_string();
        let content_type = guess_content_type(&filename);
        Ok(Self::new(name, filename, data).with_content_type(content_type))
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("multipart", "file part has an empty field name"));
        }
        if self.filename.trim().is_empty() {
            return Err(Error::invalid(
                "multipart",
                format!("file part '{}' has no filename", self.name),
            ));
        }
        if self.content_type.trim().is_empty() {
            return Err(Error::invalid(
                "multipart",
                format!("file part '{}' has no content type", self.name),
            ));
        }
        if let Err(e) = self.content_type.parse::<mime::Mime>() {
            return Err(Error::invalid(
                self.name.as_str(),
                format!("invalid content type '{}': {e}", self.content_type),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain-text field; carries no content type.
    Text { name: String, value: String },
    /// File upload.
    File(FilePart),
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } => name,
            Self::File(file) => &file.name,
        }
    }
}

/// Multipart form body; parts keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl QueryValue) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.to_query_value(),
        });
        self
    }

    /// Append a text field when `value` is `Some`.
    pub fn text_opt<V: QueryValue>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.text(name, v),
            None => self,
        }
    }

    /// Append a file part.
    pub fn file(mut self, part: FilePart) -> Self {
        self.parts.push(FormPart::File(part));
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn validate(&self) -> Result<()> {
        for part in &self.parts {
            match part {
                FormPart::Text { name, .. } if name.trim().is_empty() => {
                    return Err(Error::invalid("multipart", "text part has an empty field name"));
                }
                FormPart::File(file) => file.validate()?,
                FormPart::Text { .. } => {}
            }
        }
        Ok(())
    }
}

// MARK: - Body

/// Request body; exactly one representation per request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// JSON document, serialized as UTF-8.
    Json(serde_json::Value),
    /// Raw bytes with an explicit content type.
    Bytes { content: Bytes, content_type: String },
    /// multipart/form-data.
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Json(_) => "json",
            Self::Bytes { .. } => "bytes",
            Self::Multipart(_) => "multipart",
        }
    }
}

// MARK: - Pending request

/// A fully assembled request, ready for authentication and sending.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: HttpMethod,
    url: Url,
    query: BTreeMap<String, String>,
    headers: HeaderMap,
    body: RequestBody,
    timeout: Option<Duration>,
    operation: Option<String>,
}

impl PendingRequest {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// URL without query arguments.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn argument(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// URL including the encoded query string.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url
    }

    /// Return the request with one header set (overwriting any previous value).
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Return the request with a sensitive header set; the value is marked so
    /// it is not printed by `HeaderMap`'s `Debug`.
    pub fn with_sensitive_header(mut self, name: &str, value: &str) -> Result<Self> {
        let (name, mut value) = header_pair(name, value)?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Return the request with one query argument set.
    pub fn with_argument(mut self, name: &str, value: impl QueryValue) -> Self {
        self.query.insert(name.to_string(), value.to_query_value());
        self
    }

    /// Split into owned parts for a transport.
    pub fn into_parts(self) -> RequestParts {
        let url = self.full_url();
        RequestParts {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
        }
    }
}

/// Owned pieces of a [`PendingRequest`], consumed by a transport.
#[derive(Debug)]
pub struct RequestParts {
    pub method: HttpMethod,
    /// Full URL with query string.
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::invalid(name, format!("invalid header name: {e}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| Error::invalid(name, format!("invalid header value: {e}")))?;
    Ok((header_name, header_value))
}

// MARK: - Builder

/// Immutable builder for one call.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: HttpMethod,
    service_url: String,
    path: String,
    query: BTreeMap<String, String>,
    headers: Vec<(String, String)>,
    body: RequestBody,
    timeout: Option<Duration>,
    operation: Option<String>,
    deferred: Option<Deferred>,
}

/// A builder error reported at `build()` so path setters stay infallible.
#[derive(Debug, Clone)]
enum Deferred {
    EmptyParam(String),
    DotSegment(String),
    NoPlaceholder(String),
}

impl RequestBuilder {
    /// Start a request against `service_url` + `path_template`.
    ///
    /// `path_template` may contain `{name}` placeholders filled with
    /// [`with_path_param`](Self::with_path_param).
    pub fn new(method: HttpMethod, service_url: &str, path_template: &str) -> Self {
        Self {
            method,
            service_url: service_url.trim_end_matches('/').to_string(),
            path: path_template.to_string(),
            query: BTreeMap::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
            operation: None,
            deferred: None,
        }
    }

    /// Substitute `{name}` in the path with the percent-encoded `value`.
    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        let placeholder = format!("{{{name}}}");
        if value.is_empty() {
            self.defer(Deferred::EmptyParam(name.to_string()));
        } else if value == "." || value == ".." {
            // URL parsing would resolve these away as dot-segments.
            self.defer(Deferred::DotSegment(name.to_string()));
        } else if !self.path.contains(&placeholder) {
            self.defer(Deferred::NoPlaceholder(placeholder));
        } else {
            self.path = self.path.replace(&placeholder, &urlencoding::encode(value));
        }
        self
    }

    /// Set a query argument; a later call with the same name wins.
    pub fn with_argument(mut self, name: &str, value: impl QueryValue) -> Self {
        self.query.insert(name.to_string(), value.to_query_value());
        self
    }

    /// Set a query argument when `value` is `Some`.
    pub fn with_optional_argument<V: QueryValue>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with_argument(name, v),
            None => self,
        }
    }

    /// Set a header; a later call with the same (case-insensitive) name wins.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set several headers at once.
    pub fn with_headers<'a>(self, headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.with_header(name, value))
    }

    /// Use a JSON document as the body.
    pub fn with_json_body<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| Error::invalid("body", format!("failed to serialize JSON body: {e}")))?;
        self.set_body(RequestBody::Json(value))
    }

    /// Use raw bytes with an explicit content type as the body.
    pub fn with_body_content(self, content: impl Into<Bytes>, content_type: &str) -> Result<Self> {
        if content_type.trim().is_empty() {
            return Err(Error::missing("content_type"));
        }
        self.set_body(RequestBody::Bytes {
            content: content.into(),
            content_type: content_type.to_string(),
        })
    }

    /// Use a multipart form as the body.
    pub fn with_multipart_form(self, form: MultipartForm) -> Result<Self> {
        form.validate()?;
        self.set_body(RequestBody::Multipart(form))
    }

    /// Per-call timeout, overriding the transport default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Operation label used in logs and error context.
    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether a setter recorded a problem that `build()` will report.
    pub(crate) fn has_deferred_error(&self) -> bool {
        self.deferred.is_some()
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Header value set so far (case-insensitive lookup).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Produce the pending request.
    pub fn build(self) -> Result<PendingRequest> {
        match self.deferred {
            Some(Deferred::EmptyParam(name)) => return Err(Error::missing(name)),
            Some(Deferred::DotSegment(name)) => {
                return Err(Error::invalid(name, "'.' and '..' are not valid path segments"));
            }
            Some(Deferred::NoPlaceholder(placeholder)) => {
                return Err(Error::InvalidRequestState(format!(
                    "path has no '{placeholder}' placeholder"
                )));
            }
            None => {}
        }
        if let Some(start) = self.path.find('{') {
            let rest = &self.path[start..];
            let end = rest.find('}').map_or(rest.len(), |i| i + 1);
            return Err(Error::InvalidRequestState(format!(
                "path parameter {} was not supplied",
                &rest[..end]
            )));
        }

        let raw_url = format!("{}{}", self.service_url, self.path);
        let url = Url::parse(&raw_url)
            .map_err(|e| Error::invalid("service_url", format!("'{raw_url}' is not a valid URL: {e}")))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let (name, value) = header_pair(name, value)?;
            headers.insert(name, value);
        }

        Ok(PendingRequest {
            method: self.method,
            url,
            query: self.query,
            headers,
            body: self.body,
            timeout: self.timeout,
            operation: self.operation,
        })
    }

    fn set_body(mut self, body: RequestBody) -> Result<Self> {
        if !self.body.is_empty() {
            return Err(Error::InvalidRequestState(format!(
                "request body already set as {}; cannot also set {}",
                self.body.variant_name(),
                body.variant_name()
            )));
        }
        self.body = body;
        Ok(self)
    }

    fn defer(&mut self, problem: Deferred) {
        if self.deferred.is_none() {
            self.deferred = Some(problem);
        }
    }
}

/// Guess a MIME type from a file name.
pub fn guess_content_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "zip" => "application/zip",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "mp3" => "audio/mp3",
        "ogg" => "audio/ogg",
        "webm" => "audio/webm",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const BASE: &str = "https://api.example.com/discovery/api/";

    fn builder() -> RequestBuilder {
        RequestBuilder::new(
            HttpMethod::Get,
            BASE,
            "/v1/environments/{environment_id}/collections/{collection_id}",
        )
        .with_path_param("environment_id", "env")
        .with_path_param("collection_id", "col")
    }

    #[test]
    fn test_build_substitutes_path_and_trims_base() {
        let req = builder().with_argument("version", "2019-04-30").build().unwrap();
        assert_eq!(req.method(), HttpMethod::Get);
        assert_eq!(
            req.url().as_str(),
            "https://api.example.com/discovery/api/v1/environments/env/collections/col"
        );
        assert_eq!(req.argument("version"), Some("2019-04-30"));
        assert!(req.body().is_empty());
        assert_eq!(
            req.full_url().as_str(),
            "https://api.example.com/discovery/api/v1/environments/env/collections/col?version=2019-04-30"
        );
    }

    #[test]
    fn test_path_params_are_percent_encoded() {
        let req = RequestBuilder::new(HttpMethod::Get, BASE, "/v1/models/{model_id}")
            .with_path_param("model_id", "en US/broad band")
            .build()
            .unwrap();
        assert!(req.url().path().ends_with("/v1/models/en%20US%2Fbroad%20band"));
    }

    #[test]
    fn test_missing_path_param_is_invalid_state() {
        let err = RequestBuilder::new(HttpMethod::Get, BASE, "/v1/collections/{collection_id}")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequestState(ref m) if m.contains("{collection_id}")));
    }

    #[test]
    fn test_empty_path_param_is_rejected() {
        let err = RequestBuilder::new(HttpMethod::Get, BASE, "/v1/collections/{collection_id}")
            .with_path_param("collection_id", "")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingArgument { ref name } if name == "collection_id"));
    }

    #[test]
    fn test_dot_segment_path_param_is_rejected() {
        for value in [".", ".."] {
            let err = RequestBuilder::new(HttpMethod::Get, BASE, "/v1/models/{model_id}")
                .with_path_param("model_id", value)
                .build()
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArgument { ref name, .. } if name == "model_id"));
        }
    }

    #[test]
    fn test_last_write_wins() {
        let req = builder()
            .with_argument("count", 10)
            .with_argument("count", 20)
            .with_header("X-Watson-Learning-Opt-Out", "false")
            .with_header("x-watson-learning-opt-out", "true")
            .build()
            .unwrap();
        assert_eq!(req.argument("count"), Some("20"));
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.header("X-Watson-Learning-Opt-Out"), Some("true"));
    }

    #[test]
    fn test_query_value_conversions() {
        let date = NaiveDate::from_ymd_opt(2019, 4, 30).unwrap();
        let req = builder()
            .with_argument("version", date)
            .with_argument("threshold", 0.5)
            .with_argument("verbose", true)
            .with_argument("classifier_ids", vec!["default", "food"])
            .with_optional_argument::<u32>("count", None)
            .build()
            .unwrap();
        assert_eq!(req.argument("version"), Some("2019-04-30"));
        assert_eq!(req.argument("threshold"), Some("0.5"));
        assert_eq!(req.argument("verbose"), Some("true"));
        assert_eq!(req.argument("classifier_ids"), Some("default,food"));
        assert_eq!(req.argument("count"), None);
    }

    #[test]
    fn test_second_body_is_invalid_state() {
        let b = builder().with_json_body(&serde_json::json!({"a": 1})).unwrap();
        let err = b
            .with_body_content(Bytes::from_static(b"x"), "text/plain")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequestState(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let b = builder()
            .with_multipart_form(MultipartForm::new().text("a", "b"))
            .unwrap();
        assert!(b.with_json_body(&1).is_err());
    }

    #[test]
    fn test_builder_is_a_value() {
        let base = builder().with_argument("version", "1");
        let a = base.clone().with_argument("count", 1).build().unwrap();
        let b = base.build().unwrap();
        assert_eq!(a.argument("count"), Some("1"));
        assert_eq!(b.argument("count"), None);
    }

    #[test]
    fn test_multipart_preserves_parts_in_order() {
        let form = MultipartForm::new()
            .text("version", "2019-04-30")
            .file(FilePart::new("images_file", "a.png", vec![1u8, 2, 3]).with_content_type("image/png"));
        let req = builder().with_multipart_form(form).unwrap().build().unwrap();

        let RequestBody::Multipart(form) = req.body() else {
            panic!("expected multipart body");
        };
        assert_eq!(form.len(), 2);
        assert_eq!(
            form.parts()[0],
            FormPart::Text {
                name: "version".into(),
                value: "2019-04-30".into()
            }
        );
        let FormPart::File(file) = &form.parts()[1] else {
            panic!("expected file part");
        };
        assert_eq!(file.name, "images_file");
        assert_eq!(file.filename, "a.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.data.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_multipart_rejects_nameless_file() {
        let form = MultipartForm::new().file(FilePart::new("images_file", "", vec![0u8]));
        let err = builder().with_multipart_form(form).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_multipart_rejects_malformed_content_type() {
        let form = MultipartForm::new().file(
            FilePart::new("images_file", "a.png", vec![0u8]).with_content_type("not a mime"),
        );
        let err = builder().with_multipart_form(form).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { ref name, .. } if name == "images_file"));

        let form = MultipartForm::new().file(
            FilePart::new("audio", "a.wav", vec![0u8]).with_content_type("audio/l16; rate=16000"),
        );
        assert!(builder().with_multipart_form(form).is_ok());
    }

    #[test]
    fn test_invalid_header_reported_at_build() {
        let err = builder().with_header("bad header", "x").build().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_pending_request_with_sensitive_header() {
        let req = builder()
            .build()
            .unwrap()
            .with_sensitive_header("Authorization", "Bearer secret")
            .unwrap();
        assert!(req.headers()["authorization"].is_sensitive());
        assert!(!format!("{:?}", req.headers()).contains("secret"));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("a.PNG"), "image/png");
        assert_eq!(guess_content_type("examples.zip"), "application/zip");
        assert_eq!(guess_content_type("noext"), OCTET_STREAM);
    }

    #[tokio::test]
    async fn test_file_part_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cats.zip");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let part = FilePart::from_path("cat_positive_examples", &path).await.unwrap();
        assert_eq!(part.filename, "cats.zip");
        assert_eq!(part.content_type, "application/zip");
        assert_eq!(part.data.len(), 4);
    }
}
