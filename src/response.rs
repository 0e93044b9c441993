//! Response mapping.
//!
//! [`map`] turns a [`RawResponse`] into either a [`ServiceResponse`] or an
//! error, never both. The expected result is named by a [`ResultKind`]:
//!
//! - [`Json<T>`] decodes the body with `serde_json`. An empty body is decoded
//!   as JSON `null`, so `Json<()>` and `Json<Option<_>>` accept it while a
//!   struct reports [`Error::Deserialization`].
//! - [`Binary`] hands back the raw bytes.
//! - [`NoContent`] ignores the body.

use std::marker::PhantomData;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result, ServiceError};

/// Status, headers and body as returned by a transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A successful (2xx) call.
#[derive(Debug, Clone)]
pub struct ServiceResponse<T> {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw response body, kept for diagnostics.
    pub raw_body: Bytes,
    /// The decoded result.
    pub result: T,
}

impl<T> ServiceResponse<T> {
    pub fn into_result(self) -> T {
        self.result
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Transform the result, keeping status and headers.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResponse<U> {
        ServiceResponse {
            status: self.status,
            headers: self.headers,
            raw_body: self.raw_body,
            result: f(self.result),
        }
    }
}

/// Describes how a 2xx body becomes a result value.
pub trait ResultKind {
    type Output;

    /// Accept header the operation should send.
    const ACCEPT: Option<&'static str>;

    fn decode(body: &Bytes) -> std::result::Result<Self::Output, String>;
}

/// JSON body decoded into `T`.
pub struct Json<T>(PhantomData<T>);

impl<T: DeserializeOwned> ResultKind for Json<T> {
    type Output = T;
    const ACCEPT: Option<&'static str> = Some("application/json");

    fn decode(body: &Bytes) -> std::result::Result<T, String> {
        let input: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            body
        };
        serde_json::from_slice(input).map_err(|e| e.to_string())
    }
}

/// Raw binary body (audio, models, images).
pub struct Binary;

impl ResultKind for Binary {
    type Output = Bytes;
    const ACCEPT: Option<&'static str> = None;

    fn decode(body: &Bytes) -> std::result::Result<Bytes, String> {
        Ok(body.clone())
    }
}

/// Body ignored; result is `()`.
pub struct NoContent;

impl ResultKind for NoContent {
    type Output = ();
    const ACCEPT: Option<&'static str> = None;

    fn decode(_body: &Bytes) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Map a raw response to a typed result or an error.
pub fn map<K: ResultKind>(raw: RawResponse) -> Result<ServiceResponse<K::Output>> {
    if !raw.is_success() {
        return Err(Error::Service(service_error(raw)));
    }
    match K::decode(&raw.body) {
        Ok(result) => Ok(ServiceResponse {
            status: raw.status,
            headers: raw.headers,
            raw_body: raw.body,
            result,
        }),
        Err(message) => Err(Error::Deserialization {
            status: raw.status,
            message,
            body: raw.body,
        }),
    }
}

/// Build a [`ServiceError`] from a non-2xx response.
pub fn service_error(raw: RawResponse) -> ServiceError {
    let parsed: Option<Value> = serde_json::from_slice(&raw.body).ok();
    let message = parsed
        .as_ref()
        .and_then(extract_message)
        .unwrap_or_else(|| format!("HTTP {}", raw.status));
    let code = parsed.as_ref().and_then(extract_code);
    ServiceError {
        status: raw.status,
        message,
        code,
        body: raw.body,
        headers: raw.headers,
    }
}

/// Pull a human-readable message out of the error shapes Watson services use.
fn extract_message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    if let Some(error) = obj.get("error") {
        match error {
            Value::String(s) if !s.is_empty() => return Some(s.clone()),
            Value::Object(inner) => {
                if let Some(Value::String(s)) = inner.get("message") {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
    }

    if let Some(Value::Array(errors)) = obj.get("errors")
        && let Some(Value::String(s)) = errors.first().and_then(|e| e.get("message"))
    {
        return Some(s.clone());
    }

    ["message", "errorMessage", "description"]
        .iter()
        .find_map(|key| match obj.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
}

fn extract_code(body: &Value) -> Option<String> {
    let obj = body.as_object()?;
    let code = obj
        .get("code")
        .or_else(|| obj.get("errors")?.get(0)?.get("code"))?;
    match code {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
