#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde_json::json;
use watson_sdk::auth::{AuthScheme, Authenticator, IamTokenSource};
use watson_sdk::{BaseService, PendingRequest, RawResponse, Result, Transport};

/// Transport that records calls and answers with a fixed response.
#[derive(Debug)]
pub struct SpyTransport {
    pub calls: AtomicUsize,
    status: u16,
    body: &'static str,
}

impl SpyTransport {
    pub fn new(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            status,
            body,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for SpyTransport {
    async fn send(&self, _request: PendingRequest) -> Result<RawResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawResponse::new(
            self.status,
            HeaderMap::new(),
            Bytes::from_static(self.body.as_bytes()),
        ))
    }
}

/// Authenticator that counts calls and attaches nothing.
#[derive(Debug, Default)]
pub struct CountingAuthenticator {
    pub calls: AtomicUsize,
}

impl CountingAuthenticator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::NoAuth
    }

    async fn authenticate(&self, request: PendingRequest) -> Result<PendingRequest> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(request)
    }
}

/// A service wired to spies.
pub fn spied_service(
    name: &str,
    version: &str,
    auth: Arc<CountingAuthenticator>,
    transport: Arc<SpyTransport>,
) -> BaseService {
    BaseService::builder(name, version)
        .service_url("https://api.example.com")
        .authenticator(auth)
        .transport(transport)
        .build()
        .unwrap()
}

/// A service against a mock server with no authentication.
pub fn open_service(name: &str, version: &str, url: &str) -> BaseService {
    BaseService::builder(name, version)
        .service_url(url)
        .authenticator(Arc::new(watson_sdk::auth::NoAuthAuthenticator))
        .build()
        .unwrap()
}

pub fn iam_source(iam_url: &str) -> IamTokenSource {
    IamTokenSource::builder("test-apikey")
        .url(iam_url)
        .build()
        .unwrap()
}

/// Body of a successful IAM token response valid for an hour.
pub fn iam_token_body(token: &str) -> serde_json::Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "access_token": token,
        "refresh_token": "unused",
        "token_type": "Bearer",
        "expires_in": 3600,
        "expiration": now + 3600,
    })
}

/// An unsigned JWT with the given `iat`/`exp` claims.
pub fn jwt(iat: i64, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({"iat": iat, "exp": exp, "sub": "admin"}).to_string());
    format!("{header}.{payload}.")
}

pub fn body_text(request: &wiremock::Request) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}
